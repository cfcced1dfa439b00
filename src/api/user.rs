use axum::{routing::get, Router};
use sqlx::PgPool;

use crate::db::queries::user::{get_all_users, get_user};

/// Defines the employee-directory routes to be used in the main router
pub fn user_routes() -> Router<PgPool> {
    Router::new()
        .route("/users", get(get_all_users))
        .route("/users/{user_id}", get(get_user))
}

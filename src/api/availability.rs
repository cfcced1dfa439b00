use axum::{routing::post, Router};
use sqlx::PgPool;

use crate::db::queries::availability::check_availability;

/// Defines the availability-check route to be used in the main router
pub fn availability_routes() -> Router<PgPool> {
    Router::new().route("/availability/check", post(check_availability))
}

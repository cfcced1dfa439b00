use axum::{
    routing::{get, post},
    Router,
};
use sqlx::PgPool;

use crate::db::queries::chat::{get_task_messages, post_task_message};

/// Defines the in-task chat routes to be used in the main router
pub fn chat_routes() -> Router<PgPool> {
    Router::new()
        .route("/tasks/{task_id}/messages", get(get_task_messages))
        .route("/tasks/{task_id}/messages", post(post_task_message))
}

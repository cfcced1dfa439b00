use axum::{
    routing::{delete, get, post},
    Router,
};
use sqlx::PgPool;

use crate::db::queries::notification::{
    create_announcement, delete_notification, dismiss_all_notifications, dismiss_notification,
    get_notification_count, get_notifications,
};

/// Defines the notification routes to be used in the main router
pub fn notification_routes() -> Router<PgPool> {
    Router::new()
        .route("/notifications", get(get_notifications))
        .route("/notifications", post(create_announcement))
        .route("/notifications/count", get(get_notification_count))
        .route("/notifications/dismiss-all", post(dismiss_all_notifications))
        .route("/notifications/{notification_id}/dismiss", post(dismiss_notification))
        .route("/notifications/{notification_id}", delete(delete_notification))
}

use axum::{
    routing::{get, post},
    Router,
};
use sqlx::PgPool;

use crate::db::queries::attendance::{clock_in, clock_out, get_history, get_today};

/// Defines the attendance routes to be used in the main router
pub fn attendance_routes() -> Router<PgPool> {
    Router::new()
        .route("/attendance/clock-in", post(clock_in))
        .route("/attendance/clock-out", post(clock_out))
        .route("/attendance/today", get(get_today))
        .route("/attendance", get(get_history))
}

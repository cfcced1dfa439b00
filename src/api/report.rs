use axum::{
    routing::{get, post},
    Router,
};
use sqlx::PgPool;

use crate::db::queries::report::{
    approve_review, get_pending_reviews, get_task_reports, reject_review, submit_report,
    submit_review,
};

/// Defines the progress-report and review-workflow routes
pub fn report_routes() -> Router<PgPool> {
    Router::new()
        // Submit an accepted report (runs the roll-up cascade)
        .route("/tasks/{task_id}/reports", post(submit_report))
        // List a task's accepted reports
        .route("/tasks/{task_id}/reports", get(get_task_reports))
        // Queue a report for review
        .route("/tasks/{task_id}/reviews", post(submit_review))
        // Manager view of the pending queue
        .route("/reviews/pending", get(get_pending_reviews))
        // Approve: move pending -> accepted, then cascade
        .route("/reviews/{review_id}/approve", post(approve_review))
        // Reject: drop from the queue, no percentage change
        .route("/reviews/{review_id}/reject", post(reject_review))
}

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::task::Task;

/// An accepted progress report. `activity_id` is set when the report targets
/// one activity of the task rather than the task itself.
#[derive(Debug, FromRow, Serialize, Deserialize, ToSchema)]
pub struct ProgressReport {
    pub id: i32,
    pub task_id: i32,
    pub activity_id: Option<i32>,
    pub employee: String,
    pub percentage: i32,
    pub note: Option<String>,
    pub created_at: NaiveDateTime,
}

/// A report sitting in the pending-review queue. Same shape as an accepted
/// report; approval moves the row across.
#[derive(Debug, FromRow, Serialize, Deserialize, ToSchema)]
pub struct ReportReview {
    pub id: i32,
    pub task_id: i32,
    pub activity_id: Option<i32>,
    pub employee: String,
    pub percentage: i32,
    pub note: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewProgressReport {
    pub activity_id: Option<i32>,
    pub percentage: i32,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct RejectReview {
    pub reason: Option<String>,
}

/// Result of applying a report: the task after its roll-up plus the owning
/// project's recomputed percentage.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReportOutcome {
    pub report_id: i32,
    pub task: Task,
    pub project_percentage: i32,
}

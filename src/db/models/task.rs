use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::scheduling::conflict::ActivityDraft;

/// A task as stored. Either `employee` is set (direct assignment) or the task
/// has activities; the create/update handlers enforce the exclusion.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Task {
    pub id: i32,
    pub project_id: i32,
    pub name: String,
    pub employee: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub percentage: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A sub-activity ("group task") of a task, with its own assignee and window.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Activity {
    pub id: i32,
    pub task_id: i32,
    pub name: String,
    pub employee: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub percentage: i32,
    pub created_at: NaiveDateTime,
}

/// One task submitted for creation. Fields are optional so validation can
/// produce a message per missing field instead of a serde rejection.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct NewTask {
    pub name: Option<String>,
    pub employee: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub activities: Vec<ActivityDraft>,
}

/// Batch creation payload: all tasks are validated together and persisted
/// atomically, or the whole batch is rejected.
#[derive(Debug, Deserialize, ToSchema)]
pub struct NewTaskBatch {
    pub tasks: Vec<NewTask>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTask {
    pub name: Option<String>,
    pub employee: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

impl UpdateTask {
    /// Returns `true` if all fields are `None`.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.employee.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TaskWithActivities {
    pub task: Task,
    pub activities: Vec<Activity>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedTasksResponse {
    pub task_ids: Vec<i32>,
}

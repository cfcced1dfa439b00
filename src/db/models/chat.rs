use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, FromRow, Serialize, Deserialize, ToSchema)]
pub struct TaskMessage {
    pub id: i32,
    pub task_id: i32,
    pub sender: String,
    pub body: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewTaskMessage {
    pub body: String,
}

/// Paging: newest first, `before_id` walks backwards through history.
#[derive(Debug, Deserialize, Default, IntoParams)]
pub struct MessageFilter {
    pub limit: Option<u32>,
    pub before_id: Option<i32>,
}

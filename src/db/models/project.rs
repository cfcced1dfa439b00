use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::task::TaskWithActivities;

/// A project as stored. `percentage` is derived from its tasks and never
/// accepted from the client.
#[derive(Debug, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Project {
    pub id: i32,
    pub name: String,
    pub project_type: Option<String>,
    pub description: Option<String>,
    pub percentage: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Listing row with the task count joined in.
#[derive(Debug, FromRow, Serialize, ToSchema)]
pub struct ProjectSummary {
    pub id: i32,
    pub name: String,
    pub project_type: Option<String>,
    pub percentage: i32,
    pub task_count: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewProject {
    pub name: String,
    pub project_type: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub project_type: Option<String>,
    pub description: Option<String>,
}

impl UpdateProject {
    /// Returns `true` if all fields are `None`.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.project_type.is_none() && self.description.is_none()
    }
}

/// Full project view with its tasks and their activities.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectDetail {
    pub project: Project,
    pub tasks: Vec<TaskWithActivities>,
}

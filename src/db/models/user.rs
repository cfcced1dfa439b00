use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Full account row; never serialized to clients because of `password_hash`.
#[derive(Debug, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub role: String,
    pub account_locked: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Public directory view, what the frontend picks assignees from. The
/// `username` doubles as the employee id used on tasks and activities.
#[derive(Debug, FromRow, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: i32,
    pub username: String,
    pub full_name: Option<String>,
    pub role: String,
}

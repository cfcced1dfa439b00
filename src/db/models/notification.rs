use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

#[derive(Serialize, Deserialize, Clone, Debug, FromRow, ToSchema)]
pub struct Notification {
    pub id: i32,
    pub title: String,
    pub body: Option<String>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub type_field: String,
    pub action_type: Option<String>,
    pub action_data: Option<Value>,
    pub global: bool,
    pub dismissible: bool,
    pub created_at: NaiveDateTime,
    pub expires_at: Option<NaiveDateTime>,
}

/// Who a notification is addressed to: one employee, or everyone staffed on a
/// project.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, ToSchema)]
pub enum NotificationScope {
    #[serde(rename = "employee")]
    Employee,
    #[serde(rename = "project")]
    Project,
}

#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct NotificationTargetInput {
    pub scope: NotificationScope,
    pub employee: Option<String>,
    pub project_id: Option<i32>,
}

/// Admin-created announcement payload.
#[derive(Debug, Deserialize, ToSchema)]
pub struct NewAnnouncement {
    pub title: String,
    pub body: Option<String>,
    pub action_type: Option<String>,
    pub action_data: Option<Value>,
    pub targets: Vec<NotificationTargetInput>,
    pub expires_in_days: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, Default, IntoParams, ToSchema)]
pub struct NotificationFilter {
    pub include_dismissed: Option<bool>,
    pub include_expired: Option<bool>,
    #[serde(rename = "type")]
    pub type_field: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Listing row: the notification plus whether this employee dismissed it.
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct NotificationItem {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub notification: Notification,
    pub dismissed: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationCountResponse {
    pub total: i64,
    pub unread: i64,
}

use chrono::Utc;
use serde_json::{json, Value};
use sqlx::PgPool;

use crate::db::models::notification::{NotificationScope, NotificationTargetInput};
use crate::utils::registry::{OutboundEvent, SharedRegistry};

/// Result type for notification operations
pub type NotificationResult<T> = Result<T, NotificationError>;

/// Errors that can occur in notification operations
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid target provided: {0}")]
    InvalidTarget(String),

    #[error("Failed to serialize notification data: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Builder for persisted notifications. Persisting and live delivery are one
/// call: the rows land in a transaction, then every reachable recipient gets
/// the event pushed over the connection registry.
pub struct NotificationBuilder {
    title: String,
    body: Option<String>,
    notification_type: String,
    targets: Vec<NotificationTargetInput>,
    action_type: Option<String>,
    action_data: Option<Value>,
    dismissible: bool,
    expires_in_days: Option<i64>,
}

impl NotificationBuilder {
    pub fn new(title: impl Into<String>, notification_type: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: None,
            notification_type: notification_type.into(),
            targets: Vec::new(),
            action_type: None,
            action_data: None,
            dismissible: true,
            expires_in_days: Some(14),
        }
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Target one employee by id.
    pub fn target_employee(mut self, employee: impl Into<String>) -> Self {
        self.targets.push(NotificationTargetInput {
            scope: NotificationScope::Employee,
            employee: Some(employee.into()),
            project_id: None,
        });
        self
    }

    /// Target several employees by id.
    pub fn target_employees<I, S>(mut self, employees: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for employee in employees {
            self = self.target_employee(employee);
        }
        self
    }

    /// Target everyone staffed on a project's tasks or activities.
    pub fn target_project(mut self, project_id: i32) -> Self {
        self.targets.push(NotificationTargetInput {
            scope: NotificationScope::Project,
            employee: None,
            project_id: Some(project_id),
        });
        self
    }

    /// Set the action type and data for when the notification is clicked.
    pub fn action(mut self, action_type: impl Into<String>, action_data: Value) -> Self {
        self.action_type = Some(action_type.into());
        self.action_data = Some(action_data);
        self
    }

    pub fn dismissible(mut self, dismissible: bool) -> Self {
        self.dismissible = dismissible;
        self
    }

    /// Expiration in days (`None` means the notification never expires).
    pub fn expires_in_days(mut self, days: Option<i64>) -> Self {
        self.expires_in_days = days;
        self
    }

    /// Persist the notification and push it to every recipient with a live
    /// connection.
    pub async fn send(self, pool: &PgPool, registry: &SharedRegistry) -> NotificationResult<i32> {
        if self.targets.is_empty() {
            return Err(NotificationError::InvalidTarget(
                "At least one target is required".to_string(),
            ));
        }

        let expires_at = self
            .expires_in_days
            .map(|days| (Utc::now() + chrono::Duration::days(days)).naive_utc());

        let mut tx = pool.begin().await?;

        let notification_id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO notifications (
                title, body, type, action_type, action_data,
                global, dismissible, expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&self.title)
        .bind(&self.body)
        .bind(&self.notification_type)
        .bind(&self.action_type)
        .bind(&self.action_data)
        .bind(false)
        .bind(self.dismissible)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        for target in &self.targets {
            let scope_str = match target.scope {
                NotificationScope::Employee => "employee",
                NotificationScope::Project => "project",
            };
            sqlx::query(
                "INSERT INTO notification_targets (notification_id, scope, employee, project_id) VALUES ($1, $2, $3, $4)",
            )
            .bind(notification_id)
            .bind(scope_str)
            .bind(&target.employee)
            .bind(target.project_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        // Live fan-out happens after commit; offline recipients pick the row
        // up from GET /notifications.
        let recipients = resolve_recipients(pool, &self.targets).await?;
        let event = OutboundEvent::new(
            "notification",
            json!({
                "id": notification_id,
                "title": self.title,
                "body": self.body,
                "type": self.notification_type,
                "action_type": self.action_type,
                "action_data": self.action_data,
            }),
        );
        for employee in recipients {
            registry.emit_to_user(&employee, event.clone()).await;
        }

        Ok(notification_id)
    }
}

/// Expands target rows into concrete employee ids, deduplicated.
async fn resolve_recipients(
    pool: &PgPool,
    targets: &[NotificationTargetInput],
) -> Result<Vec<String>, sqlx::Error> {
    let mut recipients: Vec<String> = Vec::new();

    for target in targets {
        match target.scope {
            NotificationScope::Employee => {
                if let Some(employee) = &target.employee {
                    recipients.push(employee.clone());
                }
            }
            NotificationScope::Project => {
                if let Some(project_id) = target.project_id {
                    let members = project_employees(pool, project_id).await?;
                    recipients.extend(members);
                }
            }
        }
    }

    recipients.sort();
    recipients.dedup();
    Ok(recipients)
}

/// Everyone staffed on a project, from direct task assignments and activities.
pub async fn project_employees(pool: &PgPool, project_id: i32) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        r#"
        SELECT t.employee FROM tasks t
        WHERE t.project_id = $1 AND t.employee IS NOT NULL
        UNION
        SELECT a.employee FROM activities a
        JOIN tasks t ON t.id = a.task_id
        WHERE t.project_id = $1
        "#,
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
}

/// Everyone with a manager or admin account, for review-queue notifications.
pub async fn manager_employee_ids(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT username FROM users WHERE role IN ('manager', 'admin') AND account_locked = false",
    )
    .fetch_all(pool)
    .await
}

/// Common notification types for system usage
pub mod notification_types {
    pub const TASK_ASSIGNMENT: &str = "task_assignment";
    pub const REVIEW_SUBMITTED: &str = "review_submitted";
    pub const REVIEW_DECISION: &str = "review_decision";
    pub const CHAT_MESSAGE: &str = "chat_message";
    pub const SYSTEM_ANNOUNCEMENT: &str = "system_announcement";
}

/// Notifies an employee about a task or activity they were just booked on.
pub async fn notify_assignment(
    pool: &PgPool,
    registry: &SharedRegistry,
    employee: &str,
    task_id: i32,
    task_name: &str,
    project_name: &str,
) -> NotificationResult<i32> {
    NotificationBuilder::new(
        format!("New assignment: {}", task_name),
        notification_types::TASK_ASSIGNMENT,
    )
    .body(format!(
        "You have been assigned to '{}' in project '{}'",
        task_name, project_name
    ))
    .target_employee(employee)
    .action("view_task", json!({ "task_id": task_id }))
    .send(pool, registry)
    .await
}

/// Notifies managers that a progress report is waiting for review.
pub async fn notify_review_submitted(
    pool: &PgPool,
    registry: &SharedRegistry,
    review_id: i32,
    task_id: i32,
    task_name: &str,
    employee: &str,
    percentage: i32,
) -> NotificationResult<i32> {
    let managers = manager_employee_ids(pool).await?;
    if managers.is_empty() {
        return Err(NotificationError::InvalidTarget(
            "No manager accounts to notify".to_string(),
        ));
    }

    NotificationBuilder::new(
        format!("Report awaiting review: {}", task_name),
        notification_types::REVIEW_SUBMITTED,
    )
    .body(format!(
        "{} reported {}% on '{}'",
        employee, percentage, task_name
    ))
    .target_employees(managers)
    .action(
        "view_review",
        json!({ "review_id": review_id, "task_id": task_id }),
    )
    .dismissible(false)
    .send(pool, registry)
    .await
}

/// Notifies the submitter that their report was approved or rejected.
pub async fn notify_review_decision(
    pool: &PgPool,
    registry: &SharedRegistry,
    employee: &str,
    task_id: i32,
    task_name: &str,
    approved: bool,
    reason: Option<&str>,
) -> NotificationResult<i32> {
    let (title, body) = if approved {
        (
            format!("Report approved: {}", task_name),
            format!("Your progress report on '{}' was approved", task_name),
        )
    } else {
        (
            format!("Report rejected: {}", task_name),
            match reason {
                Some(reason) => format!(
                    "Your progress report on '{}' was rejected: {}",
                    task_name, reason
                ),
                None => format!("Your progress report on '{}' was rejected", task_name),
            },
        )
    };

    NotificationBuilder::new(title, notification_types::REVIEW_DECISION)
        .body(body)
        .target_employee(employee)
        .action("view_task", json!({ "task_id": task_id }))
        .send(pool, registry)
        .await
}

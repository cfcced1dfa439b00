use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use sqlx::PgPool;

use crate::api::auth::Claims;
use crate::db::models::notification::{
    NewAnnouncement, Notification, NotificationCountResponse, NotificationFilter,
    NotificationItem, NotificationScope,
};
use crate::utils::api_response::ApiResponse;
use crate::utils::notification::{notification_types, NotificationBuilder};
use crate::utils::registry::SharedRegistry;

/// Everything the WHERE clause needs to decide whether a notification is
/// addressed to this employee: global, targeted directly, or targeted at a
/// project they are staffed on.
const TARGETED_AT: &str = r#"
    (
        n.global = TRUE
        OR EXISTS (
            SELECT 1 FROM notification_targets nt
            WHERE nt.notification_id = n.id AND nt.scope = 'employee' AND nt.employee = $1
        )
        OR EXISTS (
            SELECT 1 FROM notification_targets nt
            WHERE nt.notification_id = n.id AND nt.scope = 'project'
              AND nt.project_id IN (
                  SELECT t.project_id FROM tasks t WHERE t.employee = $1
                  UNION
                  SELECT t.project_id FROM tasks t
                  JOIN activities a ON a.task_id = t.id
                  WHERE a.employee = $1
              )
        )
    )
"#;

/// Retrieves the caller's notifications, newest first
#[utoipa::path(
    get,
    path = "/notifications",
    params(NotificationFilter),
    responses(
        (status = 200, description = "Notifications retrieved successfully", body = Vec<NotificationItem>),
        (status = 500, description = "Failed to retrieve notifications")
    ),
    tag = "Notifications",
    security(("bearerAuth" = []))
)]
pub async fn get_notifications(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Query(filter): Query<NotificationFilter>,
) -> Result<ApiResponse<Vec<NotificationItem>>, ApiResponse<()>> {
    let include_dismissed = filter.include_dismissed.unwrap_or(false);
    let include_expired = filter.include_expired.unwrap_or(false);
    let limit = filter.limit.unwrap_or(50).min(200) as i64;
    let offset = filter.offset.unwrap_or(0) as i64;

    let sql = format!(
        r#"
        SELECT n.id, n.title, n.body, n.type, n.action_type, n.action_data,
               n.global, n.dismissible, n.created_at, n.expires_at,
               (d.id IS NOT NULL) AS dismissed
        FROM notifications n
        LEFT JOIN notification_dismissals d
            ON d.notification_id = n.id AND d.employee = $1
        WHERE {TARGETED_AT}
          AND ($2 OR d.id IS NULL)
          AND ($3 OR n.expires_at IS NULL OR n.expires_at > NOW())
          AND ($4::text IS NULL OR n.type = $4)
        ORDER BY n.created_at DESC, n.id DESC
        LIMIT $5 OFFSET $6
        "#
    );

    let notifications = sqlx::query_as::<_, NotificationItem>(&sql)
        .bind(&claims.username)
        .bind(include_dismissed)
        .bind(include_expired)
        .bind(&filter.type_field)
        .bind(limit)
        .bind(offset)
        .fetch_all(&pool)
        .await
        .map_err(|e| ApiResponse::db_error("Failed to retrieve notifications", e))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Notifications retrieved successfully",
        notifications,
    ))
}

/// Retrieves the caller's notification counts (badge data)
#[utoipa::path(
    get,
    path = "/notifications/count",
    responses(
        (status = 200, description = "Counts retrieved successfully", body = NotificationCountResponse),
        (status = 500, description = "Failed to count notifications")
    ),
    tag = "Notifications",
    security(("bearerAuth" = []))
)]
pub async fn get_notification_count(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<ApiResponse<NotificationCountResponse>, ApiResponse<()>> {
    let sql = format!(
        r#"
        SELECT COUNT(*) AS total,
               COUNT(*) FILTER (WHERE d.id IS NULL) AS unread
        FROM notifications n
        LEFT JOIN notification_dismissals d
            ON d.notification_id = n.id AND d.employee = $1
        WHERE {TARGETED_AT}
          AND (n.expires_at IS NULL OR n.expires_at > NOW())
        "#
    );

    let (total, unread): (i64, i64) = sqlx::query_as(&sql)
        .bind(&claims.username)
        .fetch_one(&pool)
        .await
        .map_err(|e| ApiResponse::db_error("Failed to count notifications", e))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Notification counts retrieved successfully",
        NotificationCountResponse { total, unread },
    ))
}

/// Dismisses one notification for the caller
#[utoipa::path(
    post,
    path = "/notifications/{notification_id}/dismiss",
    params(("notification_id" = i32, Path, description = "Notification to dismiss")),
    responses(
        (status = 200, description = "Notification dismissed"),
        (status = 403, description = "Notification is not dismissible"),
        (status = 404, description = "Notification not found"),
        (status = 500, description = "Failed to dismiss notification")
    ),
    tag = "Notifications",
    security(("bearerAuth" = []))
)]
pub async fn dismiss_notification(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(notification_id): Path<i32>,
) -> Result<ApiResponse<()>, ApiResponse<()>> {
    let dismissible: bool =
        sqlx::query_scalar("SELECT dismissible FROM notifications WHERE id = $1")
            .bind(notification_id)
            .fetch_optional(&pool)
            .await
            .map_err(|e| ApiResponse::db_error("Failed to fetch notification", e))?
            .ok_or_else(|| ApiResponse::not_found("Notification not found"))?;

    if !dismissible {
        return Err(ApiResponse::error(
            StatusCode::FORBIDDEN,
            "Notification is not dismissible",
            None,
        ));
    }

    sqlx::query(
        r#"
        INSERT INTO notification_dismissals (notification_id, employee)
        VALUES ($1, $2)
        ON CONFLICT (notification_id, employee) DO NOTHING
        "#,
    )
    .bind(notification_id)
    .bind(&claims.username)
    .execute(&pool)
    .await
    .map_err(|e| ApiResponse::db_error("Failed to dismiss notification", e))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Notification dismissed",
        (),
    ))
}

/// Dismisses everything dismissible currently addressed to the caller
#[utoipa::path(
    post,
    path = "/notifications/dismiss-all",
    responses(
        (status = 200, description = "Notifications dismissed", body = u64),
        (status = 500, description = "Failed to dismiss notifications")
    ),
    tag = "Notifications",
    security(("bearerAuth" = []))
)]
pub async fn dismiss_all_notifications(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<ApiResponse<u64>, ApiResponse<()>> {
    let sql = format!(
        r#"
        INSERT INTO notification_dismissals (notification_id, employee)
        SELECT n.id, $1 FROM notifications n
        WHERE n.dismissible = TRUE
          AND (n.expires_at IS NULL OR n.expires_at > NOW())
          AND {TARGETED_AT}
        ON CONFLICT (notification_id, employee) DO NOTHING
        "#
    );

    let result = sqlx::query(&sql)
        .bind(&claims.username)
        .execute(&pool)
        .await
        .map_err(|e| ApiResponse::db_error("Failed to dismiss notifications", e))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Notifications dismissed",
        result.rows_affected(),
    ))
}

/// Publishes an announcement (admins only)
#[utoipa::path(
    post,
    path = "/notifications",
    request_body = NewAnnouncement,
    responses(
        (status = 201, description = "Announcement published", body = i32),
        (status = 400, description = "No targets provided"),
        (status = 403, description = "Admins only"),
        (status = 500, description = "Failed to publish announcement")
    ),
    tag = "Notifications",
    security(("bearerAuth" = []))
)]
pub async fn create_announcement(
    State(pool): State<PgPool>,
    Extension(registry): Extension<SharedRegistry>,
    Extension(claims): Extension<Claims>,
    Json(announcement): Json<NewAnnouncement>,
) -> Result<ApiResponse<i32>, ApiResponse<()>> {
    if claims.role != "admin" {
        return Err(ApiResponse::error(
            StatusCode::FORBIDDEN,
            "Only admins can publish announcements",
            None,
        ));
    }

    let mut builder = NotificationBuilder::new(
        announcement.title,
        notification_types::SYSTEM_ANNOUNCEMENT,
    )
    .expires_in_days(announcement.expires_in_days);
    if let Some(body) = announcement.body {
        builder = builder.body(body);
    }
    if let (Some(action_type), Some(action_data)) =
        (announcement.action_type, announcement.action_data)
    {
        builder = builder.action(action_type, action_data);
    }
    for target in announcement.targets {
        builder = match (target.scope, target.employee, target.project_id) {
            (NotificationScope::Employee, Some(employee), _) => builder.target_employee(employee),
            (NotificationScope::Project, _, Some(project_id)) => builder.target_project(project_id),
            _ => builder,
        };
    }

    let notification_id = builder.send(&pool, &registry).await.map_err(|e| {
        ApiResponse::error(
            StatusCode::BAD_REQUEST,
            "Failed to publish announcement",
            Some(serde_json::json!({ "error": e.to_string() })),
        )
    })?;

    Ok(ApiResponse::success(
        StatusCode::CREATED,
        "Announcement published",
        notification_id,
    ))
}

/// Deletes a notification outright (admins only)
#[utoipa::path(
    delete,
    path = "/notifications/{notification_id}",
    params(("notification_id" = i32, Path, description = "Notification to delete")),
    responses(
        (status = 200, description = "Notification deleted"),
        (status = 403, description = "Admins only"),
        (status = 404, description = "Notification not found"),
        (status = 500, description = "Failed to delete notification")
    ),
    tag = "Notifications",
    security(("bearerAuth" = []))
)]
pub async fn delete_notification(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(notification_id): Path<i32>,
) -> Result<ApiResponse<()>, ApiResponse<()>> {
    if claims.role != "admin" {
        return Err(ApiResponse::error(
            StatusCode::FORBIDDEN,
            "Only admins can delete notifications",
            None,
        ));
    }

    let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
        .bind(notification_id)
        .execute(&pool)
        .await
        .map_err(|e| ApiResponse::db_error("Failed to delete notification", e))?;

    if result.rows_affected() == 0 {
        return Err(ApiResponse::not_found("Notification not found"));
    }

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Notification deleted",
        (),
    ))
}

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        get_notifications,
        get_notification_count,
        dismiss_notification,
        dismiss_all_notifications,
        create_announcement,
        delete_notification
    ),
    components(schemas(
        Notification,
        NotificationItem,
        NotificationCountResponse,
        NewAnnouncement
    )),
    tags((name = "Notifications", description = "Notification API Endpoints"))
)]
pub struct NotificationDoc;

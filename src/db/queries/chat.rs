use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::json;
use sqlx::PgPool;

use crate::api::auth::Claims;
use crate::db::models::chat::{MessageFilter, NewTaskMessage, TaskMessage};
use crate::utils::api_response::ApiResponse;
use crate::utils::registry::{OutboundEvent, SharedRegistry};

/// Room key a task's chat broadcasts on.
pub fn task_room(task_id: i32) -> String {
    format!("task:{task_id}")
}

/// Retrieves a task's chat history, newest first
#[utoipa::path(
    get,
    path = "/tasks/{task_id}/messages",
    params(
        ("task_id" = i32, Path, description = "Task the messages belong to"),
        MessageFilter
    ),
    responses(
        (status = 200, description = "Messages retrieved successfully", body = Vec<TaskMessage>),
        (status = 404, description = "Task not found"),
        (status = 500, description = "Failed to retrieve messages")
    ),
    tag = "Chat",
    security(("bearerAuth" = []))
)]
pub async fn get_task_messages(
    State(pool): State<PgPool>,
    Path(task_id): Path<i32>,
    Query(filter): Query<MessageFilter>,
) -> Result<ApiResponse<Vec<TaskMessage>>, ApiResponse<()>> {
    ensure_task_exists(&pool, task_id).await?;

    let limit = filter.limit.unwrap_or(50).min(200) as i64;
    let messages = sqlx::query_as::<_, TaskMessage>(
        r#"
        SELECT id, task_id, sender, body, created_at
        FROM task_messages
        WHERE task_id = $1 AND ($2::int4 IS NULL OR id < $2)
        ORDER BY id DESC
        LIMIT $3
        "#,
    )
    .bind(task_id)
    .bind(filter.before_id)
    .bind(limit)
    .fetch_all(&pool)
    .await
    .map_err(|e| ApiResponse::db_error("Failed to retrieve messages", e))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Messages retrieved successfully",
        messages,
    ))
}

/// Posts a message into a task's chat and broadcasts it to the task room
#[utoipa::path(
    post,
    path = "/tasks/{task_id}/messages",
    params(("task_id" = i32, Path, description = "Task the message belongs to")),
    request_body = NewTaskMessage,
    responses(
        (status = 201, description = "Message posted", body = TaskMessage),
        (status = 400, description = "Empty message body"),
        (status = 404, description = "Task not found"),
        (status = 500, description = "Failed to post message")
    ),
    tag = "Chat",
    security(("bearerAuth" = []))
)]
pub async fn post_task_message(
    State(pool): State<PgPool>,
    Extension(registry): Extension<SharedRegistry>,
    Extension(claims): Extension<Claims>,
    Path(task_id): Path<i32>,
    Json(message): Json<NewTaskMessage>,
) -> Result<ApiResponse<TaskMessage>, ApiResponse<()>> {
    let body = message.body.trim();
    if body.is_empty() {
        return Err(ApiResponse::error(
            StatusCode::BAD_REQUEST,
            "Message body must not be empty",
            None,
        ));
    }

    ensure_task_exists(&pool, task_id).await?;

    let message = sqlx::query_as::<_, TaskMessage>(
        r#"
        INSERT INTO task_messages (task_id, sender, body)
        VALUES ($1, $2, $3)
        RETURNING id, task_id, sender, body, created_at
        "#,
    )
    .bind(task_id)
    .bind(&claims.username)
    .bind(body)
    .fetch_one(&pool)
    .await
    .map_err(|e| ApiResponse::db_error("Failed to post message", e))?;

    registry
        .emit_to_room(
            &task_room(task_id),
            OutboundEvent::new(
                "chat_message",
                json!({
                    "id": message.id,
                    "task_id": message.task_id,
                    "sender": message.sender,
                    "body": message.body,
                    "created_at": message.created_at,
                }),
            ),
        )
        .await;

    Ok(ApiResponse::success(
        StatusCode::CREATED,
        "Message posted",
        message,
    ))
}

async fn ensure_task_exists(pool: &PgPool, task_id: i32) -> Result<(), ApiResponse<()>> {
    let exists: Option<i32> = sqlx::query_scalar("SELECT id FROM tasks WHERE id = $1")
        .bind(task_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| ApiResponse::db_error("Failed to fetch task", e))?;
    match exists {
        Some(_) => Ok(()),
        None => Err(ApiResponse::not_found("Task not found")),
    }
}

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(get_task_messages, post_task_message),
    components(schemas(TaskMessage, NewTaskMessage)),
    tags((name = "Chat", description = "In-task chat endpoints"))
)]
pub struct ChatDoc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use sqlx::PgPool;

use crate::db::models::user::UserProfile;
use crate::utils::api_response::ApiResponse;

/// Retrieves the employee directory (unlocked accounts only)
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "Users retrieved successfully", body = Vec<UserProfile>),
        (status = 500, description = "Failed to retrieve users")
    ),
    tag = "Users",
    security(("bearerAuth" = []))
)]
pub async fn get_all_users(
    State(pool): State<PgPool>,
) -> Result<ApiResponse<Vec<UserProfile>>, ApiResponse<()>> {
    let users = sqlx::query_as::<_, UserProfile>(
        "SELECT id, username, full_name, role FROM users WHERE account_locked = false ORDER BY username",
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| ApiResponse::db_error("Failed to retrieve users", e))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Users retrieved successfully",
        users,
    ))
}

/// Retrieves one user by id
#[utoipa::path(
    get,
    path = "/users/{user_id}",
    params(("user_id" = i32, Path, description = "id of the user")),
    responses(
        (status = 200, description = "User retrieved successfully", body = UserProfile),
        (status = 404, description = "User not found"),
        (status = 500, description = "Failed to fetch user")
    ),
    tag = "Users",
    security(("bearerAuth" = []))
)]
pub async fn get_user(
    State(pool): State<PgPool>,
    Path(id): Path<i32>,
) -> Result<ApiResponse<UserProfile>, ApiResponse<()>> {
    let user = sqlx::query_as::<_, UserProfile>(
        "SELECT id, username, full_name, role FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| ApiResponse::db_error("Failed to fetch user", e))?
    .ok_or_else(|| ApiResponse::not_found("User not found"))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "User retrieved successfully",
        user,
    ))
}

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(get_all_users, get_user),
    components(schemas(UserProfile)),
    tags((name = "Users", description = "Employee directory endpoints"))
)]
pub struct UserDoc;

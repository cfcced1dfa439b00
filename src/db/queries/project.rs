use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sqlx::{PgPool, QueryBuilder};

use crate::db::models::project::{
    NewProject, Project, ProjectDetail, ProjectSummary, UpdateProject,
};
use crate::db::models::task::{Activity, Task, TaskWithActivities};
use crate::utils::api_response::ApiResponse;

/// Macro for partial updates in an UPDATE statement:
macro_rules! push_if_some {
    ($separated:ident, $update:ident, $field:ident) => {
        if let Some(value) = &$update.$field {
            $separated
                .push(concat!(stringify!($field), " = "))
                .push_bind_unseparated(value);
        }
    };
}

pub(crate) use push_if_some;

/// Creates a new project. The percentage always starts at 0 and is only ever
/// recomputed from task roll-ups.
#[utoipa::path(
    post,
    path = "/projects",
    request_body = NewProject,
    responses(
        (status = 201, description = "Successfully created project", body = Project),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Projects",
    security(("bearerAuth" = []))
)]
pub async fn create_project(
    State(pool): State<PgPool>,
    Json(new_project): Json<NewProject>,
) -> Result<ApiResponse<Project>, ApiResponse<()>> {
    if new_project.name.trim().is_empty() {
        return Err(ApiResponse::error(
            StatusCode::BAD_REQUEST,
            "Project name is required",
            None,
        ));
    }

    let project = sqlx::query_as::<_, Project>(
        r#"
        INSERT INTO projects (name, project_type, description)
        VALUES ($1, $2, $3)
        RETURNING id, name, project_type, description, percentage, created_at, updated_at
        "#,
    )
    .bind(new_project.name.trim())
    .bind(&new_project.project_type)
    .bind(&new_project.description)
    .fetch_one(&pool)
    .await
    .map_err(|e| ApiResponse::db_error("Failed to create project", e))?;

    Ok(ApiResponse::success(
        StatusCode::CREATED,
        "Project created successfully",
        project,
    ))
}

/// Retrieves all projects with their task counts
#[utoipa::path(
    get,
    path = "/projects",
    responses(
        (status = 200, description = "Successfully retrieved projects", body = Vec<ProjectSummary>),
        (status = 500, description = "Failed to retrieve projects")
    ),
    tag = "Projects",
    security(("bearerAuth" = []))
)]
pub async fn get_all_projects(
    State(pool): State<PgPool>,
) -> Result<ApiResponse<Vec<ProjectSummary>>, ApiResponse<()>> {
    let projects = sqlx::query_as::<_, ProjectSummary>(
        r#"
        SELECT p.id, p.name, p.project_type, p.percentage, COUNT(t.id) AS task_count
        FROM projects p
        LEFT JOIN tasks t ON t.project_id = p.id
        GROUP BY p.id, p.name, p.project_type, p.percentage
        ORDER BY p.id
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| ApiResponse::db_error("Failed to retrieve projects", e))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Projects retrieved successfully",
        projects,
    ))
}

/// Retrieves one project with its tasks and activities
#[utoipa::path(
    get,
    path = "/projects/{project_id}",
    params(("project_id" = i32, Path, description = "id of the project")),
    responses(
        (status = 200, description = "Project retrieved successfully", body = ProjectDetail),
        (status = 404, description = "Project not found"),
        (status = 500, description = "Failed to fetch project")
    ),
    tag = "Projects",
    security(("bearerAuth" = []))
)]
pub async fn get_project(
    State(pool): State<PgPool>,
    Path(id): Path<i32>,
) -> Result<ApiResponse<ProjectDetail>, ApiResponse<()>> {
    let project = sqlx::query_as::<_, Project>(
        "SELECT id, name, project_type, description, percentage, created_at, updated_at FROM projects WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| ApiResponse::db_error("Failed to fetch project", e))?
    .ok_or_else(|| ApiResponse::not_found("Project not found"))?;

    let tasks = load_project_tasks(&pool, id)
        .await
        .map_err(|e| ApiResponse::db_error("Failed to fetch project tasks", e))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Project retrieved successfully",
        ProjectDetail { project, tasks },
    ))
}

/// Loads a project's tasks with their activities grouped underneath.
pub(crate) async fn load_project_tasks(
    pool: &PgPool,
    project_id: i32,
) -> Result<Vec<TaskWithActivities>, sqlx::Error> {
    let tasks = sqlx::query_as::<_, Task>(
        r#"
        SELECT id, project_id, name, employee, start_date, end_date, start_time, end_time,
               percentage, created_at, updated_at
        FROM tasks WHERE project_id = $1 ORDER BY id
        "#,
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    let task_ids: Vec<i32> = tasks.iter().map(|t| t.id).collect();
    let mut activities = sqlx::query_as::<_, Activity>(
        r#"
        SELECT id, task_id, name, employee, start_date, end_date, start_time, end_time,
               percentage, created_at
        FROM activities WHERE task_id = ANY($1) ORDER BY id
        "#,
    )
    .bind(&task_ids)
    .fetch_all(pool)
    .await?;

    Ok(tasks
        .into_iter()
        .map(|task| {
            let (mine, rest): (Vec<Activity>, Vec<Activity>) =
                activities.drain(..).partition(|a| a.task_id == task.id);
            activities = rest;
            TaskWithActivities {
                task,
                activities: mine,
            }
        })
        .collect())
}

/// Updates an existing project
#[utoipa::path(
    patch,
    path = "/projects/{project_id}",
    params(("project_id" = i32, Path, description = "ID of the project to be updated")),
    request_body = UpdateProject,
    responses(
        (status = 200, description = "Project updated successfully"),
        (status = 400, description = "No fields provided for update"),
        (status = 404, description = "Project not found"),
        (status = 500, description = "Failed to update project"),
    ),
    tag = "Projects",
    security(("bearerAuth" = []))
)]
pub async fn update_project(
    State(pool): State<PgPool>,
    Path(id): Path<i32>,
    Json(update): Json<UpdateProject>,
) -> Result<ApiResponse<()>, ApiResponse<()>> {
    if update.is_empty() {
        return Err(ApiResponse::error(
            StatusCode::BAD_REQUEST,
            "No fields provided for update",
            None,
        ));
    }

    let mut query_builder = QueryBuilder::new("UPDATE projects SET ");
    let mut separated = query_builder.separated(", ");

    push_if_some!(separated, update, name);
    push_if_some!(separated, update, project_type);
    push_if_some!(separated, update, description);

    separated.push("updated_at = NOW()");
    query_builder.push(" WHERE id = ").push_bind(id);

    let result = query_builder
        .build()
        .execute(&pool)
        .await
        .map_err(|e| ApiResponse::db_error("Failed to update project", e))?;

    if result.rows_affected() == 0 {
        return Err(ApiResponse::not_found("Project not found"));
    }

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Project updated successfully",
        (),
    ))
}

/// Deletes a project and everything under it
#[utoipa::path(
    delete,
    path = "/projects/{project_id}",
    params(("project_id" = i32, Path, description = "ID of the project to be deleted")),
    responses(
        (status = 200, description = "Project deleted successfully"),
        (status = 404, description = "Project not found"),
        (status = 500, description = "Failed to delete project")
    ),
    tag = "Projects",
    security(("bearerAuth" = []))
)]
pub async fn delete_project(
    State(pool): State<PgPool>,
    Path(id): Path<i32>,
) -> Result<ApiResponse<()>, ApiResponse<()>> {
    let result = sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| ApiResponse::db_error("Failed to delete project", e))?;

    if result.rows_affected() == 0 {
        return Err(ApiResponse::not_found("Project not found"));
    }

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Project deleted successfully",
        (),
    ))
}

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        create_project,
        get_all_projects,
        get_project,
        update_project,
        delete_project
    ),
    components(schemas(Project, ProjectSummary, ProjectDetail, NewProject, UpdateProject)),
    tags((name = "Projects", description = "Project API Endpoints"))
)]
pub struct ProjectDoc;

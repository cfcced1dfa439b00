use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use sqlx::{PgPool, QueryBuilder};
use tracing::warn;

use crate::db::models::task::{
    Activity, CreatedTasksResponse, NewTask, NewTaskBatch, Task, TaskWithActivities, UpdateTask,
};
use crate::db::queries::project::{load_project_tasks, push_if_some};
use crate::db::queries::report::{recompute_project, recompute_task};
use crate::scheduling::conflict::{find_internal_conflicts, ActivityDraft, Assignee};
use crate::scheduling::interval::resolve_window;
use crate::utils::api_response::ApiResponse;
use crate::utils::notification::notify_assignment;
use crate::utils::registry::SharedRegistry;

/// Trimmed, non-empty employee id of a task payload, if any.
fn direct_employee(task: &NewTask) -> Option<&str> {
    task.employee
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
}

/// Classifies how a submitted task is staffed. `None` means an unassigned
/// draft; carrying both a direct employee and activities is rejected.
pub(crate) fn classify_assignment(task: &NewTask) -> Result<Option<Assignee>, String> {
    match (direct_employee(task), task.activities.is_empty()) {
        (Some(_), false) => Err(
            "cannot carry both a direct employee assignment and activities".to_string(),
        ),
        (Some(employee), true) => Ok(Some(Assignee::Direct(employee.to_string()))),
        (None, false) => Ok(Some(Assignee::PerActivity)),
        (None, true) => Ok(None),
    }
}

/// Validates a whole creation batch and returns every human-readable failure.
/// An empty result means the batch can be persisted as-is.
pub(crate) fn validate_tasks(tasks: &[NewTask]) -> Vec<String> {
    let mut errors = Vec::new();

    if tasks.is_empty() {
        errors.push("At least one task is required".to_string());
        return errors;
    }

    for (index, task) in tasks.iter().enumerate() {
        let label = match task.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => format!("Task {} ('{}')", index + 1, name),
            _ => {
                errors.push(format!("Task {}: name is required", index + 1));
                format!("Task {}", index + 1)
            }
        };

        let window = match (task.start_date, task.end_date) {
            (Some(start_date), Some(end_date)) => {
                Some(resolve_window(start_date, end_date, task.start_time, task.end_time))
            }
            _ => {
                errors.push(format!("{label}: start and end dates are required"));
                None
            }
        };
        if let Some((start, end)) = window {
            if end <= start {
                errors.push(format!("{label}: end must be after start"));
            }
        }

        let assignee = match classify_assignment(task) {
            Ok(assignee) => assignee,
            Err(reason) => {
                errors.push(format!("{label}: {reason}"));
                continue;
            }
        };

        if assignee == Some(Assignee::PerActivity) {
            for (activity_index, activity) in task.activities.iter().enumerate() {
                let activity_label = activity.display_name(activity_index);
                if activity
                    .employee
                    .as_deref()
                    .map(str::trim)
                    .filter(|e| !e.is_empty())
                    .is_none()
                {
                    errors.push(format!("{label}: '{activity_label}' needs an employee"));
                }
                match (activity.start_date, activity.end_date) {
                    (Some(start_date), Some(end_date)) => {
                        let (start, end) = resolve_window(
                            start_date,
                            end_date,
                            activity.start_time,
                            activity.end_time,
                        );
                        if end <= start {
                            errors
                                .push(format!("{label}: '{activity_label}' end must be after start"));
                        }
                    }
                    _ => errors.push(format!(
                        "{label}: '{activity_label}' needs start and end dates"
                    )),
                }
            }

            for conflict in find_internal_conflicts(&task.activities) {
                errors.push(format!(
                    "{label}: '{}' overlaps '{}' for employee {}",
                    conflict.first_name, conflict.second_name, conflict.employee
                ));
            }
        }
    }

    errors
}

/// Creates a batch of tasks (each optionally carrying activities) under a
/// project. The whole batch is validated up front and persisted atomically;
/// any rule violation rejects everything.
#[utoipa::path(
    post,
    path = "/projects/{project_id}/tasks",
    params(("project_id" = i32, Path, description = "Project the tasks belong to")),
    request_body = NewTaskBatch,
    responses(
        (status = 201, description = "Tasks created successfully", body = CreatedTasksResponse),
        (status = 400, description = "Validation failed; no task was created"),
        (status = 404, description = "Project not found"),
        (status = 500, description = "Failed to create tasks")
    ),
    tag = "Tasks",
    security(("bearerAuth" = []))
)]
pub async fn create_tasks(
    State(pool): State<PgPool>,
    Extension(registry): Extension<SharedRegistry>,
    Path(project_id): Path<i32>,
    Json(batch): Json<NewTaskBatch>,
) -> Result<ApiResponse<CreatedTasksResponse>, ApiResponse<()>> {
    let project_name: String = sqlx::query_scalar("SELECT name FROM projects WHERE id = $1")
        .bind(project_id)
        .fetch_optional(&pool)
        .await
        .map_err(|e| ApiResponse::db_error("Failed to fetch project", e))?
        .ok_or_else(|| ApiResponse::not_found("Project not found"))?;

    let errors = validate_tasks(&batch.tasks);
    if !errors.is_empty() {
        return Err(ApiResponse::validation_failed(errors));
    }

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| ApiResponse::db_error("Failed to open transaction", e))?;

    let mut task_ids = Vec::with_capacity(batch.tasks.len());
    let mut assignments: Vec<(String, i32, String)> = Vec::new();

    for task in &batch.tasks {
        let (Some(name), Some(start_date), Some(end_date)) =
            (task.name.as_deref(), task.start_date, task.end_date)
        else {
            return Err(ApiResponse::error(
                StatusCode::BAD_REQUEST,
                "Task payload missing required fields",
                None,
            ));
        };
        let name = name.trim();
        let employee = direct_employee(task);

        let task_id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO tasks (project_id, name, employee, start_date, end_date, start_time, end_time)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(project_id)
        .bind(name)
        .bind(employee)
        .bind(start_date)
        .bind(end_date)
        .bind(task.start_time)
        .bind(task.end_time)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| ApiResponse::db_error("Failed to create task", e))?;

        if let Some(employee) = employee {
            assignments.push((employee.to_string(), task_id, name.to_string()));
        }

        for (activity_index, activity) in task.activities.iter().enumerate() {
            let (Some(employee), Some(start_date), Some(end_date)) =
                (activity.employee.as_deref(), activity.start_date, activity.end_date)
            else {
                return Err(ApiResponse::error(
                    StatusCode::BAD_REQUEST,
                    "Activity payload missing required fields",
                    None,
                ));
            };

            sqlx::query(
                r#"
                INSERT INTO activities (task_id, name, employee, start_date, end_date, start_time, end_time)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(task_id)
            .bind(activity.display_name(activity_index))
            .bind(employee.trim())
            .bind(start_date)
            .bind(end_date)
            .bind(activity.start_time)
            .bind(activity.end_time)
            .execute(&mut *tx)
            .await
            .map_err(|e| ApiResponse::db_error("Failed to create activity", e))?;

            assignments.push((employee.trim().to_string(), task_id, name.to_string()));
        }

        task_ids.push(task_id);
    }

    recompute_project(&mut *tx, project_id)
        .await
        .map_err(|e| ApiResponse::db_error("Failed to recompute project percentage", e))?;

    tx.commit()
        .await
        .map_err(|e| ApiResponse::db_error("Failed to commit tasks", e))?;

    assignments.sort();
    assignments.dedup();
    for (employee, task_id, task_name) in assignments {
        if let Err(e) =
            notify_assignment(&pool, &registry, &employee, task_id, &task_name, &project_name)
                .await
        {
            warn!("Failed to notify {employee} about task {task_id}: {e}");
        }
    }

    Ok(ApiResponse::success(
        StatusCode::CREATED,
        "Tasks created successfully",
        CreatedTasksResponse { task_ids },
    ))
}

/// Retrieves a project's tasks with their activities
#[utoipa::path(
    get,
    path = "/projects/{project_id}/tasks",
    params(("project_id" = i32, Path, description = "Project the tasks belong to")),
    responses(
        (status = 200, description = "Tasks retrieved successfully", body = Vec<TaskWithActivities>),
        (status = 404, description = "Project not found"),
        (status = 500, description = "Failed to retrieve tasks")
    ),
    tag = "Tasks",
    security(("bearerAuth" = []))
)]
pub async fn get_project_tasks(
    State(pool): State<PgPool>,
    Path(project_id): Path<i32>,
) -> Result<ApiResponse<Vec<TaskWithActivities>>, ApiResponse<()>> {
    let exists: Option<i32> = sqlx::query_scalar("SELECT id FROM projects WHERE id = $1")
        .bind(project_id)
        .fetch_optional(&pool)
        .await
        .map_err(|e| ApiResponse::db_error("Failed to fetch project", e))?;
    if exists.is_none() {
        return Err(ApiResponse::not_found("Project not found"));
    }

    let tasks = load_project_tasks(&pool, project_id)
        .await
        .map_err(|e| ApiResponse::db_error("Failed to retrieve tasks", e))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Tasks retrieved successfully",
        tasks,
    ))
}

/// Retrieves a single task with its activities
#[utoipa::path(
    get,
    path = "/tasks/{task_id}",
    params(("task_id" = i32, Path, description = "id of the task")),
    responses(
        (status = 200, description = "Task retrieved successfully", body = TaskWithActivities),
        (status = 404, description = "Task not found"),
        (status = 500, description = "Failed to fetch task")
    ),
    tag = "Tasks",
    security(("bearerAuth" = []))
)]
pub async fn get_task(
    State(pool): State<PgPool>,
    Path(task_id): Path<i32>,
) -> Result<ApiResponse<TaskWithActivities>, ApiResponse<()>> {
    let task = fetch_task(&pool, task_id).await?;
    let activities = fetch_activities(&pool, task_id)
        .await
        .map_err(|e| ApiResponse::db_error("Failed to fetch activities", e))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Task retrieved successfully",
        TaskWithActivities { task, activities },
    ))
}

async fn fetch_task(pool: &PgPool, task_id: i32) -> Result<Task, ApiResponse<()>> {
    sqlx::query_as::<_, Task>(
        r#"
        SELECT id, project_id, name, employee, start_date, end_date, start_time, end_time,
               percentage, created_at, updated_at
        FROM tasks WHERE id = $1
        "#,
    )
    .bind(task_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| ApiResponse::db_error("Failed to fetch task", e))?
    .ok_or_else(|| ApiResponse::not_found("Task not found"))
}

async fn fetch_activities(pool: &PgPool, task_id: i32) -> Result<Vec<Activity>, sqlx::Error> {
    sqlx::query_as::<_, Activity>(
        r#"
        SELECT id, task_id, name, employee, start_date, end_date, start_time, end_time,
               percentage, created_at
        FROM activities WHERE task_id = $1 ORDER BY id
        "#,
    )
    .bind(task_id)
    .fetch_all(pool)
    .await
}

/// Updates a task's own fields. Assigning an employee is rejected while the
/// task still has activities; window edits are checked for ordering against
/// the resulting dates.
#[utoipa::path(
    patch,
    path = "/tasks/{task_id}",
    params(("task_id" = i32, Path, description = "ID of the task to be updated")),
    request_body = UpdateTask,
    responses(
        (status = 200, description = "Task updated successfully", body = Task),
        (status = 400, description = "No fields provided, or the update breaks a rule"),
        (status = 404, description = "Task not found"),
        (status = 500, description = "Failed to update task"),
    ),
    tag = "Tasks",
    security(("bearerAuth" = []))
)]
pub async fn update_task(
    State(pool): State<PgPool>,
    Extension(registry): Extension<SharedRegistry>,
    Path(task_id): Path<i32>,
    Json(update): Json<UpdateTask>,
) -> Result<ApiResponse<Task>, ApiResponse<()>> {
    if update.is_empty() {
        return Err(ApiResponse::error(
            StatusCode::BAD_REQUEST,
            "No fields provided for update",
            None,
        ));
    }

    let current = fetch_task(&pool, task_id).await?;

    let new_employee = update.employee.as_deref().map(str::trim).filter(|e| !e.is_empty());
    if new_employee.is_some() {
        let activity_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM activities WHERE task_id = $1")
                .bind(task_id)
                .fetch_one(&pool)
                .await
                .map_err(|e| ApiResponse::db_error("Failed to count activities", e))?;
        if activity_count > 0 {
            return Err(ApiResponse::error(
                StatusCode::BAD_REQUEST,
                "Task already has activities; it cannot also carry a direct assignment",
                None,
            ));
        }
    }

    let (start, end) = resolve_window(
        update.start_date.unwrap_or(current.start_date),
        update.end_date.unwrap_or(current.end_date),
        update.start_time.or(current.start_time),
        update.end_time.or(current.end_time),
    );
    if end <= start {
        return Err(ApiResponse::error(
            StatusCode::BAD_REQUEST,
            "End must be after start",
            None,
        ));
    }

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| ApiResponse::db_error("Failed to open transaction", e))?;

    let mut query_builder = QueryBuilder::new("UPDATE tasks SET ");
    let mut separated = query_builder.separated(", ");

    push_if_some!(separated, update, name);
    push_if_some!(separated, update, employee);
    push_if_some!(separated, update, start_date);
    push_if_some!(separated, update, end_date);
    push_if_some!(separated, update, start_time);
    push_if_some!(separated, update, end_time);

    separated.push("updated_at = NOW()");
    query_builder.push(" WHERE id = ").push_bind(task_id);

    query_builder
        .build()
        .execute(&mut *tx)
        .await
        .map_err(|e| ApiResponse::db_error("Failed to update task", e))?;

    // Structural edits re-run the roll-up so derived values never go stale.
    let task = recompute_task(&mut *tx, task_id)
        .await
        .map_err(|e| ApiResponse::db_error("Failed to recompute task percentage", e))?;
    recompute_project(&mut *tx, task.project_id)
        .await
        .map_err(|e| ApiResponse::db_error("Failed to recompute project percentage", e))?;

    tx.commit()
        .await
        .map_err(|e| ApiResponse::db_error("Failed to commit task update", e))?;

    if let Some(employee) = new_employee {
        if current.employee.as_deref() != Some(employee) {
            let project_name: String =
                sqlx::query_scalar("SELECT name FROM projects WHERE id = $1")
                    .bind(task.project_id)
                    .fetch_one(&pool)
                    .await
                    .unwrap_or_else(|_| format!("Project {}", task.project_id));
            if let Err(e) = notify_assignment(
                &pool,
                &registry,
                employee,
                task.id,
                &task.name,
                &project_name,
            )
            .await
            {
                warn!("Failed to notify {employee} about task {task_id}: {e}");
            }
        }
    }

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Task updated successfully",
        task,
    ))
}

/// Deletes a task. Tasks with reported progress stay on the books.
#[utoipa::path(
    delete,
    path = "/tasks/{task_id}",
    params(("task_id" = i32, Path, description = "ID of the task to be deleted")),
    responses(
        (status = 200, description = "Task deleted successfully"),
        (status = 404, description = "Task not found"),
        (status = 409, description = "Task has reported progress and cannot be deleted"),
        (status = 500, description = "Failed to delete task")
    ),
    tag = "Tasks",
    security(("bearerAuth" = []))
)]
pub async fn delete_task(
    State(pool): State<PgPool>,
    Path(task_id): Path<i32>,
) -> Result<ApiResponse<()>, ApiResponse<()>> {
    let task = fetch_task(&pool, task_id).await?;
    if task.percentage > 0 {
        return Err(ApiResponse::error(
            StatusCode::CONFLICT,
            "Task has reported progress and cannot be deleted",
            None,
        ));
    }

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| ApiResponse::db_error("Failed to open transaction", e))?;

    sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(task_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| ApiResponse::db_error("Failed to delete task", e))?;

    recompute_project(&mut *tx, task.project_id)
        .await
        .map_err(|e| ApiResponse::db_error("Failed to recompute project percentage", e))?;

    tx.commit()
        .await
        .map_err(|e| ApiResponse::db_error("Failed to commit task deletion", e))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Task deleted successfully",
        (),
    ))
}

/// Adds an activity to an existing task, re-checking the task's activity set
/// for internal conflicts first
#[utoipa::path(
    post,
    path = "/tasks/{task_id}/activities",
    params(("task_id" = i32, Path, description = "Task the activity belongs to")),
    request_body = ActivityDraft,
    responses(
        (status = 201, description = "Activity added successfully", body = Activity),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Task not found"),
        (status = 500, description = "Failed to add activity")
    ),
    tag = "Tasks",
    security(("bearerAuth" = []))
)]
pub async fn add_activity(
    State(pool): State<PgPool>,
    Extension(registry): Extension<SharedRegistry>,
    Path(task_id): Path<i32>,
    Json(draft): Json<ActivityDraft>,
) -> Result<ApiResponse<Activity>, ApiResponse<()>> {
    let task = fetch_task(&pool, task_id).await?;
    if task.employee.as_deref().map(str::trim).filter(|e| !e.is_empty()).is_some() {
        return Err(ApiResponse::error(
            StatusCode::BAD_REQUEST,
            "Task carries a direct assignment; it cannot also have activities",
            None,
        ));
    }

    let existing = fetch_activities(&pool, task_id)
        .await
        .map_err(|e| ApiResponse::db_error("Failed to fetch activities", e))?;

    let mut errors = Vec::new();
    let (Some(employee), Some(start_date), Some(end_date)) = (
        draft.employee.as_deref().map(str::trim).filter(|e| !e.is_empty()),
        draft.start_date,
        draft.end_date,
    ) else {
        return Err(ApiResponse::validation_failed(vec![
            "Activity needs an employee and start and end dates".to_string(),
        ]));
    };
    let (start, end) = resolve_window(start_date, end_date, draft.start_time, draft.end_time);
    if end <= start {
        errors.push("Activity end must be after start".to_string());
    }

    let mut drafts: Vec<ActivityDraft> = existing.iter().map(to_draft).collect();
    drafts.push(draft.clone());
    let new_index = drafts.len() - 1;
    for conflict in find_internal_conflicts(&drafts) {
        if conflict.first_index == new_index || conflict.second_index == new_index {
            errors.push(format!(
                "'{}' overlaps '{}' for employee {}",
                conflict.first_name, conflict.second_name, conflict.employee
            ));
        }
    }
    if !errors.is_empty() {
        return Err(ApiResponse::validation_failed(errors));
    }

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| ApiResponse::db_error("Failed to open transaction", e))?;

    let activity = sqlx::query_as::<_, Activity>(
        r#"
        INSERT INTO activities (task_id, name, employee, start_date, end_date, start_time, end_time)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, task_id, name, employee, start_date, end_date, start_time, end_time,
                  percentage, created_at
        "#,
    )
    .bind(task_id)
    .bind(draft.display_name(new_index))
    .bind(employee)
    .bind(start_date)
    .bind(end_date)
    .bind(draft.start_time)
    .bind(draft.end_time)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| ApiResponse::db_error("Failed to add activity", e))?;

    recompute_task(&mut *tx, task_id)
        .await
        .map_err(|e| ApiResponse::db_error("Failed to recompute task percentage", e))?;
    recompute_project(&mut *tx, task.project_id)
        .await
        .map_err(|e| ApiResponse::db_error("Failed to recompute project percentage", e))?;

    tx.commit()
        .await
        .map_err(|e| ApiResponse::db_error("Failed to commit activity", e))?;

    let project_name: String = sqlx::query_scalar("SELECT name FROM projects WHERE id = $1")
        .bind(task.project_id)
        .fetch_one(&pool)
        .await
        .unwrap_or_else(|_| format!("Project {}", task.project_id));
    if let Err(e) =
        notify_assignment(&pool, &registry, employee, task_id, &task.name, &project_name).await
    {
        warn!("Failed to notify {employee} about task {task_id}: {e}");
    }

    Ok(ApiResponse::success(
        StatusCode::CREATED,
        "Activity added successfully",
        activity,
    ))
}

fn to_draft(activity: &Activity) -> ActivityDraft {
    ActivityDraft {
        name: Some(activity.name.clone()),
        employee: Some(activity.employee.clone()),
        start_date: Some(activity.start_date),
        end_date: Some(activity.end_date),
        start_time: activity.start_time,
        end_time: activity.end_time,
    }
}

/// Removes an activity and re-runs the roll-up for its task and project
#[utoipa::path(
    delete,
    path = "/tasks/{task_id}/activities/{activity_id}",
    params(
        ("task_id" = i32, Path, description = "Task the activity belongs to"),
        ("activity_id" = i32, Path, description = "Activity to remove")
    ),
    responses(
        (status = 200, description = "Activity removed successfully"),
        (status = 404, description = "Task or activity not found"),
        (status = 409, description = "Activity has reported progress and cannot be deleted"),
        (status = 500, description = "Failed to remove activity")
    ),
    tag = "Tasks",
    security(("bearerAuth" = []))
)]
pub async fn delete_activity(
    State(pool): State<PgPool>,
    Path((task_id, activity_id)): Path<(i32, i32)>,
) -> Result<ApiResponse<()>, ApiResponse<()>> {
    let task = fetch_task(&pool, task_id).await?;

    let percentage: i32 = sqlx::query_scalar(
        "SELECT percentage FROM activities WHERE id = $1 AND task_id = $2",
    )
    .bind(activity_id)
    .bind(task_id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| ApiResponse::db_error("Failed to fetch activity", e))?
    .ok_or_else(|| ApiResponse::not_found("Activity not found"))?;

    if percentage > 0 {
        return Err(ApiResponse::error(
            StatusCode::CONFLICT,
            "Activity has reported progress and cannot be deleted",
            None,
        ));
    }

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| ApiResponse::db_error("Failed to open transaction", e))?;

    sqlx::query("DELETE FROM activities WHERE id = $1 AND task_id = $2")
        .bind(activity_id)
        .bind(task_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| ApiResponse::db_error("Failed to remove activity", e))?;

    recompute_task(&mut *tx, task_id)
        .await
        .map_err(|e| ApiResponse::db_error("Failed to recompute task percentage", e))?;
    recompute_project(&mut *tx, task.project_id)
        .await
        .map_err(|e| ApiResponse::db_error("Failed to recompute project percentage", e))?;

    tx.commit()
        .await
        .map_err(|e| ApiResponse::db_error("Failed to commit activity removal", e))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Activity removed successfully",
        (),
    ))
}

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        create_tasks,
        get_project_tasks,
        get_task,
        update_task,
        delete_task,
        add_activity,
        delete_activity
    ),
    components(schemas(
        Task,
        Activity,
        NewTask,
        NewTaskBatch,
        UpdateTask,
        TaskWithActivities,
        CreatedTasksResponse,
        ActivityDraft
    )),
    tags((name = "Tasks", description = "Task and activity API Endpoints"))
)]
pub struct TaskDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn direct_task(name: &str, employee: &str) -> NewTask {
        NewTask {
            name: Some(name.to_string()),
            employee: Some(employee.to_string()),
            start_date: Some(date("2024-01-01")),
            end_date: Some(date("2024-01-05")),
            ..NewTask::default()
        }
    }

    fn activity(employee: &str, start: &str, end: &str) -> ActivityDraft {
        ActivityDraft {
            employee: Some(employee.to_string()),
            start_date: Some(date(start)),
            end_date: Some(date(end)),
            ..ActivityDraft::default()
        }
    }

    #[test]
    fn valid_direct_task_passes() {
        assert!(validate_tasks(&[direct_task("Build API", "E1")]).is_empty());
    }

    #[test]
    fn missing_name_and_dates_are_reported() {
        let task = NewTask::default();
        let errors = validate_tasks(&[task]);
        assert!(errors.iter().any(|e| e.contains("name is required")));
        assert!(errors.iter().any(|e| e.contains("start and end dates")));
    }

    #[test]
    fn end_before_start_is_rejected() {
        let mut task = direct_task("Build API", "E1");
        task.start_date = Some(date("2024-01-05"));
        task.end_date = Some(date("2024-01-01"));
        let errors = validate_tasks(&[task]);
        assert!(errors.iter().any(|e| e.contains("end must be after start")));
    }

    #[test]
    fn direct_assignment_plus_activities_is_rejected() {
        let mut task = direct_task("Build API", "E1");
        task.activities = vec![activity("E2", "2024-01-01", "2024-01-02")];
        let errors = validate_tasks(&[task]);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("cannot carry both"));
    }

    #[test]
    fn unassigned_draft_task_is_accepted() {
        let mut task = direct_task("Planning", "E1");
        task.employee = None;
        assert!(validate_tasks(&[task]).is_empty());
        assert_eq!(
            classify_assignment(&NewTask {
                name: Some("Planning".into()),
                ..NewTask::default()
            }),
            Ok(None)
        );
    }

    #[test]
    fn overlapping_activities_reject_the_batch() {
        let mut task = direct_task("Build API", "E1");
        task.employee = None;
        task.activities = vec![
            activity("E1", "2024-01-01", "2024-01-03"),
            activity("E1", "2024-01-02", "2024-01-04"),
        ];
        let errors = validate_tasks(&[task]);
        assert!(errors
            .iter()
            .any(|e| e.contains("'Activity 1' overlaps 'Activity 2' for employee E1")));
    }

    #[test]
    fn whole_batch_collects_errors_from_every_task() {
        let bad = NewTask::default();
        let good = direct_task("Build API", "E1");
        let errors = validate_tasks(&[good, bad]);
        assert!(errors.iter().all(|e| e.starts_with("Task 2")));
        assert!(!errors.is_empty());
    }

    #[test]
    fn classification_is_a_tagged_choice() {
        assert_eq!(
            classify_assignment(&direct_task("T", "E1")),
            Ok(Some(Assignee::Direct("E1".to_string())))
        );
        let mut per_activity = direct_task("T", "E1");
        per_activity.employee = None;
        per_activity.activities = vec![activity("E2", "2024-01-01", "2024-01-02")];
        assert_eq!(
            classify_assignment(&per_activity),
            Ok(Some(Assignee::PerActivity))
        );
    }
}

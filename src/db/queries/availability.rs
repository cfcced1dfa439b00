use axum::{extract::State, http::StatusCode, Json};
use chrono::{NaiveDate, NaiveTime};
use sqlx::{FromRow, PgPool};

use crate::db::models::availability::{AvailabilityRequest, AvailabilityResponse};
use crate::scheduling::conflict::{scan_assignments, AssignmentRow, ScanOptions};
use crate::scheduling::interval::resolve_window;
use crate::utils::api_response::ApiResponse;

#[derive(FromRow)]
struct TaskRow {
    task_id: i32,
    task_name: String,
    project_name: String,
    employee: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
    percentage: i32,
}

#[derive(FromRow)]
struct ActivityRow {
    task_id: i32,
    task_name: String,
    project_name: String,
    activity_id: i32,
    activity_name: String,
    employee: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
    percentage: i32,
}

/// Checks whether an employee is free for a candidate window.
///
/// An inverted window is a validation failure, answered without searching.
/// Conflicts come back as data, not as an error: the caller decides whether
/// to block or just warn.
#[utoipa::path(
    post,
    path = "/availability/check",
    request_body = AvailabilityRequest,
    responses(
        (status = 200, description = "Availability computed", body = AvailabilityResponse),
        (status = 404, description = "Scoping project not found"),
        (status = 500, description = "Failed to check availability")
    ),
    tag = "Availability",
    security(("bearerAuth" = []))
)]
pub async fn check_availability(
    State(pool): State<PgPool>,
    Json(request): Json<AvailabilityRequest>,
) -> Result<ApiResponse<AvailabilityResponse>, ApiResponse<()>> {
    let (candidate_start, candidate_end) = resolve_window(
        request.start_date,
        request.end_date,
        request.start_time,
        request.end_time,
    );

    if candidate_end <= candidate_start {
        return Ok(ApiResponse::success(
            StatusCode::OK,
            "Availability computed",
            AvailabilityResponse {
                available: false,
                conflicts: Vec::new(),
                message: "End of the requested window must be after its start".to_string(),
            },
        ));
    }

    // Optional scoping: only tasks whose project shares the given project's
    // type compete for the employee's time.
    let project_type_scope: Option<Option<String>> = match request.project_id {
        Some(project_id) => Some(
            sqlx::query_scalar::<_, Option<String>>(
                "SELECT project_type FROM projects WHERE id = $1",
            )
            .bind(project_id)
            .fetch_optional(&pool)
            .await
            .map_err(|e| ApiResponse::db_error("Failed to resolve project type", e))?
            .ok_or_else(|| ApiResponse::not_found("Scoping project not found"))?,
        ),
        None => None,
    };

    let rows = load_assignment_rows(&pool, &request.employee_id, project_type_scope.as_ref())
        .await
        .map_err(|e| ApiResponse::db_error("Failed to load existing assignments", e))?;

    let options = ScanOptions {
        exclude_id: request.exclude_id,
        is_activity_report: request.is_activity_report,
    };
    let conflicts = scan_assignments(
        &request.employee_id,
        candidate_start,
        candidate_end,
        options,
        &rows,
    );

    let available = conflicts.is_empty();
    let message = if available {
        "Employee is available for the requested window".to_string()
    } else {
        format!("{} conflicting assignment(s) found", conflicts.len())
    };

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Availability computed",
        AvailabilityResponse {
            available,
            conflicts,
            message,
        },
    ))
}

/// Loads every assignment the employee holds, directly on tasks and through
/// activities, flattened for the scan. `NULL` project types compare with
/// `IS NOT DISTINCT FROM` so untyped projects still scope together.
async fn load_assignment_rows(
    pool: &PgPool,
    employee_id: &str,
    project_type_scope: Option<&Option<String>>,
) -> Result<Vec<AssignmentRow>, sqlx::Error> {
    let scope_clause = if project_type_scope.is_some() {
        " AND p.project_type IS NOT DISTINCT FROM $2"
    } else {
        ""
    };

    let task_sql = format!(
        r#"
        SELECT t.id AS task_id, t.name AS task_name, p.name AS project_name,
               t.employee, t.start_date, t.end_date, t.start_time, t.end_time, t.percentage
        FROM tasks t
        JOIN projects p ON p.id = t.project_id
        WHERE t.employee = $1{scope_clause}
        "#
    );
    let mut task_query = sqlx::query_as::<_, TaskRow>(&task_sql).bind(employee_id);
    if let Some(scope) = project_type_scope {
        task_query = task_query.bind(scope);
    }
    let task_rows = task_query.fetch_all(pool).await?;

    let activity_sql = format!(
        r#"
        SELECT t.id AS task_id, t.name AS task_name, p.name AS project_name,
               a.id AS activity_id, a.name AS activity_name,
               a.employee, a.start_date, a.end_date, a.start_time, a.end_time, a.percentage
        FROM activities a
        JOIN tasks t ON t.id = a.task_id
        JOIN projects p ON p.id = t.project_id
        WHERE a.employee = $1{scope_clause}
        "#
    );
    let mut activity_query = sqlx::query_as::<_, ActivityRow>(&activity_sql).bind(employee_id);
    if let Some(scope) = project_type_scope {
        activity_query = activity_query.bind(scope);
    }
    let activity_rows = activity_query.fetch_all(pool).await?;

    let mut rows = Vec::with_capacity(task_rows.len() + activity_rows.len());
    rows.extend(task_rows.into_iter().map(|r| AssignmentRow {
        task_id: r.task_id,
        task_name: r.task_name,
        project_name: r.project_name,
        activity_id: None,
        activity_name: None,
        employee: r.employee,
        start_date: r.start_date,
        end_date: r.end_date,
        start_time: r.start_time,
        end_time: r.end_time,
        percentage: r.percentage,
    }));
    rows.extend(activity_rows.into_iter().map(|r| AssignmentRow {
        task_id: r.task_id,
        task_name: r.task_name,
        project_name: r.project_name,
        activity_id: Some(r.activity_id),
        activity_name: Some(r.activity_name),
        employee: r.employee,
        start_date: r.start_date,
        end_date: r.end_date,
        start_time: r.start_time,
        end_time: r.end_time,
        percentage: r.percentage,
    }));

    Ok(rows)
}

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(check_availability),
    components(schemas(
        AvailabilityRequest,
        AvailabilityResponse,
        crate::scheduling::conflict::Conflict,
        crate::scheduling::conflict::ConflictKind
    )),
    tags((name = "Availability", description = "Employee availability checks"))
)]
pub struct AvailabilityDoc;

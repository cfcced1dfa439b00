use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use sqlx::{PgConnection, PgPool};
use tracing::warn;

use crate::api::auth::Claims;
use crate::db::models::report::{
    NewProgressReport, ProgressReport, RejectReview, ReportOutcome, ReportReview,
};
use crate::db::models::task::Task;
use crate::scheduling::rollup;
use crate::utils::api_response::ApiResponse;
use crate::utils::notification::{notify_review_decision, notify_review_submitted};
use crate::utils::registry::SharedRegistry;

// ---------------------------------------------------------------------------
// Aggregation cascade
// ---------------------------------------------------------------------------

/// Recomputes a task's percentage from its activities. Tasks without
/// activities keep their directly-set value. Returns the task as stored
/// afterwards.
pub(crate) async fn recompute_task(
    conn: &mut PgConnection,
    task_id: i32,
) -> Result<Task, sqlx::Error> {
    let activity_percentages: Vec<i32> =
        sqlx::query_scalar("SELECT percentage FROM activities WHERE task_id = $1")
            .bind(task_id)
            .fetch_all(&mut *conn)
            .await?;

    if let Some(percentage) = rollup::mean_percentage(&activity_percentages) {
        sqlx::query("UPDATE tasks SET percentage = $1, updated_at = NOW() WHERE id = $2")
            .bind(percentage)
            .bind(task_id)
            .execute(&mut *conn)
            .await?;
    }

    sqlx::query_as::<_, Task>(
        r#"
        SELECT id, project_id, name, employee, start_date, end_date, start_time, end_time,
               percentage, created_at, updated_at
        FROM tasks WHERE id = $1
        "#,
    )
    .bind(task_id)
    .fetch_one(&mut *conn)
    .await
}

/// Recomputes a project's percentage from its tasks (0 with no tasks) and
/// returns the new value.
pub(crate) async fn recompute_project(
    conn: &mut PgConnection,
    project_id: i32,
) -> Result<i32, sqlx::Error> {
    let task_percentages: Vec<i32> =
        sqlx::query_scalar("SELECT percentage FROM tasks WHERE project_id = $1")
            .bind(project_id)
            .fetch_all(&mut *conn)
            .await?;

    let percentage = rollup::project_percentage(&task_percentages);
    sqlx::query("UPDATE projects SET percentage = $1, updated_at = NOW() WHERE id = $2")
        .bind(percentage)
        .bind(project_id)
        .execute(&mut *conn)
        .await?;

    Ok(percentage)
}

/// Applies a reported percentage to its activity (or directly to the task),
/// then rolls up activity → task → project. Runs on the caller's transaction
/// so the whole cascade commits or rolls back as one.
pub(crate) async fn apply_report(
    conn: &mut PgConnection,
    task_id: i32,
    activity_id: Option<i32>,
    percentage: i32,
) -> Result<(Task, i32), sqlx::Error> {
    let updated = match activity_id {
        Some(activity_id) => {
            sqlx::query("UPDATE activities SET percentage = $1 WHERE id = $2 AND task_id = $3")
                .bind(percentage)
                .bind(activity_id)
                .bind(task_id)
                .execute(&mut *conn)
                .await?
        }
        None => {
            sqlx::query("UPDATE tasks SET percentage = $1, updated_at = NOW() WHERE id = $2")
                .bind(percentage)
                .bind(task_id)
                .execute(&mut *conn)
                .await?
        }
    };
    if updated.rows_affected() == 0 {
        return Err(sqlx::Error::RowNotFound);
    }

    let task = recompute_task(&mut *conn, task_id).await?;
    let project_percentage = recompute_project(&mut *conn, task.project_id).await?;
    Ok((task, project_percentage))
}

fn validate_percentage(percentage: i32) -> Result<(), ApiResponse<()>> {
    if !(0..=100).contains(&percentage) {
        return Err(ApiResponse::error(
            StatusCode::BAD_REQUEST,
            "Percentage must be between 0 and 100",
            None,
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Submits an accepted progress report and runs the roll-up cascade
#[utoipa::path(
    post,
    path = "/tasks/{task_id}/reports",
    params(("task_id" = i32, Path, description = "Task the report belongs to")),
    request_body = NewProgressReport,
    responses(
        (status = 201, description = "Report recorded and percentages recomputed", body = ReportOutcome),
        (status = 400, description = "Invalid percentage"),
        (status = 404, description = "Task or activity not found"),
        (status = 500, description = "Failed to record report")
    ),
    tag = "Reports",
    security(("bearerAuth" = []))
)]
pub async fn submit_report(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(task_id): Path<i32>,
    Json(report): Json<NewProgressReport>,
) -> Result<ApiResponse<ReportOutcome>, ApiResponse<()>> {
    validate_percentage(report.percentage)?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| ApiResponse::db_error("Failed to open transaction", e))?;

    let report_id: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO progress_reports (task_id, activity_id, employee, percentage, note)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(task_id)
    .bind(report.activity_id)
    .bind(&claims.username)
    .bind(report.percentage)
    .bind(&report.note)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23503") => {
            ApiResponse::not_found("Task or activity not found")
        }
        _ => ApiResponse::db_error("Failed to record report", e),
    })?;

    let (task, project_percentage) =
        apply_report(&mut *tx, task_id, report.activity_id, report.percentage)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => ApiResponse::not_found("Task or activity not found"),
                e => ApiResponse::db_error("Failed to recompute percentages", e),
            })?;

    tx.commit()
        .await
        .map_err(|e| ApiResponse::db_error("Failed to commit report", e))?;

    Ok(ApiResponse::success(
        StatusCode::CREATED,
        "Report recorded successfully",
        ReportOutcome {
            report_id,
            task,
            project_percentage,
        },
    ))
}

/// Lists a task's accepted reports, newest first
#[utoipa::path(
    get,
    path = "/tasks/{task_id}/reports",
    params(("task_id" = i32, Path, description = "Task the reports belong to")),
    responses(
        (status = 200, description = "Reports retrieved successfully", body = Vec<ProgressReport>),
        (status = 500, description = "Failed to retrieve reports")
    ),
    tag = "Reports",
    security(("bearerAuth" = []))
)]
pub async fn get_task_reports(
    State(pool): State<PgPool>,
    Path(task_id): Path<i32>,
) -> Result<ApiResponse<Vec<ProgressReport>>, ApiResponse<()>> {
    let reports = sqlx::query_as::<_, ProgressReport>(
        r#"
        SELECT id, task_id, activity_id, employee, percentage, note, created_at
        FROM progress_reports WHERE task_id = $1 ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(task_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| ApiResponse::db_error("Failed to retrieve reports", e))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Reports retrieved successfully",
        reports,
    ))
}

/// Submits a progress report into the pending-review queue
#[utoipa::path(
    post,
    path = "/tasks/{task_id}/reviews",
    params(("task_id" = i32, Path, description = "Task the report belongs to")),
    request_body = NewProgressReport,
    responses(
        (status = 201, description = "Report queued for review", body = i32),
        (status = 400, description = "Invalid percentage"),
        (status = 404, description = "Task not found"),
        (status = 500, description = "Failed to queue report")
    ),
    tag = "Reviews",
    security(("bearerAuth" = []))
)]
pub async fn submit_review(
    State(pool): State<PgPool>,
    Extension(registry): Extension<SharedRegistry>,
    Extension(claims): Extension<Claims>,
    Path(task_id): Path<i32>,
    Json(report): Json<NewProgressReport>,
) -> Result<ApiResponse<i32>, ApiResponse<()>> {
    validate_percentage(report.percentage)?;

    let task_name: String = sqlx::query_scalar("SELECT name FROM tasks WHERE id = $1")
        .bind(task_id)
        .fetch_optional(&pool)
        .await
        .map_err(|e| ApiResponse::db_error("Failed to fetch task", e))?
        .ok_or_else(|| ApiResponse::not_found("Task not found"))?;

    let review_id: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO report_reviews (task_id, activity_id, employee, percentage, note)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(task_id)
    .bind(report.activity_id)
    .bind(&claims.username)
    .bind(report.percentage)
    .bind(&report.note)
    .fetch_one(&pool)
    .await
    .map_err(|e| ApiResponse::db_error("Failed to queue report for review", e))?;

    if let Err(e) = notify_review_submitted(
        &pool,
        &registry,
        review_id,
        task_id,
        &task_name,
        &claims.username,
        report.percentage,
    )
    .await
    {
        warn!("Failed to notify reviewers for review {review_id}: {e}");
    }

    Ok(ApiResponse::success(
        StatusCode::CREATED,
        "Report queued for review",
        review_id,
    ))
}

/// Lists all reports waiting for review
#[utoipa::path(
    get,
    path = "/reviews/pending",
    responses(
        (status = 200, description = "Pending reviews retrieved successfully", body = Vec<ReportReview>),
        (status = 403, description = "Managers only"),
        (status = 500, description = "Failed to retrieve pending reviews")
    ),
    tag = "Reviews",
    security(("bearerAuth" = []))
)]
pub async fn get_pending_reviews(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<ApiResponse<Vec<ReportReview>>, ApiResponse<()>> {
    require_manager(&claims)?;

    let reviews = sqlx::query_as::<_, ReportReview>(
        r#"
        SELECT id, task_id, activity_id, employee, percentage, note, created_at
        FROM report_reviews ORDER BY created_at, id
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| ApiResponse::db_error("Failed to retrieve pending reviews", e))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Pending reviews retrieved successfully",
        reviews,
    ))
}

/// Approves a pending review: the row moves into the accepted-report store
/// and the same roll-up cascade runs
#[utoipa::path(
    post,
    path = "/reviews/{review_id}/approve",
    params(("review_id" = i32, Path, description = "Pending review to approve")),
    responses(
        (status = 200, description = "Review approved and percentages recomputed", body = ReportOutcome),
        (status = 403, description = "Managers only"),
        (status = 404, description = "Pending review not found"),
        (status = 500, description = "Failed to approve review")
    ),
    tag = "Reviews",
    security(("bearerAuth" = []))
)]
pub async fn approve_review(
    State(pool): State<PgPool>,
    Extension(registry): Extension<SharedRegistry>,
    Extension(claims): Extension<Claims>,
    Path(review_id): Path<i32>,
) -> Result<ApiResponse<ReportOutcome>, ApiResponse<()>> {
    require_manager(&claims)?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| ApiResponse::db_error("Failed to open transaction", e))?;

    let review = sqlx::query_as::<_, ReportReview>(
        r#"
        DELETE FROM report_reviews WHERE id = $1
        RETURNING id, task_id, activity_id, employee, percentage, note, created_at
        "#,
    )
    .bind(review_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| ApiResponse::db_error("Failed to load pending review", e))?
    .ok_or_else(|| ApiResponse::not_found("Pending review not found"))?;

    let report_id: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO progress_reports (task_id, activity_id, employee, percentage, note)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(review.task_id)
    .bind(review.activity_id)
    .bind(&review.employee)
    .bind(review.percentage)
    .bind(&review.note)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| ApiResponse::db_error("Failed to accept report", e))?;

    let (task, project_percentage) = apply_report(
        &mut *tx,
        review.task_id,
        review.activity_id,
        review.percentage,
    )
    .await
    .map_err(|e| match e {
        sqlx::Error::RowNotFound => ApiResponse::not_found("Task or activity no longer exists"),
        e => ApiResponse::db_error("Failed to recompute percentages", e),
    })?;

    tx.commit()
        .await
        .map_err(|e| ApiResponse::db_error("Failed to commit approval", e))?;

    if let Err(e) = notify_review_decision(
        &pool,
        &registry,
        &review.employee,
        task.id,
        &task.name,
        true,
        None,
    )
    .await
    {
        warn!("Failed to notify submitter of approval {review_id}: {e}");
    }

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Review approved successfully",
        ReportOutcome {
            report_id,
            task,
            project_percentage,
        },
    ))
}

/// Rejects a pending review; no percentage changes
#[utoipa::path(
    post,
    path = "/reviews/{review_id}/reject",
    params(("review_id" = i32, Path, description = "Pending review to reject")),
    request_body = RejectReview,
    responses(
        (status = 200, description = "Review rejected"),
        (status = 403, description = "Managers only"),
        (status = 404, description = "Pending review not found"),
        (status = 500, description = "Failed to reject review")
    ),
    tag = "Reviews",
    security(("bearerAuth" = []))
)]
pub async fn reject_review(
    State(pool): State<PgPool>,
    Extension(registry): Extension<SharedRegistry>,
    Extension(claims): Extension<Claims>,
    Path(review_id): Path<i32>,
    Json(rejection): Json<RejectReview>,
) -> Result<ApiResponse<()>, ApiResponse<()>> {
    require_manager(&claims)?;

    let review = sqlx::query_as::<_, ReportReview>(
        r#"
        DELETE FROM report_reviews WHERE id = $1
        RETURNING id, task_id, activity_id, employee, percentage, note, created_at
        "#,
    )
    .bind(review_id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| ApiResponse::db_error("Failed to reject review", e))?
    .ok_or_else(|| ApiResponse::not_found("Pending review not found"))?;

    let task_name: String = sqlx::query_scalar("SELECT name FROM tasks WHERE id = $1")
        .bind(review.task_id)
        .fetch_optional(&pool)
        .await
        .map_err(|e| ApiResponse::db_error("Failed to fetch task", e))?
        .unwrap_or_else(|| format!("Task {}", review.task_id));

    if let Err(e) = notify_review_decision(
        &pool,
        &registry,
        &review.employee,
        review.task_id,
        &task_name,
        false,
        rejection.reason.as_deref(),
    )
    .await
    {
        warn!("Failed to notify submitter of rejection {review_id}: {e}");
    }

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Review rejected successfully",
        (),
    ))
}

fn require_manager(claims: &Claims) -> Result<(), ApiResponse<()>> {
    if claims.role == "manager" || claims.role == "admin" {
        Ok(())
    } else {
        Err(ApiResponse::error(
            StatusCode::FORBIDDEN,
            "Only managers can review reports",
            None,
        ))
    }
}

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        submit_report,
        get_task_reports,
        submit_review,
        get_pending_reviews,
        approve_review,
        reject_review
    ),
    components(schemas(ProgressReport, ReportReview, NewProgressReport, RejectReview, ReportOutcome)),
    tags(
        (name = "Reports", description = "Progress report endpoints"),
        (name = "Reviews", description = "Report review workflow endpoints")
    )
)]
pub struct ReportDoc;

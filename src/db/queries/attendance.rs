use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension,
};
use sqlx::PgPool;

use crate::api::auth::Claims;
use crate::db::models::attendance::{AttendanceFilter, AttendanceLog};
use crate::utils::api_response::ApiResponse;

/// Opens today's attendance log for the caller
#[utoipa::path(
    post,
    path = "/attendance/clock-in",
    responses(
        (status = 201, description = "Clocked in", body = AttendanceLog),
        (status = 409, description = "Already clocked in today"),
        (status = 500, description = "Failed to clock in")
    ),
    tag = "Attendance",
    security(("bearerAuth" = []))
)]
pub async fn clock_in(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<ApiResponse<AttendanceLog>, ApiResponse<()>> {
    let log = sqlx::query_as::<_, AttendanceLog>(
        r#"
        INSERT INTO attendance_logs (employee, work_date, clock_in)
        VALUES ($1, CURRENT_DATE, NOW())
        ON CONFLICT (employee, work_date) DO NOTHING
        RETURNING id, employee, work_date, clock_in, clock_out
        "#,
    )
    .bind(&claims.username)
    .fetch_optional(&pool)
    .await
    .map_err(|e| ApiResponse::db_error("Failed to clock in", e))?;

    match log {
        Some(log) => Ok(ApiResponse::success(StatusCode::CREATED, "Clocked in", log)),
        None => Err(ApiResponse::error(
            StatusCode::CONFLICT,
            "Already clocked in today",
            None,
        )),
    }
}

/// Closes today's attendance log for the caller
#[utoipa::path(
    post,
    path = "/attendance/clock-out",
    responses(
        (status = 200, description = "Clocked out", body = AttendanceLog),
        (status = 409, description = "No open attendance log for today"),
        (status = 500, description = "Failed to clock out")
    ),
    tag = "Attendance",
    security(("bearerAuth" = []))
)]
pub async fn clock_out(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<ApiResponse<AttendanceLog>, ApiResponse<()>> {
    let log = sqlx::query_as::<_, AttendanceLog>(
        r#"
        UPDATE attendance_logs
        SET clock_out = NOW()
        WHERE employee = $1 AND work_date = CURRENT_DATE AND clock_out IS NULL
        RETURNING id, employee, work_date, clock_in, clock_out
        "#,
    )
    .bind(&claims.username)
    .fetch_optional(&pool)
    .await
    .map_err(|e| ApiResponse::db_error("Failed to clock out", e))?;

    match log {
        Some(log) => Ok(ApiResponse::success(StatusCode::OK, "Clocked out", log)),
        None => Err(ApiResponse::error(
            StatusCode::CONFLICT,
            "No open attendance log for today",
            None,
        )),
    }
}

/// Retrieves today's attendance log for the caller, if any
#[utoipa::path(
    get,
    path = "/attendance/today",
    responses(
        (status = 200, description = "Today's log retrieved", body = AttendanceLog),
        (status = 404, description = "Not clocked in today"),
        (status = 500, description = "Failed to fetch attendance")
    ),
    tag = "Attendance",
    security(("bearerAuth" = []))
)]
pub async fn get_today(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<ApiResponse<AttendanceLog>, ApiResponse<()>> {
    let log = sqlx::query_as::<_, AttendanceLog>(
        r#"
        SELECT id, employee, work_date, clock_in, clock_out
        FROM attendance_logs
        WHERE employee = $1 AND work_date = CURRENT_DATE
        "#,
    )
    .bind(&claims.username)
    .fetch_optional(&pool)
    .await
    .map_err(|e| ApiResponse::db_error("Failed to fetch attendance", e))?
    .ok_or_else(|| ApiResponse::not_found("Not clocked in today"))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Today's log retrieved",
        log,
    ))
}

/// Retrieves the caller's attendance history with optional date bounds
#[utoipa::path(
    get,
    path = "/attendance",
    params(AttendanceFilter),
    responses(
        (status = 200, description = "Attendance history retrieved", body = Vec<AttendanceLog>),
        (status = 500, description = "Failed to fetch attendance")
    ),
    tag = "Attendance",
    security(("bearerAuth" = []))
)]
pub async fn get_history(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Query(filter): Query<AttendanceFilter>,
) -> Result<ApiResponse<Vec<AttendanceLog>>, ApiResponse<()>> {
    let logs = sqlx::query_as::<_, AttendanceLog>(
        r#"
        SELECT id, employee, work_date, clock_in, clock_out
        FROM attendance_logs
        WHERE employee = $1
          AND ($2::date IS NULL OR work_date >= $2)
          AND ($3::date IS NULL OR work_date <= $3)
        ORDER BY work_date DESC
        "#,
    )
    .bind(&claims.username)
    .bind(filter.from)
    .bind(filter.to)
    .fetch_all(&pool)
    .await
    .map_err(|e| ApiResponse::db_error("Failed to fetch attendance", e))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Attendance history retrieved",
        logs,
    ))
}

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(clock_in, clock_out, get_today, get_history),
    components(schemas(AttendanceLog)),
    tags((name = "Attendance", description = "Attendance clock-in/out endpoints"))
)]
pub struct AttendanceDoc;

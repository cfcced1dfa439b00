use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

/// One employee-day of attendance. `clock_out` stays empty until the employee
/// clocks out.
#[derive(Debug, FromRow, Serialize, Deserialize, ToSchema)]
pub struct AttendanceLog {
    pub id: i32,
    pub employee: String,
    pub work_date: NaiveDate,
    pub clock_in: NaiveDateTime,
    pub clock_out: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize, Default, IntoParams)]
pub struct AttendanceFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

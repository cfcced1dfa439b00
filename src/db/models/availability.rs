use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::scheduling::conflict::Conflict;

/// Candidate assignment to test against an employee's existing bookings.
///
/// `exclude_id` ignores the assignment being edited; `is_activity_report`
/// says whether that id names a task or an activity. `project_id` restricts
/// the search to projects sharing that project's type.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AvailabilityRequest {
    pub employee_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub exclude_id: Option<i32>,
    #[serde(default)]
    pub is_activity_report: bool,
    pub project_id: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AvailabilityResponse {
    pub available: bool,
    pub conflicts: Vec<Conflict>,
    pub message: String,
}

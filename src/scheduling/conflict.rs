use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::interval::{overlaps, resolve_window};

/// How a task is staffed once its payload has passed validation: one employee
/// on the task itself, or one employee per activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignee {
    Direct(String),
    PerActivity,
}

/// An activity as submitted for creation, before any field checks ran.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ActivityDraft {
    pub name: Option<String>,
    pub employee: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

impl ActivityDraft {
    /// Display name, falling back to the 1-based position.
    pub fn display_name(&self, index: usize) -> String {
        self.name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("Activity {}", index + 1))
    }
}

/// Two activities of the same task booking one employee into overlapping
/// windows.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InternalConflict {
    pub first_index: usize,
    pub second_index: usize,
    pub first_name: String,
    pub second_name: String,
    pub employee: String,
}

/// Pairwise scan of one task's activities. Pairs missing an employee or a
/// date on either side are skipped, as are pairs staffed by different
/// employees. O(n²), with n human-entered and small.
pub fn find_internal_conflicts(activities: &[ActivityDraft]) -> Vec<InternalConflict> {
    let mut conflicts = Vec::new();

    for i in 0..activities.len() {
        for j in (i + 1)..activities.len() {
            let (a, b) = (&activities[i], &activities[j]);

            let (Some(emp_a), Some(emp_b)) = (&a.employee, &b.employee) else {
                continue;
            };
            if emp_a.trim().is_empty() || emp_a != emp_b {
                continue;
            }
            let (Some(a_start), Some(a_end)) = (a.start_date, a.end_date) else {
                continue;
            };
            let (Some(b_start), Some(b_end)) = (b.start_date, b.end_date) else {
                continue;
            };

            let (wa_start, wa_end) = resolve_window(a_start, a_end, a.start_time, a.end_time);
            let (wb_start, wb_end) = resolve_window(b_start, b_end, b.start_time, b.end_time);

            if overlaps(wa_start, wa_end, wb_start, wb_end) {
                conflicts.push(InternalConflict {
                    first_index: i,
                    second_index: j,
                    first_name: a.display_name(i),
                    second_name: b.display_name(j),
                    employee: emp_a.clone(),
                });
            }
        }
    }

    conflicts
}

/// One persisted assignment flattened for the availability scan: either a
/// directly-assigned task (`activity_id == None`) or a single activity.
#[derive(Debug, Clone)]
pub struct AssignmentRow {
    pub task_id: i32,
    pub task_name: String,
    pub project_name: String,
    pub activity_id: Option<i32>,
    pub activity_name: Option<String>,
    pub employee: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub percentage: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConflictKind {
    Task,
    Activity,
}

/// A detected clash between the candidate window and an existing assignment.
/// Transient result data, never persisted.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Conflict {
    pub task_id: i32,
    pub task_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_name: Option<String>,
    pub project_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub percentage: i32,
    #[serde(rename = "type")]
    pub kind: ConflictKind,
}

/// Scan options carried from the request.
///
/// `exclude_id` ignores the assignment currently being edited so it cannot
/// conflict with itself; `is_activity_report` selects whether that id names a
/// task or an activity, since both share one loosely-typed id space upstream.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    pub exclude_id: Option<i32>,
    pub is_activity_report: bool,
}

/// Pure cross-assignment scan: tests the candidate window against every row,
/// applying the exclusion rules and skipping completed assignments
/// (`percentage == 100` cannot conflict).
pub fn scan_assignments(
    employee_id: &str,
    candidate_start: chrono::NaiveDateTime,
    candidate_end: chrono::NaiveDateTime,
    options: ScanOptions,
    rows: &[AssignmentRow],
) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    for row in rows {
        if row.employee != employee_id {
            continue;
        }
        if row.percentage >= 100 {
            continue;
        }

        let excluded = match row.activity_id {
            Some(activity_id) => {
                options.is_activity_report && options.exclude_id == Some(activity_id)
            }
            None => !options.is_activity_report && options.exclude_id == Some(row.task_id),
        };
        if excluded {
            continue;
        }

        let (row_start, row_end) =
            resolve_window(row.start_date, row.end_date, row.start_time, row.end_time);

        if overlaps(candidate_start, candidate_end, row_start, row_end) {
            conflicts.push(Conflict {
                task_id: row.task_id,
                task_name: row.task_name.clone(),
                activity_name: row.activity_name.clone(),
                project_name: row.project_name.clone(),
                start_date: row.start_date,
                end_date: row.end_date,
                percentage: row.percentage,
                kind: if row.activity_id.is_some() {
                    ConflictKind::Activity
                } else {
                    ConflictKind::Task
                },
            });
        }
    }

    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn time(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    fn draft(employee: &str, day: &str, start: &str, end: &str) -> ActivityDraft {
        ActivityDraft {
            name: None,
            employee: Some(employee.to_string()),
            start_date: Some(date(day)),
            end_date: Some(date(day)),
            start_time: Some(time(start)),
            end_time: Some(time(end)),
        }
    }

    fn task_row(employee: &str, percentage: i32) -> AssignmentRow {
        AssignmentRow {
            task_id: 7,
            task_name: "Task A".into(),
            project_name: "Website Revamp".into(),
            activity_id: None,
            activity_name: None,
            employee: employee.to_string(),
            start_date: date("2024-02-01"),
            end_date: date("2024-02-01"),
            start_time: None,
            end_time: None,
            percentage,
        }
    }

    #[test]
    fn same_employee_overlapping_activities_conflict() {
        let activities = vec![
            draft("E1", "2024-01-01", "09:00", "12:00"),
            draft("E1", "2024-01-01", "11:00", "13:00"),
        ];
        let conflicts = find_internal_conflicts(&activities);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].first_index, 0);
        assert_eq!(conflicts[0].second_index, 1);
        assert_eq!(conflicts[0].employee, "E1");
        assert_eq!(conflicts[0].first_name, "Activity 1");
        assert_eq!(conflicts[0].second_name, "Activity 2");
    }

    #[test]
    fn different_employees_never_conflict() {
        let activities = vec![
            draft("E1", "2024-01-01", "09:00", "12:00"),
            draft("E2", "2024-01-01", "09:00", "12:00"),
        ];
        assert!(find_internal_conflicts(&activities).is_empty());
    }

    #[test]
    fn incomplete_activities_are_skipped() {
        let mut missing_dates = draft("E1", "2024-01-01", "09:00", "12:00");
        missing_dates.start_date = None;
        let mut missing_employee = draft("E1", "2024-01-01", "09:00", "12:00");
        missing_employee.employee = None;
        let activities = vec![
            missing_dates,
            missing_employee,
            draft("E1", "2024-01-01", "09:00", "12:00"),
        ];
        assert!(find_internal_conflicts(&activities).is_empty());
    }

    #[test]
    fn back_to_back_activities_do_not_conflict() {
        let activities = vec![
            draft("E1", "2024-01-01", "09:00", "12:00"),
            draft("E1", "2024-01-01", "12:00", "14:00"),
        ];
        assert!(find_internal_conflicts(&activities).is_empty());
    }

    #[test]
    fn candidate_overlapping_existing_task_is_unavailable() {
        let rows = vec![task_row("E1", 50)];
        let (start, end) = resolve_window(
            date("2024-02-01"),
            date("2024-02-01"),
            Some(time("10:00")),
            Some(time("11:00")),
        );
        let conflicts = scan_assignments("E1", start, end, ScanOptions::default(), &rows);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::Task);
        assert_eq!(conflicts[0].task_name, "Task A");
    }

    #[test]
    fn completed_assignment_never_conflicts() {
        let rows = vec![task_row("E1", 100)];
        let (start, end) = resolve_window(
            date("2024-02-01"),
            date("2024-02-01"),
            Some(time("10:00")),
            Some(time("11:00")),
        );
        assert!(scan_assignments("E1", start, end, ScanOptions::default(), &rows).is_empty());
    }

    #[test]
    fn editing_a_task_excludes_itself() {
        let rows = vec![task_row("E1", 50)];
        let (start, end) = resolve_window(date("2024-02-01"), date("2024-02-01"), None, None);
        let options = ScanOptions {
            exclude_id: Some(7),
            is_activity_report: false,
        };
        assert!(scan_assignments("E1", start, end, options, &rows).is_empty());
    }

    #[test]
    fn task_exclusion_does_not_apply_in_activity_mode() {
        // exclude_id 7 names an activity here, so task 7 must still be scanned
        let rows = vec![task_row("E1", 50)];
        let (start, end) = resolve_window(date("2024-02-01"), date("2024-02-01"), None, None);
        let options = ScanOptions {
            exclude_id: Some(7),
            is_activity_report: true,
        };
        assert_eq!(scan_assignments("E1", start, end, options, &rows).len(), 1);
    }

    #[test]
    fn activity_rows_report_activity_conflicts() {
        let row = AssignmentRow {
            task_id: 3,
            task_name: "Backend".into(),
            project_name: "Mobile App".into(),
            activity_id: Some(21),
            activity_name: Some("API design".into()),
            employee: "E2".into(),
            start_date: date("2024-03-10"),
            end_date: date("2024-03-12"),
            start_time: None,
            end_time: None,
            percentage: 10,
        };
        let (start, end) = resolve_window(date("2024-03-11"), date("2024-03-11"), None, None);
        let conflicts = scan_assignments("E2", start, end, ScanOptions::default(), &[row]);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::Activity);
        assert_eq!(conflicts[0].activity_name.as_deref(), Some("API design"));

        let excluded = scan_assignments(
            "E2",
            start,
            end,
            ScanOptions {
                exclude_id: Some(21),
                is_activity_report: true,
            },
            &[AssignmentRow {
                activity_id: Some(21),
                ..conflict_row()
            }],
        );
        assert!(excluded.is_empty());
    }

    fn conflict_row() -> AssignmentRow {
        AssignmentRow {
            task_id: 3,
            task_name: "Backend".into(),
            project_name: "Mobile App".into(),
            activity_id: Some(21),
            activity_name: Some("API design".into()),
            employee: "E2".into(),
            start_date: date("2024-03-10"),
            end_date: date("2024-03-12"),
            start_time: None,
            end_time: None,
            percentage: 10,
        }
    }

    #[test]
    fn other_employees_rows_are_ignored() {
        let rows = vec![task_row("E9", 50)];
        let (start, end) = resolve_window(date("2024-02-01"), date("2024-02-01"), None, None);
        assert!(scan_assignments("E1", start, end, ScanOptions::default(), &rows).is_empty());
    }
}

/// Unweighted mean of child percentages, rounded half-up to the nearest
/// integer. `None` when there are no children, so callers can fall back to a
/// directly-set value.
pub fn mean_percentage(values: &[i32]) -> Option<i32> {
    if values.is_empty() {
        return None;
    }
    let sum: i64 = values.iter().map(|&v| v as i64).sum();
    let mean = sum as f64 / values.len() as f64;
    Some(mean.round() as i32)
}

/// A task's derived percentage: the mean of its activities when it has any,
/// otherwise whatever its own reports set directly.
pub fn task_percentage(direct: i32, activity_percentages: &[i32]) -> i32 {
    mean_percentage(activity_percentages).unwrap_or(direct)
}

/// A project's derived percentage: the mean of its tasks, 0 with no tasks.
pub fn project_percentage(task_percentages: &[i32]) -> i32 {
    mean_percentage(task_percentages).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thirds_round_down_to_33() {
        assert_eq!(mean_percentage(&[33, 33, 34]), Some(33));
    }

    #[test]
    fn half_rounds_up() {
        assert_eq!(mean_percentage(&[50, 51]), Some(51));
        assert_eq!(mean_percentage(&[0, 1]), Some(1));
    }

    #[test]
    fn aggregation_is_idempotent() {
        let activities = [20, 45, 80];
        let first = task_percentage(0, &activities);
        let second = task_percentage(first, &activities);
        assert_eq!(first, second);

        let tasks = [first, 10];
        assert_eq!(project_percentage(&tasks), project_percentage(&tasks));
    }

    #[test]
    fn task_without_activities_keeps_direct_value() {
        assert_eq!(task_percentage(70, &[]), 70);
    }

    #[test]
    fn project_without_tasks_is_zero() {
        assert_eq!(project_percentage(&[]), 0);
    }

    #[test]
    fn single_child_passes_through() {
        assert_eq!(mean_percentage(&[42]), Some(42));
    }
}

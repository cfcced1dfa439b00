use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Start of the canonical workday, used when an assignment has no start time.
pub fn default_day_start() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 30, 0).unwrap()
}

/// End of the canonical workday, used when an assignment has no end time.
pub fn default_day_end() -> NaiveTime {
    NaiveTime::from_hms_opt(18, 30, 0).unwrap()
}

/// Resolves an assignment's calendar dates plus optional times-of-day into a
/// pair of absolute instants. Missing times fall back to the 09:30–18:30
/// workday window.
pub fn resolve_window(
    start_date: NaiveDate,
    end_date: NaiveDate,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
) -> (NaiveDateTime, NaiveDateTime) {
    let start = start_date.and_time(start_time.unwrap_or_else(default_day_start));
    let end = end_date.and_time(end_time.unwrap_or_else(default_day_end));
    (start, end)
}

/// Half-open interval intersection test over `[start, end)`.
///
/// Touching boundaries (one window ending exactly when the other starts) do
/// not count as an overlap. Callers must reject `end <= start` windows before
/// getting here; this primitive does not validate ordering.
pub fn overlaps(
    start_a: NaiveDateTime,
    end_a: NaiveDateTime,
    start_b: NaiveDateTime,
    end_b: NaiveDateTime,
) -> bool {
    start_a < end_b && end_a > start_b
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M").unwrap()
    }

    #[test]
    fn overlap_is_symmetric() {
        let cases = [
            ("2024-01-01T09:00", "2024-01-01T12:00", "2024-01-01T11:00", "2024-01-01T13:00"),
            ("2024-01-01T09:00", "2024-01-01T10:00", "2024-01-01T10:00", "2024-01-01T11:00"),
            ("2024-01-01T09:00", "2024-01-02T18:00", "2024-01-01T12:00", "2024-01-01T13:00"),
            ("2024-03-01T09:00", "2024-03-01T10:00", "2024-05-01T09:00", "2024-05-01T10:00"),
        ];
        for (a1, a2, b1, b2) in cases {
            assert_eq!(
                overlaps(dt(a1), dt(a2), dt(b1), dt(b2)),
                overlaps(dt(b1), dt(b2), dt(a1), dt(a2)),
                "symmetry violated for {a1}..{a2} vs {b1}..{b2}"
            );
        }
    }

    #[test]
    fn touching_windows_do_not_overlap() {
        let t0 = dt("2024-01-01T09:00");
        let t1 = dt("2024-01-01T12:00");
        let t2 = dt("2024-01-01T15:00");
        assert!(!overlaps(t0, t1, t1, t2));
        assert!(!overlaps(t1, t2, t0, t1));
    }

    #[test]
    fn contained_window_overlaps() {
        assert!(overlaps(
            dt("2024-01-01T09:00"),
            dt("2024-01-01T18:00"),
            dt("2024-01-01T10:00"),
            dt("2024-01-01T11:00"),
        ));
    }

    #[test]
    fn resolve_window_defaults_to_workday() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let (start, end) = resolve_window(d, d, None, None);
        assert_eq!(start, dt("2024-02-01T09:30"));
        assert_eq!(end, dt("2024-02-01T18:30"));
    }

    #[test]
    fn resolve_window_keeps_explicit_times() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let (start, end) = resolve_window(
            d,
            d,
            NaiveTime::from_hms_opt(10, 0, 0),
            NaiveTime::from_hms_opt(11, 0, 0),
        );
        assert_eq!(start, dt("2024-02-01T10:00"));
        assert_eq!(end, dt("2024-02-01T11:00"));
    }
}

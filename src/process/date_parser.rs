use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse an EMT timestamp (`YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS[.fff]`, the
/// same with a space, or RFC 3339) into naive millis since the epoch.
pub fn parse_timestamp_millis(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.len() < 10 {
        return None;
    }
    if s.len() == 10 {
        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.naive_local().and_utc().timestamp_millis())
}

/// Calendar day of a timestamp produced by [`parse_timestamp_millis`].
pub fn day_of_millis(ms: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(ms).map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> Option<NaiveDate> {
        parse_timestamp_millis(s).and_then(day_of_millis)
    }

    #[test]
    fn test_parses_emt_formats() {
        let may_1 = NaiveDate::from_ymd_opt(2023, 5, 1);
        assert_eq!(day("2023-05-01"), may_1);
        assert_eq!(day("2023-05-01T23:59:10"), may_1);
        assert_eq!(day("2023-05-01 00:00:10.250"), may_1);
        assert_eq!(day("2023-05-01T23:30:00+02:00"), may_1);
    }

    #[test]
    fn test_time_of_day_kept() {
        let midnight = parse_timestamp_millis("2023-05-01").unwrap();
        let later = parse_timestamp_millis("2023-05-01T00:01:30").unwrap();
        assert_eq!(later - midnight, 90_000);
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_timestamp_millis(""), None);
        assert_eq!(parse_timestamp_millis("yesterday"), None);
        assert_eq!(parse_timestamp_millis("2023-13-01"), None);
        assert_eq!(parse_timestamp_millis("2023/05/01 10:00:00"), None);
    }
}

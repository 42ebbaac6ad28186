use chrono::{DateTime, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch, or 0 if the clock reads earlier.
#[inline]
pub fn get_current_time_or_zero() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// Formats an instant for use inside a file name.
///
/// ISO-8601 in UTC with millisecond precision, where `:` and `.` are replaced
/// by `-` so the result is valid on every filesystem,
/// e.g. `2024-05-01T10-22-03-125Z`.
pub fn file_name_timestamp(instant: &DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H-%M-%S-%3fZ").to_string()
}

/// [file_name_timestamp] for the current instant.
pub fn current_file_name_timestamp() -> String {
    file_name_timestamp(&Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_get_current_time() {
        assert!(get_current_time_or_zero() > 0);
    }

    #[test]
    fn file_name_timestamp_has_no_separators() {
        let instant = Utc.with_ymd_and_hms(2024, 5, 1, 10, 22, 3).unwrap()
            + chrono::Duration::milliseconds(125);
        let formatted = file_name_timestamp(&instant);
        assert_eq!(formatted, "2024-05-01T10-22-03-125Z");
        assert!(!formatted.contains(':'));
        assert!(!formatted.contains('.'));
    }
}

//! Small shared helpers that don't earn their own module.

use crate::Frame;
use chrono::{Local, NaiveDateTime, TimeZone};

pub fn resp_ok() -> Frame {
    Frame::Simple("OK".to_string())
}

pub fn resp_str(val: &str) -> Frame {
    Frame::Simple(val.to_string())
}

pub fn resp_invalid_arguments() -> Frame {
    Frame::Error("ERR wrong number of arguments".to_string())
}

/// Current Unix second, used for expiry comparisons. Kept in UTC; only the persisted
/// `EXPIREAT` record is rendered in local time.
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats a Unix second as local time, `yyyy-MM-dd HH:mm:ss`, for `EXPIREAT` persistence
/// records.
pub fn format_local_time(unix_secs: i64) -> String {
    Local
        .timestamp_opt(unix_secs, 0)
        .single()
        .map(|dt| dt.format(TIME_FORMAT).to_string())
        .unwrap_or_else(|| unix_secs.to_string())
}

/// Parses the `EXPIREAT` time argument, interpreted as local time, into a Unix second. Returns
/// `None` on anything that doesn't match `yyyy-MM-dd HH:mm:ss`.
pub fn parse_local_time(s: &str) -> Option<i64> {
    let naive = NaiveDateTime::parse_from_str(s, TIME_FORMAT).ok()?;
    Local.from_local_datetime(&naive).single().map(|dt| dt.timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_formatting() {
        let at = 1_700_000_000;
        let formatted = format_local_time(at);
        assert_eq!(parse_local_time(&formatted), Some(at));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_local_time("not a date").is_none());
    }
}

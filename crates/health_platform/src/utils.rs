//! Normalization of the loosely typed values found in plugin records.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde_json::Value;

/// Local calendar date of a record timestamp.
///
/// Accepts:
/// - `YYYY-MM-DD` -> that date, unchanged
/// - RFC3339 datetime -> converted to local time, then truncated
/// - naive `YYYY-MM-DDTHH:MM:SS` (optionally with fraction) -> already local, truncated
/// - epoch milliseconds -> converted to local time, then truncated; a JSON
///   float is accepted only when it has no fractional part
pub fn local_calendar_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                return Some(d);
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Local).date_naive());
            }
            if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
                return Some(ndt.date());
            }
            None
        }
        Value::Number(n) => {
            let millis = epoch_millis(n)?;
            Local
                .timestamp_millis_opt(millis)
                .single()
                .map(|dt| dt.date_naive())
        }
        _ => None,
    }
}

fn epoch_millis(n: &serde_json::Number) -> Option<i64> {
    if let Some(millis) = n.as_i64() {
        return Some(millis);
    }
    let f = n.as_f64()?;
    (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}

/// Numeric measurement of a record: a JSON number or a numeric string.
/// Non-finite results are rejected.
pub fn measurement(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<f64>().ok()?
        }
        _ => return None,
    };
    n.is_finite().then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn date_only_is_kept() {
        let d = local_calendar_date(&json!("2025-12-15")).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 12, 15).unwrap());
    }

    #[test]
    fn naive_datetime_keeps_its_date() {
        let d = local_calendar_date(&json!("2025-12-15T23:30:00.000")).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 12, 15).unwrap());
    }

    #[test]
    fn rfc3339_converts_to_local_date() {
        let raw = "2025-12-15T12:00:00Z";
        let expected = DateTime::parse_from_rfc3339(raw)
            .unwrap()
            .with_timezone(&Local)
            .date_naive();
        assert_eq!(local_calendar_date(&json!(raw)), Some(expected));
    }

    #[test]
    fn epoch_millis_converts_to_local_date() {
        let millis = 1_765_800_000_000i64;
        let expected = Local.timestamp_millis_opt(millis).unwrap().date_naive();
        assert_eq!(local_calendar_date(&json!(millis)), Some(expected));
    }

    #[test]
    fn integral_float_millis_match_integer_millis() {
        let from_float = local_calendar_date(&json!(1741219200000.0));
        assert!(from_float.is_some());
        assert_eq!(from_float, local_calendar_date(&json!(1741219200000i64)));
    }

    #[test]
    fn fractional_millis_are_rejected() {
        assert!(local_calendar_date(&json!(1741219200000.5)).is_none());
        assert!(local_calendar_date(&json!(1e300)).is_none());
    }

    #[test]
    fn rejects_unparseable_dates() {
        assert!(local_calendar_date(&json!("not-a-date")).is_none());
        assert!(local_calendar_date(&json!(null)).is_none());
        assert!(local_calendar_date(&json!({"d": 1})).is_none());
    }

    #[test]
    fn measurement_accepts_numbers_and_numeric_strings() {
        assert_eq!(measurement(&json!(1000)), Some(1000.0));
        assert_eq!(measurement(&json!(2.5)), Some(2.5));
        assert_eq!(measurement(&json!(" 42 ")), Some(42.0));
    }

    #[test]
    fn measurement_rejects_everything_else() {
        assert!(measurement(&json!("")).is_none());
        assert!(measurement(&json!("NaN")).is_none());
        assert!(measurement(&json!("abc")).is_none());
        assert!(measurement(&json!(null)).is_none());
        assert!(measurement(&json!(true)).is_none());
        assert!(measurement(&json!({"average": 70})).is_none());
    }
}

//! Date and time helpers.
//!
//! Range filters work on ISO 8601 text as it arrives from requests, so these
//! helpers accept either text or an already parsed [`NaiveDateTime`] through
//! [`DateInput`].

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

use crate::error::{LfbError, LfbResult};

/// Output format for datetimes; fractional seconds are printed only when present.
pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A date bound given either as request text or as a parsed datetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateInput {
    /// ISO 8601 text such as `2020-01-01` or `2020-01-01T08:30:00`.
    Text(String),
    /// A parsed datetime.
    DateTime(NaiveDateTime),
}

impl From<&str> for DateInput {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for DateInput {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<NaiveDateTime> for DateInput {
    fn from(v: NaiveDateTime) -> Self {
        Self::DateTime(v)
    }
}

impl From<NaiveDate> for DateInput {
    fn from(v: NaiveDate) -> Self {
        Self::DateTime(v.and_time(chrono::NaiveTime::MIN))
    }
}

/// Returns the date part of an ISO 8601 string (everything before `T`).
///
/// ```
/// use lfb_core::utils::trim_date_string;
///
/// assert_eq!(trim_date_string("2019-02-23T00:23:29+01:00"), "2019-02-23");
/// assert_eq!(trim_date_string("2019-02-23"), "2019-02-23");
/// ```
pub fn trim_date_string(date_string: &str) -> &str {
    date_string.split('T').next().unwrap_or(date_string)
}

/// Adds `days` (may be fractional) to a date bound and returns ISO 8601 text.
///
/// Text input is first trimmed to its bare date, so the offset is counted from
/// midnight. Datetime input is used as is.
///
/// ```
/// use lfb_core::utils::add_days;
///
/// assert_eq!(add_days("2020-01-10T18:00:00", 1.5).unwrap(), "2020-01-11T12:00:00");
/// ```
///
/// # Errors
///
/// Returns [`LfbError::Data`] if the text is not a `YYYY-MM-DD` date or the
/// offset is not a finite number of days.
pub fn add_days(input: impl Into<DateInput>, days: f64) -> LfbResult<String> {
    let base = match input.into() {
        DateInput::Text(text) => {
            let trimmed = trim_date_string(&text);
            NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
                .map_err(|e| LfbError::Data(format!("invalid date '{text}': {e}")))?
                .and_time(chrono::NaiveTime::MIN)
        }
        DateInput::DateTime(dt) => dt,
    };

    let millis = (days * 86_400_000.0).round();
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
    #[allow(clippy::cast_precision_loss)]
    let in_range = millis >= i64::MIN as f64 && millis < i64::MAX as f64;
    if !in_range {
        return Err(LfbError::Data(format!("invalid day offset {days}")));
    }
    #[allow(clippy::cast_possible_truncation)]
    let offset = Duration::try_milliseconds(millis as i64)
        .ok_or_else(|| LfbError::Data(format!("invalid day offset {days}")))?;

    base.checked_add_signed(offset)
        .map(|dt| dt.format(ISO_FORMAT).to_string())
        .ok_or_else(|| LfbError::Data(format!("date out of range after adding {days} days")))
}

/// Parses ISO 8601 date or datetime text. A bare date maps to midnight.
///
/// Accepts `T` or a space as the separator, optional fractional seconds, and
/// an optional UTC offset (which is dropped after conversion to UTC).
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .ok()
        .map(|d| d.and_time(chrono::NaiveTime::MIN))
}

/// Converts a unix timestamp (seconds) to ISO 8601 text in UTC.
pub fn timestamp_to_iso(timestamp: i64) -> Option<String> {
    DateTime::from_timestamp(timestamp, 0).map(|dt| dt.naive_utc().format(ISO_FORMAT).to_string())
}

/// Formats an optional datetime as ISO 8601 text.
pub fn datetime_to_iso(datetime: Option<&NaiveDateTime>) -> Option<String> {
    datetime.map(|dt| dt.format(ISO_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_trim_date_string() {
        assert_eq!(trim_date_string("2020-01-01T10:00:00"), "2020-01-01");
        assert_eq!(trim_date_string(""), "");
    }

    #[test]
    fn test_add_days_whole_day_from_text() {
        assert_eq!(add_days("2020-01-31", 1.0).unwrap(), "2020-02-01T00:00:00");
    }

    #[test]
    fn test_add_days_trims_time_from_text() {
        assert_eq!(add_days("2020-01-10T23:59:59", 1.0).unwrap(), "2020-01-11T00:00:00");
    }

    #[test]
    fn test_add_days_fractional() {
        assert_eq!(add_days("2020-01-10", 1.5).unwrap(), "2020-01-11T12:00:00");
    }

    #[test]
    fn test_add_days_datetime_keeps_time() {
        let start = dt(2020, 1, 10, 8, 30, 0);
        assert_eq!(add_days(start, 1.0).unwrap(), "2020-01-11T08:30:00");
    }

    #[test]
    fn test_add_days_negative() {
        assert_eq!(add_days("2020-03-01", -1.0).unwrap(), "2020-02-29T00:00:00");
    }

    #[test]
    fn test_add_days_invalid_text() {
        assert!(matches!(add_days("yesterday", 1.0), Err(LfbError::Data(_))));
    }

    #[test]
    fn test_add_days_non_finite() {
        assert!(add_days("2020-01-01", f64::NAN).is_err());
    }

    #[test]
    fn test_add_days_huge_offset_is_an_error() {
        for days in [-1e300, 1e300, 1e12, -1e12] {
            assert!(matches!(add_days("2020-01-01", days), Err(LfbError::Data(_))));
        }
    }

    #[test]
    fn test_parse_datetime_variants() {
        assert_eq!(parse_datetime("2020-01-01"), Some(dt(2020, 1, 1, 0, 0, 0)));
        assert_eq!(
            parse_datetime("2020-01-01T12:30:05"),
            Some(dt(2020, 1, 1, 12, 30, 5))
        );
        assert_eq!(
            parse_datetime("2020-01-01 12:30:05"),
            Some(dt(2020, 1, 1, 12, 30, 5))
        );
        assert_eq!(
            parse_datetime("2019-02-23T00:23:29+01:00"),
            Some(dt(2019, 2, 22, 23, 23, 29))
        );
        assert_eq!(parse_datetime("not a date"), None);
    }

    #[test]
    fn test_timestamp_to_iso() {
        assert_eq!(timestamp_to_iso(0).as_deref(), Some("1970-01-01T00:00:00"));
    }

    #[test]
    fn test_datetime_to_iso() {
        assert_eq!(datetime_to_iso(None), None);
        let value = dt(2021, 5, 4, 3, 2, 1);
        assert_eq!(
            datetime_to_iso(Some(&value)).as_deref(),
            Some("2021-05-04T03:02:01")
        );
    }
}

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde_json::Value;
use thiserror::Error;

use crate::model::WorkoutState;

const START_DATE_TIME: &str = "startDateTime";

/// Offsets must stay strictly inside one day.
const MAX_OFFSET_MICROS: i64 = 24 * 60 * 60 * 1_000_000;

/// Reasons a request body is not a valid workout state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateValidationError {
    #[error("Invalid workout state schema. Must contain only \"startDateTime\" field.")]
    Schema,

    #[error("startDateTime must be a valid timezone-aware ISO 8601 datetime string")]
    DateTime,
}

/// Validate a decoded request body as a [`WorkoutState`].
///
/// The body must be an object whose key set is exactly `{startDateTime}`
/// with a string value; unknown fields are rejected, not ignored. The
/// datetime is checked but kept verbatim.
pub fn parse_workout_state(body: &Value) -> Result<WorkoutState, StateValidationError> {
    let object = body.as_object().ok_or(StateValidationError::Schema)?;

    if object.len() != 1 {
        return Err(StateValidationError::Schema);
    }

    let start_date_time = object
        .get(START_DATE_TIME)
        .and_then(Value::as_str)
        .ok_or(StateValidationError::Schema)?;

    if !is_timezone_aware_iso8601(start_date_time) {
        return Err(StateValidationError::DateTime);
    }

    Ok(WorkoutState {
        start_date_time: start_date_time.to_string(),
    })
}

/// Whether `s` is an ISO 8601 datetime carrying an explicit UTC offset.
///
/// Every `Z` is read as `+00:00`. Accepted:
/// - dates `YYYY-MM-DD`, `YYYYMMDD`, `YYYY-Www[-D]`, `YYYYWww[D]`
/// - any single character between date and time
/// - times `HH`, `HH:MM`, `HHMM`, `HH:MM:SS`, `HHMMSS`, seconds optionally
///   followed by `.` or `,` and a fraction (digits past the sixth are dropped)
/// - offsets `±` followed by the same clock forms, under 24 hours
///
/// Naive datetimes, bare dates, leap seconds and hour 24 are rejected.
pub fn is_timezone_aware_iso8601(s: &str) -> bool {
    parse_aware(&s.replace('Z', "+00:00")).is_some()
}

/// Parse into the local datetime and its offset in microseconds.
fn parse_aware(s: &str) -> Option<(NaiveDateTime, i64)> {
    let date_len = date_length(s.as_bytes())?;
    let date = parse_date(s.get(..date_len)?)?;

    let mut rest = s.get(date_len..)?.chars();
    rest.next()?;
    let rest = rest.as_str();

    let sign_at = rest.find(['+', '-'])?;
    let sign = if rest[sign_at..].starts_with('-') { -1 } else { 1 };

    let (hour, minute, second, micro) = parse_clock(&rest[..sign_at])?;
    let time = NaiveTime::from_hms_micro_opt(hour, minute, second, micro)?;

    let (oh, om, os, ous) = parse_clock(&rest[sign_at + 1..])?;
    let offset = ((i64::from(oh) * 60 + i64::from(om)) * 60 + i64::from(os)) * 1_000_000
        + i64::from(ous);
    if offset >= MAX_OFFSET_MICROS {
        return None;
    }

    Some((date.and_time(time), sign * offset))
}

/// Length of the date prefix, which decides where the separator sits.
fn date_length(s: &[u8]) -> Option<usize> {
    if s.len() < 7 {
        return None;
    }
    if s.len() == 7 {
        return Some(7);
    }

    if s[4] == b'-' {
        if s[5] != b'W' {
            return Some(10);
        }
        // YYYY-Www or YYYY-Www-D
        if s.len() > 8 && s[8] == b'-' {
            if s.len() == 9 {
                return None;
            }
            if s.len() > 10 && s[10].is_ascii_digit() {
                return Some(8);
            }
            return Some(10);
        }
        return Some(8);
    }

    if s[4] == b'W' {
        // YYYYWww or YYYYWwwD, followed by a separator that may be a digit
        let digits_end = s[7..]
            .iter()
            .position(|b| !b.is_ascii_digit())
            .map_or(s.len(), |i| i + 7);
        if digits_end < 9 {
            return Some(digits_end);
        }
        return Some(if digits_end % 2 == 0 { 7 } else { 8 });
    }

    Some(8)
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let b = s.as_bytes();
    let year = digits(b.get(..4)?)? as i32;
    if year < 1 {
        return None;
    }

    let extended = b.get(4) == Some(&b'-');
    let mut pos = 4 + usize::from(extended);

    if b.get(pos) == Some(&b'W') {
        pos += 1;
        let week = digits(b.get(pos..pos + 2)?)?;
        pos += 2;

        let mut day = 1;
        if pos < b.len() {
            if (b[pos] == b'-') != extended {
                return None;
            }
            pos += usize::from(extended);
            day = digits(b.get(pos..pos + 1)?)?;
            pos += 1;
        }
        if pos != b.len() || !(1..=7).contains(&day) {
            return None;
        }

        return NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)?
            .checked_add_days(Days::new(u64::from(day - 1)));
    }

    let month = digits(b.get(pos..pos + 2)?)?;
    pos += 2;
    if (b.get(pos) == Some(&b'-')) != extended {
        return None;
    }
    pos += usize::from(extended);
    let day = digits(b.get(pos..pos + 2)?)?;
    if pos + 2 != b.len() {
        return None;
    }

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Read `HH[[:]MM[[:]SS[(.|,)fraction]]]` into hours, minutes, seconds and
/// microseconds. Separators must be used consistently. Ranges are left to
/// the caller.
fn parse_clock(s: &str) -> Option<(u32, u32, u32, u32)> {
    let b = s.as_bytes();
    let mut parts = [0u32; 3];
    let mut pos = 0;
    let mut colons = false;

    for (i, part) in parts.iter_mut().enumerate() {
        *part = digits(b.get(pos..pos + 2)?)?;
        pos += 2;

        let Some(&next) = b.get(pos) else { break };
        if i == 0 {
            colons = next == b':';
        }
        if i == 2 {
            break;
        }
        if colons {
            if next != b':' {
                return None;
            }
            pos += 1;
        }
    }

    let mut micro = 0;
    if pos < b.len() {
        if b[pos] != b'.' && b[pos] != b',' {
            return None;
        }
        let fraction = &b[pos + 1..];
        if fraction.is_empty() || !fraction.iter().all(u8::is_ascii_digit) {
            return None;
        }
        let kept = &fraction[..fraction.len().min(6)];
        micro = digits(kept)? * 10u32.pow(6 - kept.len() as u32);
    }

    Some((parts[0], parts[1], parts[2], micro))
}

/// Decimal value of an all-ASCII-digit slice.
fn digits(b: &[u8]) -> Option<u32> {
    if b.is_empty() || !b.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(b.iter().fold(0, |acc, d| acc * 10 + u32::from(d - b'0')))
}

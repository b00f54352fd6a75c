//! RFC 3339 timestamp parsing and formatting.
//!
//! Server documents carry timestamps as RFC 3339 strings (for example
//! `2013-05-10T18:50:41-07:00`). Internally a [`Timestamp`] is microseconds
//! since the Unix epoch plus the original UTC offset in minutes, so the
//! string can be reproduced on output.

use thiserror::Error;

const MICROSECONDS_PER_SECOND: i64 = 1_000_000;
const MICROSECONDS_PER_MINUTE: i64 = 60 * MICROSECONDS_PER_SECOND;
const MICROSECONDS_PER_HOUR: i64 = 60 * MICROSECONDS_PER_MINUTE;
const MICROSECONDS_PER_DAY: i64 = 24 * MICROSECONDS_PER_HOUR;

/// Error type for RFC 3339 parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TimestampParseError {
    pub message: String,
}

impl TimestampParseError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A point in time with the UTC offset it was written with.
///
/// Two timestamps compare by instant first, so ordering ignores how the
/// offset happened to be spelled unless the instants are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    /// Microseconds since the Unix epoch (1970-01-01T00:00:00Z).
    epoch_us: i64,
    /// Signed UTC offset in minutes (e.g., -420 for -07:00).
    offset_min: i16,
}

impl Timestamp {
    /// Creates a timestamp from epoch microseconds at UTC.
    pub fn from_epoch_micros(epoch_us: i64) -> Self {
        Self {
            epoch_us,
            offset_min: 0,
        }
    }

    /// Creates a timestamp from epoch microseconds with an explicit offset.
    pub fn new(epoch_us: i64, offset_min: i16) -> Self {
        Self {
            epoch_us,
            offset_min,
        }
    }

    /// Microseconds since the Unix epoch.
    pub fn epoch_micros(&self) -> i64 {
        self.epoch_us
    }

    /// The UTC offset in minutes this timestamp was written with.
    pub fn offset_minutes(&self) -> i16 {
        self.offset_min
    }

    /// Parses an RFC 3339 datetime string.
    pub fn parse(text: &str) -> Result<Timestamp, TimestampParseError> {
        // Minimum form is YYYY-MM-DDTHH:MM:SS (19 characters).
        if text.len() < 19 || !text.is_ascii() {
            return Err(TimestampParseError::new(format!(
                "invalid RFC 3339 datetime: {}",
                text
            )));
        }

        let sep = text.as_bytes()[10];
        if sep != b'T' && sep != b't' && sep != b' ' {
            return Err(TimestampParseError::new(format!(
                "invalid RFC 3339 datetime: {}",
                text
            )));
        }

        let (year, month, day) = parse_date_part(&text[..10])?;
        let time_part = &text[11..];
        if time_part.as_bytes()[2] != b':' || time_part.as_bytes()[5] != b':' {
            return Err(TimestampParseError::new(format!(
                "invalid RFC 3339 datetime: {}",
                text
            )));
        }

        let hours = parse_component(&time_part[..2], 23, "hours", text)? as i64;
        let minutes = parse_component(&time_part[3..5], 59, "minutes", text)? as i64;
        let seconds = parse_component(&time_part[6..8], 59, "seconds", text)? as i64;

        // Optional fractional seconds, then the timezone suffix.
        let rest = &time_part[8..];
        let (fractional, offset_str) = split_fraction(rest);
        let offset_min = match offset_str {
            Some(s) => parse_timezone_offset(s)?,
            None => 0,
        };

        let micros = fraction_micros(fractional);
        let days = date_to_days(year, month, day) as i64;
        let local_us = days * MICROSECONDS_PER_DAY
            + hours * MICROSECONDS_PER_HOUR
            + minutes * MICROSECONDS_PER_MINUTE
            + seconds * MICROSECONDS_PER_SECOND
            + micros;

        // Local time = UTC + offset, so UTC = local - offset.
        let epoch_us = local_us - offset_min as i64 * MICROSECONDS_PER_MINUTE;

        Ok(Timestamp {
            epoch_us,
            offset_min,
        })
    }

    /// Formats this timestamp as an RFC 3339 datetime string.
    pub fn format(&self) -> String {
        let local_us = self.epoch_us + self.offset_min as i64 * MICROSECONDS_PER_MINUTE;
        let days = local_us.div_euclid(MICROSECONDS_PER_DAY);
        let time_us = local_us.rem_euclid(MICROSECONDS_PER_DAY);

        let (year, month, day) = days_to_date(days as i32);
        let hours = time_us / MICROSECONDS_PER_HOUR;
        let minutes = (time_us % MICROSECONDS_PER_HOUR) / MICROSECONDS_PER_MINUTE;
        let seconds = (time_us % MICROSECONDS_PER_MINUTE) / MICROSECONDS_PER_SECOND;
        let micros = time_us % MICROSECONDS_PER_SECOND;

        format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}{}{}",
            year,
            month,
            day,
            hours,
            minutes,
            seconds,
            format_fraction(micros),
            format_timezone_offset(self.offset_min)
        )
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format())
    }
}

/// Parses the `YYYY-MM-DD` prefix, validating calendar ranges.
fn parse_date_part(date: &str) -> Result<(i32, u32, u32), TimestampParseError> {
    let bytes = date.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return Err(TimestampParseError::new(format!(
            "invalid date in datetime: {}",
            date
        )));
    }

    let year: i32 = date[..4]
        .parse()
        .map_err(|_| TimestampParseError::new(format!("invalid year in datetime: {}", date)))?;
    let month: u32 = date[5..7]
        .parse()
        .map_err(|_| TimestampParseError::new(format!("invalid month in datetime: {}", date)))?;
    let day: u32 = date[8..10]
        .parse()
        .map_err(|_| TimestampParseError::new(format!("invalid day in datetime: {}", date)))?;

    if !(1..=12).contains(&month) {
        return Err(TimestampParseError::new(format!(
            "invalid month in datetime: {}",
            date
        )));
    }
    if day < 1 || day > days_in_month(year, month) {
        return Err(TimestampParseError::new(format!(
            "invalid day in datetime: {}",
            date
        )));
    }

    Ok((year, month, day))
}

/// Parses a two-digit time component and checks its upper bound.
fn parse_component(
    digits: &str,
    max: u32,
    what: &str,
    full: &str,
) -> Result<u32, TimestampParseError> {
    let value: u32 = digits
        .parse()
        .map_err(|_| TimestampParseError::new(format!("invalid {} in datetime: {}", what, full)))?;
    if value > max {
        return Err(TimestampParseError::new(format!(
            "invalid {} in datetime: {}",
            what, full
        )));
    }
    Ok(value)
}

/// Splits `[.ssssss][Z|+HH:MM]` into fraction digits and timezone suffix.
fn split_fraction(rest: &str) -> (Option<&str>, Option<&str>) {
    if let Some(after_dot) = rest.strip_prefix('.') {
        let frac_len = after_dot
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(after_dot.len());
        let frac = &after_dot[..frac_len];
        let tz = &after_dot[frac_len..];
        (Some(frac), (!tz.is_empty()).then_some(tz))
    } else if rest.is_empty() {
        (None, None)
    } else {
        (None, Some(rest))
    }
}

/// Converts fractional-second digits to microseconds (pad or truncate to 6).
fn fraction_micros(frac: Option<&str>) -> i64 {
    match frac {
        None => 0,
        Some(s) if s.is_empty() => 0,
        Some(s) => {
            let mut padded = s.to_string();
            while padded.len() < 6 {
                padded.push('0');
            }
            padded.truncate(6);
            padded.parse().unwrap_or(0)
        }
    }
}

/// Formats microseconds as fractional seconds, omitting trailing zeros.
fn format_fraction(us: i64) -> String {
    if us == 0 {
        return String::new();
    }
    let digits = format!("{:06}", us);
    format!(".{}", digits.trim_end_matches('0'))
}

/// Parses a timezone offset string (Z, +HH:MM, -HH:MM) to offset minutes.
fn parse_timezone_offset(offset: &str) -> Result<i16, TimestampParseError> {
    if offset == "Z" || offset == "z" {
        return Ok(0);
    }

    let invalid = || TimestampParseError::new(format!("invalid timezone offset: {}", offset));

    if offset.len() != 6 || offset.as_bytes()[3] != b':' {
        return Err(invalid());
    }
    let sign = match offset.as_bytes()[0] {
        b'+' => 1i16,
        b'-' => -1i16,
        _ => return Err(invalid()),
    };
    let hours: i16 = offset[1..3].parse().map_err(|_| invalid())?;
    let minutes: i16 = offset[4..6].parse().map_err(|_| invalid())?;
    if hours > 24 || (hours == 24 && minutes != 0) || minutes > 59 {
        return Err(invalid());
    }

    Ok(sign * (hours * 60 + minutes))
}

/// Formats offset minutes as a timezone string (Z, +HH:MM, -HH:MM).
fn format_timezone_offset(offset_min: i16) -> String {
    if offset_min == 0 {
        return "Z".to_string();
    }
    let sign = if offset_min >= 0 { '+' } else { '-' };
    let abs = offset_min.abs();
    format!("{}{:02}:{:02}", sign, abs / 60, abs % 60)
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

/// Days since the Unix epoch for a civil date (Howard Hinnant's algorithm).
fn date_to_days(year: i32, month: u32, day: u32) -> i32 {
    let y = if month <= 2 { year - 1 } else { year } as i64;
    let m = if month <= 2 {
        month as i64 + 9
    } else {
        month as i64 - 3
    };

    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = (y - era * 400) as u32;
    let doy = (153 * m as u32 + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;

    (era * 146097 + doe as i64 - 719468) as i32
}

/// Civil date for days since the Unix epoch (the inverse of [`date_to_days`]).
fn days_to_date(days: i32) -> (i32, u32, u32) {
    let z = days as i64 + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = (z - era * 146097) as u32;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };

    let year = if m <= 2 { y + 1 } else { y } as i32;
    (year, m, d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_utc() {
        let ts = Timestamp::parse("1970-01-01T00:00:00Z").unwrap();
        assert_eq!(ts.epoch_micros(), 0);
        assert_eq!(ts.offset_minutes(), 0);

        let ts = Timestamp::parse("1970-01-01T00:00:01Z").unwrap();
        assert_eq!(ts.epoch_micros(), 1_000_000);
    }

    #[test]
    fn test_parse_with_offset() {
        // 18:50:41 at -07:00 is 01:50:41 UTC the next day.
        let ts = Timestamp::parse("2013-05-10T18:50:41-07:00").unwrap();
        assert_eq!(ts.offset_minutes(), -420);
        let utc = Timestamp::parse("2013-05-11T01:50:41Z").unwrap();
        assert_eq!(ts.epoch_micros(), utc.epoch_micros());
    }

    #[test]
    fn test_parse_fractional_seconds() {
        let ts = Timestamp::parse("2020-06-15T12:00:00.5Z").unwrap();
        assert_eq!(ts.epoch_micros() % MICROSECONDS_PER_SECOND, 500_000);

        let ts = Timestamp::parse("2020-06-15T12:00:00.123456Z").unwrap();
        assert_eq!(ts.epoch_micros() % MICROSECONDS_PER_SECOND, 123_456);
    }

    #[test]
    fn test_format_roundtrip() {
        for text in [
            "2013-05-10T18:50:41-07:00",
            "1970-01-01T00:00:00Z",
            "1999-12-31T23:59:59+05:30",
            "2020-02-29T06:30:00.25Z",
            "1944-06-06T06:30:00Z",
        ] {
            let ts = Timestamp::parse(text).unwrap();
            assert_eq!(ts.format(), text, "failed for {}", text);
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for text in [
            "not-a-date",
            "",
            "2020-13-01T00:00:00Z",
            "2020-02-30T00:00:00Z",
            "2020-01-01T24:00:00Z",
            "2020-01-01T00:61:00Z",
            "2020-01-01 00:00",
            "2020-01-01T00:00:00+25:00",
        ] {
            assert!(Timestamp::parse(text).is_err(), "accepted {:?}", text);
        }
    }

    #[test]
    fn test_separator_variants() {
        assert!(Timestamp::parse("2020-01-01 12:00:00Z").is_ok());
        assert!(Timestamp::parse("2020-01-01t12:00:00Z").is_ok());
    }

    #[test]
    fn test_pre_epoch() {
        let ts = Timestamp::parse("1969-12-31T23:59:59Z").unwrap();
        assert_eq!(ts.epoch_micros(), -1_000_000);
        assert_eq!(ts.format(), "1969-12-31T23:59:59Z");
    }

    #[test]
    fn test_ordering() {
        let earlier = Timestamp::parse("2020-01-01T00:00:00Z").unwrap();
        let later = Timestamp::parse("2020-01-01T00:00:01Z").unwrap();
        assert!(earlier < later);
    }
}

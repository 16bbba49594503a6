//! Countdown arithmetic and start-time parsing.
//!
//! Timestamps are Unix epoch milliseconds. The display layer recomputes a
//! [`Breakdown`] once per second from the configured start time.

use serde::Serialize;

use crate::error::WaitroomError;

const MS_PER_SECOND: i64 = 1000;
const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// Largest year a `datetime-local` input accepts.
const MAX_YEAR: i64 = 275_760;

/// Remaining time split into display units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    pub days: u64,
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
    /// Remaining milliseconds, 0 once the target has passed.
    pub total_ms: u64,
}

impl Breakdown {
    /// Time left from `now_ms` until `target_ms`, clamped at zero.
    pub fn until(target_ms: i64, now_ms: i64) -> Breakdown {
        let remaining = target_ms.saturating_sub(now_ms);
        if remaining <= 0 {
            return Breakdown::default();
        }
        Breakdown {
            days: (remaining / MS_PER_DAY) as u64,
            hours: (remaining % MS_PER_DAY / MS_PER_HOUR) as u8,
            minutes: (remaining % MS_PER_HOUR / MS_PER_MINUTE) as u8,
            seconds: (remaining % MS_PER_MINUTE / MS_PER_SECOND) as u8,
            total_ms: remaining as u64,
        }
    }

    pub fn is_over(&self) -> bool {
        self.total_ms == 0
    }

    pub fn show_days(&self) -> bool {
        self.days > 0
    }

    pub fn show_hours(&self) -> bool {
        self.hours > 0 || self.days > 0
    }

    /// `"1d 02:03:04"`, `"02:03:04"`, `"03:04"`; seconds are dropped when
    /// `show_seconds` is false.
    pub fn clock_text(&self, show_seconds: bool) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(3);
        if self.show_hours() {
            parts.push(format!("{:02}", self.hours));
        }
        parts.push(format!("{:02}", self.minutes));
        if show_seconds {
            parts.push(format!("{:02}", self.seconds));
        }
        let clock = parts.join(":");
        if self.show_days() {
            format!("{}d {clock}", self.days)
        } else {
            clock
        }
    }
}

/// Parse a `datetime-local` value (`YYYY-MM-DDTHH:MM[:SS]`) in a zone
/// `utc_offset_minutes` east of UTC.
pub fn parse_start_time(text: &str, utc_offset_minutes: i32) -> Result<i64, WaitroomError> {
    let invalid = || WaitroomError::InvalidStartTime {
        text: text.to_string(),
    };

    let (date, time) = text.trim().split_once(['T', ' ']).ok_or_else(invalid)?;

    let mut date_parts = date.splitn(3, '-');
    let year: i64 = field(date_parts.next()).ok_or_else(invalid)?;
    let month: u32 = field(date_parts.next()).ok_or_else(invalid)?;
    let day: u32 = field(date_parts.next()).ok_or_else(invalid)?;

    let mut time_parts = time.splitn(3, ':');
    let hour: u32 = field(time_parts.next()).ok_or_else(invalid)?;
    let minute: u32 = field(time_parts.next()).ok_or_else(invalid)?;
    let second: u32 = match time_parts.next() {
        // Browsers may append fractional seconds.
        Some(s) => field(s.split('.').next()).ok_or_else(invalid)?,
        None => 0,
    };

    if year > MAX_YEAR
        || !(1..=12).contains(&month)
        || day == 0
        || day > days_in_month(year, month)
        || hour > 23
        || minute > 59
        || second > 59
    {
        return Err(invalid());
    }

    let days = days_from_civil(year, month, day);
    let local_ms = days * MS_PER_DAY
        + hour as i64 * MS_PER_HOUR
        + minute as i64 * MS_PER_MINUTE
        + second as i64 * MS_PER_SECOND;
    Ok(local_ms - utc_offset_minutes as i64 * MS_PER_MINUTE)
}

/// Format epoch milliseconds as a `datetime-local` value (minute precision).
pub fn format_start_time(epoch_ms: i64, utc_offset_minutes: i32) -> String {
    let local = epoch_ms.saturating_add(utc_offset_minutes as i64 * MS_PER_MINUTE);
    let days = local.div_euclid(MS_PER_DAY);
    let in_day = local.rem_euclid(MS_PER_DAY);
    let (year, month, day) = civil_from_days(days);
    format!(
        "{year:04}-{month:02}-{day:02}T{:02}:{:02}",
        in_day / MS_PER_HOUR,
        in_day % MS_PER_HOUR / MS_PER_MINUTE
    )
}

fn field<T: std::str::FromStr>(s: Option<&str>) -> Option<T> {
    let s = s?;
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn is_leap(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: i64, month: u32) -> u32 {
    match month {
        2 if is_leap(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Days since 1970-01-01 (Howard Hinnant's algorithm).
fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let m = month as i64;
    let mp = if m > 2 { m - 3 } else { m + 9 };
    let doy = (153 * mp + 2) / 5 + day as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + if month <= 2 { 1 } else { 0 };
    (year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_hour_one_minute_one_second() {
        let now = 1_700_000_000_000;
        let b = Breakdown::until(now + 3661 * 1000, now);
        assert_eq!((b.days, b.hours, b.minutes, b.seconds), (0, 1, 1, 1));
        assert_eq!(b.total_ms, 3_661_000);
        assert!(!b.is_over());
    }

    #[test]
    fn past_target_is_all_zeros() {
        let now = 1_700_000_000_000;
        assert_eq!(Breakdown::until(now - 5000, now), Breakdown::default());
        assert_eq!(Breakdown::until(now, now), Breakdown::default());
        assert!(Breakdown::until(now - 1, now).is_over());
    }

    #[test]
    fn partial_seconds_round_down() {
        let b = Breakdown::until(1999, 0);
        assert_eq!(b.seconds, 1);
        assert_eq!(b.total_ms, 1999);
    }

    #[test]
    fn multi_day_breakdown() {
        let remaining = 2 * MS_PER_DAY + 3 * MS_PER_HOUR + 4 * MS_PER_MINUTE + 5 * MS_PER_SECOND;
        let b = Breakdown::until(remaining, 0);
        assert_eq!((b.days, b.hours, b.minutes, b.seconds), (2, 3, 4, 5));
    }

    #[test]
    fn clock_text_follows_visible_units() {
        let b = Breakdown::until(2 * MS_PER_DAY + 3 * MS_PER_HOUR + 4 * MS_PER_MINUTE + 5000, 0);
        assert_eq!(b.clock_text(true), "2d 03:04:05");
        assert_eq!(b.clock_text(false), "2d 03:04");

        let b = Breakdown::until(4 * MS_PER_MINUTE + 5000, 0);
        assert_eq!(b.clock_text(true), "04:05");
        assert_eq!(Breakdown::default().clock_text(true), "00:00");
    }

    #[test]
    fn parses_datetime_local() {
        assert_eq!(parse_start_time("1970-01-01T00:00", 0).expect("epoch"), 0);
        assert_eq!(
            parse_start_time("2024-02-29T12:30:15", 0).expect("leap day"),
            1_709_209_815_000
        );
        // 12:00 in UTC+2 is 10:00 UTC.
        assert_eq!(
            parse_start_time("1970-01-02T12:00", 120).expect("offset"),
            MS_PER_DAY + 10 * MS_PER_HOUR
        );
    }

    #[test]
    fn rejects_malformed_start_times() {
        for text in [
            "",
            "2024-13-01T10:00",
            "2023-02-29T10:00",
            "2024-01-01",
            "2024-01-01T24:00",
            "2024-01-01Tab:cd",
            "275761-01-01T00:00",
            "999999999-01-01T00:00",
            "99999999999999999999-01-01T00:00",
        ] {
            assert!(
                matches!(parse_start_time(text, 0), Err(WaitroomError::InvalidStartTime { .. })),
                "accepted {text:?}"
            );
        }
    }

    #[test]
    fn latest_browser_year_is_accepted() {
        let ms = parse_start_time("275760-09-13T00:00", 0).expect("max year");
        assert_eq!(ms, 8_640_000_000_000_000);
    }

    #[test]
    fn format_round_trips_parse() {
        for text in ["2026-10-19T18:45", "1999-12-31T23:59", "2000-03-01T00:00"] {
            let ms = parse_start_time(text, 180).expect("parse");
            assert_eq!(format_start_time(ms, 180), text);
        }
    }
}

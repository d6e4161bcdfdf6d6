//! Conversion between local wall-clock times and UTC instants.
//!
//! Offsets are always looked up in the IANA database for the specific date
//! being converted, never cached per zone, so DST transitions are honoured.

use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone,
    Timelike, Utc,
};
use chrono_tz::Tz;
use tracing::debug;

use crate::error::{SchedulingError, SchedulingResult};

pub const MINUTES_PER_DAY: u32 = 24 * 60;

// Widest UTC offset either side of zero in the IANA database (+14:00, -12:00)
const MAX_OFFSET_HOURS: i64 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayFormat {
    Time,
    Date,
}

// Split "H:MM" / "HH:MM" into hour and minute digits
fn split_clock(clock: &str) -> Option<(u32, u32)> {
    let (hour, minute) = clock.split_once(':')?;
    let digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());

    if !digits(hour) || hour.len() > 2 || !digits(minute) || minute.len() != 2 {
        return None;
    }

    Some((hour.parse().ok()?, minute.parse().ok()?))
}

// "9:00 AM", "09:00am", "12:30 pm"
fn parse_twelve_hour(raw: &str) -> Option<u32> {
    let upper = raw.trim().to_ascii_uppercase();
    let (clock, is_pm) = if let Some(rest) = upper.strip_suffix("AM") {
        (rest, false)
    } else if let Some(rest) = upper.strip_suffix("PM") {
        (rest, true)
    } else {
        return None;
    };

    let (hour, minute) = split_clock(clock.trim_end())?;
    if !(1..=12).contains(&hour) || minute > 59 {
        return None;
    }

    let hour = match (hour, is_pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, false) => h,
        (h, true) => h + 12,
    };

    Some(hour * 60 + minute)
}

// Legacy "HH:MM" 24-hour strings
fn parse_twenty_four_hour(raw: &str) -> Option<u32> {
    let (hour, minute) = split_clock(raw.trim())?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some(hour * 60 + minute)
}

/// Parse a 12-hour "H:MM AM/PM" string (case-insensitive) into minutes past
/// midnight.
pub fn parse_time_of_day(time: &str) -> SchedulingResult<u32> {
    parse_twelve_hour(time).ok_or_else(|| SchedulingError::InvalidTimeFormat(time.to_string()))
}

/// Parse a wall-clock string in either 12-hour or legacy 24-hour form into
/// minutes past midnight.
pub fn parse_wall_clock(time: &str) -> SchedulingResult<u32> {
    parse_twelve_hour(time)
        .or_else(|| parse_twenty_four_hour(time))
        .ok_or_else(|| SchedulingError::InvalidTimeFormat(time.to_string()))
}

/// Format minutes past midnight as "H:MM AM/PM".
pub fn format_wall_clock(minute_of_day: u32) -> String {
    let minute_of_day = minute_of_day % MINUTES_PER_DAY;
    let hour = minute_of_day / 60;
    let minute = minute_of_day % 60;
    let meridiem = if hour < 12 { "AM" } else { "PM" };
    let display_hour = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:{:02} {}", display_hour, minute, meridiem)
}

/// Canonical 12-hour rendering of any accepted wall-clock string.
pub fn canonical_time(time: &str) -> SchedulingResult<String> {
    parse_wall_clock(time).map(format_wall_clock)
}

pub fn parse_timezone(timezone: &str) -> SchedulingResult<Tz> {
    timezone
        .parse::<Tz>()
        .map_err(|_| SchedulingError::InvalidTimezone(timezone.to_string()))
}

// Resolve a naive local datetime in `tz` to UTC.
// Ambiguous times (fall back) take the earlier instant; times inside a
// spring-forward gap use the offset in force before the gap.
fn resolve_local(tz: &Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(local) => local.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => {
            let before_gap = naive - Duration::hours(24);
            let offset_secs = tz.offset_from_utc_datetime(&before_gap).fix().local_minus_utc();
            debug!(
                "Local time {} does not exist in {}, applying pre-transition offset {}s",
                naive, tz, offset_secs
            );
            Utc.from_utc_datetime(&(naive - Duration::seconds(i64::from(offset_secs))))
        }
    }
}

/// Convert a local date and "H:MM AM/PM" time in `timezone` to a UTC instant.
pub fn to_utc(date: NaiveDate, time: &str, timezone: &str) -> SchedulingResult<DateTime<Utc>> {
    let minutes = parse_time_of_day(time)?;
    let tz = parse_timezone(timezone)?;
    let naive = date
        .and_hms_opt(minutes / 60, minutes % 60, 0)
        .ok_or_else(|| SchedulingError::InvalidTimeFormat(time.to_string()))?;

    let instant = resolve_local(&tz, naive);
    debug!(
        "Converted {} {} ({}) to {}",
        date,
        time,
        timezone,
        instant.to_rfc3339()
    );
    Ok(instant)
}

/// End of a session lasting `duration_minutes` from `start_utc`.
///
/// Durations that push the end past the representable range are a
/// `Validation` error.
pub fn calculate_end_utc(
    start_utc: DateTime<Utc>,
    duration_minutes: i64,
) -> SchedulingResult<DateTime<Utc>> {
    Duration::try_minutes(duration_minutes)
        .and_then(|duration| start_utc.checked_add_signed(duration))
        .ok_or_else(|| {
            SchedulingError::Validation(format!(
                "duration of {} minutes is out of range",
                duration_minutes
            ))
        })
}

/// UTC range holding every instant that falls on `date` in some timezone.
///
/// The start is inclusive and the end exclusive.
pub fn date_window_utc(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let midnight = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
    let margin = Duration::hours(MAX_OFFSET_HOURS);
    let start = midnight
        .checked_sub_signed(margin)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let end = midnight
        .checked_add_signed(Duration::days(1) + margin)
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    (start, end)
}

/// Render an instant in `timezone` as a wall-clock time ("3:00 PM") or a
/// date ("Thu, Jun 12, 2025").
pub fn format_for_display(
    instant_utc: DateTime<Utc>,
    timezone: &str,
    format: DisplayFormat,
) -> SchedulingResult<String> {
    let tz = parse_timezone(timezone)?;
    let local = instant_utc.with_timezone(&tz);

    Ok(match format {
        DisplayFormat::Time => format_wall_clock(local.hour() * 60 + local.minute()),
        DisplayFormat::Date => local.format("%a, %b %-d, %Y").to_string(),
    })
}

/// Calendar date of an instant as seen in `timezone`.
pub fn local_date(instant_utc: DateTime<Utc>, timezone: &str) -> SchedulingResult<NaiveDate> {
    let tz = parse_timezone(timezone)?;
    Ok(instant_utc.with_timezone(&tz).date_naive())
}

/// UTC offset of `timezone` on `date`, formatted "+HH:MM" / "-HH:MM".
///
/// The offset is evaluated at local noon, which is clear of every DST
/// transition in the IANA database.
pub fn offset_for(date: NaiveDate, timezone: &str) -> SchedulingResult<String> {
    let tz = parse_timezone(timezone)?;
    let noon = date
        .and_hms_opt(12, 0, 0)
        .ok_or_else(|| SchedulingError::Validation(format!("invalid date {}", date)))?;

    let offset_secs = match tz.from_local_datetime(&noon).earliest() {
        Some(local) => local.offset().fix().local_minus_utc(),
        None => tz.offset_from_utc_datetime(&noon).fix().local_minus_utc(),
    };

    let sign = if offset_secs >= 0 { '+' } else { '-' };
    let abs_secs = offset_secs.unsigned_abs();
    Ok(format!(
        "{}{:02}:{:02}",
        sign,
        abs_secs / 3600,
        (abs_secs % 3600) / 60
    ))
}

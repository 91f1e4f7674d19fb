///! Time-window filtering for schedule entries
///!
///! Decides which entries participate in a comparison cycle: everything
///! from today through `horizon_days` ahead, with a one-hour look-back
///! grace for today's bookings so in-progress ice times and small clock
///! skews do not show up as spurious removals.

use super::types::ScheduleEntry;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

pub const DEFAULT_HORIZON_DAYS: i64 = 7;

/// Look-back applied to today's entries before they age out.
const SAME_DAY_GRACE_HOURS: i64 = 1;

/// Parse a calendar date in the `YYYY-MM-DD` form the API uses.
pub fn parse_entry_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Parse a wall-clock time, accepting both `HH:MM` and `HH:MM:SS`.
/// The upstream feed is not consistent about granularity.
pub fn parse_entry_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

/// Return the entries relevant for comparison as of `now`.
///
/// - dates strictly after today up to `today + horizon_days` inclusive
///   are always retained;
/// - today's entries are retained while their start instant is later
///   than `now` minus the one-hour grace; if the start time is absent
///   or unparseable the entry is retained anyway, since dropping data
///   on malformed input would surface as a false removal;
/// - entries dated in the past or beyond the horizon are dropped;
/// - entries whose date cannot be parsed are dropped with a warning.
pub fn filter_next_days(
    entries: &[ScheduleEntry],
    horizon_days: i64,
    now: NaiveDateTime,
) -> Vec<ScheduleEntry> {
    let today = now.date();
    let end_date = today + Duration::days(horizon_days);

    let mut filtered = Vec::new();
    for entry in entries {
        let Some(date) = parse_entry_date(&entry.date) else {
            tracing::warn!(
                "Dropping entry with unparseable date '{}' ({} {})",
                entry.date,
                entry.schedule_type,
                entry.league
            );
            continue;
        };

        if date > today && date <= end_date {
            filtered.push(entry.clone());
        } else if date == today {
            match parse_entry_time(&entry.start_time) {
                Some(start) => {
                    let starts_at = date.and_time(start);
                    if starts_at > now - Duration::hours(SAME_DAY_GRACE_HOURS) {
                        filtered.push(entry.clone());
                    }
                }
                // Fail open: no usable start time, keep the entry.
                None => filtered.push(entry.clone()),
            }
        }
    }

    filtered
}

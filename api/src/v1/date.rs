//! Calendar-day helpers.
//!
//! Dates without a time component are pinned to local noon before being turned
//! into timestamps, so a day never drifts to its neighbour when converted
//! between time zones.

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};

/// Today's calendar day in the local time zone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// The local calendar day an instant falls on.
pub fn local_day(at: DateTime<Utc>) -> NaiveDate {
    at.with_timezone(&Local).date_naive()
}

/// Parses `YYYY-MM-DD`, or an RFC 3339 timestamp which is mapped onto its
/// local calendar day. Returns `None` for anything else.
pub fn parse_day(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    if let Ok(day) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(day);
    }

    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|at| local_day(at.with_timezone(&Utc)))
}

/// Noon of `day` in the local time zone.
pub fn local_noon(day: NaiveDate) -> Option<DateTime<Utc>> {
    let noon = day.and_hms_opt(12, 0, 0)?;
    Local
        .from_local_datetime(&noon)
        .earliest()
        .map(|at| at.with_timezone(&Utc))
}

/// Parses a due or target date. Unparseable input yields `None`, i.e. "no
/// date", rather than an error.
pub fn parse_local_noon(value: &str) -> Option<DateTime<Utc>> {
    parse_day(value).and_then(local_noon)
}

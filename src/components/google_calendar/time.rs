use super::models::CalendarEvent;
use crate::error::{google_calendar_error, TollResult};
use crate::utils::time::CANONICAL_DATE_FORMAT;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::debug;

/// The two shapes an event start comes in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStart {
    /// `start.dateTime`, e.g. `2023-03-02T08:00:00-05:00`
    Timestamped(NaiveDateTime),
    /// `start.date` of an all-day event, e.g. `2023-03-02`
    DateOnly(NaiveDate),
}

impl EventStart {
    /// Calendar day of the start
    pub fn date(&self) -> NaiveDate {
        match self {
            EventStart::Timestamped(dt) => dt.date(),
            EventStart::DateOnly(date) => *date,
        }
    }
}

/// Classify an event start.
///
/// `start.dateTime` is tried first. When it is absent or unparseable the
/// bare `start.date` is used instead.
pub fn classify_start(event: &CalendarEvent) -> TollResult<EventStart> {
    let timestamp_err = match &event.start_date_time {
        Some(timestamp) => match parse_timestamp(timestamp) {
            Ok(dt) => return Ok(EventStart::Timestamped(dt)),
            Err(e) => Some(e),
        },
        None => None,
    };

    match (&event.start_date, timestamp_err) {
        (Some(date), err) => {
            if let Some(err) = err {
                debug!(event = %event.id, "Falling back to start date: {}", err);
            }
            parse_date(date).map(EventStart::DateOnly)
        }
        (None, Some(err)) => Err(err),
        (None, None) => Err(google_calendar_error(&format!(
            "Event {} has no start date",
            event.id
        ))),
    }
}

/// Parse a `T`-separated timestamp as wall-clock time, ignoring any offset.
///
/// Only the date part has to be valid; a time of day that is not `HH:MM:SS`
/// or `HH:MM` reads as midnight.
fn parse_timestamp(timestamp: &str) -> TollResult<NaiveDateTime> {
    let (date, time) = timestamp
        .split_once('T')
        .ok_or_else(|| google_calendar_error(&format!("Malformed timestamp: {}", timestamp)))?;

    let date = parse_date(date)?;
    let time = time
        .get(..8)
        .and_then(|hms| NaiveTime::parse_from_str(hms, "%H:%M:%S").ok())
        .or_else(|| {
            time.get(..5)
                .and_then(|hm| NaiveTime::parse_from_str(hm, "%H:%M").ok())
        })
        .unwrap_or(NaiveTime::MIN);

    Ok(date.and_time(time))
}

fn parse_date(date: &str) -> TollResult<NaiveDate> {
    NaiveDate::parse_from_str(date, CANONICAL_DATE_FORMAT)
        .map_err(|e| google_calendar_error(&format!("Failed to parse date '{}': {}", date, e)))
}

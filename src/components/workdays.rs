use crate::components::google_calendar::{classify_start, CalendarEvent};
use crate::error::{Error, TollResult};
use crate::utils::time::canonical_date;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Canonical `YYYY-MM-DD` dates worked
pub type WorkdaySet = BTreeSet<String>;

/// Whether the event summary contains the keyword, ignoring case
pub fn is_workday_event(event: &CalendarEvent, keyword: &str) -> bool {
    let keyword = keyword.to_lowercase();
    event
        .summary
        .as_deref()
        .is_some_and(|summary| summary.to_lowercase().contains(&keyword))
}

/// Collect the dates of keyword-tagged events.
///
/// Events whose start cannot be parsed are skipped with a warning. An empty
/// result is an error since there is nothing to reconcile against.
pub fn extract_workdays(events: &[CalendarEvent], keyword: &str) -> TollResult<WorkdaySet> {
    let mut workdays = WorkdaySet::new();

    for event in events.iter().filter(|e| is_workday_event(e, keyword)) {
        match classify_start(event) {
            Ok(start) => {
                debug!(event = %event.id, ?start, "Matched work day event");
                workdays.insert(canonical_date(start.date()));
            }
            Err(e) => warn!(event = %event.id, "Skipping work day event: {}", e),
        }
    }

    if workdays.is_empty() {
        return Err(Error::NoWorkdays);
    }

    Ok(workdays)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(summary: Option<&str>, date_time: Option<&str>, date: Option<&str>) -> CalendarEvent {
        CalendarEvent {
            id: summary.unwrap_or("untitled").to_string(),
            summary: summary.map(str::to_string),
            start_date_time: date_time.map(str::to_string),
            start_date: date.map(str::to_string),
        }
    }

    #[test]
    fn test_keyword_is_case_insensitive_substring() {
        assert!(is_workday_event(&event(Some("NELC shift"), None, None), "nelc"));
        assert!(is_workday_event(&event(Some("Drive to nelc"), None, None), "NELC"));
        assert!(is_workday_event(&event(Some("xNeLcx"), None, None), "nelc"));
        assert!(!is_workday_event(&event(Some("Dentist"), None, None), "nelc"));
        assert!(!is_workday_event(&event(None, None, None), "nelc"));
    }

    #[test]
    fn test_extract_both_start_shapes() {
        let events = vec![
            event(Some("NELC"), Some("2023-03-02T08:00:00-05:00"), None),
            event(Some("nelc all day"), None, Some("2023-03-09")),
            event(Some("Lunch"), Some("2023-03-10T12:00:00-05:00"), None),
            // Two events on the same day collapse into one work day
            event(Some("NELC late"), Some("2023-03-02T18:00:00-05:00"), None),
        ];

        let workdays = extract_workdays(&events, "nelc").unwrap();
        let days: Vec<_> = workdays.iter().map(String::as_str).collect();
        assert_eq!(days, vec!["2023-03-02", "2023-03-09"]);
    }

    #[test]
    fn test_malformed_event_is_skipped() {
        let events = vec![
            event(Some("NELC"), Some("not a timestamp"), None),
            event(Some("NELC"), None, None),
            event(Some("NELC"), None, Some("2023-03-14")),
        ];

        let workdays = extract_workdays(&events, "nelc").unwrap();
        assert_eq!(workdays.len(), 1);
        assert!(workdays.contains("2023-03-14"));
    }

    #[test]
    fn test_unparseable_timestamp_uses_start_date() {
        let events = vec![event(Some("NELC"), Some("garbage"), Some("2023-03-09"))];

        let workdays = extract_workdays(&events, "nelc").unwrap();
        let days: Vec<_> = workdays.iter().map(String::as_str).collect();
        assert_eq!(days, vec!["2023-03-09"]);
    }

    #[test]
    fn test_no_workdays_is_error() {
        let events = vec![event(Some("Dentist"), None, Some("2023-03-01"))];
        assert!(matches!(
            extract_workdays(&events, "nelc"),
            Err(Error::NoWorkdays)
        ));
        assert!(matches!(extract_workdays(&[], "nelc"), Err(Error::NoWorkdays)));
    }
}

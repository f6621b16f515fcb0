use serde_json::Value;

/// Simplified calendar event representation
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Default, PartialEq)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: Option<String>,
    pub start_date_time: Option<String>,
    pub start_date: Option<String>,
}

impl CalendarEvent {
    /// Build an event from one entry of the API's `items` array
    pub fn from_json(event: &Value) -> Self {
        let id = event.get("id").and_then(|id| id.as_str()).unwrap_or("").to_string();
        let summary = event.get("summary").and_then(|s| s.as_str()).map(|s| s.to_string());

        let start = event.get("start").and_then(|start| start.as_object());

        let start_date_time = start
            .and_then(|start| start.get("dateTime"))
            .and_then(|dt| dt.as_str())
            .map(|s| s.to_string());

        let start_date = start
            .and_then(|start| start.get("date"))
            .and_then(|d| d.as_str())
            .map(|s| s.to_string());

        CalendarEvent {
            id,
            summary,
            start_date_time,
            start_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_timed_event() {
        let event = CalendarEvent::from_json(&json!({
            "id": "abc",
            "summary": "NELC shift",
            "start": { "dateTime": "2023-03-02T08:00:00-05:00", "timeZone": "America/New_York" }
        }));

        assert_eq!(event.id, "abc");
        assert_eq!(event.summary.as_deref(), Some("NELC shift"));
        assert_eq!(event.start_date_time.as_deref(), Some("2023-03-02T08:00:00-05:00"));
        assert_eq!(event.start_date, None);
    }

    #[test]
    fn test_from_json_all_day_event_without_summary() {
        let event = CalendarEvent::from_json(&json!({
            "id": "def",
            "start": { "date": "2023-03-09" }
        }));

        assert_eq!(event.summary, None);
        assert_eq!(event.start_date_time, None);
        assert_eq!(event.start_date.as_deref(), Some("2023-03-09"));
    }
}

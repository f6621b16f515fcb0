#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use toll_reconciler::components::google_calendar::CalendarEvent;
use toll_reconciler::components::{EventSource, StatementSource};
use toll_reconciler::error::TollResult;

/// Mock calendar returning predefined events
#[derive(Debug, Default)]
pub struct MockEventSource {
    events: Vec<CalendarEvent>,
    pub requests: Mutex<Vec<(String, DateTime<Utc>, DateTime<Utc>)>>,
}

impl MockEventSource {
    pub fn new(events: Vec<CalendarEvent>) -> Self {
        Self {
            events,
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl EventSource for MockEventSource {
    async fn list_events(
        &self,
        calendar_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> TollResult<Vec<CalendarEvent>> {
        self.requests
            .lock()
            .unwrap()
            .push((calendar_id.to_string(), start, end));
        Ok(self.events.clone())
    }
}

/// Mock statement returning fixed markup and counting calls
#[derive(Debug, Default)]
pub struct MockStatementSource {
    html: String,
    calls: AtomicUsize,
}

impl MockStatementSource {
    pub fn new(html: &str) -> Self {
        Self {
            html: html.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatementSource for MockStatementSource {
    async fn fetch_statement_table_html(&self) -> TollResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.html.clone())
    }
}

/// Timed event helper
pub fn timed_event(id: &str, summary: &str, date_time: &str) -> CalendarEvent {
    CalendarEvent {
        id: id.to_string(),
        summary: Some(summary.to_string()),
        start_date_time: Some(date_time.to_string()),
        start_date: None,
    }
}

/// All-day event helper
pub fn all_day_event(id: &str, summary: &str, date: &str) -> CalendarEvent {
    CalendarEvent {
        id: id.to_string(),
        summary: Some(summary.to_string()),
        start_date_time: None,
        start_date: Some(date.to_string()),
    }
}

/// March 2023 statement used across tests
pub const MARCH_STATEMENT: &str = r#"
<table class="table table-striped">
  <thead>
    <tr>
      <th>Transaction Date/Time</th>
      <th>Transponder</th>
      <th>Description</th>
      <th>Amount</th>
    </tr>
  </thead>
  <tbody>
    <tr><td>03/09/2023 05:31:07 PM</td><td>0123</td><td>TOLL - Hooksett Plaza</td><td>$  0.75</td></tr>
    <tr><td>03/01/2023 07:40:12 AM</td><td>0123</td><td>TOLL - Bedford Plaza</td><td>$  1.00</td></tr>
    <tr><td>03/02/2023 07:38:55 AM</td><td>0123</td><td>TOLL - Bedford Plaza</td><td>$  2.50</td></tr>
    <tr><td>03/15/2023 12:00:00 PM</td><td></td><td>PAYMENT - Thank you</td><td>$  0.00</td></tr>
    <tr><td>04/02/2023 07:38:55 AM</td><td>0123</td><td>TOLL - Bedford Plaza</td><td>$  2.50</td></tr>
  </tbody>
</table>
"#;

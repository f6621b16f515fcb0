use crate::components::google_calendar::CalendarEvent;
use crate::error::TollResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

// Export components
pub mod google_calendar;
pub mod report;
pub mod toll_portal;
pub mod workdays;

/// Source of calendar events
#[async_trait]
pub trait EventSource: Send + Sync {
    /// List events starting in `[start, end)`
    async fn list_events(
        &self,
        calendar_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> TollResult<Vec<CalendarEvent>>;
}

/// Source of the statement table markup
#[async_trait]
pub trait StatementSource: Send + Sync {
    /// Fetch the statement table markup in one all-or-nothing call
    async fn fetch_statement_table_html(&self) -> TollResult<String>;
}

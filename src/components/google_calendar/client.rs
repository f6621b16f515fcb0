use super::models::CalendarEvent;
use super::token::TokenManager;
use crate::components::EventSource;
use crate::config::Config;
use crate::error::{google_calendar_error, TollResult};
use crate::utils::time::rfc3339_utc;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use tracing::debug;
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Where the access token comes from
#[derive(Clone)]
enum Credentials {
    Managed(TokenManager),
    Static(String),
}

/// Google Calendar events API client
#[derive(Clone)]
pub struct GoogleCalendarClient {
    client: Client,
    credentials: Credentials,
    api_base: String,
    max_results: u32,
}

impl GoogleCalendarClient {
    /// Client authenticated through the cached token file
    pub fn new(config: &Config) -> Self {
        let client = Client::new();
        Self {
            credentials: Credentials::Managed(TokenManager::with_client(config, client.clone())),
            client,
            api_base: DEFAULT_API_BASE.to_string(),
            max_results: config.max_results,
        }
    }

    /// Client with a fixed access token and API base, used against test servers
    pub fn with_access_token(api_base: &str, access_token: &str, max_results: u32) -> Self {
        Self {
            client: Client::new(),
            credentials: Credentials::Static(access_token.to_string()),
            api_base: api_base.trim_end_matches('/').to_string(),
            max_results,
        }
    }

    async fn access_token(&self) -> TollResult<String> {
        match &self.credentials {
            Credentials::Managed(tokens) => tokens.access_token().await,
            Credentials::Static(token) => Ok(token.clone()),
        }
    }

    fn events_url(
        &self,
        calendar_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> TollResult<Url> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| google_calendar_error(&format!("Failed to parse URL: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| google_calendar_error("API base URL cannot have a path"))?
            .extend(["calendars", calendar_id, "events"]);

        url.query_pairs_mut()
            .append_pair("timeMin", &rfc3339_utc(start))
            .append_pair("timeMax", &rfc3339_utc(end))
            .append_pair("maxResults", &self.max_results.to_string())
            .append_pair("singleEvents", "true")
            .append_pair("orderBy", "startTime");

        Ok(url)
    }
}

#[async_trait]
impl EventSource for GoogleCalendarClient {
    async fn list_events(
        &self,
        calendar_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> TollResult<Vec<CalendarEvent>> {
        let access_token = self.access_token().await?;
        let url = self.events_url(calendar_id, start, end)?;
        debug!("Fetching events from {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to fetch events: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(google_calendar_error(&format!(
                "Failed to fetch events: HTTP {} - {}",
                status, error_body
            )));
        }

        let response_data: serde_json::Value = response.json().await.map_err(|e| {
            google_calendar_error(&format!("Failed to parse events response: {}", e))
        })?;

        // An empty calendar omits `items`
        let events = response_data
            .get("items")
            .and_then(|i| i.as_array())
            .map(|items| items.iter().map(CalendarEvent::from_json).collect())
            .unwrap_or_default();

        Ok(events)
    }
}

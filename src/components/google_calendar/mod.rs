//! Google Calendar access: OAuth token handling and the events list query.

pub mod auth;
mod client;
pub mod models;
pub mod time;
pub mod token;

pub use client::{GoogleCalendarClient, DEFAULT_API_BASE};
pub use models::CalendarEvent;
pub use time::{classify_start, EventStart};
pub use token::{ClientSecrets, StoredToken, TokenManager};

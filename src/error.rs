use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Environment error: {0}")]
    #[diagnostic(code(toll_reconciler::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(toll_reconciler::config))]
    Config(String),

    #[error("Google Calendar API error: {0}")]
    #[diagnostic(code(toll_reconciler::google_calendar))]
    GoogleCalendar(String),

    #[error("Authorization error: {0}")]
    #[diagnostic(
        code(toll_reconciler::auth),
        help("Delete the token file and run `authorize_calendar` to sign in again")
    )]
    Auth(String),

    #[error("Toll portal error: {0}")]
    #[diagnostic(code(toll_reconciler::portal))]
    Portal(String),

    #[error("Statement error: {0}")]
    #[diagnostic(code(toll_reconciler::statement))]
    Statement(String),

    #[error("Statement table has no '{0}' column")]
    #[diagnostic(code(toll_reconciler::missing_column))]
    MissingColumn(String),

    #[error("No work days found for the requested month.")]
    #[diagnostic(
        code(toll_reconciler::no_workdays),
        help("Check that the calendar events for this month contain the workday keyword")
    )]
    NoWorkdays,

    #[error("Invalid month '{0}', expected a number from 1 to 12")]
    #[diagnostic(code(toll_reconciler::invalid_month))]
    InvalidMonth(String),

    #[error("Report error: {0}")]
    #[diagnostic(code(toll_reconciler::report))]
    Report(String),

    #[error(transparent)]
    #[diagnostic(code(toll_reconciler::io))]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    #[diagnostic(code(toll_reconciler::http))]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(toll_reconciler::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(toll_reconciler::other))]
    Other(String),
}

// Implement From for TOML deserialization errors
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for Error {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Error::Report(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type TollResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(message: &str) -> Error {
    Error::Environment(message.to_string())
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create Google Calendar errors
pub fn google_calendar_error(message: &str) -> Error {
    Error::GoogleCalendar(message.to_string())
}

/// Helper to create authorization errors
pub fn auth_error(message: &str) -> Error {
    Error::Auth(message.to_string())
}

/// Helper to create toll portal errors
pub fn portal_error(message: &str) -> Error {
    Error::Portal(message.to_string())
}

/// Helper to create statement parsing errors
pub fn statement_error(message: &str) -> Error {
    Error::Statement(message.to_string())
}

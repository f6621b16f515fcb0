use crate::components::toll_portal::PrefixRules;
use crate::error::{config_error, env_error, TollResult};
use chrono::{Datelike, Local};
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default location of the optional settings file
pub const DEFAULT_CONFIG_FILE: &str = "config/tolls.toml";

/// Default OAuth scope for the calendar API
pub const DEFAULT_CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

/// Default portal landing page holding the login form
pub const DEFAULT_PORTAL_URL: &str = "https://www.ezpassnh.com";

/// Default statement page
pub const DEFAULT_STATEMENT_URL: &str =
    "https://www.ezpassnh.com/account/statement-and-activity/statement";

/// Main configuration structure
#[derive(Debug, Clone)]
pub struct Config {
    /// Google Calendar ID to read work days from
    pub calendar_id: String,
    /// Installed-app client secrets downloaded from the Google console
    pub client_secrets_path: PathBuf,
    /// Cached OAuth token
    pub token_path: PathBuf,
    /// OAuth scope requested during authorization
    pub calendar_scope: String,
    /// Result cap for the events query
    pub max_results: u32,
    /// Loopback port for the OAuth redirect
    pub redirect_port: u16,
    /// Case-insensitive keyword marking a work day event
    pub workday_keyword: String,
    /// Year the requested month belongs to
    pub year: i32,
    /// Portal landing page holding the login form
    pub portal_url: String,
    /// Statement page holding the transaction table
    pub statement_url: String,
    pub portal_username: Option<String>,
    pub portal_password: Option<String>,
    /// Read the statement markup from this file instead of scraping
    pub statement_html: Option<PathBuf>,
    /// Write scraped statement markup to this file
    pub save_statement_html: Option<PathBuf>,
    /// Spreadsheet written at the end of the run
    pub output_path: PathBuf,
    /// Characters dropped from descriptions without a delimiter
    pub location_prefix: usize,
    /// Characters dropped from amounts before parsing
    pub amount_prefix: usize,
    /// Label delimiter preceding the location in descriptions
    pub location_delimiter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            calendar_id: "primary".to_string(),
            client_secrets_path: PathBuf::from("credentials.json"),
            token_path: PathBuf::from("token.json"),
            calendar_scope: DEFAULT_CALENDAR_SCOPE.to_string(),
            max_results: 250,
            redirect_port: 8080,
            workday_keyword: "nelc".to_string(),
            year: Local::now().year(),
            portal_url: DEFAULT_PORTAL_URL.to_string(),
            statement_url: DEFAULT_STATEMENT_URL.to_string(),
            portal_username: None,
            portal_password: None,
            statement_html: None,
            save_statement_html: None,
            output_path: PathBuf::from("tolls.xlsx"),
            location_prefix: 8,
            amount_prefix: 3,
            location_delimiter: " - ".to_string(),
        }
    }
}

/// Non-secret settings that may live in the settings file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    calendar_id: Option<String>,
    client_secrets_path: Option<PathBuf>,
    token_path: Option<PathBuf>,
    calendar_scope: Option<String>,
    max_results: Option<u32>,
    redirect_port: Option<u16>,
    workday_keyword: Option<String>,
    year: Option<i32>,
    portal_url: Option<String>,
    statement_url: Option<String>,
    statement_html: Option<PathBuf>,
    save_statement_html: Option<PathBuf>,
    output_path: Option<PathBuf>,
    location_prefix: Option<usize>,
    amount_prefix: Option<usize>,
    location_delimiter: Option<String>,
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> TollResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let mut config = Config::default();

        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            let content = fs::read_to_string(DEFAULT_CONFIG_FILE)?;
            config.apply_file(&content)?;
        }

        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that cannot produce a meaningful run
    pub fn validate(&self) -> TollResult<()> {
        if self.workday_keyword.trim().is_empty() {
            return Err(config_error("Workday keyword must not be empty"));
        }
        if self.max_results == 0 {
            return Err(config_error("Event result cap must be at least 1"));
        }
        if self.calendar_id.trim().is_empty() {
            return Err(config_error("Calendar ID must not be empty"));
        }
        Ok(())
    }

    /// Overlay settings from a TOML document
    pub fn apply_file(&mut self, content: &str) -> TollResult<()> {
        let file: FileConfig = toml::from_str(content)?;

        if let Some(v) = file.calendar_id {
            self.calendar_id = v;
        }
        if let Some(v) = file.client_secrets_path {
            self.client_secrets_path = v;
        }
        if let Some(v) = file.token_path {
            self.token_path = v;
        }
        if let Some(v) = file.calendar_scope {
            self.calendar_scope = v;
        }
        if let Some(v) = file.max_results {
            self.max_results = v;
        }
        if let Some(v) = file.redirect_port {
            self.redirect_port = v;
        }
        if let Some(v) = file.workday_keyword {
            self.workday_keyword = v;
        }
        if let Some(v) = file.year {
            self.year = v;
        }
        if let Some(v) = file.portal_url {
            self.portal_url = v;
        }
        if let Some(v) = file.statement_url {
            self.statement_url = v;
        }
        if file.statement_html.is_some() {
            self.statement_html = file.statement_html;
        }
        if file.save_statement_html.is_some() {
            self.save_statement_html = file.save_statement_html;
        }
        if let Some(v) = file.output_path {
            self.output_path = v;
        }
        if let Some(v) = file.location_prefix {
            self.location_prefix = v;
        }
        if let Some(v) = file.amount_prefix {
            self.amount_prefix = v;
        }
        if let Some(v) = file.location_delimiter {
            self.location_delimiter = v;
        }

        Ok(())
    }

    /// Overlay settings from environment variables
    fn apply_env(&mut self) -> TollResult<()> {
        if let Ok(v) = env::var("GOOGLE_CALENDAR_ID") {
            self.calendar_id = v;
        }
        if let Ok(v) = env::var("GOOGLE_CLIENT_SECRETS_PATH") {
            self.client_secrets_path = PathBuf::from(v);
        }
        if let Ok(v) = env::var("GOOGLE_TOKEN_PATH") {
            self.token_path = PathBuf::from(v);
        }
        if let Ok(v) = env::var("GOOGLE_CALENDAR_SCOPE") {
            self.calendar_scope = v;
        }
        if let Some(v) = parse_env("GOOGLE_MAX_RESULTS")? {
            self.max_results = v;
        }
        if let Some(v) = parse_env("GOOGLE_REDIRECT_PORT")? {
            self.redirect_port = v;
        }
        if let Ok(v) = env::var("WORKDAY_KEYWORD") {
            self.workday_keyword = v;
        }
        if let Some(v) = parse_env("TOLL_YEAR")? {
            self.year = v;
        }
        if let Ok(v) = env::var("TOLL_PORTAL_URL") {
            self.portal_url = v;
        }
        if let Ok(v) = env::var("TOLL_STATEMENT_URL") {
            self.statement_url = v;
        }
        if let Ok(v) = env::var("TOLL_PORTAL_USERNAME") {
            self.portal_username = Some(v);
        }
        if let Ok(v) = env::var("TOLL_PORTAL_PASSWORD") {
            self.portal_password = Some(v);
        }
        if let Ok(v) = env::var("TOLL_STATEMENT_HTML") {
            self.statement_html = Some(PathBuf::from(v));
        }
        if let Ok(v) = env::var("TOLL_SAVE_STATEMENT_HTML") {
            self.save_statement_html = Some(PathBuf::from(v));
        }
        if let Ok(v) = env::var("TOLL_OUTPUT_PATH") {
            self.output_path = PathBuf::from(v);
        }
        if let Some(v) = parse_env("TOLL_LOCATION_PREFIX")? {
            self.location_prefix = v;
        }
        if let Some(v) = parse_env("TOLL_AMOUNT_PREFIX")? {
            self.amount_prefix = v;
        }
        if let Ok(v) = env::var("TOLL_LOCATION_DELIMITER") {
            self.location_delimiter = v;
        }

        Ok(())
    }

    /// Prefix stripping rules for statement normalization
    pub fn prefix_rules(&self) -> PrefixRules {
        PrefixRules {
            location_prefix: self.location_prefix,
            amount_prefix: self.amount_prefix,
            location_delimiter: self.location_delimiter.clone(),
        }
    }

    /// Portal credentials, required when the statement is scraped
    pub fn portal_credentials(&self) -> TollResult<(String, String)> {
        let username = self
            .portal_username
            .clone()
            .ok_or_else(|| env_error("Missing environment variable: TOLL_PORTAL_USERNAME"))?;
        let password = self
            .portal_password
            .clone()
            .ok_or_else(|| env_error("Missing environment variable: TOLL_PORTAL_PASSWORD"))?;
        Ok((username, password))
    }
}

/// Parse a numeric environment variable, if set
fn parse_env<T: FromStr>(var: &str) -> TollResult<Option<T>> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| env_error(&format!("Invalid {} format", var))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.calendar_id, "primary");
        assert_eq!(config.max_results, 250);
        assert_eq!(config.workday_keyword, "nelc");
        assert_eq!(config.output_path, PathBuf::from("tolls.xlsx"));
        assert_eq!(config.year, Local::now().year());
    }

    #[test]
    fn test_apply_file_overrides() {
        let mut config = Config::default();
        config
            .apply_file(
                r#"
                workday_keyword = "office"
                year = 2023
                output_path = "out/march.xlsx"
                location_prefix = 5
                "#,
            )
            .unwrap();

        assert_eq!(config.workday_keyword, "office");
        assert_eq!(config.year, 2023);
        assert_eq!(config.output_path, PathBuf::from("out/march.xlsx"));
        assert_eq!(config.location_prefix, 5);
        // Untouched values keep their defaults
        assert_eq!(config.amount_prefix, 3);
        assert_eq!(config.calendar_id, "primary");
    }

    #[test]
    fn test_apply_file_rejects_bad_toml() {
        let mut config = Config::default();
        assert!(config.apply_file("year = \"soon\"").is_err());
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_ok());

        let blank_keyword = Config {
            workday_keyword: "  ".to_string(),
            ..Config::default()
        };
        assert!(blank_keyword.validate().is_err());

        let no_results = Config {
            max_results: 0,
            ..Config::default()
        };
        assert!(no_results.validate().is_err());
    }

    #[test]
    fn test_portal_credentials_required() {
        let mut config = Config::default();
        assert!(config.portal_credentials().is_err());

        config.portal_username = Some("driver".to_string());
        config.portal_password = Some("hunter2".to_string());
        let (user, pass) = config.portal_credentials().unwrap();
        assert_eq!(user, "driver");
        assert_eq!(pass, "hunter2");
    }
}

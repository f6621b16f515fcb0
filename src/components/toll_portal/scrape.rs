use crate::components::StatementSource;
use crate::config::Config;
use crate::error::{portal_error, TollResult};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::path::PathBuf;
use tracing::{debug, info};
use url::Url;

/// Username input of the login dialog
pub const USERNAME_INPUT: &str = "input#loginReturnDialog";
/// Password input of the login dialog
pub const PASSWORD_INPUT: &str = "input#passwordReturnDialog";
/// Container wrapping the statement table
pub const STATEMENT_TABLE_CONTAINER: &str = ".ezpass-container-table";

fn selector(css: &'static str) -> TollResult<Selector> {
    Selector::parse(css).map_err(|e| portal_error(&format!("Invalid selector '{}': {}", css, e)))
}

/// Login form ready to submit
#[derive(Debug, Clone, PartialEq)]
pub struct LoginForm {
    pub action: Url,
    pub fields: Vec<(String, String)>,
}

/// Find the login form on a page and fill in the credentials.
///
/// Hidden inputs such as anti-forgery tokens are submitted unchanged.
pub fn parse_login_form(
    html: &str,
    page_url: &Url,
    username: &str,
    password: &str,
) -> TollResult<LoginForm> {
    let document = Html::parse_document(html);
    let form_selector = selector("form")?;
    let input_selector = selector("input")?;
    let username_selector = selector(USERNAME_INPUT)?;
    let password_selector = selector(PASSWORD_INPUT)?;

    let form = document
        .select(&form_selector)
        .find(|form| form.select(&username_selector).next().is_some())
        .ok_or_else(|| portal_error("Login form not found on portal page"))?;

    let field_name = |selector: &Selector, label: &str| {
        form.select(selector)
            .next()
            .and_then(|input| input.value().attr("name"))
            .map(str::to_string)
            .ok_or_else(|| portal_error(&format!("Login form {} input has no name", label)))
    };
    let username_field = field_name(&username_selector, "username")?;
    let password_field = field_name(&password_selector, "password")?;

    let mut fields = Vec::new();
    for input in form.select(&input_selector) {
        let element = input.value();
        let Some(name) = element.attr("name") else {
            continue;
        };
        let kind = element.attr("type").unwrap_or("text").to_ascii_lowercase();
        if matches!(kind.as_str(), "checkbox" | "radio") && element.attr("checked").is_none() {
            continue;
        }
        if matches!(kind.as_str(), "submit" | "button" | "image") {
            continue;
        }

        let value = if name == username_field {
            username
        } else if name == password_field {
            password
        } else {
            element.attr("value").unwrap_or("")
        };
        fields.push((name.to_string(), value.to_string()));
    }

    let action = match form.value().attr("action").filter(|a| !a.trim().is_empty()) {
        Some(action) => page_url
            .join(action)
            .map_err(|e| portal_error(&format!("Invalid login form action '{}': {}", action, e)))?,
        None => page_url.clone(),
    };

    Ok(LoginForm { action, fields })
}

/// Inner markup of the statement table container
pub fn extract_statement_table(html: &str) -> TollResult<String> {
    let document = Html::parse_document(html);
    let container = selector(STATEMENT_TABLE_CONTAINER)?;

    document
        .select(&container)
        .next()
        .map(|element| element.inner_html())
        .ok_or_else(|| portal_error("Statement table not found, the login may have failed"))
}

/// Scrapes the statement table from the toll portal with a cookie session
pub struct PortalScraper {
    client: Client,
    portal_url: Url,
    statement_url: Url,
    username: String,
    password: String,
}

impl PortalScraper {
    pub fn new(
        portal_url: &str,
        statement_url: &str,
        username: &str,
        password: &str,
    ) -> TollResult<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let parse = |url: &str| {
            Url::parse(url).map_err(|e| portal_error(&format!("Invalid portal URL '{}': {}", url, e)))
        };

        Ok(Self {
            client,
            portal_url: parse(portal_url)?,
            statement_url: parse(statement_url)?,
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> TollResult<Self> {
        let (username, password) = config.portal_credentials()?;
        Self::new(&config.portal_url, &config.statement_url, &username, &password)
    }

    async fn get_page(&self, url: &Url) -> TollResult<String> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| portal_error(&format!("Failed to load {}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(portal_error(&format!(
                "Failed to load {}: HTTP {}",
                url,
                response.status()
            )));
        }

        Ok(response.text().await?)
    }

    async fn log_in(&self) -> TollResult<()> {
        let home = self.get_page(&self.portal_url).await?;
        let form = parse_login_form(&home, &self.portal_url, &self.username, &self.password)?;
        debug!(action = %form.action, fields = form.fields.len(), "Submitting login form");

        let response = self
            .client
            .post(form.action.clone())
            .form(&form.fields)
            .send()
            .await
            .map_err(|e| portal_error(&format!("Login request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(portal_error(&format!("Login failed: HTTP {}", response.status())));
        }

        Ok(())
    }
}

#[async_trait]
impl StatementSource for PortalScraper {
    async fn fetch_statement_table_html(&self) -> TollResult<String> {
        println!("Logging into the toll portal...");
        self.log_in().await?;

        println!("Loading statement page...");
        let statement = self.get_page(&self.statement_url).await?;

        println!("Scraping table...");
        let table = extract_statement_table(&statement)?;
        info!(bytes = table.len(), "Scraped statement table");
        Ok(table)
    }
}

/// Statement markup saved by an earlier run
pub struct SavedStatement {
    path: PathBuf,
}

impl SavedStatement {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl StatementSource for SavedStatement {
    async fn fetch_statement_table_html(&self) -> TollResult<String> {
        info!("Reading statement from {}", self.path.display());
        tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            portal_error(&format!(
                "Failed to read saved statement {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}

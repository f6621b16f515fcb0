use super::auth::authorize_interactively;
use crate::config::Config;
use crate::error::{auth_error, TollResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens this close to expiry are refreshed
const EXPIRY_SKEW_SECS: i64 = 60;

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// OAuth client registration from the Google console download
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Parse an `{"installed": {...}}` or `{"web": {...}}` document
    pub fn from_json(content: &str) -> TollResult<Self> {
        let file: ClientSecretsFile = serde_json::from_str(content)?;
        file.installed
            .or(file.web)
            .ok_or_else(|| auth_error("Client secrets have neither an 'installed' nor a 'web' section"))
    }

    pub fn load(path: &Path) -> TollResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            auth_error(&format!(
                "Failed to read client secrets {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&content)
    }
}

/// Token cached between runs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredToken {
    #[serde(alias = "token")]
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Expiry as a unix timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    /// Expiry as an ISO timestamp, as written by the Google Python client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<String>,
}

impl StoredToken {
    /// Build a token from an OAuth token endpoint response
    pub fn from_token_response(
        response: &Value,
        previous_refresh_token: Option<&str>,
        now: i64,
    ) -> TollResult<Self> {
        let access_token = response
            .get("access_token")
            .and_then(|v| v.as_str())
            .ok_or_else(|| auth_error("Token response missing 'access_token' field"))?
            .to_string();

        // Refresh responses usually omit the refresh token, keep the old one
        let refresh_token = response
            .get("refresh_token")
            .and_then(|v| v.as_str())
            .or(previous_refresh_token)
            .map(|s| s.to_string());

        let expires_in = response.get("expires_in").and_then(|v| v.as_i64()).unwrap_or(3600);

        Ok(Self {
            access_token,
            refresh_token,
            expires_at: Some(now + expires_in),
            expiry: None,
        })
    }

    /// Expiry as a unix timestamp, if known
    pub fn expiry_timestamp(&self) -> Option<i64> {
        if let Some(expires_at) = self.expires_at {
            return Some(expires_at);
        }
        let expiry = self.expiry.as_deref()?;
        DateTime::parse_from_rfc3339(expiry)
            .map(|dt| dt.timestamp())
            .or_else(|_| {
                NaiveDateTime::parse_from_str(expiry, "%Y-%m-%dT%H:%M:%S%.f")
                    .map(|dt| dt.and_utc().timestamp())
            })
            .ok()
    }

    /// Tokens without a known expiry count as expired
    pub fn is_expired(&self, now: i64) -> bool {
        match self.expiry_timestamp() {
            Some(expires_at) => expires_at - EXPIRY_SKEW_SECS <= now,
            None => true,
        }
    }
}

/// Loads, refreshes and persists the calendar OAuth token
#[derive(Clone)]
pub struct TokenManager {
    token_path: PathBuf,
    client_secrets_path: PathBuf,
    scope: String,
    redirect_port: u16,
    client: Client,
}

impl TokenManager {
    pub fn new(config: &Config) -> Self {
        Self::with_client(config, Client::new())
    }

    pub fn with_client(config: &Config, client: Client) -> Self {
        Self {
            token_path: config.token_path.clone(),
            client_secrets_path: config.client_secrets_path.clone(),
            scope: config.calendar_scope.clone(),
            redirect_port: config.redirect_port,
            client,
        }
    }

    /// Get a usable access token
    pub async fn access_token(&self) -> TollResult<String> {
        Ok(self.get_token().await?.access_token)
    }

    /// Get OAuth token from the cache file, refreshing or re-authorizing as needed
    pub async fn get_token(&self) -> TollResult<StoredToken> {
        let now = Utc::now().timestamp();

        let cached = match self.load_token().await {
            Ok(cached) => cached,
            Err(e) => {
                warn!("Ignoring unreadable token file: {}", e);
                None
            }
        };

        if let Some(token) = cached {
            if !token.is_expired(now) {
                debug!("Using cached token from {}", self.token_path.display());
                return Ok(token);
            }

            if let Some(refresh_token) = token.refresh_token.as_deref() {
                let secrets = ClientSecrets::load(&self.client_secrets_path)?;
                match self.refresh_token(&secrets, refresh_token).await {
                    Ok(refreshed) => {
                        self.save_token(&refreshed).await?;
                        return Ok(refreshed);
                    }
                    Err(e) => warn!("Token refresh failed, signing in again: {}", e),
                }
            }
        } else {
            info!("No cached token at {}", self.token_path.display());
        }

        self.authorize().await
    }

    /// Run the interactive sign-in and cache the result
    pub async fn authorize(&self) -> TollResult<StoredToken> {
        let secrets = ClientSecrets::load(&self.client_secrets_path)?;
        let token =
            authorize_interactively(&self.client, &secrets, &self.scope, self.redirect_port).await?;
        self.save_token(&token).await?;
        Ok(token)
    }

    /// Refresh an expired token
    pub async fn refresh_token(
        &self,
        secrets: &ClientSecrets,
        refresh_token: &str,
    ) -> TollResult<StoredToken> {
        let params = [
            ("client_id", secrets.client_id.as_str()),
            ("client_secret", secrets.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post(&secrets.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| auth_error(&format!("Failed to refresh token: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(auth_error(&format!(
                "Failed to refresh token: HTTP {} - {}",
                status, error_body
            )));
        }

        let new_token: Value = response
            .json()
            .await
            .map_err(|e| auth_error(&format!("Failed to parse token response: {}", e)))?;

        info!("Refreshed Google Calendar token");
        StoredToken::from_token_response(&new_token, Some(refresh_token), Utc::now().timestamp())
    }

    async fn load_token(&self) -> TollResult<Option<StoredToken>> {
        if !tokio::fs::try_exists(&self.token_path).await? {
            return Ok(None);
        }
        let content = tokio::fs::read_to_string(&self.token_path).await?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    async fn save_token(&self, token: &StoredToken) -> TollResult<()> {
        let content = serde_json::to_string_pretty(token)?;
        tokio::fs::write(&self.token_path, content).await?;
        debug!("Saved token to {}", self.token_path.display());
        Ok(())
    }
}

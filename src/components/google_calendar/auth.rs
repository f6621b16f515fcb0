use super::token::{ClientSecrets, StoredToken};
use crate::error::{auth_error, TollResult};
use chrono::Utc;
use reqwest::Client;
use serde_json::Value;
use tracing::{info, warn};
use url::Url;

/// Build the consent page URL
pub fn consent_url(
    secrets: &ClientSecrets,
    scope: &str,
    redirect_uri: &str,
    state: &str,
) -> TollResult<Url> {
    Url::parse_with_params(
        &secrets.auth_uri,
        &[
            ("client_id", secrets.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("response_type", "code"),
            ("access_type", "offline"),
            ("prompt", "consent"),
            ("scope", scope),
            ("state", state),
        ],
    )
    .map_err(|e| auth_error(&format!("Failed to build authorization URL: {}", e)))
}

/// Pull the authorization code out of a callback request path.
///
/// Returns `Ok(None)` for unrelated requests such as `/favicon.ico`.
pub fn extract_code(request_path: &str, expected_state: &str) -> TollResult<Option<String>> {
    let url = Url::parse("http://localhost")
        .and_then(|base| base.join(request_path))
        .map_err(|e| auth_error(&format!("Malformed callback URL: {}", e)))?;

    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => return Err(auth_error(&format!("Authorization denied: {}", value))),
            _ => {}
        }
    }

    let Some(code) = code else {
        return Ok(None);
    };

    if state.as_deref() != Some(expected_state) {
        return Err(auth_error("Authorization callback state does not match"));
    }

    Ok(Some(code))
}

/// Block on the loopback server until the consent redirect arrives
fn wait_for_code(server: tiny_http::Server, state: &str) -> TollResult<String> {
    loop {
        let request = server.recv()?;
        let path = request.url().to_string();

        match extract_code(&path, state) {
            Ok(Some(code)) => {
                let response = tiny_http::Response::from_string(
                    "Authorization successful! You can close this window.",
                );
                request.respond(response)?;
                return Ok(code);
            }
            Ok(None) => {
                let response = tiny_http::Response::from_string("Not found").with_status_code(404);
                request.respond(response)?;
            }
            Err(e) => {
                let response = tiny_http::Response::from_string(
                    "Authorization failed. You can close this window.",
                )
                .with_status_code(400);
                let _ = request.respond(response);
                return Err(e);
            }
        }
    }
}

/// Exchange an authorization code for tokens
pub async fn exchange_code(
    client: &Client,
    secrets: &ClientSecrets,
    code: &str,
    redirect_uri: &str,
) -> TollResult<StoredToken> {
    let response = client
        .post(&secrets.token_uri)
        .form(&[
            ("client_id", secrets.client_id.as_str()),
            ("client_secret", secrets.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        let error_text = response.text().await?;
        return Err(auth_error(&format!("Failed to get token: {}", error_text)));
    }

    let token_data: Value = response.json().await?;
    StoredToken::from_token_response(&token_data, None, Utc::now().timestamp())
}

/// Sign in through the browser and a loopback redirect
pub async fn authorize_interactively(
    client: &Client,
    secrets: &ClientSecrets,
    scope: &str,
    port: u16,
) -> TollResult<StoredToken> {
    let redirect_uri = format!("http://127.0.0.1:{}", port);

    // Generate random state for security
    let state = uuid::Uuid::new_v4().to_string();
    let auth_url = consent_url(secrets, scope, &redirect_uri, &state)?;

    // Bind before opening the browser so the redirect cannot race the server
    let server = tiny_http::Server::http(("127.0.0.1", port))
        .map_err(|e| auth_error(&format!("Failed to start callback server: {}", e)))?;

    println!("Opening browser for Google Calendar authorization...");
    if let Err(e) = webbrowser::open(auth_url.as_str()) {
        warn!("Could not open a browser: {}", e);
        println!("Open this URL to continue:\n{}", auth_url);
    }
    println!("Waiting for authorization callback...");

    let code = tokio::task::spawn_blocking(move || wait_for_code(server, &state))
        .await
        .map_err(|e| auth_error(&format!("Callback listener failed: {}", e)))??;

    let token = exchange_code(client, secrets, &code, &redirect_uri).await?;
    info!("Google Calendar authorization completed");
    Ok(token)
}

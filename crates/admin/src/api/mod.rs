//! Typed client for the console backend REST API.
//!
//! One [`ConsoleClient`] covers every endpoint group; the groups live in
//! their own modules as `impl ConsoleClient` blocks:
//!
//! - [`admins`] - admin CRUD, status toggle, Marzban inbounds
//! - [`panels`] - panel CRUD and status toggle
//! - [`dashboard`] - dashboard payload and the superadmin listings
//! - [`superadmin`] - news, logs, backup and restore

mod admins;
mod dashboard;
mod error;
mod panels;
mod superadmin;

use std::sync::Arc;

use proxy_console_core::{DecodedToken, LoginResponse, ResponseModel};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::instrument;
use url::Url;

pub use error::ApiError;
pub use superadmin::backup_file_name;

use crate::config::{ConsoleConfig, Credentials};
use error::first_error_message;

/// Client for the console backend.
///
/// Cheap to clone; clones share the HTTP connection pool and the cached
/// access token.
#[derive(Clone)]
pub struct ConsoleClient {
    inner: Arc<ConsoleClientInner>,
}

struct ConsoleClientInner {
    client: reqwest::Client,
    /// Always ends with `/` so relative joins keep any path prefix.
    base_url: Url,
    credentials: Credentials,
    token: RwLock<Option<SecretString>>,
}

impl std::fmt::Debug for ConsoleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("credentials", &self.inner.credentials)
            .finish_non_exhaustive()
    }
}

/// Body of a successful call: either the standard envelope or a bare value.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Payload<T> {
    Envelope(ResponseModel<T>),
    Bare(T),
}

impl ConsoleClient {
    /// Create a client from configuration.
    ///
    /// A pre-issued token from the configuration is used as-is; password
    /// credentials are exchanged for a token on the first call.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ConsoleConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("proxy-console/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let mut base_url = config.api_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let token = match &config.credentials {
            Credentials::Token(token) => Some(token.clone()),
            Credentials::Password { .. } => None,
        };

        Ok(Self {
            inner: Arc::new(ConsoleClientInner {
                client,
                base_url,
                credentials: config.credentials.clone(),
                token: RwLock::new(token),
            }),
        })
    }

    /// Base URL of the backend.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Exchange username and password for an access token.
    ///
    /// The token is cached for subsequent calls.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the credentials are rejected.
    #[instrument(skip(self, password), fields(username = %username))]
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<LoginResponse, ApiError> {
        let url = self.url("login")?;
        let response = self
            .inner
            .client
            .post(url)
            .form(&[
                ("username", username),
                ("password", password.expose_secret()),
            ])
            .send()
            .await?;

        let response = check_status(response).await?;
        let body = response.text().await?;
        let login: LoginResponse =
            serde_json::from_str(&body).map_err(|e| ApiError::Parse(e.to_string()))?;

        *self.inner.token.write().await = Some(SecretString::from(login.access_token.clone()));
        tracing::info!("Logged in to console backend");
        Ok(login)
    }

    /// Current access token, logging in with the configured credentials if
    /// none is cached.
    ///
    /// # Errors
    ///
    /// Returns an error if login is required and fails.
    pub async fn token(&self) -> Result<SecretString, ApiError> {
        if let Some(token) = self.inner.token.read().await.clone() {
            return Ok(token);
        }

        match &self.inner.credentials {
            Credentials::Password { username, password } => {
                self.login(username, password).await?;
            }
            Credentials::Token(token) => {
                *self.inner.token.write().await = Some(token.clone());
            }
        }

        self.inner
            .token
            .read()
            .await
            .clone()
            .ok_or_else(|| ApiError::Unauthorized("No access token".to_string()))
    }

    /// Decode the claims of the current access token.
    ///
    /// # Errors
    ///
    /// Returns an error if no token can be obtained or it is malformed.
    pub async fn whoami(&self) -> Result<DecodedToken, ApiError> {
        let token = self.token().await?;
        DecodedToken::decode(token.expose_secret()).map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Drop the cached token; the next call logs in again.
    pub async fn clear_token(&self) {
        *self.inner.token.write().await = None;
    }

    // =========================================================================
    // Request helpers
    // =========================================================================

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Build an authenticated request.
    async fn request(
        &self,
        method: reqwest::Method,
        path: &str,
    ) -> Result<reqwest::RequestBuilder, ApiError> {
        let url = self.url(path)?;
        let token = self.token().await?;
        Ok(self
            .inner
            .client
            .request(method, url)
            .bearer_auth(token.expose_secret()))
    }

    /// Send a request and map error statuses to [`ApiError`].
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = request.send().await?;
        check_status(response).await
    }

    /// GET `path` and return the payload data.
    async fn get_data<T: DeserializeOwned>(
        &self,
        path: &str,
        what: &'static str,
    ) -> Result<T, ApiError> {
        let request = self.request(reqwest::Method::GET, path).await?;
        let response = self.send(request).await?;
        into_data(&response.text().await?, what)
    }

    /// Send a mutation with an optional JSON body and return the server
    /// message.
    async fn mutate<B: Serialize + Sync>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<String, ApiError> {
        let mut request = self.request(method, path).await?;
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = self.send(request).await?;
        into_message(&response.text().await?)
    }
}

/// Turn an error status into [`ApiError`], keeping the first message of the
/// body.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = first_error_message(&body, status.as_u16());
    tracing::warn!(status = status.as_u16(), %message, "Console backend returned an error");

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized(message));
    }
    Err(ApiError::Server {
        status: status.as_u16(),
        message,
    })
}

fn parse_payload<T: DeserializeOwned>(body: &str) -> Result<Payload<T>, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Parse(e.to_string()))
}

/// Extract the data of a successful response body.
fn into_data<T: DeserializeOwned>(body: &str, what: &'static str) -> Result<T, ApiError> {
    match parse_payload(body)? {
        Payload::Envelope(envelope) if !envelope.success => {
            Err(ApiError::Rejected(non_empty(envelope.message, "Operation failed")))
        }
        Payload::Envelope(envelope) => envelope.data.ok_or(ApiError::MissingData(what)),
        Payload::Bare(data) => Ok(data),
    }
}

/// Extract the message of a successful mutation response body.
///
/// Empty bodies count as success with no message.
fn into_message(body: &str) -> Result<String, ApiError> {
    if body.trim().is_empty() {
        return Ok(String::new());
    }
    match parse_payload::<serde_json::Value>(body)? {
        Payload::Envelope(envelope) if !envelope.success => {
            Err(ApiError::Rejected(non_empty(envelope.message, "Operation failed")))
        }
        Payload::Envelope(envelope) => Ok(envelope.message),
        Payload::Bare(serde_json::Value::String(message)) => Ok(message),
        Payload::Bare(_) => Ok(String::new()),
    }
}

fn non_empty(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

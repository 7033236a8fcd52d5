//! Command implementations.

pub mod account;
pub mod admins;
pub mod clients;
pub mod output;
pub mod panels;
pub mod settings;

use clap::Args;
use proxy_console_admin::api::ApiError;
use proxy_console_admin::config::{ConfigError, ConsoleConfig};
use proxy_console_admin::pages::FormError;
use proxy_console_admin::panels::PanelError;
use proxy_console_admin::tasks::TaskError;
use proxy_console_admin::{ConsoleClient, ConsoleError};
use thiserror::Error;

pub use output::OutputFormat;

/// Errors that end a command.
///
/// [`CliError::user_message`] is the single line shown to the operator.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration, backend, panel or client-management failure.
    #[error(transparent)]
    Console(#[from] ConsoleError),

    #[error("{0}")]
    Form(#[from] FormError),

    /// Bad arguments that clap cannot check on its own.
    #[error("{0}")]
    Usage(String),

    /// A page reported a failure as a message.
    #[error("{0}")]
    Failed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// The message printed before exiting.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Console(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::Console(e.into())
    }
}

impl From<ApiError> for CliError {
    fn from(e: ApiError) -> Self {
        Self::Console(e.into())
    }
}

impl From<PanelError> for CliError {
    fn from(e: PanelError) -> Self {
        Self::Console(e.into())
    }
}

impl From<TaskError> for CliError {
    fn from(e: TaskError) -> Self {
        Self::Console(e.into())
    }
}

/// Console backend connection flags; each falls back to its environment
/// variable.
#[derive(Debug, Args)]
pub struct ConnectionArgs {
    /// Console backend base URL
    #[arg(long, global = true, env = "CONSOLE_API_URL")]
    pub api_url: Option<String>,

    /// Login username
    #[arg(long = "console-username", global = true, env = "CONSOLE_USERNAME")]
    pub username: Option<String>,

    /// Login password
    #[arg(
        long = "console-password",
        global = true,
        env = "CONSOLE_PASSWORD",
        hide_env_values = true
    )]
    pub password: Option<String>,

    /// Pre-issued access token (takes precedence over username/password)
    #[arg(
        long = "console-token",
        global = true,
        env = "CONSOLE_TOKEN",
        hide_env_values = true
    )]
    pub token: Option<String>,
}

/// Configuration and client for one invocation.
pub struct Session {
    pub config: ConsoleConfig,
    pub client: ConsoleClient,
}

impl ConnectionArgs {
    /// Resolve configuration and build the backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is incomplete or invalid.
    pub fn connect(&self) -> Result<Session, CliError> {
        let config = ConsoleConfig::from_lookup(|key| match key {
            "CONSOLE_API_URL" => self.api_url.clone(),
            "CONSOLE_USERNAME" => self.username.clone(),
            "CONSOLE_PASSWORD" => self.password.clone(),
            "CONSOLE_TOKEN" => self.token.clone(),
            _ => std::env::var(key).ok(),
        })?;
        let client = ConsoleClient::new(&config)?;
        Ok(Session { config, client })
    }
}

/// Today's date in local time, the reference for expiry arithmetic.
pub fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

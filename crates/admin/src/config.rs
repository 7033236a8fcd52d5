//! Console configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CONSOLE_API_URL` - Base URL of the console backend
//! - Either `CONSOLE_TOKEN`, or both `CONSOLE_USERNAME` and `CONSOLE_PASSWORD`
//!
//! ## Optional
//! - `CONSOLE_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `CONSOLE_BACKUP_DIR` - Directory backups are downloaded into (default: .)

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// How the console authenticates against the backend.
#[derive(Clone)]
pub enum Credentials {
    /// Log in with a username and password to obtain a token.
    Password {
        username: String,
        password: SecretString,
    },
    /// Use a pre-issued bearer token.
    Token(SecretString),
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
            Self::Token(_) => f.debug_tuple("Token").field(&"[REDACTED]").finish(),
        }
    }
}

/// Console configuration.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Base URL of the console backend
    pub api_url: Url,
    /// Login credentials or token
    pub credentials: Credentials,
    /// Per-request timeout
    pub timeout: Duration,
    /// Directory backups are downloaded into
    pub backup_dir: PathBuf,
}

impl ConsoleConfig {
    /// Configuration with default timeout and backup directory.
    #[must_use]
    pub fn new(api_url: Url, credentials: Credentials) -> Self {
        Self {
            api_url,
            credentials,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            backup_dir: PathBuf::from("."),
        }
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let raw_url = env.required("CONSOLE_API_URL")?;
        let api_url = parse_api_url(&raw_url)
            .map_err(|e| ConfigError::InvalidEnvVar("CONSOLE_API_URL".to_string(), e))?;

        let credentials = Credentials::from_env(&env)?;

        let timeout_secs = env
            .or_default("CONSOLE_TIMEOUT_SECS", &DEFAULT_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("CONSOLE_TIMEOUT_SECS".to_string(), e.to_string())
            })?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "CONSOLE_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let backup_dir = PathBuf::from(env.or_default("CONSOLE_BACKUP_DIR", "."));

        Ok(Self {
            api_url,
            credentials,
            timeout: Duration::from_secs(timeout_secs),
            backup_dir,
        })
    }
}

impl Credentials {
    fn from_env<F>(env: &Env<F>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = env.optional("CONSOLE_TOKEN") {
            return Ok(Self::Token(SecretString::from(token)));
        }

        match (env.optional("CONSOLE_USERNAME"), env.optional("CONSOLE_PASSWORD")) {
            (Some(username), Some(password)) => Ok(Self::Password {
                username,
                password: SecretString::from(password),
            }),
            (None, None) => Err(ConfigError::MissingEnvVar(
                "CONSOLE_TOKEN or CONSOLE_USERNAME/CONSOLE_PASSWORD".to_string(),
            )),
            _ => Err(ConfigError::InvalidEnvVar(
                "CONSOLE_*".to_string(),
                "Both CONSOLE_USERNAME and CONSOLE_PASSWORD must be set together".to_string(),
            )),
        }
    }
}

/// Parse and normalise the backend base URL.
///
/// # Errors
///
/// Returns a message if the URL is not an absolute http(s) URL.
pub fn parse_api_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme: {}", url.scheme()));
    }
    Ok(url)
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable source with blank values treated as unset.
struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }
}

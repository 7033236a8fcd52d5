//! Direct clients for upstream 3x-ui ("sanaei") and tx-ui panels.
//!
//! Both panel families expose the same `panel/api/inbounds/...` surface and
//! authenticate with a cookie session obtained from `POST login`. They
//! differ only in how long a session is trusted before logging in again.
//!
//! # Example
//!
//! ```rust,ignore
//! let registry = PanelRegistry::new();
//! let client = registry.client(&connection).await?;
//! let inbounds = client.inbounds().await?;
//! ```

mod client;
mod registry;
mod types;

use std::sync::Arc;
use std::time::Duration;

use proxy_console_core::PanelType;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;

pub use client::XuiClient;
pub use registry::PanelRegistry;
pub use types::{ClientInput, ClientStat, Inbound, InboundClient, PanelUser, XuiResponse};

/// Errors that can occur when talking to an upstream panel.
#[derive(Debug, Error)]
pub enum PanelError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The panel refused the login.
    #[error("Login failed: {status} - {body}")]
    LoginFailed { status: u16, body: String },

    /// A call returned a non-success status after the retry.
    #[error("{path} returned HTTP {status}")]
    Status { status: u16, path: String },

    /// The panel answered `success: false`.
    #[error("Panel rejected the request: {0}")]
    Rejected(String),

    /// The panel type has no direct client.
    #[error("Unsupported panel type: {0}")]
    Unsupported(String),

    /// A request body could not be encoded, or a reply had an unexpected
    /// shape.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The panel URL is not usable.
    #[error("Invalid panel URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A failure shared by concurrent callers waiting on the same client.
    #[error(transparent)]
    Shared(Arc<PanelError>),
}

/// Panel family with a direct client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelKind {
    /// 3x-ui.
    Sanaei,
    /// tx-ui.
    TxUi,
}

impl PanelKind {
    /// How long a login session is reused.
    #[must_use]
    pub const fn session_ttl(self) -> Duration {
        match self {
            Self::Sanaei => Duration::from_secs(3500),
            Self::TxUi => Duration::from_secs(300),
        }
    }
}

impl TryFrom<&PanelType> for PanelKind {
    type Error = PanelError;

    fn try_from(panel_type: &PanelType) -> Result<Self, Self::Error> {
        match panel_type {
            PanelType::ThreeXUi => Ok(Self::Sanaei),
            PanelType::TxUi => Ok(Self::TxUi),
            other => Err(PanelError::Unsupported(other.to_string())),
        }
    }
}

impl std::str::FromStr for PanelKind {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("sanaei") {
            return Ok(Self::Sanaei);
        }
        let panel_type: PanelType = s
            .parse()
            .map_err(|_| PanelError::Unsupported(s.to_owned()))?;
        Self::try_from(&panel_type)
    }
}

/// Where and as whom to connect to a panel.
#[derive(Clone)]
pub struct PanelConnection {
    pub kind: PanelKind,
    pub url: Url,
    pub username: String,
    pub password: SecretString,
}

impl std::fmt::Debug for PanelConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelConnection")
            .field("kind", &self.kind)
            .field("url", &self.url.as_str())
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl PanelConnection {
    /// Key identifying the login session of this connection.
    #[must_use]
    pub fn session_key(&self) -> String {
        format!("{}|{}", self.url, self.username)
    }

    /// Key under which [`PanelRegistry`] shares a client.
    ///
    /// Covers the panel kind and a SHA-256 fingerprint of the password, so
    /// changed credentials never reuse a stale session.
    #[must_use]
    pub fn registry_key(&self) -> String {
        let fingerprint = Sha256::digest(self.password.expose_secret().as_bytes());
        format!(
            "{:?}|{}|{}|{}",
            self.kind,
            self.url,
            self.username,
            hex::encode(fingerprint)
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ttl() {
        assert_eq!(PanelKind::Sanaei.session_ttl(), Duration::from_secs(3500));
        assert_eq!(PanelKind::TxUi.session_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_kind_from_panel_type() {
        assert_eq!("3x-ui".parse::<PanelKind>().unwrap(), PanelKind::Sanaei);
        assert_eq!("tx-ui".parse::<PanelKind>().unwrap(), PanelKind::TxUi);
        assert!(matches!(
            PanelKind::try_from(&PanelType::Marzban),
            Err(PanelError::Unsupported(_))
        ));
    }

    #[test]
    fn test_registry_key_hides_password() {
        let connection = PanelConnection {
            kind: PanelKind::Sanaei,
            url: Url::parse("https://panel.example.com:2053/").unwrap(),
            username: "admin".to_owned(),
            password: SecretString::from("hunter22".to_owned()),
        };
        let key = connection.registry_key();
        assert!(key.starts_with("Sanaei|https://panel.example.com:2053/|admin|"));
        assert!(!key.contains("hunter22"));

        let rotated = PanelConnection {
            password: SecretString::from("hunter23".to_owned()),
            ..connection.clone()
        };
        assert_ne!(rotated.registry_key(), key);
        assert_eq!(rotated.session_key(), connection.session_key());
    }

    #[test]
    fn test_connection_debug_redacts_password() {
        let connection = PanelConnection {
            kind: PanelKind::Sanaei,
            url: Url::parse("https://panel.example.com:2053/").unwrap(),
            username: "admin".to_owned(),
            password: SecretString::from("hunter22".to_owned()),
        };
        let debug = format!("{connection:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter22"));
    }
}

//! Records exchanged with the console backend.
//!
//! Output records are transient caches of server state: created by a fetch
//! and replaced wholesale on every refetch. Input records are the bodies of
//! create/update calls.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{
    AdminId, ClientId, Flow, InboundId, InboundSelection, NewsId, PanelId, PanelType, Role,
    Traffic, parse_expiry_date, remaining_days,
};

// =============================================================================
// Envelope
// =============================================================================

/// Standard response envelope of the console backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseModel<T> {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ResponseModel<T> {
    /// Successful envelope carrying `data`.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Failed envelope with a message only.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

// =============================================================================
// Auth
// =============================================================================

/// Response of the login endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
}

/// Errors that can occur when decoding an access token.
#[derive(thiserror::Error, Debug)]
pub enum TokenError {
    /// The token does not have three dot-separated segments.
    #[error("access token is not a JWT")]
    Malformed,
    /// The payload segment is not valid base64url.
    #[error("access token payload is not base64url: {0}")]
    Encoding(#[from] base64::DecodeError),
    /// The payload is not the expected JSON claims.
    #[error("access token claims are invalid: {0}")]
    Claims(#[from] serde_json::Error),
}

/// Claims carried by a console access token.
///
/// Decoded without signature verification; the backend is the authority and
/// this is only used to show who is logged in and when the token lapses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedToken {
    pub sub: String,
    pub role: Role,
    #[serde(default)]
    pub panel: String,
    pub exp: i64,
}

impl DecodedToken {
    /// Decode the claims of a JWT.
    ///
    /// # Errors
    ///
    /// Returns a [`TokenError`] if the token is malformed.
    pub fn decode(token: &str) -> Result<Self, TokenError> {
        let mut segments = token.split('.');
        let (Some(_header), Some(payload), Some(_signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(TokenError::Malformed);
        };
        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Whether the token has expired at unix time `now`.
    #[must_use]
    pub const fn is_expired(&self, now: i64) -> bool {
        now >= self.exp
    }
}

// =============================================================================
// Admins
// =============================================================================

/// An admin account as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminOutput {
    pub id: AdminId,
    pub username: String,
    pub is_active: bool,
    /// Name of the panel this admin is provisioned on.
    pub panel: String,
    pub inbound_id: Option<InboundId>,
    /// JSON-encoded [`InboundSelection`] for Marzban panels.
    pub marzban_inbounds: Option<String>,
    pub marzban_password: Option<String>,
    #[serde(default)]
    pub flow: Option<String>,
    /// Quota in bytes.
    pub traffic: Traffic,
    pub return_traffic: bool,
    /// `YYYY-MM-DD`.
    pub expiry_date: Option<String>,
}

impl AdminOutput {
    /// Parsed expiry date, if set and well-formed.
    #[must_use]
    pub fn expiry(&self) -> Option<NaiveDate> {
        self.expiry_date.as_deref().and_then(parse_expiry_date)
    }

    /// Days left until expiry, floored at zero.
    #[must_use]
    pub fn remaining_days(&self, today: NaiveDate) -> Option<i64> {
        self.expiry().map(|expiry| remaining_days(expiry, today))
    }

    /// The flow, if it is one of the known values.
    #[must_use]
    pub fn flow(&self) -> Option<Flow> {
        self.flow.as_deref().and_then(|f| f.parse().ok())
    }

    /// The stored Marzban inbound selection.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored JSON is malformed.
    pub fn inbound_selection(
        &self,
    ) -> Result<InboundSelection, crate::types::InboundSelectionError> {
        self.marzban_inbounds
            .as_deref()
            .map_or_else(|| Ok(InboundSelection::new()), InboundSelection::parse)
    }
}

/// Body of admin create and update calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminInput {
    pub username: String,
    pub password: String,
    pub panel: String,
    pub inbound_id: Option<InboundId>,
    pub marzban_inbounds: Option<String>,
    pub marzban_password: Option<String>,
    pub flow: Option<Flow>,
    /// Quota in gigabytes; the backend converts to bytes.
    #[serde(with = "rust_decimal::serde::float")]
    pub traffic: Decimal,
    pub return_traffic: bool,
    pub is_active: bool,
    pub expiry_date: Option<String>,
}

// =============================================================================
// Panels
// =============================================================================

/// A panel integration as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelOutput {
    pub id: PanelId,
    pub panel_type: PanelType,
    pub name: String,
    pub url: String,
    pub is_active: bool,
}

/// Body of panel create and update calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelInput {
    pub panel_type: PanelType,
    pub name: String,
    pub url: String,
    pub sub_url: Option<String>,
    pub username: String,
    pub password: String,
    pub is_active: bool,
}

/// Inbound tags of a Marzban panel grouped by protocol.
pub type PanelInbounds = std::collections::BTreeMap<String, Vec<String>>;

// =============================================================================
// News
// =============================================================================

/// An announcement shown on admin dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: NewsId,
    pub message: String,
    pub created_at: String,
}

/// Body of the add-news call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsInput {
    pub message: String,
}

// =============================================================================
// Clients and dashboard
// =============================================================================

/// An end user provisioned on an admin's inbound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientsOutput {
    pub id: ClientId,
    pub uuid: String,
    pub username: String,
    pub status: bool,
    pub is_online: bool,
    pub data_limit: Traffic,
    pub used_data: Traffic,
    pub expiry_date: Option<String>,
    pub expiry_date_unix: Option<i64>,
    #[serde(default)]
    pub sub_id: Option<String>,
    #[serde(default)]
    pub flow: Option<String>,
}

/// Host resource usage reported on the superadmin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStats {
    pub total_memory: u64,
    pub used_memory: u64,
    pub cpu_percent: f64,
    pub disk_total: u64,
    pub disk_used: u64,
}

/// Advertisement block shown to admins.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AdsData {
    pub title: Option<String>,
    pub text: Option<String>,
    pub link: Option<String>,
    pub button: Option<String>,
}

/// Dashboard payload; which fields are set depends on the caller's role.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DashboardData {
    #[serde(default)]
    pub remaining_traffic: Option<Traffic>,
    #[serde(default)]
    pub expiry_time: Option<String>,
    #[serde(default)]
    pub news: Option<Vec<String>>,
    #[serde(default)]
    pub sub_url: Option<String>,
    #[serde(default)]
    pub users: Option<Vec<ClientsOutput>>,
    #[serde(default)]
    pub admins: Option<Vec<AdminOutput>>,
    #[serde(default)]
    pub panels: Option<Vec<PanelOutput>>,
    #[serde(default)]
    pub system: Option<SystemStats>,
    #[serde(default)]
    pub ads: Option<AdsData>,
}

//! Wire types of the 3x-ui / tx-ui panel API.

use proxy_console_core::{InboundId, Traffic};
use serde::{Deserialize, Deserializer, Serialize};

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

const fn enabled() -> bool {
    true
}

/// Response wrapper used by every panel endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct XuiResponse<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub msg: String,
    pub obj: Option<T>,
}

impl<T> Default for XuiResponse<T> {
    fn default() -> Self {
        Self {
            success: false,
            msg: String::new(),
            obj: None,
        }
    }
}

/// An inbound with its per-client traffic counters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Inbound {
    pub id: InboundId,
    #[serde(default)]
    pub remark: String,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub enable: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub client_stats: Vec<ClientStat>,
    /// Protocol settings as a JSON string; holds the configured clients.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing)]
    pub settings: String,
}

impl Inbound {
    /// Clients configured in [`Inbound::settings`].
    ///
    /// # Errors
    ///
    /// Returns an error if the settings string is not the expected JSON.
    pub fn clients(&self) -> Result<Vec<InboundClient>, serde_json::Error> {
        if self.settings.trim().is_empty() {
            return Ok(Vec::new());
        }
        let settings: InboundSettings = serde_json::from_str(&self.settings)?;
        Ok(settings.clients)
    }
}

#[derive(Deserialize)]
struct InboundSettings {
    #[serde(default, deserialize_with = "null_as_default")]
    clients: Vec<InboundClient>,
}

/// A client as configured on an inbound.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundClient {
    /// UUID; trojan inbounds call it `password`.
    #[serde(default, alias = "password")]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub flow: String,
    #[serde(default = "enabled")]
    pub enable: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sub_id: String,
}

/// Traffic counters of one client on an inbound.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientStat {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub inbound_id: Option<InboundId>,
    #[serde(default)]
    pub enable: bool,
    pub email: String,
    #[serde(default)]
    pub up: Traffic,
    #[serde(default)]
    pub down: Traffic,
    /// Unix milliseconds; zero means no expiry.
    #[serde(default)]
    pub expiry_time: i64,
    /// Quota in bytes; zero means unlimited.
    #[serde(default)]
    pub total: Traffic,
    #[serde(default)]
    pub reset: i64,
}

impl ClientStat {
    /// Upload plus download.
    #[must_use]
    pub const fn used(&self) -> Traffic {
        Traffic::from_bytes(self.up.bytes().saturating_add(self.down.bytes()))
    }
}

/// A client of an admin's inbound, with its online flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelUser {
    #[serde(flatten)]
    pub stat: ClientStat,
    pub is_online: bool,
}

/// A client to create or update on an inbound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInput {
    /// Client UUID.
    pub id: String,
    pub email: String,
    pub enable: bool,
    /// Quota in bytes.
    pub total: Traffic,
    /// Unix milliseconds; zero means no expiry.
    pub expiry_time: i64,
    pub sub_id: String,
    /// The client's own flow, used when the admin has none.
    pub flow: Option<String>,
}

/// One entry of the `settings.clients` array.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SettingsClient<'a> {
    pub id: &'a str,
    pub sub_id: &'a str,
    pub email: &'a str,
    pub flow: &'a str,
    pub enable: bool,
    #[serde(rename = "totalGB")]
    pub total_gb: u64,
    pub expiry_time: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_ip: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<&'a str>,
}

#[derive(Serialize)]
pub(super) struct Settings<'a> {
    pub clients: [SettingsClient<'a>; 1],
}

/// Body of `addClient` / `updateClient`: settings travel as a JSON string.
#[derive(Serialize)]
pub(super) struct ClientRequest {
    pub id: InboundId,
    pub settings: String,
}

//! Panel types, transport flows and console roles.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Upstream proxy-management system a panel integration talks to.
///
/// Unknown tags are preserved in [`PanelType::Other`] so listing a backend
/// that knows about a newer panel type never fails.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PanelType {
    /// Sanaei 3x-ui.
    #[default]
    ThreeXUi,
    /// tx-ui.
    TxUi,
    /// Marzban.
    Marzban,
    /// Any other tag reported by the backend.
    Other(String),
}

impl PanelType {
    /// Wire tag for this panel type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::ThreeXUi => "3x-ui",
            Self::TxUi => "tx-ui",
            Self::Marzban => "marzban",
            Self::Other(tag) => tag,
        }
    }

    /// Whether admins on this panel type must carry a [`Flow`].
    #[must_use]
    pub const fn requires_flow(&self) -> bool {
        matches!(self, Self::ThreeXUi | Self::TxUi)
    }

    /// Whether admins on this panel type select inbounds per protocol.
    #[must_use]
    pub const fn uses_inbound_selection(&self) -> bool {
        matches!(self, Self::Marzban)
    }
}

impl From<String> for PanelType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "3x-ui" => Self::ThreeXUi,
            "tx-ui" => Self::TxUi,
            "marzban" => Self::Marzban,
            _ => Self::Other(tag),
        }
    }
}

impl From<&str> for PanelType {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_owned())
    }
}

impl From<PanelType> for String {
    fn from(panel_type: PanelType) -> Self {
        match panel_type {
            PanelType::Other(tag) => tag,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for PanelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PanelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        if tag.is_empty() {
            return Err("Panel type is required".to_owned());
        }
        Ok(Self::from(tag))
    }
}

/// XTLS flow assigned to clients on 3x-ui and tx-ui inbounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flow {
    #[serde(rename = "xtls-rprx-vision")]
    XtlsRprxVision,
    #[serde(rename = "xtls-rprx-vision-udp443")]
    XtlsRprxVisionUdp443,
}

impl Flow {
    /// All selectable flows.
    pub const ALL: [Self; 2] = [Self::XtlsRprxVision, Self::XtlsRprxVisionUdp443];

    /// Wire value of the flow.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::XtlsRprxVision => "xtls-rprx-vision",
            Self::XtlsRprxVisionUdp443 => "xtls-rprx-vision-udp443",
        }
    }

    /// Parse an optional flow; `"none"` and blank input mean no flow.
    ///
    /// # Errors
    ///
    /// Returns an error for any other unknown value.
    pub fn parse_optional(s: &str) -> Result<Option<Self>, String> {
        let value = s.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("none") {
            return Ok(None);
        }
        value.parse().map(Some)
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Flow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|flow| flow.as_str() == s.trim())
            .ok_or_else(|| format!("invalid flow: {s}"))
    }
}

/// Role carried in the console access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Reseller admin bound to one panel.
    Admin,
    /// Operator with access to admin, panel and settings management.
    Superadmin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Superadmin => write!(f, "superadmin"),
        }
    }
}

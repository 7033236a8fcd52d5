//! Per-protocol inbound selection used by Marzban admins.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Errors that can occur when reading a stored selection.
#[derive(thiserror::Error, Debug)]
pub enum InboundSelectionError {
    /// The stored value is not a JSON object of string lists.
    #[error("invalid inbound selection: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Selected inbound tags grouped by protocol.
///
/// Stored by the backend as a JSON string such as
/// `{"vless":["VLESS TCP"],"vmess":["VMess WS"]}`. A protocol never maps to
/// an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InboundSelection(BTreeMap<String, Vec<String>>);

impl InboundSelection {
    /// Create an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the JSON string stored on an admin record.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a protocol-to-tags object.
    pub fn parse(stored: &str) -> Result<Self, InboundSelectionError> {
        let map: BTreeMap<String, Vec<String>> = serde_json::from_str(stored)?;
        Ok(Self(
            map.into_iter().filter(|(_, tags)| !tags.is_empty()).collect(),
        ))
    }

    /// Select `tag` under `protocol`, or deselect it if already selected.
    ///
    /// Deselecting the last tag of a protocol removes the protocol.
    pub fn toggle(&mut self, protocol: &str, tag: &str) {
        let tags = self.0.entry(protocol.to_owned()).or_default();
        if let Some(pos) = tags.iter().position(|t| t == tag) {
            tags.remove(pos);
            if tags.is_empty() {
                self.0.remove(protocol);
            }
        } else {
            tags.push(tag.to_owned());
        }
    }

    /// Whether `tag` is selected under `protocol`.
    #[must_use]
    pub fn contains(&self, protocol: &str, tag: &str) -> bool {
        self.0
            .get(protocol)
            .is_some_and(|tags| tags.iter().any(|t| t == tag))
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over protocols and their selected tags.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }

    /// Backend representation: `None` when empty, else the JSON string.
    #[must_use]
    pub fn to_wire(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        serde_json::to_string(&self.0).ok()
    }
}

impl From<BTreeMap<String, Vec<String>>> for InboundSelection {
    fn from(map: BTreeMap<String, Vec<String>>) -> Self {
        Self(map.into_iter().filter(|(_, tags)| !tags.is_empty()).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_adds_and_removes() {
        let mut selection = InboundSelection::new();
        selection.toggle("vless", "VLESS TCP");
        selection.toggle("vless", "VLESS WS");
        assert!(selection.contains("vless", "VLESS TCP"));

        selection.toggle("vless", "VLESS TCP");
        assert!(!selection.contains("vless", "VLESS TCP"));
        assert!(selection.contains("vless", "VLESS WS"));
    }

    #[test]
    fn test_toggle_last_tag_drops_protocol() {
        let mut selection = InboundSelection::new();
        selection.toggle("vmess", "VMess WS");
        selection.toggle("vmess", "VMess WS");
        assert!(selection.is_empty());
        assert_eq!(selection.to_wire(), None);
    }

    #[test]
    fn test_to_wire_json() {
        let mut selection = InboundSelection::new();
        selection.toggle("vmess", "VMess WS");
        selection.toggle("trojan", "Trojan");
        assert_eq!(
            selection.to_wire().unwrap(),
            r#"{"trojan":["Trojan"],"vmess":["VMess WS"]}"#
        );
    }

    #[test]
    fn test_parse_stored() {
        let selection = InboundSelection::parse(r#"{"vless":["A"],"vmess":[]}"#).unwrap();
        assert!(selection.contains("vless", "A"));
        assert_eq!(selection.iter().count(), 1);
        assert!(InboundSelection::parse("not json").is_err());
    }
}

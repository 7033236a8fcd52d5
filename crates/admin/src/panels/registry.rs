//! Process-wide pool of panel clients.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use super::{PanelConnection, PanelError, XuiClient};

/// Shares one [`XuiClient`] (and so one login session) per panel kind, URL,
/// username and password.
#[derive(Clone)]
pub struct PanelRegistry {
    clients: Cache<String, XuiClient>,
}

impl Default for PanelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PanelRegistry {
    #[must_use]
    pub fn new() -> Self {
        let clients = Cache::builder()
            .max_capacity(64)
            .time_to_idle(Duration::from_secs(3600))
            .build();
        Self { clients }
    }

    /// Client for `connection`, created on first use.
    ///
    /// Concurrent first calls for the same connection build one client.
    ///
    /// # Errors
    ///
    /// Returns an error if a new client cannot be built.
    pub async fn client(&self, connection: &PanelConnection) -> Result<XuiClient, PanelError> {
        self.clients
            .try_get_with(connection.registry_key(), async {
                XuiClient::new(connection.clone())
            })
            .await
            .map_err(|e| Arc::try_unwrap(e).unwrap_or_else(PanelError::Shared))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;
    use url::Url;

    use super::*;
    use crate::panels::PanelKind;

    fn connection(username: &str) -> PanelConnection {
        PanelConnection {
            kind: PanelKind::TxUi,
            url: Url::parse("http://127.0.0.1:54321/").unwrap(),
            username: username.to_owned(),
            password: SecretString::from("secret".to_owned()),
        }
    }

    #[tokio::test]
    async fn test_concurrent_first_calls_share_client() {
        let registry = PanelRegistry::new();
        let conn = connection("admin");

        let (a, b) = tokio::join!(registry.client(&conn), registry.client(&conn));

        assert!(a.unwrap().ptr_eq(&b.unwrap()));
    }

    #[tokio::test]
    async fn test_changed_password_or_kind_gets_new_client() {
        let registry = PanelRegistry::new();
        let original = registry.client(&connection("admin")).await.unwrap();

        let rotated = PanelConnection {
            password: SecretString::from("rotated".to_owned()),
            ..connection("admin")
        };
        let sanaei = PanelConnection {
            kind: PanelKind::Sanaei,
            ..connection("admin")
        };

        assert!(!registry.client(&rotated).await.unwrap().ptr_eq(&original));
        assert!(!registry.client(&sanaei).await.unwrap().ptr_eq(&original));
        assert!(registry.client(&connection("admin")).await.unwrap().ptr_eq(&original));
    }

    #[tokio::test]
    async fn test_same_connection_shares_client() {
        let registry = PanelRegistry::new();
        let a = registry.client(&connection("admin")).await.unwrap();
        let b = registry.client(&connection("admin")).await.unwrap();
        let c = registry.client(&connection("other")).await.unwrap();

        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }
}

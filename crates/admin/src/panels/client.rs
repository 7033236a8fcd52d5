//! HTTP client for one upstream panel.

use std::sync::Arc;
use std::time::Instant;

use moka::future::Cache;
use proxy_console_core::InboundId;
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use super::types::{ClientRequest, ClientStat, Inbound, Settings, SettingsClient, XuiResponse};
use super::{ClientInput, PanelConnection, PanelError, PanelKind};

/// Statuses after which the session is assumed lost.
const RELOGIN_STATUSES: [StatusCode; 3] = [
    StatusCode::UNAUTHORIZED,
    StatusCode::FORBIDDEN,
    StatusCode::NOT_FOUND,
];

/// Client for a 3x-ui or tx-ui panel.
///
/// The session cookie lives in the client's cookie store. Logins are
/// remembered for [`PanelKind::session_ttl`]; a 401, 403 or 404 forces a
/// fresh login and the request is retried once.
#[derive(Clone)]
pub struct XuiClient {
    inner: Arc<XuiClientInner>,
}

struct XuiClientInner {
    client: reqwest::Client,
    /// Always ends with `/`.
    base_url: Url,
    connection: PanelConnection,
    /// Login time per session key; entries expire after the session TTL.
    sessions: Cache<String, Instant>,
}

impl std::fmt::Debug for XuiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XuiClient")
            .field("connection", &self.inner.connection)
            .finish_non_exhaustive()
    }
}

impl XuiClient {
    /// Create a client for `connection`.
    ///
    /// # Errors
    ///
    /// Returns `PanelError::Http` if the HTTP client cannot be built.
    pub fn new(connection: PanelConnection) -> Result<Self, PanelError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("Mozilla/5.0")
            .build()?;

        let mut base_url = connection.url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let sessions = Cache::builder()
            .max_capacity(16)
            .time_to_live(connection.kind.session_ttl())
            .build();

        Ok(Self {
            inner: Arc::new(XuiClientInner {
                client,
                base_url,
                connection,
                sessions,
            }),
        })
    }

    /// Whether both handles share the same client.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// The panel family.
    #[must_use]
    pub fn kind(&self) -> PanelKind {
        self.inner.connection.kind
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Log in unless a session younger than the TTL exists.
    ///
    /// # Errors
    ///
    /// Returns `PanelError::LoginFailed` if the panel refuses the credentials.
    #[instrument(skip(self), fields(url = %self.inner.base_url))]
    pub async fn login(&self, force: bool) -> Result<(), PanelError> {
        let key = self.inner.connection.session_key();
        if !force && self.inner.sessions.contains_key(&key) {
            return Ok(());
        }
        self.inner.sessions.invalidate(&key).await;

        let connection = &self.inner.connection;
        let response = self
            .inner
            .client
            .post(self.url("login")?)
            .form(&[
                ("username", connection.username.as_str()),
                ("password", connection.password.expose_secret()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status != StatusCode::OK {
            return Err(PanelError::LoginFailed {
                status: status.as_u16(),
                body,
            });
        }
        // 3x-ui answers 200 with success=false on bad credentials
        if let Ok(reply) = serde_json::from_str::<XuiResponse<serde_json::Value>>(&body)
            && !reply.success
        {
            return Err(PanelError::LoginFailed {
                status: status.as_u16(),
                body: reply.msg,
            });
        }

        self.inner.sessions.insert(key, Instant::now()).await;
        tracing::debug!(kind = ?connection.kind, "Logged in to panel");
        Ok(())
    }

    /// Whether a login session is currently remembered.
    #[must_use]
    pub fn has_session(&self) -> bool {
        self.inner
            .sessions
            .contains_key(&self.inner.connection.session_key())
    }

    // =========================================================================
    // Request helpers
    // =========================================================================

    fn url(&self, path: &str) -> Result<Url, PanelError> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// Send a request, re-logging in and retrying once on a lost session.
    async fn request_with_retry<B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response, PanelError> {
        self.login(false).await?;
        let url = self.url(path)?;

        let build = |method: Method| {
            let request = self.inner.client.request(method, url.clone());
            match body {
                Some(body) => request.json(body),
                None => request,
            }
        };

        let mut response = build(method.clone()).send().await?;
        if RELOGIN_STATUSES.contains(&response.status()) {
            tracing::debug!(status = response.status().as_u16(), path, "Session lost, logging in again");
            self.login(true).await?;
            response = build(method).send().await?;
        }

        let status = response.status();
        if !status.is_success() {
            return Err(PanelError::Status {
                status: status.as_u16(),
                path: path.to_owned(),
            });
        }
        Ok(response)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
    ) -> Result<XuiResponse<T>, PanelError> {
        let response = self.request_with_retry::<()>(method, path, None).await?;
        safe_json(response).await
    }

    /// Post a client change and require `success`.
    async fn post_client(
        &self,
        path: &str,
        inbound_id: InboundId,
        entry: SettingsClient<'_>,
    ) -> Result<(), PanelError> {
        let settings = serde_json::to_string(&Settings { clients: [entry] })?;
        let body = ClientRequest {
            id: inbound_id,
            settings,
        };
        let response = self
            .request_with_retry(Method::POST, path, Some(&body))
            .await?;
        require_success(safe_json::<serde_json::Value>(response).await?)
    }

    // =========================================================================
    // Endpoints
    // =========================================================================

    /// Whether the panel accepts our credentials and reports its status.
    ///
    /// Never fails; any error counts as "not reachable".
    #[instrument(skip(self), fields(url = %self.inner.base_url))]
    pub async fn test_connection(&self) -> bool {
        if let Err(e) = self.login(true).await {
            tracing::warn!(error = %e, "Panel login failed");
            return false;
        }
        match self
            .call::<serde_json::Value>(Method::GET, "panel/api/server/status")
            .await
        {
            Ok(reply) => reply.success,
            Err(e) => {
                tracing::warn!(error = %e, "Panel status check failed");
                false
            }
        }
    }

    /// All inbounds with their client counters.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn inbounds(&self) -> Result<Vec<Inbound>, PanelError> {
        let reply = self
            .call::<Vec<Inbound>>(Method::GET, "panel/api/inbounds/list")
            .await?;
        Ok(reply.obj.unwrap_or_default())
    }

    /// Emails of clients currently online.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn online_clients(&self) -> Result<Vec<String>, PanelError> {
        let reply = self
            .call::<Vec<String>>(Method::POST, "panel/api/inbounds/onlines")
            .await?;
        Ok(reply.obj.unwrap_or_default())
    }

    /// Add a client to an inbound.
    ///
    /// `flow` is the inbound's flow; when `None` the client's own flow is
    /// used.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the panel rejects it.
    #[instrument(skip(self, client), fields(email = %client.email))]
    pub async fn add_client(
        &self,
        inbound_id: InboundId,
        flow: Option<&str>,
        client: &ClientInput,
    ) -> Result<(), PanelError> {
        let entry = SettingsClient {
            id: &client.id,
            sub_id: &client.sub_id,
            email: &client.email,
            flow: flow.or(client.flow.as_deref()).unwrap_or_default(),
            enable: client.enable,
            total_gb: client.total.bytes(),
            expiry_time: client.expiry_time,
            reset: Some(0),
            limit_ip: Some(0),
            comment: Some(""),
        };
        self.post_client("panel/api/inbounds/addClient", inbound_id, entry)
            .await
    }

    /// Replace a client on an inbound.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the panel rejects it.
    #[instrument(skip(self, client), fields(email = %client.email))]
    pub async fn update_client(
        &self,
        uuid: &str,
        inbound_id: InboundId,
        flow: Option<&str>,
        client: &ClientInput,
    ) -> Result<(), PanelError> {
        let entry = SettingsClient {
            id: uuid,
            sub_id: &client.sub_id,
            email: &client.email,
            flow: flow.or(client.flow.as_deref()).unwrap_or_default(),
            enable: client.enable,
            total_gb: client.total.bytes(),
            expiry_time: client.expiry_time,
            reset: None,
            limit_ip: None,
            comment: None,
        };
        let path = format!(
            "panel/api/inbounds/updateClient/{}",
            urlencoding::encode(uuid)
        );
        self.post_client(&path, inbound_id, entry).await
    }

    /// Remove a client from an inbound.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the panel rejects it.
    #[instrument(skip(self))]
    pub async fn delete_client(&self, inbound_id: InboundId, uuid: &str) -> Result<(), PanelError> {
        let path = format!(
            "panel/api/inbounds/{inbound_id}/delClient/{}",
            urlencoding::encode(uuid)
        );
        require_success(self.call::<serde_json::Value>(Method::POST, &path).await?)
    }

    /// Zero a client's traffic counters.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the panel rejects it.
    #[instrument(skip(self))]
    pub async fn reset_client_usage(
        &self,
        inbound_id: InboundId,
        email: &str,
    ) -> Result<(), PanelError> {
        let path = format!(
            "panel/api/inbounds/{inbound_id}/resetClientTraffic/{}",
            urlencoding::encode(email)
        );
        require_success(self.call::<serde_json::Value>(Method::POST, &path).await?)
    }

    /// Traffic counters of the client with `email`, if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn client_traffic(&self, email: &str) -> Result<Option<ClientStat>, PanelError> {
        let path = format!(
            "panel/api/inbounds/getClientTraffics/{}",
            urlencoding::encode(email)
        );
        let reply = self.call::<ClientStat>(Method::GET, &path).await?;
        Ok(reply.obj)
    }
}

/// Parse a panel reply.
///
/// A body that is not JSON at all counts as an empty reply. JSON of the
/// wrong shape is an error.
async fn safe_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<XuiResponse<T>, PanelError> {
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read panel response");
            return Ok(XuiResponse::default());
        }
    };
    parse_reply(&body)
}

fn parse_reply<T: DeserializeOwned>(body: &str) -> Result<XuiResponse<T>, PanelError> {
    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, body = %body, "Invalid JSON from panel");
            return Ok(XuiResponse::default());
        }
    };
    serde_json::from_value(value).map_err(|e| {
        tracing::error!(error = %e, "Unexpected panel reply shape");
        PanelError::Serialization(e)
    })
}

fn require_success(reply: XuiResponse<serde_json::Value>) -> Result<(), PanelError> {
    if reply.success {
        Ok(())
    } else {
        Err(PanelError::Rejected(if reply.msg.is_empty() {
            "no message".to_owned()
        } else {
            reply.msg
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_non_json_reply_is_empty() {
        let reply = parse_reply::<Vec<Inbound>>("<html>502 Bad Gateway</html>").unwrap();
        assert!(!reply.success);
        assert!(reply.obj.is_none());
    }

    #[test]
    fn test_wrong_shape_reply_is_an_error() {
        let err = parse_reply::<Vec<Inbound>>(r#"{"success":true,"obj":[{"id":"two"}]}"#)
            .unwrap_err();
        assert!(matches!(err, PanelError::Serialization(_)), "{err:?}");
    }

    #[test]
    fn test_inbound_with_null_stats_still_lists() {
        let reply = parse_reply::<Vec<Inbound>>(
            r#"{"success":true,"msg":"","obj":[
                {"id":2,"clientStats":[{"email":"alice"}]},
                {"id":9,"clientStats":null}
            ]}"#,
        )
        .unwrap();
        let inbounds = reply.obj.unwrap();
        assert_eq!(inbounds.len(), 2);
        assert_eq!(inbounds[0].client_stats[0].email, "alice");
    }

    #[test]
    fn test_require_success() {
        let ok = XuiResponse {
            success: true,
            msg: String::new(),
            obj: None,
        };
        assert!(require_success(ok).is_ok());

        let rejected = XuiResponse {
            success: false,
            msg: "Duplicate email".to_owned(),
            obj: None,
        };
        assert!(matches!(
            require_success(rejected),
            Err(PanelError::Rejected(ref m)) if m == "Duplicate email"
        ));
    }

    #[test]
    fn test_relogin_statuses() {
        assert!(RELOGIN_STATUSES.contains(&StatusCode::NOT_FOUND));
        assert!(!RELOGIN_STATUSES.contains(&StatusCode::INTERNAL_SERVER_ERROR));
    }
}

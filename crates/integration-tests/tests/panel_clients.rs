//! Panel client and per-admin client management against a mock 3x-ui panel.

#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use proxy_console_admin::panels::{PanelConnection, PanelError, PanelKind, PanelRegistry, XuiClient};
use proxy_console_admin::tasks::{AdminTaskService, ClientOverrides, TaskError};
use proxy_console_core::forms::UserForm;
use proxy_console_core::{BYTES_PER_GB, ExpiryInput, Flow, InboundId};
use proxy_console_integration_tests::{
    MockPanel, PASSWORD, PanelState, USERNAME, client_uuid, inbound_json, set_settings_clients,
};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::{Value, json};

fn connection(panel: &MockPanel, password: &str) -> PanelConnection {
    PanelConnection {
        kind: PanelKind::Sanaei,
        url: panel.url(),
        username: USERNAME.to_owned(),
        password: SecretString::from(password.to_owned()),
    }
}

async fn panel_with_clients() -> MockPanel {
    MockPanel::start(PanelState {
        inbounds: vec![inbound_json(2, &["alice", "bob"]), inbound_json(3, &["carol"])],
        onlines: vec!["bob".to_owned()],
        ..PanelState::default()
    })
    .await
}

fn service(client: XuiClient) -> AdminTaskService {
    AdminTaskService::for_inbound(
        "reseller".to_owned(),
        InboundId::new(2),
        Some(Flow::XtlsRprxVision),
        client,
    )
}

/// Decode the `settings` string of the last client call.
async fn last_settings(panel: &MockPanel) -> Value {
    let body = panel.state.lock().await.last_client_body.clone().unwrap();
    serde_json::from_str(body["settings"].as_str().unwrap()).unwrap()
}

// =============================================================================
// Session handling
// =============================================================================

#[tokio::test]
async fn test_session_is_reused() {
    let panel = panel_with_clients().await;
    let client = XuiClient::new(connection(&panel, PASSWORD)).unwrap();

    client.inbounds().await.unwrap();
    client.online_clients().await.unwrap();

    assert!(client.has_session());
    assert_eq!(panel.state.lock().await.logins, 1);
}

#[tokio::test]
async fn test_lost_session_relogs_and_retries() {
    let panel = panel_with_clients().await;
    let client = XuiClient::new(connection(&panel, PASSWORD)).unwrap();
    client.inbounds().await.unwrap();

    panel.expire_session().await;
    let inbounds = client.inbounds().await.unwrap();

    assert_eq!(inbounds.len(), 2);
    let state = panel.state.lock().await;
    assert_eq!(state.logins, 2);
    assert_eq!(
        state.requests,
        vec![
            "POST /login",
            "GET /panel/api/inbounds/list",
            "GET /panel/api/inbounds/list",
            "POST /login",
            "GET /panel/api/inbounds/list",
        ]
    );
}

#[tokio::test]
async fn test_bad_credentials_fail_login() {
    let panel = panel_with_clients().await;
    let client = XuiClient::new(connection(&panel, "wrong")).unwrap();

    let err = client.inbounds().await.unwrap_err();

    assert!(
        matches!(err, PanelError::LoginFailed { ref body, .. } if body == "Wrong username or password"),
        "unexpected error: {err:?}"
    );
    assert!(!client.has_session());
    assert!(!client.test_connection().await);
}

#[tokio::test]
async fn test_connection_check() {
    let panel = panel_with_clients().await;
    let client = XuiClient::new(connection(&panel, PASSWORD)).unwrap();

    assert!(client.test_connection().await);
}

#[tokio::test]
async fn test_registry_shares_sessions() {
    let panel = panel_with_clients().await;
    let registry = PanelRegistry::new();
    let conn = connection(&panel, PASSWORD);

    registry.client(&conn).await.unwrap().inbounds().await.unwrap();
    registry.client(&conn).await.unwrap().inbounds().await.unwrap();

    assert_eq!(panel.state.lock().await.logins, 1);
}

// =============================================================================
// Client management
// =============================================================================

#[tokio::test]
async fn test_users_flags_online_clients() {
    let panel = panel_with_clients().await;
    let tasks = service(XuiClient::new(connection(&panel, PASSWORD)).unwrap());

    let users = tasks.users().await.unwrap();

    assert_eq!(users.len(), 2);
    let bob = users.iter().find(|u| u.stat.email == "bob").unwrap();
    assert!(bob.is_online);
    let alice = users.iter().find(|u| u.stat.email == "alice").unwrap();
    assert!(!alice.is_online);
    assert_eq!(alice.stat.used().bytes(), 3 * BYTES_PER_GB);
}

#[tokio::test]
async fn test_users_of_missing_inbound_is_empty() {
    let panel = panel_with_clients().await;
    let client = XuiClient::new(connection(&panel, PASSWORD)).unwrap();
    let tasks = AdminTaskService::for_inbound("ghost".to_owned(), InboundId::new(42), None, client);

    assert!(tasks.users().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_add_client_sends_settings_string() {
    let panel = panel_with_clients().await;
    let tasks = service(XuiClient::new(connection(&panel, PASSWORD)).unwrap());
    let form = UserForm {
        email: "dave".to_owned(),
        total_gb: Decimal::from(5),
        expiry: ExpiryInput::Days(1.0),
    };
    let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();

    let uuid = tasks.add_client(&form, today).await.unwrap();

    let body = panel.state.lock().await.last_client_body.clone().unwrap();
    assert_eq!(body["id"], 2);
    assert!(body["settings"].is_string());

    let settings = last_settings(&panel).await;
    let entry = &settings["clients"][0];
    assert_eq!(entry["id"], uuid.as_str());
    assert_eq!(entry["email"], "dave");
    assert_eq!(entry["flow"], "xtls-rprx-vision");
    assert_eq!(entry["totalGB"], 5 * BYTES_PER_GB);
    assert_eq!(entry["expiryTime"], 1_767_312_000_000_i64);
    assert_eq!(entry["enable"], true);
    assert_eq!(entry["subId"].as_str().unwrap().len(), 16);
}

#[tokio::test]
async fn test_users_survive_inbound_with_null_stats() {
    let mut fresh = inbound_json(9, &[]);
    fresh["clientStats"] = Value::Null;
    let panel = MockPanel::start(PanelState {
        inbounds: vec![inbound_json(2, &["alice", "bob"]), fresh],
        ..PanelState::default()
    })
    .await;
    let tasks = service(XuiClient::new(connection(&panel, PASSWORD)).unwrap());

    let users = tasks.users().await.unwrap();

    assert_eq!(users.len(), 2);
}

#[tokio::test]
async fn test_misshapen_inbound_list_is_an_error() {
    let panel = MockPanel::start(PanelState {
        inbounds: vec![json!({"id": "two", "clientStats": []})],
        ..PanelState::default()
    })
    .await;
    let tasks = service(XuiClient::new(connection(&panel, PASSWORD)).unwrap());

    let err = tasks.users().await.unwrap_err();

    assert!(
        matches!(err, TaskError::Panel(PanelError::Serialization(_))),
        "unexpected error: {err:?}"
    );
}

fn alice_form() -> UserForm {
    UserForm {
        email: "alice".to_owned(),
        total_gb: Decimal::from(20),
        expiry: ExpiryInput::None,
    }
}

#[tokio::test]
async fn test_update_client_applies_overrides() {
    let panel = panel_with_clients().await;
    let tasks = service(XuiClient::new(connection(&panel, PASSWORD)).unwrap());
    let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    let overrides = ClientOverrides {
        enable: Some(false),
        sub_id: Some("newsubid12345678".to_owned()),
    };

    tasks
        .update_client(&client_uuid("alice"), &alice_form(), &overrides, today)
        .await
        .unwrap();

    let requests = panel.state.lock().await.requests.clone();
    assert_eq!(
        requests.last().unwrap(),
        "POST /panel/api/inbounds/updateClient/uuid-alice"
    );
    let entry = last_settings(&panel).await["clients"][0].clone();
    assert_eq!(entry["id"], "uuid-alice");
    assert_eq!(entry["subId"], "newsubid12345678");
    assert_eq!(entry["enable"], false);
    assert_eq!(entry["totalGB"], 20 * BYTES_PER_GB);
    assert_eq!(entry["expiryTime"], 0);
}

#[tokio::test]
async fn test_update_client_keeps_current_settings() {
    let panel = panel_with_clients().await;
    set_settings_clients(
        &mut panel.state.lock().await.inbounds,
        2,
        &[json!({
            "id": "uuid-alice",
            "email": "alice",
            "flow": "xtls-rprx-vision",
            "enable": false,
            "subId": "keepmysubid12345"
        })],
    );
    // Admin without a flow of its own
    let tasks = AdminTaskService::for_inbound(
        "reseller".to_owned(),
        InboundId::new(2),
        None,
        XuiClient::new(connection(&panel, PASSWORD)).unwrap(),
    );
    let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();

    tasks
        .update_client("uuid-alice", &alice_form(), &ClientOverrides::default(), today)
        .await
        .unwrap();

    let entry = last_settings(&panel).await["clients"][0].clone();
    assert_eq!(entry["subId"], "keepmysubid12345");
    assert_eq!(entry["enable"], false);
    assert_eq!(entry["flow"], "xtls-rprx-vision");
}

#[tokio::test]
async fn test_update_unknown_client_sends_nothing() {
    let panel = panel_with_clients().await;
    let tasks = service(XuiClient::new(connection(&panel, PASSWORD)).unwrap());
    let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();

    let err = tasks
        .update_client("uuid-nobody", &alice_form(), &ClientOverrides::default(), today)
        .await
        .unwrap_err();

    assert!(matches!(err, TaskError::ClientNotFound(ref id) if id == "uuid-nobody"));
    let state = panel.state.lock().await;
    assert!(state.last_client_body.is_none());
    assert!(!state.requests.iter().any(|r| r.contains("updateClient")));
}

#[tokio::test]
async fn test_reset_and_delete_paths() {
    let panel = panel_with_clients().await;
    let tasks = service(XuiClient::new(connection(&panel, PASSWORD)).unwrap());

    tasks.reset_usage("alice").await.unwrap();
    tasks.delete_client("0b7c1a52-uuid").await.unwrap();

    let requests = panel.state.lock().await.requests.clone();
    assert!(requests.contains(&"POST /panel/api/inbounds/2/resetClientTraffic/alice".to_owned()));
    assert!(requests.contains(&"POST /panel/api/inbounds/2/delClient/0b7c1a52-uuid".to_owned()));
}

#[tokio::test]
async fn test_panel_rejection_is_returned() {
    let panel = panel_with_clients().await;
    panel.state.lock().await.reject_with = Some("Duplicate email: alice".to_owned());
    let tasks = service(XuiClient::new(connection(&panel, PASSWORD)).unwrap());
    let form = UserForm {
        email: "alice".to_owned(),
        total_gb: Decimal::ONE,
        expiry: ExpiryInput::None,
    };
    let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();

    let err = tasks.add_client(&form, today).await.unwrap_err();

    assert!(err.to_string().contains("Duplicate email: alice"), "{err}");
}

#[tokio::test]
async fn test_client_traffic_lookup() {
    let panel = panel_with_clients().await;
    let client = XuiClient::new(connection(&panel, PASSWORD)).unwrap();

    let carol = client.client_traffic("carol").await.unwrap().unwrap();
    assert_eq!(carol.inbound_id, Some(InboundId::new(3)));
    assert!(client.client_traffic("nobody").await.unwrap().is_none());
}

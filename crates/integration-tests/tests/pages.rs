//! Admin and panel pages and their dialogs against the mock console backend.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use chrono::NaiveDate;
use proxy_console_admin::pages::{
    AdminFormDialog, AdminsPage, FormError, PanelFormDialog, PanelsPage,
};
use proxy_console_admin::{ConsoleClient, ConsoleConfig, Credentials};
use proxy_console_core::{AdminId, ExpiryInput, Flow, PanelId};
use proxy_console_integration_tests::{BackendState, MockBackend, admin_json, panel_json};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::json;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
}

async fn seeded() -> MockBackend {
    MockBackend::start(BackendState {
        admins: vec![
            admin_json(1, "reseller", "germany"),
            admin_json(2, "partner", "germany"),
        ],
        panels: vec![
            panel_json(7, "germany", "3x-ui"),
            panel_json(8, "iran", "marzban"),
        ],
        ..BackendState::default()
    })
    .await
}

// =============================================================================
// Admins page
// =============================================================================

#[tokio::test]
async fn test_refresh_loads_admins() {
    let backend = seeded().await;
    let client = backend.client();
    let mut page = AdminsPage::new();

    page.refresh(&client).await;

    assert!(!page.is_loading());
    assert_eq!(page.error(), None);
    assert_eq!(page.items().len(), 2);
    let rows = page.rows(today());
    assert_eq!(rows[0].traffic, "50.00 GB");
    assert_eq!(rows[0].remaining_days, Some(296));
}

#[tokio::test]
async fn test_delete_refetches_list() {
    let backend = seeded().await;
    let client = backend.client();
    let mut page = AdminsPage::new();
    page.refresh(&client).await;
    backend.clear_requests().await;

    let message = page.delete(&client, AdminId::new(1)).await.unwrap();

    assert_eq!(message, "Admin deleted successfully");
    assert_eq!(page.items().len(), 1);
    assert!(page.find(AdminId::new(1)).is_none());
    assert_eq!(
        backend.requests().await,
        vec!["DELETE /superadmin/admin/1", "GET /superadmin/admins"]
    );
}

#[tokio::test]
async fn test_toggle_refetches_list() {
    let backend = seeded().await;
    let client = backend.client();
    let mut page = AdminsPage::new();
    page.refresh(&client).await;

    page.toggle_active(&client, AdminId::new(2)).await.unwrap();

    assert!(!page.find(AdminId::new(2)).unwrap().is_active);
    assert!(page.find(AdminId::new(1)).unwrap().is_active);
}

#[tokio::test]
async fn test_failed_mutation_leaves_list_untouched() {
    let backend = seeded().await;
    let client = backend.client();
    let mut page = AdminsPage::new();
    page.refresh(&client).await;
    backend.state.lock().await.fail_mutations = Some((
        StatusCode::BAD_REQUEST,
        json!({"success": false, "message": "Admin has active users"}),
    ));
    backend.clear_requests().await;

    let err = page.delete(&client, AdminId::new(1)).await.unwrap_err();

    assert_eq!(err.to_string(), "Admin has active users");
    assert_eq!(page.items().len(), 2);
    assert_eq!(page.error(), None);
    // No refetch after a failure
    assert_eq!(backend.requests().await, vec!["DELETE /superadmin/admin/1"]);
}

#[tokio::test]
async fn test_garbage_list_uses_fallback_and_keeps_items() {
    let backend = seeded().await;
    let client = backend.client();
    let mut page = AdminsPage::new();
    page.refresh(&client).await;
    backend.state.lock().await.garbage_lists = Some("<html>bad gateway</html>".to_owned());

    page.refresh(&client).await;

    assert_eq!(page.error(), Some("Failed to fetch admins"));
    assert_eq!(page.items().len(), 2);
    assert!(!page.is_loading());
}

// =============================================================================
// Admin dialog
// =============================================================================

#[tokio::test]
async fn test_create_admin_on_3x_ui_panel() {
    let backend = seeded().await;
    let client = backend.client();
    let mut dialog = AdminFormDialog::open_on(&client, None, today()).await;
    assert!(!dialog.is_edit());
    assert_eq!(dialog.panels().len(), 2);

    dialog.select_panel(&client, "germany").await;
    dialog.form.username = "newbie".to_owned();
    dialog.form.password = "pass1234".to_owned();
    dialog.form.flow = Some(Flow::XtlsRprxVision);
    dialog.form.traffic_gb = Decimal::new(15, 1);
    dialog.form.expiry = ExpiryInput::Days(30.0);
    dialog.form.is_active = true;

    let message = dialog.submit(&client).await.unwrap();
    assert_eq!(message, "Admin created successfully");

    let body = backend.state.lock().await.last_admin_body.clone().unwrap();
    assert_eq!(body["username"], "newbie");
    assert_eq!(body["flow"], "xtls-rprx-vision");
    assert_eq!(body["traffic"], 1.5);
    assert_eq!(body["expiry_date"], "2026-04-09");
    assert!(body["marzban_password"].is_null());

    let mut page = AdminsPage::new();
    page.apply_dialog_success(&client).await;
    let created = page.items().iter().find(|a| a.username == "newbie").unwrap();
    assert_eq!(created.traffic.bytes(), 1_610_612_736);
}

#[tokio::test]
async fn test_missing_flow_blocks_submit() {
    let backend = seeded().await;
    let client = backend.client();
    let mut dialog = AdminFormDialog::open_on(&client, None, today()).await;
    dialog.select_panel(&client, "germany").await;
    dialog.form.username = "newbie".to_owned();
    dialog.form.password = "pass1234".to_owned();
    backend.clear_requests().await;

    let err = dialog.submit(&client).await.unwrap_err();

    assert!(matches!(err, FormError::Validation(_)));
    assert_eq!(err.to_string(), "Flow is required for 3x-ui panels");
    assert!(backend.requests().await.is_empty());
    assert_eq!(backend.state.lock().await.admins.len(), 2);
}

#[tokio::test]
async fn test_marzban_admin_sends_selection() {
    let mut inbounds = std::collections::BTreeMap::new();
    inbounds.insert(
        "vless".to_owned(),
        vec!["VLESS TCP".to_owned(), "VLESS WS".to_owned()],
    );
    let backend = seeded().await;
    backend
        .state
        .lock()
        .await
        .inbounds
        .insert("iran".to_owned(), inbounds);
    let client = backend.client();
    let mut dialog = AdminFormDialog::open_on(&client, None, today()).await;

    dialog.select_panel(&client, "iran").await;
    assert_eq!(dialog.inbounds().unwrap()["vless"].len(), 2);
    dialog.toggle_inbound("vless", "VLESS TCP");
    dialog.form.username = "mz-reseller".to_owned();
    dialog.form.password = "pass1234".to_owned();

    dialog.submit(&client).await.unwrap();

    let body = backend.state.lock().await.last_admin_body.clone().unwrap();
    assert_eq!(body["marzban_inbounds"], r#"{"vless":["VLESS TCP"]}"#);
    assert_eq!(body["marzban_password"], "pass1234");
    assert!(body["flow"].is_null());
}

#[tokio::test]
async fn test_edit_admin_reports_server_error() {
    let backend = seeded().await;
    let client = backend.client();
    let mut page = AdminsPage::new();
    page.refresh(&client).await;
    let admin = page.find(AdminId::new(1)).unwrap().clone();

    let mut dialog = AdminFormDialog::open_on(&client, Some(&admin), today()).await;
    assert!(dialog.is_edit());
    assert_eq!(dialog.form.username, "reseller");
    dialog.form.password = "pass1234".to_owned();
    backend.state.lock().await.fail_mutations = Some((
        StatusCode::UNPROCESSABLE_ENTITY,
        json!({"detail": [{"loc": ["body", "traffic"], "msg": "Traffic is too large"}]}),
    ));

    let err = dialog.submit(&client).await.unwrap_err();

    assert_eq!(err, FormError::Server("Traffic is too large".to_owned()));
    assert_eq!(dialog.error(), Some("Traffic is too large"));
    assert!(!dialog.is_submitting());

    dialog.close();
    assert!(!dialog.is_edit());
    assert_eq!(dialog.error(), None);
}

// =============================================================================
// Panels page and dialog
// =============================================================================

#[tokio::test]
async fn test_create_panel_then_refetch() {
    let backend = seeded().await;
    let client = backend.client();
    let mut page = PanelsPage::new();
    page.refresh(&client).await;

    let mut dialog = PanelFormDialog::open(None);
    dialog.form.panel_type = "tx-ui".to_owned();
    dialog.form.name = "finland".to_owned();
    dialog.form.url = "https://fi.example.com:54321/".to_owned();
    dialog.form.username = "admin".to_owned();
    dialog.form.password = "secret123".to_owned();
    dialog.form.is_active = true;

    assert_eq!(dialog.submit(&client).await.unwrap(), "Panel created successfully");
    page.apply_dialog_success(&client).await;

    assert_eq!(page.items().len(), 3);
    assert!(page.items().iter().any(|p| p.name == "finland"));
}

#[tokio::test]
async fn test_invalid_panel_url_blocks_submit() {
    let backend = seeded().await;
    let client = backend.client();
    let mut dialog = PanelFormDialog::open(None);
    dialog.form.panel_type = "3x-ui".to_owned();
    dialog.form.name = "broken".to_owned();
    dialog.form.url = "not a url".to_owned();
    dialog.form.username = "admin".to_owned();
    dialog.form.password = "secret123".to_owned();
    backend.clear_requests().await;

    let err = dialog.submit(&client).await.unwrap_err();

    assert_eq!(err.to_string(), "Must be a valid URL");
    assert!(backend.requests().await.is_empty());
}

#[tokio::test]
async fn test_panel_toggle_and_delete() {
    let backend = seeded().await;
    let client = backend.client();
    let mut page = PanelsPage::new();
    page.refresh(&client).await;

    page.toggle_active(&client, PanelId::new(7)).await.unwrap();
    assert!(!page.find(PanelId::new(7)).unwrap().is_active);

    page.delete(&client, PanelId::new(8)).await.unwrap();
    assert_eq!(page.items().len(), 1);

    let err = page.delete(&client, PanelId::new(99)).await.unwrap_err();
    assert_eq!(err.to_string(), "Panel not found");
    assert_eq!(page.items().len(), 1);
}

#[tokio::test]
async fn test_panel_list_error_uses_server_message() {
    let backend = seeded().await;
    let stale = ConsoleClient::new(&ConsoleConfig::new(
        backend.url(),
        Credentials::Token(SecretString::from("stale".to_owned())),
    ))
    .unwrap();
    let mut page = PanelsPage::new();

    page.refresh(&stale).await;

    assert_eq!(page.error(), Some("Could not validate credentials"));
    assert!(page.items().is_empty());
}

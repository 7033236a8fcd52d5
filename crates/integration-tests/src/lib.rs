//! In-process mock servers for the proxy console integration tests.
//!
//! - [`MockBackend`] - the console REST backend (`/login`, `/superadmin/...`)
//! - [`MockPanel`] - a 3x-ui panel (`/login`, `/panel/api/...`)
//!
//! Both bind `127.0.0.1:0`, serve from a spawned task, and expose their
//! state so tests can inject failures and inspect what was received.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Form, Multipart, Path, Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use proxy_console_admin::{ConsoleClient, ConsoleConfig, Credentials};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use url::Url;

/// Username accepted by both mocks.
pub const USERNAME: &str = "root";
/// Password accepted by both mocks.
pub const PASSWORD: &str = "hunter22";

const BYTES_PER_GB: f64 = 1_073_741_824.0;

/// Bind a listener on a free port and serve `app` in the background.
async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server");
    let addr = listener.local_addr().expect("mock server address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock server");
    });
    addr
}

/// JWT-shaped token carrying `claims`; the signature is not checked.
#[must_use]
pub fn token_for(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.mock-signature")
}

fn envelope(message: &str, data: Value) -> Json<Value> {
    Json(json!({"success": true, "message": message, "data": data}))
}

// =============================================================================
// Console backend
// =============================================================================

/// State of the mock console backend.
#[derive(Debug, Default)]
pub struct BackendState {
    pub admins: Vec<Value>,
    pub panels: Vec<Value>,
    pub news: Vec<Value>,
    pub logs: Vec<String>,
    /// Marzban inbounds per panel name.
    pub inbounds: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    pub backup: Vec<u8>,
    /// When set, the backup body breaks off after these bytes.
    pub broken_backup: Option<Vec<u8>>,
    pub restored: Option<(String, Vec<u8>)>,
    /// `METHOD /path` of every request, in order.
    pub requests: Vec<String>,
    /// Last admin create/update body.
    pub last_admin_body: Option<Value>,
    /// When set, every mutation answers with this status and body.
    pub fail_mutations: Option<(StatusCode, Value)>,
    /// When set, list endpoints answer 200 with this raw body.
    pub garbage_lists: Option<String>,
    pub next_id: i32,
    pub logins: u32,
}

type Shared = Arc<Mutex<BackendState>>;

/// Mock console backend.
pub struct MockBackend {
    pub addr: SocketAddr,
    pub state: Shared,
    token: String,
}

impl MockBackend {
    /// Start a backend seeded with `state`.
    pub async fn start(mut state: BackendState) -> Self {
        if state.next_id == 0 {
            state.next_id = 100;
        }
        let token = token_for(&json!({
            "sub": USERNAME,
            "role": "superadmin",
            "panel": "",
            "exp": 4_102_444_800_i64
        }));
        let shared = Arc::new(Mutex::new(state));

        let app = Router::new()
            .route("/login", post(login))
            .route("/dashboard", get(dashboard))
            .route("/superadmin/admins", get(list_admins))
            .route("/superadmin/admin", post(create_admin))
            .route("/superadmin/admin/{id}", put(update_admin).delete(delete_admin))
            .route("/superadmin/admin/{id}/status", put(toggle_admin))
            .route("/superadmin/panel/{name}/inbounds", get(panel_inbounds))
            .route("/superadmin/panels", get(list_panels))
            .route("/superadmin/panel", post(create_panel))
            .route("/superadmin/panel/{id}", put(update_panel).delete(delete_panel))
            .route("/superadmin/panel/{id}/status", put(toggle_panel))
            .route("/superadmin/news", get(list_news).post(add_news))
            .route("/superadmin/news/{id}", delete(delete_news))
            .route("/superadmin/logs", get(logs))
            .route("/superadmin/backup", get(backup))
            .route("/superadmin/restore", post(restore))
            .layer(middleware::from_fn_with_state(
                (shared.clone(), token.clone()),
                record_and_authorize,
            ))
            .with_state((shared.clone(), token.clone()));

        let addr = serve(app).await;
        Self {
            addr,
            state: shared,
            token,
        }
    }

    /// Base URL of the backend.
    #[must_use]
    pub fn url(&self) -> Url {
        Url::parse(&format!("http://{}/", self.addr)).expect("mock url")
    }

    /// Client logging in with username and password.
    #[must_use]
    pub fn client(&self) -> ConsoleClient {
        let config = ConsoleConfig::new(
            self.url(),
            Credentials::Password {
                username: USERNAME.to_owned(),
                password: SecretString::from(PASSWORD.to_owned()),
            },
        );
        ConsoleClient::new(&config).expect("console client")
    }

    /// Client using the backend's token directly.
    #[must_use]
    pub fn token_client(&self) -> ConsoleClient {
        let config = ConsoleConfig::new(
            self.url(),
            Credentials::Token(SecretString::from(self.token.clone())),
        );
        ConsoleClient::new(&config).expect("console client")
    }

    /// Requests received so far, excluding the login.
    pub async fn requests(&self) -> Vec<String> {
        self.state
            .lock()
            .await
            .requests
            .iter()
            .filter(|r| r.as_str() != "POST /login")
            .cloned()
            .collect()
    }

    pub async fn clear_requests(&self) {
        self.state.lock().await.requests.clear();
    }
}

type BackendCtx = State<(Shared, String)>;

async fn record_and_authorize(
    State((state, token)): BackendCtx,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    state
        .lock()
        .await
        .requests
        .push(format!("{} {path}", request.method()));

    let expected = format!("Bearer {token}");
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);

    if path != "/login" && !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Could not validate credentials"})),
        )
            .into_response();
    }
    next.run(request).await
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

async fn login(State((state, token)): BackendCtx, Form(form): Form<LoginForm>) -> Response {
    if form.username != USERNAME || form.password != PASSWORD {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Incorrect username or password"})),
        )
            .into_response();
    }
    state.lock().await.logins += 1;
    Json(json!({"access_token": token, "token_type": "bearer"})).into_response()
}

async fn dashboard(State((state, _)): BackendCtx) -> Json<Value> {
    let state = state.lock().await;
    envelope(
        "",
        json!({
            "admins": state.admins,
            "panels": state.panels,
            "news": state.news.iter().map(|n| n["message"].clone()).collect::<Vec<_>>(),
            "system": {
                "total_memory": 8_589_934_592_u64,
                "used_memory": 2_147_483_648_u64,
                "cpu_percent": 12.5,
                "disk_total": 107_374_182_400_u64,
                "disk_used": 53_687_091_200_u64
            }
        }),
    )
}

/// Answer with the injected failure, if any.
fn injected_failure(state: &BackendState) -> Option<Response> {
    state
        .fail_mutations
        .as_ref()
        .map(|(status, body)| (*status, Json(body.clone())).into_response())
}

fn list_response(state: &BackendState, items: &[Value]) -> Response {
    match &state.garbage_lists {
        Some(body) => (StatusCode::OK, body.clone()).into_response(),
        None => envelope("", Value::Array(items.to_vec())).into_response(),
    }
}

fn toggle_active(items: &mut [Value], id: i64) -> bool {
    items.iter_mut().find(|i| i["id"] == id).is_some_and(|item| {
        let active = item["is_active"].as_bool().unwrap_or(false);
        item["is_active"] = Value::Bool(!active);
        true
    })
}

fn not_found(what: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"detail": format!("{what} not found")})),
    )
        .into_response()
}

fn admin_record(id: i32, body: &Value) -> Value {
    let gb = body["traffic"].as_f64().unwrap_or(0.0);
    json!({
        "id": id,
        "username": body["username"],
        "is_active": body["is_active"],
        "panel": body["panel"],
        "inbound_id": body["inbound_id"],
        "marzban_inbounds": body["marzban_inbounds"],
        "marzban_password": body["marzban_password"],
        "flow": body["flow"],
        "traffic": (gb * BYTES_PER_GB).round(),
        "return_traffic": body["return_traffic"],
        "expiry_date": body["expiry_date"],
    })
}

async fn list_admins(State((state, _)): BackendCtx) -> Response {
    let state = state.lock().await;
    list_response(&state, &state.admins)
}

async fn create_admin(State((state, _)): BackendCtx, Json(body): Json<Value>) -> Response {
    let mut state = state.lock().await;
    if let Some(failure) = injected_failure(&state) {
        return failure;
    }
    if state.admins.iter().any(|a| a["username"] == body["username"]) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"success": false, "message": "Admin already exists"})),
        )
            .into_response();
    }
    let id = state.next_id;
    state.next_id += 1;
    state.admins.push(admin_record(id, &body));
    state.last_admin_body = Some(body);
    envelope("Admin created successfully", Value::Null).into_response()
}

async fn update_admin(
    State((state, _)): BackendCtx,
    Path(id): Path<i32>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().await;
    if let Some(failure) = injected_failure(&state) {
        return failure;
    }
    let Some(slot) = state.admins.iter_mut().find(|a| a["id"] == id) else {
        return not_found("Admin");
    };
    *slot = admin_record(id, &body);
    state.last_admin_body = Some(body);
    envelope("Admin updated successfully", Value::Null).into_response()
}

async fn delete_admin(State((state, _)): BackendCtx, Path(id): Path<i32>) -> Response {
    let mut state = state.lock().await;
    if let Some(failure) = injected_failure(&state) {
        return failure;
    }
    let before = state.admins.len();
    state.admins.retain(|a| a["id"] != id);
    if state.admins.len() == before {
        return not_found("Admin");
    }
    envelope("Admin deleted successfully", Value::Null).into_response()
}

async fn toggle_admin(State((state, _)): BackendCtx, Path(id): Path<i64>) -> Response {
    let mut state = state.lock().await;
    if let Some(failure) = injected_failure(&state) {
        return failure;
    }
    if toggle_active(&mut state.admins, id) {
        envelope("Admin status updated", Value::Null).into_response()
    } else {
        not_found("Admin")
    }
}

async fn panel_inbounds(State((state, _)): BackendCtx, Path(name): Path<String>) -> Response {
    let state = state.lock().await;
    // Bare map, no envelope
    state
        .inbounds
        .get(&name)
        .map_or_else(|| not_found("Panel"), |map| Json(map.clone()).into_response())
}

async fn list_panels(State((state, _)): BackendCtx) -> Response {
    let state = state.lock().await;
    list_response(&state, &state.panels)
}

fn panel_record(id: i32, body: &Value) -> Value {
    json!({
        "id": id,
        "panel_type": body["panel_type"],
        "name": body["name"],
        "url": body["url"],
        "is_active": body["is_active"],
    })
}

async fn create_panel(State((state, _)): BackendCtx, Json(body): Json<Value>) -> Response {
    let mut state = state.lock().await;
    if let Some(failure) = injected_failure(&state) {
        return failure;
    }
    let id = state.next_id;
    state.next_id += 1;
    state.panels.push(panel_record(id, &body));
    envelope("Panel created successfully", Value::Null).into_response()
}

async fn update_panel(
    State((state, _)): BackendCtx,
    Path(id): Path<i32>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().await;
    if let Some(failure) = injected_failure(&state) {
        return failure;
    }
    let Some(slot) = state.panels.iter_mut().find(|p| p["id"] == id) else {
        return not_found("Panel");
    };
    *slot = panel_record(id, &body);
    envelope("Panel updated successfully", Value::Null).into_response()
}

async fn delete_panel(State((state, _)): BackendCtx, Path(id): Path<i32>) -> Response {
    let mut state = state.lock().await;
    if let Some(failure) = injected_failure(&state) {
        return failure;
    }
    let before = state.panels.len();
    state.panels.retain(|p| p["id"] != id);
    if state.panels.len() == before {
        return not_found("Panel");
    }
    envelope("Panel deleted successfully", Value::Null).into_response()
}

async fn toggle_panel(State((state, _)): BackendCtx, Path(id): Path<i64>) -> Response {
    let mut state = state.lock().await;
    if let Some(failure) = injected_failure(&state) {
        return failure;
    }
    if toggle_active(&mut state.panels, id) {
        envelope("Panel status updated", Value::Null).into_response()
    } else {
        not_found("Panel")
    }
}

async fn list_news(State((state, _)): BackendCtx) -> Response {
    let state = state.lock().await;
    list_response(&state, &state.news)
}

#[derive(Deserialize)]
struct NewsBody {
    message: String,
}

async fn add_news(State((state, _)): BackendCtx, Json(body): Json<NewsBody>) -> Response {
    let mut state = state.lock().await;
    if let Some(failure) = injected_failure(&state) {
        return failure;
    }
    let id = state.next_id;
    state.next_id += 1;
    state.news.push(json!({
        "id": id,
        "message": body.message,
        "created_at": "2026-01-15T09:30:00"
    }));
    envelope("News added", Value::Null).into_response()
}

async fn delete_news(State((state, _)): BackendCtx, Path(id): Path<i32>) -> Response {
    let mut state = state.lock().await;
    if let Some(failure) = injected_failure(&state) {
        return failure;
    }
    let before = state.news.len();
    state.news.retain(|n| n["id"] != id);
    if state.news.len() == before {
        return not_found("News");
    }
    envelope("News deleted", Value::Null).into_response()
}

async fn logs(State((state, _)): BackendCtx) -> Json<Value> {
    let state = state.lock().await;
    envelope("", json!(state.logs))
}

async fn backup(State((state, _)): BackendCtx) -> Response {
    let state = state.lock().await;
    if let Some(partial) = state.broken_backup.clone() {
        let chunks = vec![
            Ok(partial),
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "backup stream aborted",
            )),
        ];
        return (
            [(header::CONTENT_TYPE, "application/octet-stream")],
            Body::from_stream(futures::stream::iter(chunks)),
        )
            .into_response();
    }
    (
        [(header::CONTENT_TYPE, "application/octet-stream")],
        state.backup.clone(),
    )
        .into_response()
}

async fn restore(State((state, _)): BackendCtx, mut multipart: Multipart) -> Response {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_owned();
        let Ok(bytes) = field.bytes().await else {
            break;
        };
        state.lock().await.restored = Some((name, bytes.to_vec()));
        return envelope("Database restored successfully", Value::Null).into_response();
    }
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({"detail": [{"loc": ["body", "file"], "msg": "Field required", "type": "missing"}]})),
    )
        .into_response()
}

// =============================================================================
// 3x-ui panel
// =============================================================================

/// State of the mock 3x-ui panel.
#[derive(Debug, Default)]
pub struct PanelState {
    /// Whether the panel currently honours the client's session.
    pub authenticated: bool,
    pub logins: u32,
    /// Inbounds as returned by `inbounds/list`.
    pub inbounds: Vec<Value>,
    pub onlines: Vec<String>,
    /// `METHOD /path` of every request, in order.
    pub requests: Vec<String>,
    /// Body of the last addClient / updateClient call.
    pub last_client_body: Option<Value>,
    /// When set, client mutations answer `success: false` with this message.
    pub reject_with: Option<String>,
}

type PanelShared = Arc<Mutex<PanelState>>;

/// Mock 3x-ui panel.
pub struct MockPanel {
    pub addr: SocketAddr,
    pub state: PanelShared,
}

impl MockPanel {
    pub async fn start(state: PanelState) -> Self {
        let shared = Arc::new(Mutex::new(state));
        let app = Router::new()
            .route("/login", post(panel_login))
            .route("/panel/api/server/status", get(panel_status))
            .route("/panel/api/inbounds/list", get(panel_list))
            .route("/panel/api/inbounds/onlines", post(panel_onlines))
            .route("/panel/api/inbounds/addClient", post(panel_client_change))
            .route(
                "/panel/api/inbounds/updateClient/{uuid}",
                post(panel_client_update),
            )
            .route(
                "/panel/api/inbounds/{id}/delClient/{uuid}",
                post(panel_simple),
            )
            .route(
                "/panel/api/inbounds/{id}/resetClientTraffic/{email}",
                post(panel_simple),
            )
            .route(
                "/panel/api/inbounds/getClientTraffics/{email}",
                get(panel_traffic),
            )
            .with_state(shared.clone());

        let addr = serve(app).await;
        Self {
            addr,
            state: shared,
        }
    }

    #[must_use]
    pub fn url(&self) -> Url {
        Url::parse(&format!("http://{}/", self.addr)).expect("mock url")
    }

    /// Forget the current session, as a panel restart would.
    pub async fn expire_session(&self) {
        self.state.lock().await.authenticated = false;
    }
}

/// Record the request and refuse it while no session is active.
async fn panel_guard(state: &PanelShared, line: String) -> Option<Response> {
    let mut state = state.lock().await;
    state.requests.push(line);
    if state.authenticated {
        None
    } else {
        Some(StatusCode::UNAUTHORIZED.into_response())
    }
}

async fn panel_login(State(state): State<PanelShared>, Form(form): Form<LoginForm>) -> Response {
    let mut state = state.lock().await;
    state.requests.push("POST /login".to_owned());
    if form.username != USERNAME || form.password != PASSWORD {
        return Json(json!({"success": false, "msg": "Wrong username or password", "obj": null}))
            .into_response();
    }
    state.logins += 1;
    state.authenticated = true;
    (
        [(header::SET_COOKIE, format!("3x-ui=session-{}; Path=/", state.logins))],
        Json(json!({"success": true, "msg": "Login Successfully", "obj": null})),
    )
        .into_response()
}

async fn panel_status(State(state): State<PanelShared>) -> Response {
    if let Some(denied) = panel_guard(&state, "GET /panel/api/server/status".to_owned()).await {
        return denied;
    }
    Json(json!({"success": true, "msg": "", "obj": {"cpu": 3.5}})).into_response()
}

async fn panel_list(State(state): State<PanelShared>) -> Response {
    if let Some(denied) = panel_guard(&state, "GET /panel/api/inbounds/list".to_owned()).await {
        return denied;
    }
    let inbounds = state.lock().await.inbounds.clone();
    Json(json!({"success": true, "msg": "", "obj": inbounds})).into_response()
}

async fn panel_onlines(State(state): State<PanelShared>) -> Response {
    if let Some(denied) = panel_guard(&state, "POST /panel/api/inbounds/onlines".to_owned()).await {
        return denied;
    }
    let onlines = state.lock().await.onlines.clone();
    Json(json!({"success": true, "msg": "", "obj": onlines})).into_response()
}

fn mutation_reply(state: &PanelState) -> Response {
    match &state.reject_with {
        Some(msg) => Json(json!({"success": false, "msg": msg, "obj": null})).into_response(),
        None => Json(json!({"success": true, "msg": "ok", "obj": null})).into_response(),
    }
}

async fn panel_client_change(
    State(state): State<PanelShared>,
    Json(body): Json<Value>,
) -> Response {
    if let Some(denied) = panel_guard(&state, "POST /panel/api/inbounds/addClient".to_owned()).await {
        return denied;
    }
    let mut state = state.lock().await;
    state.last_client_body = Some(body);
    mutation_reply(&state)
}

async fn panel_client_update(
    State(state): State<PanelShared>,
    Path(uuid): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let line = format!("POST /panel/api/inbounds/updateClient/{uuid}");
    if let Some(denied) = panel_guard(&state, line).await {
        return denied;
    }
    let mut state = state.lock().await;
    state.last_client_body = Some(body);
    mutation_reply(&state)
}

async fn panel_simple(State(state): State<PanelShared>, request: Request) -> Response {
    let line = format!("{} {}", request.method(), request.uri().path());
    if let Some(denied) = panel_guard(&state, line).await {
        return denied;
    }
    let state = state.lock().await;
    mutation_reply(&state)
}

async fn panel_traffic(
    State(state): State<PanelShared>,
    Path(email): Path<String>,
) -> Response {
    let line = format!("GET /panel/api/inbounds/getClientTraffics/{email}");
    if let Some(denied) = panel_guard(&state, line).await {
        return denied;
    }
    let state = state.lock().await;
    let stat = state
        .inbounds
        .iter()
        .filter_map(|i| i["clientStats"].as_array())
        .flatten()
        .find(|c| c["email"] == email.as_str())
        .cloned();
    Json(json!({"success": true, "msg": "", "obj": stat})).into_response()
}

// =============================================================================
// Fixtures
// =============================================================================

/// Admin record as the backend stores it.
#[must_use]
pub fn admin_json(id: i32, username: &str, panel: &str) -> Value {
    json!({
        "id": id,
        "username": username,
        "is_active": true,
        "panel": panel,
        "inbound_id": 2,
        "marzban_inbounds": null,
        "marzban_password": null,
        "flow": "xtls-rprx-vision",
        "traffic": 53_687_091_200_u64,
        "return_traffic": false,
        "expiry_date": "2026-12-31"
    })
}

/// Panel record as the backend stores it.
#[must_use]
pub fn panel_json(id: i32, name: &str, panel_type: &str) -> Value {
    json!({
        "id": id,
        "panel_type": panel_type,
        "name": name,
        "url": format!("https://{name}.example.com:2053/"),
        "is_active": true
    })
}

/// UUID the fixtures give the client with `email`.
#[must_use]
pub fn client_uuid(email: &str) -> String {
    format!("uuid-{email}")
}

/// Settings entry of an enabled client with a subscription id and flow.
#[must_use]
pub fn settings_client_json(email: &str) -> Value {
    json!({
        "id": client_uuid(email),
        "email": email,
        "flow": "xtls-rprx-vision",
        "enable": true,
        "subId": format!("sub-{email}"),
        "totalGB": 10_737_418_240_u64,
        "expiryTime": 0
    })
}

/// 3x-ui inbound with one client stat and one settings entry per email.
#[must_use]
pub fn inbound_json(id: i32, emails: &[&str]) -> Value {
    let stats: Vec<Value> = emails
        .iter()
        .enumerate()
        .map(|(i, email)| {
            json!({
                "id": i + 1,
                "inboundId": id,
                "enable": true,
                "email": email,
                "up": 1_073_741_824_u64,
                "down": 2_147_483_648_u64,
                "expiryTime": 0,
                "total": 10_737_418_240_u64,
                "reset": 0
            })
        })
        .collect();
    let clients: Vec<Value> = emails.iter().map(|e| settings_client_json(e)).collect();
    json!({
        "id": id,
        "remark": format!("inbound-{id}"),
        "protocol": "vless",
        "port": 443,
        "enable": true,
        "clientStats": stats,
        "settings": json!({"clients": clients, "decryption": "none"}).to_string()
    })
}

/// Replace the settings entries of inbound `id` in a seeded panel.
///
/// # Panics
///
/// Panics if the inbound is not seeded.
pub fn set_settings_clients(inbounds: &mut [Value], id: i32, clients: &[Value]) {
    let inbound = inbounds
        .iter_mut()
        .find(|i| i["id"] == id)
        .expect("seeded inbound");
    inbound["settings"] = Value::String(json!({"clients": clients}).to_string());
}

//! Shared fixtures: a scripted back-office API on a local port, a recording
//! navigator, and scratch paths for file-store tests.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{Value, json};

use crate::Backoffice;
use crate::config::ClientConfig;
use crate::route::{Navigator, Route};
use crate::store::{CredentialStore, MemoryCredentialStore};

pub const ADMIN_EMAIL: &str = "a@x.com";
pub const STAFF_EMAIL: &str = "staff@x.com";
pub const PASSWORD: &str = "pw";
/// Password that makes the mock hold the login response for a while.
pub const SLOW_PASSWORD: &str = "slow";
pub const ADMIN_TOKEN: &str = "T1";
pub const STAFF_TOKEN: &str = "T2";

/// Unique, not-yet-created path under the system temp dir.
pub fn scratch_path(label: &str) -> PathBuf {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("backoffice-test-{}-{label}-{n}", std::process::id()))
}

pub fn admin_user() -> Value {
    json!({ "id": 1, "name": "Ana Admin", "email": ADMIN_EMAIL, "role": "admin" })
}

pub fn staff_user() -> Value {
    json!({ "id": "u-2", "name": "Sam Staff", "email": STAFF_EMAIL, "role": "staff" })
}

// =============================================================================
// NAVIGATOR
// =============================================================================

#[derive(Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn visits(&self) -> Vec<Route> {
        self.visits.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.visits.lock().unwrap().push(route);
    }
}

// =============================================================================
// MOCK API
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

/// Scripted server state; tests flip these knobs between calls.
pub struct MockState {
    pub requests: Mutex<Vec<RecordedRequest>>,
    /// Status returned by `/auth/logout`.
    pub logout_status: Mutex<u16>,
    /// Replaces the `/auth/me` body when set.
    pub me_override: Mutex<Option<Value>>,
    /// How long `/auth/me` waits before answering.
    pub me_delay: Mutex<Duration>,
    /// Status `/auth/me` answers with instead of looking at the token, when set.
    pub me_status: Mutex<Option<u16>>,
    /// When true every protected endpoint answers 401 regardless of token.
    pub reject_all: Mutex<bool>,
}

impl MockState {
    fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            logout_status: Mutex::new(200),
            me_override: Mutex::new(None),
            me_delay: Mutex::new(Duration::ZERO),
            me_status: Mutex::new(None),
            reject_all: Mutex::new(false),
        }
    }

    fn user_for(&self, headers: &HeaderMap) -> Option<Value> {
        if *self.reject_all.lock().unwrap() {
            return None;
        }
        let auth = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
        match auth.strip_prefix("Bearer ")? {
            ADMIN_TOKEN => Some(admin_user()),
            STAFF_TOKEN => Some(staff_user()),
            _ => None,
        }
    }
}

pub struct MockApi {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockApi {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::new());
        let api = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/logout", post(logout))
            .route("/auth/me", get(me))
            .route("/auth/register", post(register))
            .route("/auth/reset-password", post(reset_password))
            .route("/admin/stats", get(stats))
            .route("/admin/reservas", get(bookings))
            .route("/admin/reservas/{id}", get(booking).put(update_booking))
            .route("/admin/reservas/{id}/cancel", post(cancel_booking))
            .route("/tours/buscar", get(search_tours))
            .route("/tours/{id}/completo", get(tour))
            .route("/admin/tours", post(create_tour))
            .route("/admin/tours/{id}", put(update_tour).delete(delete_tour))
            .route("/admin/analytics", get(analytics))
            .route("/admin/broken", get(broken))
            .with_state(Arc::clone(&state));
        let app = Router::new()
            .nest("/api", api)
            .layer(middleware::from_fn_with_state(Arc::clone(&state), record));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url: format!("http://{addr}/api"), state }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests().into_iter().filter(|r| r.path == format!("/api{path}")).collect()
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(&self.base_url).unwrap().with_timeout(Duration::from_secs(5))
    }
}

/// Everything a session/transport test needs, wired against a fresh mock.
pub struct Harness {
    pub api: MockApi,
    pub store: Arc<MemoryCredentialStore>,
    pub navigator: Arc<RecordingNavigator>,
    pub app: Backoffice,
}

pub async fn harness() -> Harness {
    harness_with_store(MemoryCredentialStore::new()).await
}

pub async fn harness_with_store(store: MemoryCredentialStore) -> Harness {
    let api = MockApi::start().await;
    let store = Arc::new(store);
    let navigator = Arc::new(RecordingNavigator::default());
    let app = Backoffice::connect(
        &api.config(),
        Arc::clone(&store) as Arc<dyn CredentialStore>,
        Arc::clone(&navigator) as Arc<dyn Navigator>,
    )
    .unwrap();
    Harness { api, store, navigator, app }
}

// =============================================================================
// HANDLERS
// =============================================================================

async fn record(State(state): State<Arc<MockState>>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, 1024 * 1024).await.unwrap_or_default();
    state.requests.lock().unwrap().push(RecordedRequest {
        method: parts.method.to_string(),
        path: parts.uri.path().to_owned(),
        query: parts.uri.query().map(ToOwned::to_owned),
        authorization: parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned),
        body: serde_json::from_slice(&bytes).ok(),
    });
    next.run(Request::from_parts(parts, axum::body::Body::from(bytes))).await
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": "token inválido" }))).into_response()
}

fn bad_credentials() -> Response {
    let body = json!({ "error": "credenciales inválidas" });
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    let email = body.get("email").and_then(Value::as_str).unwrap_or_default();
    let password = body.get("password").and_then(Value::as_str).unwrap_or_default();
    if password == SLOW_PASSWORD {
        tokio::time::sleep(Duration::from_millis(300)).await;
    } else if password != PASSWORD {
        return bad_credentials();
    }
    match email {
        ADMIN_EMAIL => Json(json!({ "token": ADMIN_TOKEN, "user": admin_user() })).into_response(),
        STAFF_EMAIL => Json(json!({ "token": STAFF_TOKEN, "user": staff_user() })).into_response(),
        "empty@x.com" => Json(json!({ "token": "", "user": admin_user() })).into_response(),
        "shapeless@x.com" => Json(json!({ "ok": true })).into_response(),
        _ => bad_credentials(),
    }
}

async fn logout(State(state): State<Arc<MockState>>) -> Response {
    let status = *state.logout_status.lock().unwrap();
    let status = StatusCode::from_u16(status).unwrap();
    (status, Json(json!({ "success": status.is_success() }))).into_response()
}

async fn me(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    let delay = *state.me_delay.lock().unwrap();
    tokio::time::sleep(delay).await;
    if let Some(status) = *state.me_status.lock().unwrap() {
        let status = StatusCode::from_u16(status).unwrap();
        return (status, Json(json!({ "error": "forced" }))).into_response();
    }
    let Some(user) = state.user_for(&headers) else {
        return unauthorized();
    };
    let body = state.me_override.lock().unwrap().clone().unwrap_or(user);
    Json(body).into_response()
}

async fn register(Json(body): Json<Value>) -> Response {
    if body.get("email").and_then(Value::as_str) == Some(ADMIN_EMAIL) {
        let body = json!({ "error": "email ya registrado" });
        return (StatusCode::CONFLICT, Json(body)).into_response();
    }
    let role = body.get("role").cloned().unwrap_or_else(|| json!("staff"));
    (
        StatusCode::CREATED,
        Json(json!({ "id": 77, "name": body["name"], "email": body["email"], "role": role })),
    )
        .into_response()
}

async fn reset_password(Json(body): Json<Value>) -> Response {
    if body.get("email").and_then(Value::as_str).is_none_or(str::is_empty) {
        let body = json!({ "error": "email requerido" });
        return (StatusCode::BAD_REQUEST, Json(body)).into_response();
    }
    Json(json!({ "message": "reset enviado" })).into_response()
}

async fn stats(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if state.user_for(&headers).is_none() {
        return unauthorized();
    }
    Json(json!({
        "bookings_today": 4,
        "revenue_month": 12500.5,
        "active_customers": 31,
        "active_tours": 12
    }))
    .into_response()
}

fn booking_json(id: i64, estado: &str) -> Value {
    json!({
        "id": id, "tour_id": 3, "nombre": "Luis", "num_personas": 2,
        "fecha_solicitud": "2024-05-01T10:00:00", "estado": estado
    })
}

async fn bookings(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(params): Query<std::collections::HashMap<String, String>>,
) -> Response {
    if state.user_for(&headers).is_none() {
        return unauthorized();
    }
    let estado = params.get("estado").map_or("pendiente", String::as_str);
    Json(json!({ "reservas": [booking_json(1, estado), booking_json(2, estado)] })).into_response()
}

async fn booking(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if state.user_for(&headers).is_none() {
        return unauthorized();
    }
    if id == 404 {
        let body = json!({ "error": "Reserva no encontrada" });
        return (StatusCode::NOT_FOUND, Json(body)).into_response();
    }
    Json(booking_json(id, "pendiente")).into_response()
}

async fn update_booking(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    if state.user_for(&headers).is_none() {
        return unauthorized();
    }
    let estado = body.get("estado").and_then(Value::as_str).unwrap_or("pendiente");
    Json(booking_json(id, estado)).into_response()
}

async fn cancel_booking(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if state.user_for(&headers).is_none() {
        return unauthorized();
    }
    Json(json!({ "success": true, "message": "cancelada" })).into_response()
}

fn tour_json(id: i64) -> Value {
    json!({
        "id": id,
        "titulo": "Japón clásico",
        "precio_desde": 2490.0,
        "continente": "Asia",
        "destacado": true
    })
}

async fn search_tours(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(params): Query<std::collections::HashMap<String, String>>,
) -> Response {
    if state.user_for(&headers).is_none() {
        return unauthorized();
    }
    let page: i64 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    Json(json!({
        "tours": [tour_json(5)],
        "total": 21,
        "page": page,
        "per_page": 20,
        "total_pages": 2
    }))
    .into_response()
}

async fn tour(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if state.user_for(&headers).is_none() {
        return unauthorized();
    }
    Json(tour_json(id)).into_response()
}

async fn create_tour(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    if state.user_for(&headers).is_none() {
        return unauthorized();
    }
    body["id"] = json!(99);
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn update_tour(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(mut body): Json<Value>,
) -> Response {
    if state.user_for(&headers).is_none() {
        return unauthorized();
    }
    body["id"] = json!(id);
    Json(body).into_response()
}

async fn delete_tour(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if state.user_for(&headers).is_none() {
        return unauthorized();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn analytics(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if state.user_for(&headers).is_none() {
        return unauthorized();
    }
    Json(json!({ "ingresos": [{ "mes": "2024-05", "total": 12500.5 }] })).into_response()
}

async fn broken(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if state.user_for(&headers).is_none() {
        return unauthorized();
    }
    (StatusCode::OK, "<html>not json</html>").into_response()
}

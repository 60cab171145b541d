use std::{collections::BTreeMap, sync::Arc, time::SystemTime};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

pub const DEFAULT_METHOD: &str = "chacha20-ietf-poly1305";
pub const DEFAULT_ACCESS_KEY_PORT: u16 = 4433;
/// Port the management API itself listens on; never free for access keys.
pub const MANAGEMENT_PORT: u16 = 8081;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataLimit {
    pub bytes: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessKey {
    pub id: String,
    pub name: String,
    pub password: String,
    pub port: u16,
    pub method: String,
    pub access_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_limit: Option<DataLimit>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub name: String,
    pub server_id: String,
    pub metrics_enabled: bool,
    pub created_timestamp_ms: u64,
    pub version: String,
    pub port_for_new_access_keys: u16,
    pub hostname_for_access_keys: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_data_limit: Option<DataLimit>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AccessKeyInput {
    pub name: Option<String>,
    pub method: Option<String>,
    pub password: Option<String>,
    pub limit: Option<DataLimit>,
}

#[derive(Deserialize)]
pub struct NameInput {
    pub name: String,
}

#[derive(Deserialize)]
pub struct HostnameInput {
    pub hostname: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsEnabledInput {
    pub metrics_enabled: bool,
}

#[derive(Deserialize)]
pub struct LimitInput {
    pub limit: DataLimit,
}

/// In-memory state of one Outline server.
#[derive(Debug)]
pub struct ServerState {
    pub info: ServerInfo,
    pub keys: BTreeMap<String, AccessKey>,
    pub bytes_transferred: BTreeMap<String, u64>,
    next_id: u64,
}

impl Default for ServerState {
    fn default() -> Self {
        let created_timestamp_ms = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Self {
            info: ServerInfo {
                name: "Outline Server".to_string(),
                server_id: Uuid::new_v4().to_string(),
                metrics_enabled: false,
                created_timestamp_ms,
                version: "1.11.0".to_string(),
                port_for_new_access_keys: DEFAULT_ACCESS_KEY_PORT,
                hostname_for_access_keys: "127.0.0.1".to_string(),
                access_key_data_limit: None,
            },
            keys: BTreeMap::new(),
            bytes_transferred: BTreeMap::new(),
            next_id: 0,
        }
    }
}

impl ServerState {
    fn build_key(&self, id: String, input: AccessKeyInput) -> AccessKey {
        let method = input.method.unwrap_or_else(|| DEFAULT_METHOD.to_string());
        let password = input
            .password
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
        let port = self.info.port_for_new_access_keys;
        let access_url = format!(
            "ss://{method}:{password}@{}:{port}/?outline=1",
            self.info.hostname_for_access_keys
        );
        AccessKey {
            id,
            name: input.name.unwrap_or_default(),
            password,
            port,
            method,
            access_url,
            data_limit: input.limit,
        }
    }

    fn insert(&mut self, key: AccessKey) {
        self.bytes_transferred.entry(key.id.clone()).or_insert(0);
        self.keys.insert(key.id.clone(), key);
    }
}

pub type Db = Arc<RwLock<ServerState>>;

/// The management API mounted at the root.
pub fn app() -> Router {
    router(Db::default())
}

/// The management API mounted under a secret path prefix, the way a real
/// server exposes it (`https://host:port/<prefix>/...`).
pub fn app_with_prefix(prefix: &str) -> Router {
    Router::new().nest(&format!("/{prefix}"), app())
}

pub fn router(db: Db) -> Router {
    Router::new()
        .route("/access-keys", get(list_access_keys).post(create_access_key))
        .route(
            "/access-keys/{id}",
            get(get_access_key).put(put_access_key).delete(delete_access_key),
        )
        .route("/access-keys/{id}/name", put(rename_access_key))
        .route(
            "/access-keys/{id}/data-limit",
            put(set_key_data_limit).delete(delete_key_data_limit),
        )
        .route("/metrics/transfer", get(transfer_metrics))
        .route("/metrics/enabled", get(get_metrics_enabled).put(set_metrics_enabled))
        .route("/server", get(server_info))
        .route("/name", put(set_server_name))
        .route("/server/hostname-for-access-keys", put(set_hostname))
        .route("/server/port-for-new-access-keys", put(set_default_port))
        .route(
            "/server/access-key-data-limit",
            put(set_global_data_limit).delete(delete_global_data_limit),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener, prefix: Option<&str>) -> Result<(), std::io::Error> {
    let app = match prefix {
        Some(prefix) => app_with_prefix(prefix),
        None => app(),
    };
    axum::serve(listener, app).await
}

// --- access keys ---

async fn list_access_keys(State(db): State<Db>) -> Json<Value> {
    let state = db.read().await;
    let keys: Vec<&AccessKey> = state.keys.values().collect();
    Json(json!({ "accessKeys": keys }))
}

async fn create_access_key(
    State(db): State<Db>,
    Json(input): Json<AccessKeyInput>,
) -> (StatusCode, Json<AccessKey>) {
    let mut state = db.write().await;
    let id = state.next_id.to_string();
    state.next_id += 1;
    let key = state.build_key(id, input);
    debug!(id = %key.id, "created access key");
    state.insert(key.clone());
    (StatusCode::CREATED, Json(key))
}

async fn get_access_key(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<Json<AccessKey>, StatusCode> {
    let state = db.read().await;
    state.keys.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

/// Creates the key under the given id, replacing any existing one.
async fn put_access_key(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(input): Json<AccessKeyInput>,
) -> (StatusCode, Json<AccessKey>) {
    let mut state = db.write().await;
    let key = state.build_key(id, input);
    debug!(id = %key.id, "stored access key");
    state.insert(key.clone());
    (StatusCode::CREATED, Json(key))
}

async fn delete_access_key(State(db): State<Db>, Path(id): Path<String>) -> StatusCode {
    let mut state = db.write().await;
    match state.keys.remove(&id) {
        Some(_) => {
            state.bytes_transferred.remove(&id);
            debug!(%id, "deleted access key");
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}

async fn rename_access_key(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(input): Json<NameInput>,
) -> StatusCode {
    let mut state = db.write().await;
    match state.keys.get_mut(&id) {
        Some(key) => {
            key.name = input.name;
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}

async fn set_key_data_limit(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(input): Json<LimitInput>,
) -> StatusCode {
    let mut state = db.write().await;
    match state.keys.get_mut(&id) {
        Some(key) => {
            key.data_limit = Some(input.limit);
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}

async fn delete_key_data_limit(State(db): State<Db>, Path(id): Path<String>) -> StatusCode {
    let mut state = db.write().await;
    match state.keys.get_mut(&id) {
        Some(key) => {
            key.data_limit = None;
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}

// --- metrics ---

async fn transfer_metrics(State(db): State<Db>) -> Json<Value> {
    let state = db.read().await;
    Json(json!({ "bytesTransferredByUserId": state.bytes_transferred }))
}

async fn get_metrics_enabled(State(db): State<Db>) -> Json<Value> {
    let state = db.read().await;
    Json(json!({ "metricsEnabled": state.info.metrics_enabled }))
}

async fn set_metrics_enabled(
    State(db): State<Db>,
    Json(input): Json<MetricsEnabledInput>,
) -> StatusCode {
    db.write().await.info.metrics_enabled = input.metrics_enabled;
    StatusCode::NO_CONTENT
}

// --- server ---

async fn server_info(State(db): State<Db>) -> Json<ServerInfo> {
    Json(db.read().await.info.clone())
}

async fn set_server_name(State(db): State<Db>, Json(input): Json<NameInput>) -> StatusCode {
    if input.name.trim().is_empty() {
        return StatusCode::BAD_REQUEST;
    }
    db.write().await.info.name = input.name;
    StatusCode::NO_CONTENT
}

async fn set_hostname(State(db): State<Db>, Json(input): Json<HostnameInput>) -> StatusCode {
    if input.hostname.trim().is_empty() {
        return StatusCode::BAD_REQUEST;
    }
    db.write().await.info.hostname_for_access_keys = input.hostname;
    StatusCode::NO_CONTENT
}

/// The body is read loosely so a missing or out-of-range port is a 400
/// rather than an extractor rejection.
async fn set_default_port(State(db): State<Db>, Json(input): Json<Value>) -> StatusCode {
    let Some(port) = input
        .get("port")
        .and_then(Value::as_u64)
        .and_then(|port| u16::try_from(port).ok())
        .filter(|port| *port != 0)
    else {
        return StatusCode::BAD_REQUEST;
    };
    if port == MANAGEMENT_PORT {
        return StatusCode::CONFLICT;
    }
    db.write().await.info.port_for_new_access_keys = port;
    debug!(port, "changed default port");
    StatusCode::NO_CONTENT
}

async fn set_global_data_limit(State(db): State<Db>, Json(input): Json<LimitInput>) -> StatusCode {
    db.write().await.info.access_key_data_limit = Some(input.limit);
    StatusCode::NO_CONTENT
}

async fn delete_global_data_limit(State(db): State<Db>) -> StatusCode {
    db.write().await.info.access_key_data_limit = None;
    StatusCode::NO_CONTENT
}

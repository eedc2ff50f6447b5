//! Shared utilities for integration testing.
//!
//! Provides a programmable mock platform upstream (meetings and registrants
//! with conditional-write support), a mock access-check endpoint, and a
//! helper that boots the gateway against both.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;

use collab_gateway::config::{GatewayConfig, UpstreamConfig};
use collab_gateway::{HttpServer, Shutdown};

/// Bearer token the tests send as the end-user credential.
pub const USER_TOKEN: &str = "user-token";

/// Shared state of the mock platform upstream.
#[derive(Clone, Default)]
pub struct PlatformState {
    /// Meeting uid → (body, version). The advertised ETag is `"v<version>"`.
    pub meetings: Arc<Mutex<HashMap<String, (serde_json::Value, u64)>>>,
    /// Registrant uid → (body, version).
    pub registrants: Arc<Mutex<HashMap<String, (serde_json::Value, u64)>>>,
    /// When set, GETs advertise a tag one version behind the one PUT/DELETE
    /// will accept, simulating a concurrent writer landing in between.
    pub stale_reads: Arc<AtomicBool>,
    /// When cleared, GETs omit the ETag header entirely.
    pub emit_etag: Arc<AtomicBool>,
    /// When set, registrant creation is denied with 403.
    pub deny_registrant_writes: Arc<AtomicBool>,
    /// Count of registrant-creation calls received.
    pub registrant_create_calls: Arc<AtomicUsize>,
    /// (request path, Authorization header) for every request received.
    pub authorizations: Arc<Mutex<Vec<(String, String)>>>,
}

impl PlatformState {
    pub fn new() -> Self {
        let state = Self::default();
        state.emit_etag.store(true, Ordering::SeqCst);
        state
    }

    pub fn insert_meeting(&self, uid: &str, body: serde_json::Value) {
        self.meetings.lock().unwrap().insert(uid.to_string(), (body, 1));
    }

    pub fn insert_registrant(&self, uid: &str, body: serde_json::Value) {
        self.registrants.lock().unwrap().insert(uid.to_string(), (body, 1));
    }

    pub fn meeting_version(&self, uid: &str) -> Option<u64> {
        self.meetings.lock().unwrap().get(uid).map(|(_, v)| *v)
    }

    pub fn has_registrant(&self, uid: &str) -> bool {
        self.registrants.lock().unwrap().contains_key(uid)
    }

    /// Authorization headers seen on requests whose path matches `select`.
    pub fn authorizations_where(&self, select: impl Fn(&str) -> bool) -> Vec<String> {
        self.authorizations
            .lock()
            .unwrap()
            .iter()
            .filter(|(path, _)| select(path))
            .map(|(_, auth)| auth.clone())
            .collect()
    }
}

fn etag_for(version: u64) -> String {
    format!("\"v{version}\"")
}

fn get_resource(
    store: &Mutex<HashMap<String, (serde_json::Value, u64)>>,
    uid: &str,
    stale: bool,
    emit_etag: bool,
) -> Response {
    let store = store.lock().unwrap();
    match store.get(uid) {
        Some((body, version)) => {
            let advertised = if stale { version.saturating_sub(1) } else { *version };
            let mut response = Json(body.clone()).into_response();
            if emit_etag {
                response
                    .headers_mut()
                    .insert(header::ETAG, etag_for(advertised).parse().unwrap());
            }
            response
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"message": "not found"})),
        )
            .into_response(),
    }
}

fn check_if_match(headers: &HeaderMap, version: u64) -> Result<(), Response> {
    let provided = headers
        .get(header::IF_MATCH)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if provided == etag_for(version) {
        Ok(())
    } else {
        Err((
            StatusCode::PRECONDITION_FAILED,
            Json(serde_json::json!({"message": "etag mismatch"})),
        )
            .into_response())
    }
}

fn put_resource(
    store: &Mutex<HashMap<String, (serde_json::Value, u64)>>,
    uid: &str,
    headers: &HeaderMap,
    body: serde_json::Value,
) -> Response {
    let mut store = store.lock().unwrap();
    match store.get_mut(uid) {
        Some((stored, version)) => {
            if let Err(rejection) = check_if_match(headers, *version) {
                return rejection;
            }
            *stored = body.clone();
            *version += 1;
            Json(body).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn delete_resource(
    store: &Mutex<HashMap<String, (serde_json::Value, u64)>>,
    uid: &str,
    headers: &HeaderMap,
) -> Response {
    let mut store = store.lock().unwrap();
    match store.get(uid) {
        Some((_, version)) => {
            if let Err(rejection) = check_if_match(headers, *version) {
                return rejection;
            }
            store.remove(uid);
            StatusCode::NO_CONTENT.into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Build the mock platform router. Legacy and current paths share handlers.
pub fn platform_router(state: PlatformState) -> Router {
    async fn list_meetings(State(state): State<PlatformState>) -> Json<Vec<serde_json::Value>> {
        let meetings = state.meetings.lock().unwrap();
        let mut bodies: Vec<serde_json::Value> = meetings.values().map(|(b, _)| b.clone()).collect();
        bodies.sort_by_key(|b| b["uid"].as_str().unwrap_or_default().to_string());
        Json(bodies)
    }

    async fn get_meeting(State(state): State<PlatformState>, Path(uid): Path<String>) -> Response {
        get_resource(
            &state.meetings,
            &uid,
            state.stale_reads.load(Ordering::SeqCst),
            state.emit_etag.load(Ordering::SeqCst),
        )
    }

    async fn put_meeting(
        State(state): State<PlatformState>,
        Path(uid): Path<String>,
        headers: HeaderMap,
        Json(body): Json<serde_json::Value>,
    ) -> Response {
        put_resource(&state.meetings, &uid, &headers, body)
    }

    async fn delete_meeting(
        State(state): State<PlatformState>,
        Path(uid): Path<String>,
        headers: HeaderMap,
    ) -> Response {
        delete_resource(&state.meetings, &uid, &headers)
    }

    async fn create_registrant(
        State(state): State<PlatformState>,
        Path(_uid): Path<String>,
        Json(body): Json<serde_json::Value>,
    ) -> Response {
        state.registrant_create_calls.fetch_add(1, Ordering::SeqCst);
        if state.deny_registrant_writes.load(Ordering::SeqCst) {
            return (
                StatusCode::FORBIDDEN,
                Json(serde_json::json!({"message": "forbidden"})),
            )
                .into_response();
        }
        if body["email"].as_str() == Some("bad@example.org") {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"message": "registrant rejected"})),
            )
                .into_response();
        }
        let uid = uuid::Uuid::new_v4().to_string();
        let mut created = body.clone();
        created["uid"] = serde_json::Value::String(uid.clone());
        state
            .registrants
            .lock()
            .unwrap()
            .insert(uid, (created.clone(), 1));
        (StatusCode::CREATED, Json(created)).into_response()
    }

    async fn get_registrant(
        State(state): State<PlatformState>,
        Path((_uid, rid)): Path<(String, String)>,
    ) -> Response {
        get_resource(
            &state.registrants,
            &rid,
            state.stale_reads.load(Ordering::SeqCst),
            state.emit_etag.load(Ordering::SeqCst),
        )
    }

    async fn put_registrant(
        State(state): State<PlatformState>,
        Path((_uid, rid)): Path<(String, String)>,
        headers: HeaderMap,
        Json(body): Json<serde_json::Value>,
    ) -> Response {
        put_resource(&state.registrants, &rid, &headers, body)
    }

    async fn delete_registrant(
        State(state): State<PlatformState>,
        Path((_uid, rid)): Path<(String, String)>,
        headers: HeaderMap,
    ) -> Response {
        delete_resource(&state.registrants, &rid, &headers)
    }

    async fn record_authorization(
        State(state): State<PlatformState>,
        request: Request,
        next: Next,
    ) -> Response {
        let auth = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        state
            .authorizations
            .lock()
            .unwrap()
            .push((request.uri().path().to_string(), auth));
        next.run(request).await
    }

    let meeting_routes = get(get_meeting).put(put_meeting).delete(delete_meeting);
    let registrant_item_routes = get(get_registrant)
        .put(put_registrant)
        .delete(delete_registrant);

    Router::new()
        .route("/meetings", get(list_meetings))
        .route("/meetings/{uid}", meeting_routes.clone())
        .route("/v1/meetings/{uid}", meeting_routes)
        .route("/meetings/{uid}/registrants", post(create_registrant))
        .route(
            "/meetings/{uid}/registrants/{rid}",
            registrant_item_routes.clone(),
        )
        .route("/v1/meetings/{uid}/registrants/{rid}", registrant_item_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            record_authorization,
        ))
        .with_state(state)
}

/// Shared state of the mock access-check upstream.
#[derive(Clone, Default)]
pub struct AccessState {
    /// Resource ids the principal is granted on.
    pub granted: Arc<Mutex<HashSet<String>>>,
    /// When set, the whole endpoint fails with 500.
    pub fail: Arc<AtomicBool>,
}

impl AccessState {
    pub fn grant(&self, id: &str) {
        self.granted.lock().unwrap().insert(id.to_string());
    }
}

/// Build the mock access-check router. Results are parallel strings of the
/// form `<triple>@user:alice:<granted>`.
pub fn access_router(state: AccessState) -> Router {
    async fn check(
        State(state): State<AccessState>,
        Json(body): Json<serde_json::Value>,
    ) -> Response {
        if state.fail.load(Ordering::SeqCst) {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"message": "access check down"})),
            )
                .into_response();
        }
        let granted = state.granted.lock().unwrap();
        let results: Vec<String> = body["requests"]
            .as_array()
            .cloned()
            .unwrap_or_default()
            .iter()
            .filter_map(|r| r.as_str())
            .map(|triple| {
                let id = triple
                    .split(':')
                    .nth(1)
                    .and_then(|rest| rest.split('#').next())
                    .unwrap_or_default();
                format!("{triple}@user:alice:{}", granted.contains(id))
            })
            .collect();
        Json(serde_json::json!({ "results": results })).into_response()
    }

    Router::new()
        .route("/access-check", post(check))
        .with_state(state)
}

/// Serve a router on an ephemeral port and return its address.
pub async fn spawn_router(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Boot the gateway against the given upstreams. Returns the gateway address
/// and its shutdown handle.
pub async fn spawn_gateway(
    platform_addr: SocketAddr,
    access_addr: SocketAddr,
    m2m_token: Option<&str>,
) -> (SocketAddr, Shutdown) {
    let mut config = GatewayConfig::default();
    config.upstreams.push(UpstreamConfig {
        name: "platform".into(),
        base_url: format!("http://{platform_addr}"),
    });
    config.upstreams.push(UpstreamConfig {
        name: "access".into(),
        base_url: format!("http://{access_addr}"),
    });
    config.auth.m2m_token = m2m_token.map(str::to_string);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.clone();
    tokio::spawn(async move {
        server.run(listener, server_shutdown).await.unwrap();
    });
    (addr, shutdown)
}

/// Client preconfigured with the test user's bearer token.
pub fn authed_client() -> reqwest::Client {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::AUTHORIZATION,
        format!("Bearer {USER_TOKEN}").parse().unwrap(),
    );
    reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .unwrap()
}

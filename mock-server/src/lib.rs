//! In-memory stand-in for a Slide controller's local RPC API.
//!
//! Serves the four `/rpc/Slide.*` endpoints over POST. A device created
//! with `MockDevice::with_code` enforces Digest auth the way the firmware
//! does: unauthenticated requests get a 401 with a fresh nonce, and each
//! issued nonce is accepted exactly once.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::Mutex, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const REALM: &str = "slide";
pub const USERNAME: &str = "user";
pub const OPAQUE: &str = "6f70617175652d736c696465";

#[derive(Deserialize)]
pub struct SetPos {
    pub pos: f64,
}

struct Inner {
    code: Option<String>,
    pos: RwLock<f64>,
    nonces: Mutex<HashSet<String>>,
    requests: AtomicUsize,
    calibrations: AtomicUsize,
}

/// Shared handle to one simulated device. Clones observe the same state.
#[derive(Clone)]
pub struct MockDevice {
    inner: Arc<Inner>,
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDevice {
    /// A device that accepts every request.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// A device that requires Digest auth with `code` as the secret.
    pub fn with_code(code: &str) -> Self {
        Self::build(Some(code.to_string()))
    }

    fn build(code: Option<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                code,
                pos: RwLock::new(0.0),
                nonces: Mutex::new(HashSet::new()),
                requests: AtomicUsize::new(0),
                calibrations: AtomicUsize::new(0),
            }),
        }
    }

    /// HTTP requests received so far, rejected ones included.
    pub fn requests(&self) -> usize {
        self.inner.requests.load(Ordering::SeqCst)
    }

    pub fn calibrations(&self) -> usize {
        self.inner.calibrations.load(Ordering::SeqCst)
    }

    pub async fn position(&self) -> f64 {
        *self.inner.pos.read().await
    }

    pub async fn set_position(&self, pos: f64) {
        *self.inner.pos.write().await = pos;
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/rpc/Slide.GetInfo", post(get_info))
            .route("/rpc/Slide.SetPos", post(set_pos))
            .route("/rpc/Slide.Stop", post(stop))
            .route("/rpc/Slide.Calibrate", post(calibrate))
            .layer(middleware::from_fn_with_state(self.clone(), require_digest))
            .with_state(self.clone())
    }
}

/// Router for an open device, for tests that need no auth.
pub fn app() -> Router {
    MockDevice::new().router()
}

pub async fn run(listener: TcpListener, device: MockDevice) -> Result<(), std::io::Error> {
    axum::serve(listener, device.router()).await
}

async fn require_digest(State(device): State<MockDevice>, request: Request, next: Next) -> Response {
    device.inner.requests.fetch_add(1, Ordering::SeqCst);
    let Some(code) = device.inner.code.as_deref() else {
        return next.run(request).await;
    };

    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let method = request.method().as_str().to_string();
    let path = request.uri().path().to_string();

    let authorized = match authorization {
        Some(value) => verify(&device, code, &method, &path, &value).await,
        None => false,
    };

    if authorized {
        next.run(request).await
    } else {
        challenge(&device).await
    }
}

async fn challenge(device: &MockDevice) -> Response {
    let nonce = Uuid::new_v4().simple().to_string();
    device.inner.nonces.lock().await.insert(nonce.clone());
    debug!(%nonce, "issuing digest challenge");
    let value = format!("Digest realm=\"{REALM}\", qop=\"auth\", nonce=\"{nonce}\", opaque=\"{OPAQUE}\"");
    (StatusCode::UNAUTHORIZED, [(header::WWW_AUTHENTICATE, value)]).into_response()
}

async fn verify(device: &MockDevice, code: &str, method: &str, path: &str, authorization: &str) -> bool {
    let Some(rest) = authorization.strip_prefix("Digest ") else {
        return false;
    };
    let params = auth_params(rest);
    let field = |k: &str| params.get(k).map(String::as_str).unwrap_or_default();

    if field("username") != USERNAME
        || field("realm") != REALM
        || field("uri") != path
        || field("qop") != "auth"
        || field("opaque") != OPAQUE
    {
        return false;
    }
    // Single use: a nonce is gone once presented, valid or not.
    if !device.inner.nonces.lock().await.remove(field("nonce")) {
        return false;
    }

    let ha1 = md5_hex(&format!("{USERNAME}:{REALM}:{code}"));
    let ha2 = md5_hex(&format!("{method}:{path}"));
    let expected = md5_hex(&format!(
        "{ha1}:{}:{}:{}:auth:{ha2}",
        field("nonce"),
        field("nc"),
        field("cnonce")
    ));
    expected == field("response")
}

fn md5_hex(input: &str) -> String {
    format!("{:x}", md5::compute(input.as_bytes()))
}

fn auth_params(input: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    let mut rest = input;
    while let Some(eq) = rest.find('=') {
        let key = rest[..eq].trim().trim_start_matches(',').trim().to_string();
        let after = &rest[eq + 1..];
        let (value, tail) = match after.strip_prefix('"') {
            Some(quoted) => match quoted.find('"') {
                Some(end) => (&quoted[..end], &quoted[end + 1..]),
                None => (quoted, ""),
            },
            None => match after.find(',') {
                Some(end) => (&after[..end], &after[end..]),
                None => (after, ""),
            },
        };
        params.insert(key, value.trim().to_string());
        rest = tail;
    }
    params
}

async fn get_info(State(device): State<MockDevice>) -> Json<Value> {
    let pos = device.position().await;
    Json(json!({
        "slide_id": "slide_300000000000",
        "mac": "300000000000",
        "board_rev": 1,
        "device_name": "",
        "zone_name": "",
        "curtain_type": 0,
        "calib_time": 30000,
        "pos": pos,
        "touch_go": true,
    }))
}

async fn set_pos(
    State(device): State<MockDevice>,
    Json(input): Json<SetPos>,
) -> Result<Json<Value>, StatusCode> {
    if !(0.0..=1.0).contains(&input.pos) {
        return Err(StatusCode::BAD_REQUEST);
    }
    device.set_position(input.pos).await;
    info!(pos = input.pos, "moving");
    Ok(Json(json!({ "response": "success" })))
}

/// Answers with an empty body, like the firmware does for Stop.
async fn stop() -> StatusCode {
    StatusCode::OK
}

async fn calibrate(State(device): State<MockDevice>) -> Json<Value> {
    device.inner.calibrations.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "response": "success" }))
}

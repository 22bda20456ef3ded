//! RPC client for the Slide local API.
//!
//! # Design
//! `SlideClient` holds only immutable configuration: host, credentials and a
//! transport. Every `rpc` call is self-contained:
//!
//! 1. POST without credentials.
//! 2. If credentials are configured and the answer is 401, parse the
//!    challenge, compute a digest response and POST once more.
//! 3. The second answer is final, whatever it is.
//!
//! No nonce or session survives a call. The exchange is split into
//! `build_rpc`, `authorize` and `parse_rpc` so each step can be exercised
//! against plain `HttpResponse` values.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::{ClientOptions, Credentials};
use crate::digest::DigestChallenge;
use crate::error::RpcError;
use crate::http::{HttpRequest, HttpResponse, METHOD};
use crate::transport::{Transport, UreqTransport};
use crate::types::{
    Empty, SetPos, SlideInfo, CALIBRATE_PATH, GET_INFO_PATH, SET_POS_PATH, STOP_PATH,
};

/// Client for one Slide device.
///
/// Safe to share between threads; concurrent calls are neither ordered nor
/// serialized relative to one another.
#[derive(Debug, Clone)]
pub struct SlideClient<T = UreqTransport> {
    host: String,
    credentials: Option<Credentials>,
    transport: T,
}

impl SlideClient<UreqTransport> {
    pub fn new(host: &str, options: ClientOptions) -> Self {
        let transport = UreqTransport::new(options.timeout);
        Self::with_transport(host, options.credentials(), transport)
    }
}

impl<T: Transport> SlideClient<T> {
    pub fn with_transport(host: &str, credentials: Option<Credentials>, transport: T) -> Self {
        Self {
            host: host.trim_end_matches('/').to_string(),
            credentials,
            transport,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build the unauthenticated POST for `path`. A body serializing to
    /// `null` is sent as `{}`.
    pub fn build_rpc<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<HttpRequest, RpcError> {
        let value = serde_json::to_value(body).map_err(|e| RpcError::Serialization(e.to_string()))?;
        let payload = if value.is_null() {
            "{}".to_string()
        } else {
            serde_json::to_string(&value).map_err(|e| RpcError::Serialization(e.to_string()))?
        };

        Ok(HttpRequest {
            path: path.to_string(),
            url: format!("http://{}{path}", self.host),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: payload,
        })
    }

    /// Turn a 401 answer into the authenticated retry of `request`.
    ///
    /// Fails with `MissingChallenge` when the answer carries no usable
    /// `WWW-Authenticate` header.
    pub fn authorize(
        &self,
        request: &HttpRequest,
        challenge_response: &HttpResponse,
        credentials: &Credentials,
    ) -> Result<HttpRequest, RpcError> {
        let header = challenge_response.header("www-authenticate").ok_or_else(|| {
            RpcError::missing_challenge(&request.path, "no WWW-Authenticate header")
        })?;
        let challenge = DigestChallenge::parse(header).map_err(|e| e.at_path(&request.path))?;
        let authorization = challenge.authorize(METHOD, &request.path, credentials);
        Ok(request.with_header("authorization", authorization))
    }

    /// Interpret the final answer of a call. Empty body means no result.
    pub fn parse_rpc(&self, path: &str, response: HttpResponse) -> Result<Option<Value>, RpcError> {
        if !response.is_success() {
            return Err(RpcError::RpcFailed {
                path: path.to_string(),
                status: response.status,
            });
        }
        if response.body.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&response.body)
            .map(Some)
            .map_err(|e| RpcError::malformed(path, e.to_string()))
    }

    /// Perform one logical RPC: at most two round trips.
    pub fn rpc<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Option<Value>, RpcError> {
        let request = self.build_rpc(path, body)?;
        debug!(host = %self.host, path, "rpc attempt");
        let response = self.transport.send(&request)?;

        let response = match &self.credentials {
            Some(credentials) if response.status == 401 => {
                debug!(host = %self.host, path, "challenged, retrying with digest");
                let retry = self.authorize(&request, &response, credentials)?;
                self.transport.send(&retry)?
            }
            _ => response,
        };

        self.parse_rpc(path, response)
    }

    /// `Slide.GetInfo`. The answer must be an object with a numeric `pos`.
    pub fn get_info(&self) -> Result<SlideInfo, RpcError> {
        let value = self
            .rpc(GET_INFO_PATH, &Empty {})?
            .ok_or_else(|| RpcError::malformed(GET_INFO_PATH, "empty body"))?;
        serde_json::from_value(value).map_err(|e| RpcError::malformed(GET_INFO_PATH, e.to_string()))
    }

    /// `Slide.SetPos`, 0 = fully open, 1 = fully closed. Out-of-range input
    /// is clamped silently; NaN counts as 0.
    pub fn set_position(&self, pos: f64) -> Result<Option<Value>, RpcError> {
        self.rpc(SET_POS_PATH, &SetPos { pos: clamp_position(pos) })
    }

    pub fn stop(&self) -> Result<Option<Value>, RpcError> {
        self.rpc(STOP_PATH, &Empty {})
    }

    pub fn calibrate(&self) -> Result<Option<Value>, RpcError> {
        self.rpc(CALIBRATE_PATH, &Empty {})
    }
}

/// Clamp a raw device position into `[0, 1]`.
pub fn clamp_position(pos: f64) -> f64 {
    if pos.is_nan() {
        0.0
    } else {
        pos.clamp(0.0, 1.0)
    }
}

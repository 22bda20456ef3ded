//! Network side of an RPC attempt.
//!
//! # Design
//! `Transport` performs exactly one POST per `send` and never retries; the
//! retry-once-on-401 rule lives in `SlideClient`. Non-2xx statuses come back
//! as `HttpResponse` values, only failures to get any answer become errors.
//!
//! `UreqTransport` builds a fresh agent for every attempt, so each attempt
//! owns its own deadline and no connection outlives the call.

use std::io;
use std::time::Duration;

use tracing::debug;

use crate::config::DEFAULT_TIMEOUT_MS;
use crate::error::RpcError;
use crate::http::{HttpRequest, HttpResponse};

/// One timeout-bounded HTTP round trip.
pub trait Transport: Send + Sync {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, RpcError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, RpcError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, RpcError> {
        (**self).send(request)
    }
}

/// Blocking transport on top of `ureq`.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    timeout: Duration,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn agent(&self) -> ureq::Agent {
        ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(self.timeout))
            .build()
            .new_agent()
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_TIMEOUT_MS))
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, RpcError> {
        let agent = self.agent();
        let mut builder = agent.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let mut response = builder
            .send(request.body.as_bytes())
            .map_err(|e| classify(&request.path, e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| classify(&request.path, e))?;

        debug!(path = %request.path, status, body_len = body.len(), "rpc attempt answered");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Map a ureq failure onto the client taxonomy; deadline hits become `Timeout`.
fn classify(path: &str, err: ureq::Error) -> RpcError {
    let timed_out = match &err {
        ureq::Error::Timeout(_) => true,
        ureq::Error::Io(io) => matches!(io.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock),
        _ => false,
    };
    if timed_out {
        debug!(path, "rpc attempt timed out");
        RpcError::Timeout {
            path: path.to_string(),
        }
    } else {
        debug!(path, error = %err, "rpc attempt failed");
        RpcError::Transport {
            path: path.to_string(),
            message: err.to_string(),
        }
    }
}

//! Error types for the Slide RPC client.
//!
//! # Design
//! Every failure of an `rpc` call surfaces as exactly one `RpcError`. Each
//! variant names the RPC path so a caller juggling several operations can
//! tell which one failed from the message alone.

use thiserror::Error;

/// Errors returned by `SlideClient` operations.
#[derive(Debug, Error)]
pub enum RpcError {
    /// A transport attempt exceeded the configured bound.
    #[error("Slide RPC {path} timed out")]
    Timeout { path: String },

    /// The final attempt answered with a non-2xx status. A 401 after the
    /// digest retry also lands here.
    #[error("Slide RPC {path} failed with status {status}")]
    RpcFailed { path: String, status: u16 },

    /// A 401 arrived without a usable `WWW-Authenticate` challenge.
    #[error("Slide RPC {path} got 401 without a usable challenge: {reason}")]
    MissingChallenge { path: String, reason: String },

    /// The body was present but not valid JSON, or not the expected shape.
    #[error("Slide RPC {path} returned a malformed response: {message}")]
    MalformedResponse { path: String, message: String },

    /// The request never got a response: connection refused, DNS, reset.
    #[error("Slide RPC {path} transport error: {message}")]
    Transport { path: String, message: String },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl RpcError {
    pub fn missing_challenge(path: impl Into<String>, reason: impl Into<String>) -> Self {
        RpcError::MissingChallenge {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed(path: impl Into<String>, message: impl Into<String>) -> Self {
        RpcError::MalformedResponse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Fill in the path of a `MissingChallenge` raised before the path was known.
    pub(crate) fn at_path(self, path: &str) -> Self {
        match self {
            RpcError::MissingChallenge { reason, .. } => RpcError::MissingChallenge {
                path: path.to_string(),
                reason,
            },
            other => other,
        }
    }

    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            RpcError::RpcFailed { status, .. } => Some(*status),
            RpcError::MissingChallenge { .. } => Some(401),
            _ => None,
        }
    }
}

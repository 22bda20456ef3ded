//! Client for the local JSON-RPC API of Slide curtain controllers.
//!
//! # Overview
//! Each operation is a JSON POST to a fixed `/rpc/Slide.*` path. Devices
//! with a configured code answer unauthenticated requests with a Digest
//! challenge; the client answers it once, per call, and never caches a
//! nonce or session.
//!
//! # Design
//! - `SlideClient` holds only immutable configuration and is shared freely.
//! - `Transport` is the I/O seam; `UreqTransport` is the blocking production
//!   implementation.
//! - `digest` is pure apart from the cnonce draw, so it is tested against
//!   fixed vectors.
//! - `config`, `position` and `registry` serve host integrations that manage
//!   several devices.

pub mod client;
pub mod config;
pub mod digest;
pub mod error;
pub mod http;
pub mod position;
pub mod registry;
pub mod transport;
pub mod types;

pub use client::SlideClient;
pub use config::{ClientOptions, Credentials, PlatformConfig, SlideConfig};
pub use digest::DigestChallenge;
pub use error::RpcError;
pub use http::{HttpRequest, HttpResponse};
pub use position::{percent_to_pos, pos_to_percent, PositionState};
pub use registry::{Device, DeviceKey, DeviceRegistry, Upsert};
pub use transport::{Transport, UreqTransport};
pub use types::SlideInfo;

//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! One result envelope serves every RPC. It carries the error category, a
//! message, the HTTP status when there was one, and the decoded JSON
//! re-serialized as a C string. GetInfo additionally fills `pos`.

use std::ffi::CString;
use std::os::raw::c_char;

use serde_json::Value;
use slide_core::{RpcError, SlideInfo};

/// Opaque handle to a `SlideClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiSlideClient {
    pub(crate) inner: slide_core::SlideClient,
}

/// Error codes returned in `FfiSlideResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Timeout = 1,
    RpcFailed = 2,
    MissingChallenge = 3,
    MalformedResponse = 4,
    Transport = 5,
    Serialization = 6,
    Panic = 7,
    NullArg = 8,
}

/// Result envelope for all RPC functions.
///
/// On success `error_code` is `Ok` and `error_message` is null. `json` holds
/// the decoded body or is null when the device answered with an empty body.
/// `pos` is only meaningful for `slide_get_info`; it is NaN otherwise.
/// On failure `json` is null and `error_message` describes the error.
#[repr(C)]
pub struct FfiSlideResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub pos: f64,
    pub json: *mut c_char,
}

/// Own `s` as a C string. Interior NULs cannot come out of serde_json; any
/// other source with one yields an empty string.
fn c_string(s: String) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

impl FfiSlideResult {
    fn boxed(self) -> *mut Self {
        Box::into_raw(Box::new(self))
    }

    fn error(error_code: FfiErrorCode, http_status: u16, msg: String) -> *mut Self {
        FfiSlideResult {
            error_code,
            error_message: c_string(msg),
            http_status,
            pos: f64::NAN,
            json: std::ptr::null_mut(),
        }
        .boxed()
    }

    /// Success result of a generic RPC.
    pub(crate) fn ok_value(value: Option<Value>) -> *mut Self {
        FfiSlideResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status: 0,
            pos: f64::NAN,
            json: value.map_or(std::ptr::null_mut(), |v| c_string(v.to_string())),
        }
        .boxed()
    }

    /// Success result of GetInfo: `pos` plus the full payload.
    pub(crate) fn ok_info(info: SlideInfo) -> *mut Self {
        let pos = info.pos;
        let json = serde_json::to_string(&info).map_or(std::ptr::null_mut(), c_string);
        FfiSlideResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status: 0,
            pos,
            json,
        }
        .boxed()
    }

    pub(crate) fn from_error(err: RpcError) -> *mut Self {
        let code = match &err {
            RpcError::Timeout { .. } => FfiErrorCode::Timeout,
            RpcError::RpcFailed { .. } => FfiErrorCode::RpcFailed,
            RpcError::MissingChallenge { .. } => FfiErrorCode::MissingChallenge,
            RpcError::MalformedResponse { .. } => FfiErrorCode::MalformedResponse,
            RpcError::Transport { .. } => FfiErrorCode::Transport,
            RpcError::Serialization(_) => FfiErrorCode::Serialization,
        };
        Self::error(code, err.status().unwrap_or(0), err.to_string())
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::error(FfiErrorCode::NullArg, 0, format!("null argument: {name}"))
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::error(FfiErrorCode::Panic, 0, msg.to_string())
    }
}

//! C-ABI wrapper around `slide-core`.
//!
//! # Overview
//! Lets a host written in any language with a C FFI drive a Slide device:
//! create a client, call the four RPCs, read a result envelope, free it.
//! Calls block for at most two round trips, each bounded by the client's
//! timeout.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - All RPCs return a heap `FfiSlideResult` that the caller must release
//!   with `slide_free_result`, whether the call succeeded or not.
//! - Clients are released with `slide_client_free`.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::catch_unwind;
use std::time::Duration;

use slide_core::config::DEFAULT_TIMEOUT_MS;
use slide_core::{ClientOptions, RpcError, SlideClient};

use types::*;

/// Borrow a nullable C string as an owned `String`. Null and invalid UTF-8
/// both read as absent.
fn optional_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok().map(str::to_string)
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a client for the device at `host` (`ip` or `ip:port`).
///
/// `timeout_ms` of 0 selects the 5000 ms default. Digest auth is enabled
/// only when both `username` and `code` are non-null and non-empty.
/// Returns null if `host` is null. Free with `slide_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn slide_client_new(
    host: *const c_char,
    timeout_ms: u64,
    username: *const c_char,
    code: *const c_char,
) -> *mut FfiSlideClient {
    catch_unwind(|| {
        let Some(host) = optional_string(host) else {
            return std::ptr::null_mut();
        };
        let timeout_ms = if timeout_ms == 0 { DEFAULT_TIMEOUT_MS } else { timeout_ms };
        let options = ClientOptions {
            timeout: Duration::from_millis(timeout_ms),
            username: optional_string(username),
            secret: optional_string(code),
        };
        let client = SlideClient::new(&host, options);
        Box::into_raw(Box::new(FfiSlideClient { inner: client }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `slide_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn slide_client_free(client: *mut FfiSlideClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// RPC functions
// ---------------------------------------------------------------------------

fn call(
    client: *const FfiSlideClient,
    name: &str,
    op: impl FnOnce(&SlideClient) -> Result<Option<serde_json::Value>, RpcError> + std::panic::UnwindSafe,
) -> *mut FfiSlideResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiSlideResult::null_arg("client");
        }
        let client = unsafe { &*client };
        match op(&client.inner) {
            Ok(value) => FfiSlideResult::ok_value(value),
            Err(e) => FfiSlideResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiSlideResult::panic(&format!("panic in {name}")))
}

/// `Slide.GetInfo`. On success `pos` holds the current position and `json`
/// the full payload.
#[unsafe(no_mangle)]
pub extern "C" fn slide_get_info(client: *const FfiSlideClient) -> *mut FfiSlideResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiSlideResult::null_arg("client");
        }
        let client = unsafe { &*client };
        match client.inner.get_info() {
            Ok(info) => FfiSlideResult::ok_info(info),
            Err(e) => FfiSlideResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiSlideResult::panic("panic in slide_get_info"))
}

/// `Slide.SetPos`; `pos` is clamped to [0, 1], 0 = open, 1 = closed.
#[unsafe(no_mangle)]
pub extern "C" fn slide_set_position(client: *const FfiSlideClient, pos: f64) -> *mut FfiSlideResult {
    call(client, "slide_set_position", move |c| c.set_position(pos))
}

#[unsafe(no_mangle)]
pub extern "C" fn slide_stop(client: *const FfiSlideClient) -> *mut FfiSlideResult {
    call(client, "slide_stop", |c| c.stop())
}

#[unsafe(no_mangle)]
pub extern "C" fn slide_calibrate(client: *const FfiSlideClient) -> *mut FfiSlideResult {
    call(client, "slide_calibrate", |c| c.calibrate())
}

// ---------------------------------------------------------------------------
// Position mapping
// ---------------------------------------------------------------------------

/// Device position (0 = open) to percent open (100 = open).
#[unsafe(no_mangle)]
pub extern "C" fn slide_pos_to_percent(pos: f64) -> u8 {
    slide_core::pos_to_percent(pos)
}

/// Percent open (100 = open) to device position (0 = open).
#[unsafe(no_mangle)]
pub extern "C" fn slide_percent_to_pos(percent: f64) -> f64 {
    slide_core::percent_to_pos(percent)
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free a result returned by any RPC function. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn slide_free_result(result: *mut FfiSlideResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        if !result.error_message.is_null() {
            drop(unsafe { CString::from_raw(result.error_message) });
        }
        if !result.json.is_null() {
            drop(unsafe { CString::from_raw(result.json) });
        }
    });
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

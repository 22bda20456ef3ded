//! Payloads of the Slide RPC API.
//!
//! # Design
//! Only `pos` is relied upon. Firmware revisions add and rename the other
//! GetInfo fields, so everything else is kept verbatim in `extra`.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

pub const GET_INFO_PATH: &str = "/rpc/Slide.GetInfo";
pub const SET_POS_PATH: &str = "/rpc/Slide.SetPos";
pub const STOP_PATH: &str = "/rpc/Slide.Stop";
pub const CALIBRATE_PATH: &str = "/rpc/Slide.Calibrate";

/// Decoded `Slide.GetInfo` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideInfo {
    /// 0.0 = fully open, 1.0 = fully closed.
    pub pos: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Request body of `Slide.SetPos`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetPos {
    #[serde(serialize_with = "whole_as_integer")]
    pub pos: f64,
}

/// Write `1.0` as `1` so the device sees the same body a JavaScript client sends.
fn whole_as_integer<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() <= i32::MAX as f64 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// Request body of the argument-less calls: `{}`.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Empty {}

//! Conversion between device positions and window-covering percentages.
//!
//! The device counts 0.0 as fully open and 1.0 as fully closed. Home
//! automation hosts count 100% as fully open and 0% as fully closed.

use crate::client::clamp_position;

/// Device position to percent open, rounded to a whole percent.
pub fn pos_to_percent(pos: f64) -> u8 {
    ((1.0 - clamp_position(pos)) * 100.0).round() as u8
}

/// Percent open to device position.
pub fn percent_to_pos(percent: f64) -> f64 {
    let p = if percent.is_nan() { 0.0 } else { percent.clamp(0.0, 100.0) };
    1.0 - p / 100.0
}

/// Direction of travel while moving toward a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionState {
    /// Opening.
    Increasing,
    /// Closing.
    Decreasing,
    Stopped,
}

impl PositionState {
    pub fn between(current_percent: u8, target_percent: u8) -> Self {
        match target_percent.cmp(&current_percent) {
            std::cmp::Ordering::Greater => PositionState::Increasing,
            std::cmp::Ordering::Less => PositionState::Decreasing,
            std::cmp::Ordering::Equal => PositionState::Stopped,
        }
    }
}

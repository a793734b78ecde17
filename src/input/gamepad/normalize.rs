//! Conversion from gilrs values to raw axis samples
//!
//! gilrs reports sticks as `f32` in -1.0..=1.0. The aim machine works on the
//! XInput-style `i16` range, so values are scaled by 32767 and rounded. The
//! machine applies its own radial deadzone; no deadzone is applied here.

use crate::aim::AXIS_MAX_VALUE;

/// Scale a gilrs axis value to the `i16` axis range
///
/// Out-of-range and non-finite inputs are clamped (NaN maps to 0).
///
/// # Example
/// ```
/// use aim_latch::input::gamepad::normalize::axis_to_raw;
///
/// assert_eq!(axis_to_raw(0.0), 0);
/// assert_eq!(axis_to_raw(1.0), 32767);
/// assert_eq!(axis_to_raw(-1.0), -32767);
/// assert_eq!(axis_to_raw(2.5), 32767);
/// ```
pub fn axis_to_raw(value: f32) -> i16 {
    if value.is_nan() {
        return 0;
    }
    let clamped = value.clamp(-1.0, 1.0);
    (clamped * AXIS_MAX_VALUE as f32).round() as i16
}

/// Convert a gilrs stick pair, keeping diagonals inside the unit circle
///
/// Some pads report a square range (corners at (1, 1)); those are pulled back
/// onto the circle so diagonals don't overshoot the aim magnitude.
pub fn stick_to_raw(x: f32, y: f32) -> (i16, i16) {
    let magnitude = (x * x + y * y).sqrt();
    let (x, y) = if magnitude > 1.0 {
        (x / magnitude, y / magnitude)
    } else {
        (x, y)
    };
    (axis_to_raw(x), axis_to_raw(y))
}

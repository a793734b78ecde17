//! Aim vector processing (deadzone, angle quantization, output scaling)
//!
//! Everything here is a pure function of the raw `i16` stick values and the
//! current [`AimSettings`].
//!
//! # Buckets
//!
//! The circle is cut into `num_aim_directions` equal slices. Bucket 0 is
//! centered on +X and indices grow counter-clockwise (toward +Y). A raw angle
//! is snapped to the nearest bucket center; exact half-way angles round to the
//! even index, and the wraparound bucket `N` folds back to `0`.
//!
//! Buckets are compared as integers. Two vectors that land in the same bucket
//! always produce bit-identical output.

use std::f64::consts::TAU;

use super::types::{AxisPair, AXIS_MAX_VALUE};
use crate::config::AimSettings;

/// Index of a discretized aim direction, always `< num_aim_directions`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bucket(pub u32);

/// Length of the aim vector, or 0.0 when it falls inside the deadzone
///
/// The deadzone radius is `AXIS_MAX_VALUE * aim_deadzone / 100`. A vector
/// exactly on the radius counts as aiming.
pub fn aim_magnitude(aim_x: i16, aim_y: i16, deadzone_percent: u32) -> f64 {
    let x = aim_x as f64;
    let y = aim_y as f64;
    let magnitude = (x * x + y * y).sqrt();

    let radius = AXIS_MAX_VALUE as f64 * deadzone_percent as f64 / 100.0;
    if magnitude < radius {
        0.0
    } else {
        magnitude
    }
}

/// Angle of the aim vector in `[0, 2π)`
pub fn raw_angle(aim_x: i16, aim_y: i16) -> f64 {
    let theta = (aim_y as f64).atan2(aim_x as f64);
    if theta < 0.0 {
        theta + TAU
    } else {
        theta
    }
}

/// Snap an angle in `[0, 2π)` to its nearest bucket
///
/// `num_directions` must be at least 1; zero is treated as 1 so this never
/// divides by zero even on unvalidated input.
pub fn bucket_for_angle(theta: f64, num_directions: u32) -> Bucket {
    let n = num_directions.max(1);
    let scaled = (theta / TAU * n as f64).round_ties_even();

    // theta < 2π keeps `scaled` within 0..=n
    let index = (scaled as u64 % n as u64) as u32;
    Bucket(index)
}

/// Bucket of an aim vector
pub fn bucket_for_vector(aim_x: i16, aim_y: i16, num_directions: u32) -> Bucket {
    bucket_for_angle(raw_angle(aim_x, aim_y), num_directions)
}

/// Center angle of a bucket, in radians
pub fn bucket_angle(bucket: Bucket, num_directions: u32) -> f64 {
    let n = num_directions.max(1);
    bucket.0 as f64 / n as f64 * TAU
}

/// Output stick value pointing at `bucket`
///
/// Length is `AXIS_MAX_VALUE * aim_magnitude / 100` (integer arithmetic).
/// Components are truncated toward zero and saturate at the `i16` limits, so
/// magnitudes above 100% clip instead of wrapping.
pub fn aim_output(bucket: Bucket, settings: &AimSettings) -> AxisPair {
    let theta = bucket_angle(bucket, settings.num_aim_directions);
    let scale = (AXIS_MAX_VALUE as i64 * settings.aim_magnitude as i64 / 100) as f64;

    AxisPair {
        x: (theta.cos() * scale) as i16,
        y: (theta.sin() * scale) as i16,
    }
}

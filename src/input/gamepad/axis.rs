//! Axis binding names for gamepad providers
//!
//! Config files refer to sticks by short names:
//! - `lx` / `ly` -> left stick
//! - `rx` / `ry` -> right stick
//! - `zl` / `zr` -> analog triggers

use anyhow::{bail, Result};
use gilrs::Axis;

/// Map a binding name to its gilrs axis
pub fn axis_from_name(name: &str) -> Result<Axis> {
    let axis = match name.trim().to_ascii_lowercase().as_str() {
        "lx" => Axis::LeftStickX,
        "ly" => Axis::LeftStickY,
        "rx" => Axis::RightStickX,
        "ry" => Axis::RightStickY,
        "zl" => Axis::LeftZ,
        "zr" => Axis::RightZ,
        other => bail!("Unknown axis binding: \"{}\" (expected lx, ly, rx, ry, zl or zr)", other),
    };
    Ok(axis)
}

/// Short binding name of a gilrs axis, if it has one
pub fn axis_name(axis: Axis) -> Option<&'static str> {
    match axis {
        Axis::LeftStickX => Some("lx"),
        Axis::LeftStickY => Some("ly"),
        Axis::RightStickX => Some("rx"),
        Axis::RightStickY => Some("ry"),
        Axis::LeftZ => Some("zl"),
        Axis::RightZ => Some("zr"),
        _ => None,
    }
}

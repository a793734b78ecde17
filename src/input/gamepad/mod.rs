//! Gamepad input support using GilRs
//!
//! Polls a single controller and turns its bound sticks and hold button into
//! aim samples.

pub mod axis;
pub mod buttons;
pub mod diagnostics;
pub mod normalize;
pub mod provider;

pub use diagnostics::print_gamepad_diagnostics;
pub use provider::{Bindings, GilrsProvider};

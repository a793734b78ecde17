//! aim-latch - hold-to-aim, then auto-lock direction
//!
//! Shapes a movement stick, an aim stick and a hold button into one output
//! stick for games that only support a fixed number of fire directions.
//! While the button is held, pushing the aim stick steers a discretized
//! direction for a short debounce window; after that the direction is latched
//! and the output drops to zero until the button is released or the stick is
//! pushed toward a different direction.

pub mod aim;
pub mod config;
pub mod drivers;
pub mod input;
pub mod replay;

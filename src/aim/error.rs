//! Error types for the aim controller

use thiserror::Error;

/// Errors raised when configuring or constructing the aim controller
///
/// Sampling itself never fails; only caller contract violations end up here.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AimError {
    #[error("num_aim_directions must be at least 1")]
    NoDirections,

    #[error("active_aim_time_ms must be a finite, non-negative number (got {0})")]
    InvalidAimTime(f64),

    #[error("aim_deadzone must be within 0..=100 percent (got {0})")]
    DeadzoneOutOfRange(u32),

    #[error("timer scheduling requires a running tokio runtime")]
    NoRuntime,
}

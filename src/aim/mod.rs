//! Hold-to-aim, then auto-lock direction
//!
//! Turns a movement stick, an aim stick and a hold button into a single
//! output stick for games that only fire in a fixed number of directions.
//!
//! - [`machine`]: the pure three-state machine
//! - [`discretize`]: deadzone, angle buckets and output scaling
//! - [`controller`]: mutex-guarded host entry points and debounce timer
//! - [`timer`]: one-shot timer sources

pub mod controller;
pub mod discretize;
pub mod error;
pub mod machine;
pub mod timer;
pub mod types;

pub use controller::AimController;
pub use error::AimError;
pub use machine::{AimStateMachine, Step, TimerAction};
pub use timer::{ManualScheduler, PendingTimer, Scheduler, TokioScheduler};
pub use types::{
    AimState, AxisPair, FrameCause, OutputAxis, OutputFrame, Sample, AXIS_MAX_VALUE,
};

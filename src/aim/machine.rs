//! Hold-to-aim state machine
//!
//! Pure logic: no locks, no clocks. Each call returns the output pair plus an
//! instruction for the debounce timer, and the caller (see
//! [`AimController`](super::controller::AimController)) applies both.
//!
//! # States
//!
//! ```text
//!            held + aim outside deadzone
//!   Normal ─────────────────────────────► ActiveAim ◄──────────────┐
//!     ▲                                       │                    │
//!     │ timer fires, released                 │ timer fires, held  │ held + new bucket
//!     │◄──────────────────────────────────────┤                    │
//!     │                                       ▼                    │
//!     └────────────── released ────────── PassiveAim ──────────────┘
//! ```
//!
//! Outputs per state:
//! - `Normal`: movement stick passes through
//! - `ActiveAim`: unit vector at the discretized aim angle, scaled by `aim_magnitude`
//! - `PassiveAim`: `(0, 0)`, the game keeps firing in the latched direction

use std::time::Duration;
use tracing::debug;

use super::discretize::{aim_magnitude, aim_output, bucket_for_vector, Bucket};
use super::error::AimError;
use super::types::{AimState, AxisPair, Sample};
use crate::config::AimSettings;

/// What the caller must do with the debounce timer after a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Leave any pending timer alone
    Keep,
    /// Cancel any pending timer and start a new one
    Restart(Duration),
}

/// Result of feeding one event into the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub previous: AimState,
    pub state: AimState,
    pub output: AxisPair,
    pub timer: TimerAction,
}

impl Step {
    pub fn changed_state(&self) -> bool {
        self.previous != self.state
    }
}

/// Aim state machine with its retained memory
#[derive(Debug, Clone)]
pub struct AimStateMachine {
    settings: AimSettings,
    state: AimState,
    /// Bucket the active-aim output last pointed at
    last_bucket: Option<Bucket>,
    /// Replayed when the debounce timer fires
    last_sample: Option<Sample>,
}

impl AimStateMachine {
    pub fn new(settings: AimSettings) -> Result<Self, AimError> {
        settings.validate()?;
        Ok(Self {
            settings,
            state: AimState::Normal,
            last_bucket: None,
            last_sample: None,
        })
    }

    pub fn state(&self) -> AimState {
        self.state
    }

    pub fn settings(&self) -> &AimSettings {
        &self.settings
    }

    /// Replace the settings; the next step uses them
    ///
    /// Invalid settings are rejected and the current ones kept.
    pub fn set_settings(&mut self, settings: AimSettings) -> Result<(), AimError> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    #[cfg(test)]
    fn last_bucket(&self) -> Option<Bucket> {
        self.last_bucket
    }

    /// Return to `Normal` for a new session
    pub fn reset(&mut self) {
        if self.state != AimState::Normal {
            debug!(from = %self.state, "Aim state reset");
        }
        self.state = AimState::Normal;
    }

    /// Feed a fresh sample
    pub fn on_sample(&mut self, sample: Sample) -> Step {
        let previous = self.state;
        let aiming = aim_magnitude(sample.aim_x, sample.aim_y, self.settings.aim_deadzone) != 0.0;
        let bucket = bucket_for_vector(sample.aim_x, sample.aim_y, self.settings.num_aim_directions);

        let mut timer = TimerAction::Keep;

        match self.state {
            AimState::Normal => {
                if sample.aim_held && aiming {
                    self.state = AimState::ActiveAim;
                    timer = TimerAction::Restart(self.settings.active_aim_duration());
                }
            }
            AimState::ActiveAim => {}
            AimState::PassiveAim => {
                if !sample.aim_held {
                    self.state = AimState::Normal;
                } else if aiming && self.last_bucket != Some(bucket) {
                    self.state = AimState::ActiveAim;
                    timer = TimerAction::Restart(self.settings.active_aim_duration());
                }
            }
        }

        let output = match self.state {
            AimState::Normal => AxisPair::new(sample.move_x, sample.move_y),
            AimState::ActiveAim => {
                // Deadzone only gates entry; once active the stick angle always steers
                self.last_bucket = Some(bucket);
                aim_output(bucket, &self.settings)
            }
            AimState::PassiveAim => AxisPair::ZERO,
        };

        self.last_sample = Some(sample);

        if previous != self.state {
            debug!(
                from = %previous,
                to = %self.state,
                bucket = self.last_bucket.map(|b| b.0),
                "Aim state transition"
            );
        }

        Step {
            previous,
            state: self.state,
            output,
            timer,
        }
    }

    /// Debounce window elapsed
    ///
    /// Leaves active aim (latching if the button is still held) and recomputes
    /// the output from the last sample. Returns `None` for an expiry that has
    /// nothing to act on: no sample seen yet, or not in `ActiveAim`.
    pub fn on_timer_expired(&mut self) -> Option<Step> {
        if self.state != AimState::ActiveAim {
            debug!(state = %self.state, "Ignoring stale aim timer expiry");
            return None;
        }
        let sample = self.last_sample?;

        let previous = self.state;
        self.state = if sample.aim_held {
            AimState::PassiveAim
        } else {
            AimState::Normal
        };

        let mut step = self.on_sample(sample);
        step.previous = previous;
        Some(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> AimSettings {
        AimSettings {
            aim_magnitude: 100,
            aim_deadzone: 50,
            active_aim_time_ms: 20.0,
            num_aim_directions: 8,
        }
    }

    fn machine() -> AimStateMachine {
        AimStateMachine::new(settings()).unwrap()
    }

    fn held(aim_x: i16, aim_y: i16) -> Sample {
        Sample::new(1000, -2000, aim_x, aim_y, true)
    }

    fn released(move_x: i16, move_y: i16) -> Sample {
        Sample::new(move_x, move_y, 0, 0, false)
    }

    const DEBOUNCE: TimerAction = TimerAction::Restart(Duration::from_millis(20));

    #[test]
    fn test_rejects_zero_directions() {
        let mut s = settings();
        s.num_aim_directions = 0;
        assert_eq!(AimStateMachine::new(s).unwrap_err(), AimError::NoDirections);

        let mut m = machine();
        assert!(m.set_settings(s).is_err());
        assert_eq!(m.settings().num_aim_directions, 8);
    }

    #[test]
    fn test_normal_passthrough() {
        let mut m = machine();
        let step = m.on_sample(Sample::new(1234, -4321, 30000, 0, false));
        assert_eq!(step.state, AimState::Normal);
        assert_eq!(step.output, AxisPair::new(1234, -4321));
        assert_eq!(step.timer, TimerAction::Keep);
    }

    #[test]
    fn test_hold_inside_deadzone_stays_normal() {
        let mut m = machine();
        let step = m.on_sample(Sample::new(5, 6, 16000, 0, true));
        assert_eq!(step.state, AimState::Normal);
        assert_eq!(step.output, AxisPair::new(5, 6));
        assert_eq!(step.timer, TimerAction::Keep);
    }

    #[test]
    fn test_enter_active_aim() {
        let mut m = machine();
        let step = m.on_sample(held(30000, 0));
        assert_eq!(step.previous, AimState::Normal);
        assert_eq!(step.state, AimState::ActiveAim);
        assert_eq!(step.output, AxisPair::new(32767, 0));
        assert_eq!(step.timer, DEBOUNCE);
        assert_eq!(m.last_bucket(), Some(Bucket(0)));
    }

    #[test]
    fn test_active_aim_follows_stick_without_restarting_timer() {
        let mut m = machine();
        m.on_sample(held(30000, 0));

        let step = m.on_sample(held(0, 30000));
        assert_eq!(step.state, AimState::ActiveAim);
        assert_eq!(step.output, AxisPair::new(0, 32767));
        assert_eq!(step.timer, TimerAction::Keep);
        assert_eq!(m.last_bucket(), Some(Bucket(2)));
    }

    #[test]
    fn test_active_aim_ignores_release_until_timer() {
        let mut m = machine();
        m.on_sample(held(30000, 0));

        let step = m.on_sample(released(100, 100));
        assert_eq!(step.state, AimState::ActiveAim);
        assert_eq!(step.output, AxisPair::new(32767, 0));
    }

    #[test]
    fn test_active_aim_steers_inside_deadzone() {
        let mut m = machine();
        m.on_sample(held(0, -30000));

        // Centered stick has angle 0
        let step = m.on_sample(held(0, 0));
        assert_eq!(step.state, AimState::ActiveAim);
        assert_eq!(step.output, AxisPair::new(32767, 0));
        assert_eq!(m.last_bucket(), Some(Bucket(0)));
    }

    #[test]
    fn test_active_aim_output_depends_only_on_bucket() {
        let mut short = machine();
        let mut long = machine();
        short.on_sample(held(30000, 0));
        long.on_sample(held(30000, 0));

        // Both point at bucket 4; only the second is outside the deadzone
        let inside = short.on_sample(held(-10000, 0));
        let outside = long.on_sample(held(-30000, 0));

        assert_eq!(inside.output, AxisPair::new(-32767, 0));
        assert_eq!(inside.output, outside.output);
        assert_eq!(short.last_bucket(), long.last_bucket());
    }

    #[test]
    fn test_timer_latches_when_held() {
        let mut m = machine();
        m.on_sample(held(30000, 0));

        let step = m.on_timer_expired().unwrap();
        assert_eq!(step.previous, AimState::ActiveAim);
        assert_eq!(step.state, AimState::PassiveAim);
        assert_eq!(step.output, AxisPair::ZERO);
        assert_eq!(step.timer, TimerAction::Keep);
    }

    #[test]
    fn test_timer_returns_to_normal_when_released() {
        let mut m = machine();
        m.on_sample(held(30000, 0));
        m.on_sample(released(700, 800));

        let step = m.on_timer_expired().unwrap();
        assert_eq!(step.state, AimState::Normal);
        assert_eq!(step.output, AxisPair::new(700, 800));
    }

    #[test]
    fn test_passive_release_restores_movement() {
        let mut m = machine();
        m.on_sample(held(30000, 0));
        m.on_timer_expired();

        let step = m.on_sample(released(-300, 400));
        assert_eq!(step.state, AimState::Normal);
        assert_eq!(step.output, AxisPair::new(-300, 400));
    }

    #[test]
    fn test_passive_same_bucket_stays_latched() {
        let mut m = machine();
        m.on_sample(held(30000, 0));
        m.on_timer_expired();

        // Different raw angle, same bucket
        let step = m.on_sample(held(30000, 3000));
        assert_eq!(step.state, AimState::PassiveAim);
        assert_eq!(step.output, AxisPair::ZERO);
        assert_eq!(step.timer, TimerAction::Keep);

        // Stick back at center
        let step = m.on_sample(held(0, 0));
        assert_eq!(step.state, AimState::PassiveAim);
        assert_eq!(step.output, AxisPair::ZERO);
    }

    #[test]
    fn test_passive_new_bucket_reaims() {
        let mut m = machine();
        m.on_sample(held(30000, 0));
        m.on_timer_expired();

        let step = m.on_sample(held(-30000, 0));
        assert_eq!(step.previous, AimState::PassiveAim);
        assert_eq!(step.state, AimState::ActiveAim);
        assert_eq!(step.output, AxisPair::new(-32767, 0));
        assert_eq!(step.timer, DEBOUNCE);
        assert_eq!(m.last_bucket(), Some(Bucket(4)));
    }

    #[test]
    fn test_passive_new_bucket_inside_deadzone_ignored() {
        let mut m = machine();
        m.on_sample(held(30000, 0));
        m.on_timer_expired();

        let step = m.on_sample(held(-10000, 0));
        assert_eq!(step.state, AimState::PassiveAim);
    }

    #[test]
    fn test_stale_timer_ignored() {
        let mut m = machine();
        assert!(m.on_timer_expired().is_none());

        m.on_sample(held(30000, 0));
        m.on_timer_expired();
        assert_eq!(m.state(), AimState::PassiveAim);
        assert!(m.on_timer_expired().is_none());
        assert_eq!(m.state(), AimState::PassiveAim);
    }

    #[test]
    fn test_reset_returns_to_normal_and_keeps_settings() {
        let mut m = machine();
        let mut s = settings();
        s.num_aim_directions = 4;
        m.set_settings(s).unwrap();
        m.on_sample(held(30000, 0));

        m.reset();
        assert_eq!(m.state(), AimState::Normal);
        assert_eq!(m.settings().num_aim_directions, 4);
    }

    #[test]
    fn test_repeated_samples_are_stable() {
        let mut m = machine();
        let sample = held(21000, 21000);
        let first = m.on_sample(sample).output;
        for _ in 0..10 {
            assert_eq!(m.on_sample(sample).output, first);
        }

        m.on_timer_expired();
        for _ in 0..10 {
            assert_eq!(m.on_sample(sample).output, AxisPair::ZERO);
        }
    }

    #[test]
    fn test_settings_take_effect_next_sample() {
        let mut m = machine();
        m.on_sample(held(30000, 0));

        let mut s = settings();
        s.aim_magnitude = 50;
        m.set_settings(s).unwrap();

        let step = m.on_sample(held(30000, 0));
        assert_eq!(step.output, AxisPair::new(16383, 0));
    }

    #[test]
    fn test_zero_duration_still_restarts() {
        let mut s = settings();
        s.active_aim_time_ms = 0.0;
        let mut m = AimStateMachine::new(s).unwrap();
        let step = m.on_sample(held(30000, 0));
        assert_eq!(step.timer, TimerAction::Restart(Duration::ZERO));
    }
}

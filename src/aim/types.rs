//! Core value types shared by the aim state machine and its hosts

use std::fmt;

/// Largest value an output axis can carry.
///
/// Scaling is done against the positive extreme so that a full-magnitude
/// aim vector along +X lands exactly on `i16::MAX`.
pub const AXIS_MAX_VALUE: i16 = i16::MAX;

/// One polling tick worth of raw input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sample {
    pub move_x: i16,
    pub move_y: i16,
    pub aim_x: i16,
    pub aim_y: i16,
    /// Hold-for-aiming button
    pub aim_held: bool,
}

impl Sample {
    pub fn new(move_x: i16, move_y: i16, aim_x: i16, aim_y: i16, aim_held: bool) -> Self {
        Self {
            move_x,
            move_y,
            aim_x,
            aim_y,
            aim_held,
        }
    }

    /// Build a sample from the five raw values a host delivers
    ///
    /// The momentary value counts as held when it is nonzero.
    pub fn from_raw(values: [i16; 5]) -> Self {
        let [move_x, move_y, aim_x, aim_y, hold] = values;
        Self::new(move_x, move_y, aim_x, aim_y, hold != 0)
    }
}

/// Output stick value written to the host, one entry per axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AxisPair {
    pub x: i16,
    pub y: i16,
}

impl AxisPair {
    pub const ZERO: AxisPair = AxisPair { x: 0, y: 0 };

    pub fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for AxisPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Output axis index as seen by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputAxis {
    X = 0,
    Y = 1,
}

impl OutputAxis {
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Aiming mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AimState {
    /// Movement stick passes straight through
    #[default]
    Normal,
    /// Aim stick is steering; debounce timer running
    ActiveAim,
    /// Direction latched, output held at zero
    PassiveAim,
}

impl AimState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AimState::Normal => "normal",
            AimState::ActiveAim => "active_aim",
            AimState::PassiveAim => "passive_aim",
        }
    }
}

impl fmt::Display for AimState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What triggered an output frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameCause {
    Sample,
    Timer,
}

impl FrameCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrameCause::Sample => "sample",
            FrameCause::Timer => "timer",
        }
    }
}

/// Both output axes plus the state that produced them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputFrame {
    pub output: AxisPair,
    pub state: AimState,
    pub cause: FrameCause,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_from_raw_hold_is_nonzero() {
        let s = Sample::from_raw([1, 2, 3, 4, 0]);
        assert_eq!(s, Sample::new(1, 2, 3, 4, false));

        assert!(Sample::from_raw([0, 0, 0, 0, 1]).aim_held);
        assert!(Sample::from_raw([0, 0, 0, 0, -1]).aim_held);
    }

    #[test]
    fn test_output_axis_index() {
        assert_eq!(OutputAxis::X.index(), 0);
        assert_eq!(OutputAxis::Y.index(), 1);
    }

    #[test]
    fn test_state_names() {
        assert_eq!(AimState::default(), AimState::Normal);
        assert_eq!(AimState::PassiveAim.to_string(), "passive_aim");
    }
}

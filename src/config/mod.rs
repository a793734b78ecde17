//! Configuration management for aim-latch
//!
//! Handles loading, parsing, and hot-reloading of YAML configuration files.

pub mod watcher;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::fs;
use tracing::info;

use crate::aim::AimError;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub aim: AimSettings,
    #[serde(default)]
    pub gamepad: GamepadConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Aim shaping parameters
///
/// These are the four values exposed to the user. They can be replaced at any
/// time; the next evaluation picks them up.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct AimSettings {
    /// Output vector length, percent of the axis maximum
    #[serde(default = "default_aim_magnitude")]
    pub aim_magnitude: u32,
    /// Aim vectors shorter than this percent of the axis maximum are ignored
    #[serde(default = "default_aim_deadzone")]
    pub aim_deadzone: u32,
    /// Debounce window after entering active aim
    #[serde(default = "default_active_aim_time_ms")]
    pub active_aim_time_ms: f64,
    /// Number of discrete fire directions
    #[serde(default = "default_num_aim_directions")]
    pub num_aim_directions: u32,
}

impl Default for AimSettings {
    fn default() -> Self {
        Self {
            aim_magnitude: default_aim_magnitude(),
            aim_deadzone: default_aim_deadzone(),
            active_aim_time_ms: default_active_aim_time_ms(),
            num_aim_directions: default_num_aim_directions(),
        }
    }
}

impl AimSettings {
    /// Reject values the state machine cannot compute with
    pub fn validate(&self) -> Result<(), AimError> {
        if self.num_aim_directions == 0 {
            return Err(AimError::NoDirections);
        }
        if !self.active_aim_time_ms.is_finite() || self.active_aim_time_ms < 0.0 {
            return Err(AimError::InvalidAimTime(self.active_aim_time_ms));
        }
        if self.aim_deadzone > 100 {
            return Err(AimError::DeadzoneOutOfRange(self.aim_deadzone));
        }
        Ok(())
    }

    /// Debounce window as a `Duration`
    ///
    /// Only meaningful on validated settings.
    pub fn active_aim_duration(&self) -> Duration {
        Duration::from_nanos((self.active_aim_time_ms.max(0.0) * 1_000_000.0).round() as u64)
    }
}

/// Gamepad input configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct GamepadConfig {
    /// Only use a gamepad whose name contains this (case-insensitive)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_match: Option<String>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub bindings: BindingConfig,
}

impl Default for GamepadConfig {
    fn default() -> Self {
        Self {
            product_match: None,
            poll_interval_ms: default_poll_interval_ms(),
            bindings: BindingConfig::default(),
        }
    }
}

/// Which physical controls feed the five sample inputs
///
/// Axis names: `lx`, `ly`, `rx`, `ry`, `zl`, `zr`.
/// Button names: `a`, `b`, `x`, `y`, `lb`, `rb`, `lt`, `rt`, `l3`, `r3`, ...
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct BindingConfig {
    #[serde(default = "default_move_x")]
    pub move_x: String,
    #[serde(default = "default_move_y")]
    pub move_y: String,
    #[serde(default = "default_aim_x")]
    pub aim_x: String,
    #[serde(default = "default_aim_y")]
    pub aim_y: String,
    #[serde(default = "default_hold")]
    pub hold: String,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            move_x: default_move_x(),
            move_y: default_move_y(),
            aim_x: default_aim_x(),
            aim_y: default_aim_y(),
            hold: default_hold(),
        }
    }
}

/// Output driver configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct OutputConfig {
    /// Log every axis write instead of only changed output frames
    #[serde(default)]
    pub log_every_write: bool,
}

impl AppConfig {
    /// Load configuration from file
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path))?;

        Self::from_yaml(&contents).with_context(|| format!("Invalid config file: {}", path))
    }

    /// Load configuration from file, or use defaults if it does not exist
    ///
    /// Never creates the file. A file that exists but is invalid is an error.
    pub async fn load_or_default(path: &str) -> Result<Self> {
        if fs::try_exists(path).await.unwrap_or(false) {
            Self::load(path).await
        } else {
            info!("No configuration at {}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Parse and validate configuration from a YAML string
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: AppConfig =
            serde_yaml::from_str(contents).context("Failed to parse YAML config")?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self, path: &str) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;

        fs::write(path, yaml)
            .await
            .with_context(|| format!("Failed to write config file: {}", path))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.aim.validate().context("Invalid aim settings")?;
        if self.gamepad.poll_interval_ms == 0 {
            anyhow::bail!("gamepad.poll_interval_ms must be greater than zero");
        }
        Ok(())
    }
}

// Default value functions
fn default_aim_magnitude() -> u32 { 100 }
fn default_aim_deadzone() -> u32 { 50 }
fn default_active_aim_time_ms() -> f64 { 20.0 }
fn default_num_aim_directions() -> u32 { 8 }
fn default_poll_interval_ms() -> u64 { 4 }
fn default_move_x() -> String { "lx".to_string() }
fn default_move_y() -> String { "ly".to_string() }
fn default_aim_x() -> String { "rx".to_string() }
fn default_aim_y() -> String { "ry".to_string() }
fn default_hold() -> String { "rb".to_string() }

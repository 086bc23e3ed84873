//! Animation engine configuration
//!
//! Tuning constants for fly-to trajectories, deceleration and curve solving.
//! Defaults match the values the engine was designed around; hosts can load
//! overrides from TOML.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::animator::AnimationOwner;
use crate::error::{ConfigError, Result};

/// Tuning for the animation engine
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Average fly-to velocity in ρ-screenfuls per second
    pub fly_to_velocity: f64,
    /// Relative amount of zooming along a fly-to path. 1.42 is the average
    /// chosen by participants in van Wijk & Nuij's user study.
    pub fly_to_rho: f64,
    /// Shortest derived fly-to duration (ms)
    pub fly_to_min_duration_ms: u64,
    /// Longest derived fly-to duration (ms)
    pub fly_to_max_duration_ms: u64,
    /// Deceleration ends once both velocity components drop below this (pt/s)
    pub deceleration_threshold: f64,
    /// Precision of the cubic-bezier solver
    pub bezier_epsilon: f64,
    /// Owner used by manager calls that don't name one
    pub default_owner: String,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl AnimationConfig {
    /// Standard configuration for interactive maps.
    pub fn standard() -> Self {
        Self {
            fly_to_velocity: 1.2,
            fly_to_rho: 1.42,
            fly_to_min_duration_ms: 100,
            fly_to_max_duration_ms: 15_000,
            deceleration_threshold: 1.0,
            bezier_epsilon: 1e-6,
            default_owner: AnimationOwner::DEFAULT.as_str().to_string(),
        }
    }

    /// Testing configuration with a 1 ms duration floor so derived
    /// durations can be asserted without the standard floor masking them.
    pub fn testing() -> Self {
        Self {
            fly_to_min_duration_ms: 1,
            ..Self::standard()
        }
    }

    /// Parse a TOML document; missing keys keep their standard value.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!("AnimationConfig: loaded from {}", path.as_ref().display());
        Ok(config)
    }

    /// Check every value is in range.
    pub fn validate(&self) -> Result<()> {
        if !(self.fly_to_velocity.is_finite() && self.fly_to_velocity > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "fly_to_velocity must be positive, got {}",
                self.fly_to_velocity
            )));
        }
        if !(self.fly_to_rho.is_finite() && self.fly_to_rho > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "fly_to_rho must be positive, got {}",
                self.fly_to_rho
            )));
        }
        if self.fly_to_min_duration_ms == 0 {
            return Err(ConfigError::Invalid(
                "fly_to_min_duration_ms must be at least 1".to_string(),
            ));
        }
        if self.fly_to_min_duration_ms > self.fly_to_max_duration_ms {
            return Err(ConfigError::Invalid(format!(
                "fly_to_min_duration_ms ({}) exceeds fly_to_max_duration_ms ({})",
                self.fly_to_min_duration_ms, self.fly_to_max_duration_ms
            )));
        }
        if !(self.deceleration_threshold.is_finite() && self.deceleration_threshold > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "deceleration_threshold must be positive, got {}",
                self.deceleration_threshold
            )));
        }
        if !(self.bezier_epsilon.is_finite() && self.bezier_epsilon > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "bezier_epsilon must be positive, got {}",
                self.bezier_epsilon
            )));
        }
        if self.default_owner.is_empty() {
            return Err(ConfigError::Invalid("default_owner must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn with_fly_to_velocity(mut self, velocity: f64) -> Self {
        self.fly_to_velocity = velocity;
        self
    }

    pub fn with_fly_to_duration_range(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.fly_to_min_duration_ms = min_ms;
        self.fly_to_max_duration_ms = max_ms;
        self
    }

    pub fn with_deceleration_threshold(mut self, threshold: f64) -> Self {
        self.deceleration_threshold = threshold;
        self
    }

    pub fn with_default_owner(mut self, owner: impl Into<String>) -> Self {
        self.default_owner = owner.into();
        self
    }

    pub fn fly_to_min_duration(&self) -> Duration {
        Duration::from_millis(self.fly_to_min_duration_ms)
    }

    pub fn fly_to_max_duration(&self) -> Duration {
        Duration::from_millis(self.fly_to_max_duration_ms)
    }

    pub fn default_owner(&self) -> AnimationOwner {
        AnimationOwner::new(self.default_owner.clone())
    }
}

//! Runtime configuration for the track store, its sweeps and the update loop.

use crate::error::TrackingError;
use crate::geo::ObserverPose;
use crate::mapper::VisualizationConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for the TrackStore, SmoothingScheduler, StaleReaper and
/// TrackerRuntime.
///
/// The three time/distance gates are independent:
/// `update_rate_limit_secs` governs how often a position change is accepted,
/// `min_movement` how large it must be, and `stale_threshold_secs` how long a
/// track may go without any report at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Geometry of the visualization volume
    pub visualization: VisualizationConfig,

    /// Seconds without any report before a track is reaped (default: 120)
    pub stale_threshold_secs: f64,

    /// Minimum seconds between accepted position updates (default: 0.1)
    pub update_rate_limit_secs: f64,

    /// Minimum target displacement in visualization units (default: 0.001)
    pub min_movement: f64,

    /// Smoothing gain per second; lerp factor is `dt * speed` (default: 5.0)
    pub smoothing_speed: f64,

    /// Distance below which smoothing snaps to the target (default: 0.001)
    pub smoothing_epsilon: f64,

    /// Minimum elapsed seconds before a velocity sample is taken (default: 0.1)
    pub velocity_sample_interval_secs: f64,

    /// Update loop rate in Hz (default: 30)
    pub tick_rate_hz: u32,

    /// Delay before a failed feed reconnects (default: 5 s)
    pub reconnect_delay_secs: f64,

    /// Fixed observer used when no live pose is available (default: none)
    pub test_observer: Option<ObserverPose>,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            visualization: VisualizationConfig::default(),
            stale_threshold_secs: 120.0,
            update_rate_limit_secs: 0.1,
            min_movement: 0.001,
            smoothing_speed: 5.0,
            smoothing_epsilon: 0.001,
            velocity_sample_interval_secs: 0.1,
            tick_rate_hz: 30,
            reconnect_delay_secs: 5.0,
            test_observer: None,
        }
    }
}

impl TrackingConfig {
    /// Parse a JSON document; missing fields fall back to defaults.
    pub fn from_json_str(json: &str) -> Result<Self, TrackingError> {
        let config: TrackingConfig = serde_json::from_str(json)
            .map_err(|e| TrackingError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, TrackingError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Reject values that would make projection or the sweeps meaningless.
    pub fn validate(&self) -> Result<(), TrackingError> {
        let vis = &self.visualization;
        if !(vis.range_km > 0.0) {
            return Err(invalid("visualization.range_km must be positive"));
        }
        if !(vis.display_radius > 0.0) {
            return Err(invalid("visualization.display_radius must be positive"));
        }
        if !vis.altitude_scale.is_finite() || !vis.base_height.is_finite() {
            return Err(invalid("visualization altitude parameters must be finite"));
        }

        let non_negative = [
            ("min_movement", self.min_movement),
            ("smoothing_speed", self.smoothing_speed),
            ("smoothing_epsilon", self.smoothing_epsilon),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(invalid(format!("{name} must be a finite non-negative number")));
            }
        }

        let durations = [
            ("stale_threshold_secs", self.stale_threshold_secs),
            ("update_rate_limit_secs", self.update_rate_limit_secs),
            ("velocity_sample_interval_secs", self.velocity_sample_interval_secs),
            ("reconnect_delay_secs", self.reconnect_delay_secs),
        ];
        for (name, value) in durations {
            if Duration::try_from_secs_f64(value).is_err() {
                return Err(invalid(format!(
                    "{name} must be a non-negative number of seconds within Duration range"
                )));
            }
        }

        if self.tick_rate_hz == 0 {
            return Err(invalid("tick_rate_hz must be at least 1"));
        }

        if let Some(pose) = &self.test_observer {
            if !pose.is_valid() {
                return Err(invalid("test_observer coordinates out of range"));
            }
        }

        Ok(())
    }

    pub fn stale_threshold(&self) -> Duration {
        saturating_secs(self.stale_threshold_secs)
    }

    pub fn update_rate_limit(&self) -> Duration {
        saturating_secs(self.update_rate_limit_secs)
    }

    pub fn velocity_sample_interval(&self) -> Duration {
        saturating_secs(self.velocity_sample_interval_secs)
    }

    pub fn tick_interval(&self) -> Duration {
        saturating_secs(1.0 / self.tick_rate_hz.max(1) as f64)
    }

    pub fn reconnect_delay(&self) -> Duration {
        saturating_secs(self.reconnect_delay_secs)
    }
}

/// Seconds to `Duration`, clamped to `[0, Duration::MAX]`; NaN reads as zero.
fn saturating_secs(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX)
}

fn invalid(msg: impl Into<String>) -> TrackingError {
    TrackingError::InvalidConfig(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = TrackingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.stale_threshold(), Duration::from_secs(120));
        assert_eq!(config.update_rate_limit(), Duration::from_millis(100));
        assert_eq!(config.visualization.ring_count, 4);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = TrackingConfig::from_json_str(
            r#"{ "stale_threshold_secs": 30, "visualization": { "range_km": 50 } }"#,
        )
        .unwrap();

        assert_eq!(config.stale_threshold_secs, 30.0);
        assert_eq!(config.visualization.range_km, 50.0);
        assert_eq!(config.visualization.display_radius, 0.25);
        assert_eq!(config.tick_rate_hz, 30);
        assert!(config.test_observer.is_none());
    }

    #[test]
    fn test_test_observer_from_json() {
        let config = TrackingConfig::from_json_str(
            r#"{ "test_observer": { "latitude": 52.2387, "longitude": 6.8564, "altitude_m": 50.0 } }"#,
        )
        .unwrap();

        assert_eq!(config.test_observer, Some(ObserverPose::new(52.2387, 6.8564, 50.0)));
    }

    #[test]
    fn test_rejects_zero_range() {
        let mut config = TrackingConfig::default();
        config.visualization.range_km = 0.0;
        assert!(matches!(config.validate(), Err(TrackingError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_negative_threshold() {
        let config = TrackingConfig {
            min_movement: -0.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_tick_rate() {
        let result = TrackingConfig::from_json_str(r#"{ "tick_rate_hz": 0 }"#);
        assert!(matches!(result, Err(TrackingError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(TrackingConfig::from_json_str("{ not json").is_err());
    }

    #[test]
    fn test_rejects_threshold_beyond_duration_range() {
        let result = TrackingConfig::from_json_str(r#"{ "stale_threshold_secs": 1e30 }"#);
        assert!(matches!(result, Err(TrackingError::InvalidConfig(_))));

        let config = TrackingConfig {
            reconnect_delay_secs: f64::MAX,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duration_accessors_saturate() {
        let config = TrackingConfig {
            stale_threshold_secs: 1e30,
            update_rate_limit_secs: f64::NAN,
            reconnect_delay_secs: -3.0,
            ..Default::default()
        };
        assert_eq!(config.stale_threshold(), Duration::MAX);
        assert_eq!(config.update_rate_limit(), Duration::ZERO);
        assert_eq!(config.reconnect_delay(), Duration::ZERO);
    }

    #[test]
    fn test_tick_interval() {
        let config = TrackingConfig {
            tick_rate_hz: 20,
            ..Default::default()
        };
        assert_eq!(config.tick_interval(), Duration::from_millis(50));
    }
}

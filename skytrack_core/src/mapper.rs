//! Scaled position mapping from real-world meters into the visualization volume.
//!
//! The volume is a disc of `display_radius` units standing for `range_km` of
//! real-world range, with altitude scaled separately so that cruise-level
//! traffic stays inside a squat cylinder. Output axes: x = east, y = up,
//! z = north.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Geometry of the bounded visualization volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationConfig {
    /// Visualization-space radius corresponding to `range_km` (default: 0.25)
    pub display_radius: f64,

    /// Real-world radius in kilometers mapped onto `display_radius` (default: 100)
    pub range_km: f64,

    /// Visualization units per meter of altitude (default: 0.00007)
    pub altitude_scale: f64,

    /// Vertical offset of the zero-altitude plane (default: 0.0)
    pub base_height: f64,

    /// Number of cosmetic range rings drawn by the renderer (default: 4)
    pub ring_count: u32,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            display_radius: 0.25,
            range_km: 100.0,
            altitude_scale: 0.00007,
            base_height: 0.0,
            ring_count: 4,
        }
    }
}

impl VisualizationConfig {
    /// Visualization units per real-world meter on the horizontal plane.
    #[inline]
    pub fn scale_factor(&self) -> f64 {
        self.display_radius / (self.range_km * 1000.0)
    }

    /// Radii of the evenly spaced range rings, innermost first.
    pub fn ring_radii(&self) -> Vec<f64> {
        let n = self.ring_count;
        (1..=n)
            .map(|i| self.display_radius * i as f64 / n as f64)
            .collect()
    }

    /// Real-world range in kilometers represented by each ring.
    pub fn ring_ranges_km(&self) -> Vec<f64> {
        let n = self.ring_count;
        (1..=n).map(|i| self.range_km * i as f64 / n as f64).collect()
    }
}

/// Map an east/up/north offset in meters into visualization space.
///
/// No clamping: targets beyond `range_km` land outside the nominal disc
/// instead of disappearing.
pub fn map_to_visualization_space(
    east_m: f64,
    up_m: f64,
    north_m: f64,
    config: &VisualizationConfig,
) -> Vector3<f64> {
    let scale = config.scale_factor();
    Vector3::new(
        east_m * scale,
        config.base_height + up_m * config.altitude_scale,
        north_m * scale,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_reference_scenario() {
        let config = VisualizationConfig {
            base_height: 1.2,
            ..Default::default()
        };
        let north = 0.07 * 111_133.0;
        let up = 28_000.0 * 0.3048 - 50.0;

        let local = map_to_visualization_space(0.0, up, north, &config);

        assert_relative_eq!(local.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(local.z, 0.019_448, epsilon = 1e-5);
        assert_relative_eq!(local.y, 1.2 + 0.593_9, epsilon = 1e-3);
    }

    #[test]
    fn test_range_edge_maps_to_radius() {
        let config = VisualizationConfig::default();
        let local = map_to_visualization_space(100_000.0, 0.0, 0.0, &config);
        assert_relative_eq!(local.x, config.display_radius, epsilon = 1e-12);
    }

    #[test]
    fn test_no_clamping_beyond_range() {
        let config = VisualizationConfig::default();
        let local = map_to_visualization_space(0.0, 0.0, -300_000.0, &config);
        assert_relative_eq!(local.z, -0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_ring_radii() {
        let config = VisualizationConfig::default();
        let radii = config.ring_radii();
        assert_eq!(radii.len(), 4);
        assert_relative_eq!(radii[0], 0.0625, epsilon = 1e-12);
        assert_relative_eq!(radii[3], 0.25, epsilon = 1e-12);
        assert_relative_eq!(config.ring_ranges_km()[1], 50.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_rings() {
        let config = VisualizationConfig {
            ring_count: 0,
            ..Default::default()
        };
        assert!(config.ring_radii().is_empty());
    }
}

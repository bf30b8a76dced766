//! Per-tick smoothing of displayed positions toward their targets.
//!
//! Plain clamped linear interpolation toward a moving target: between
//! reports the displayed position glides toward the last known target and
//! stops there. `estimated_velocity` is never used to run ahead of it.

use crate::config::TrackingConfig;
use crate::track_store::TrackStore;

/// Advances every track's `current_position` toward its `target_position`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothingScheduler {
    /// Gain per second; the lerp factor for a tick is `dt * speed`, clamped to [0, 1]
    pub speed: f64,

    /// Remaining distance (visualization units) treated as "arrived"
    pub epsilon: f64,
}

impl SmoothingScheduler {
    pub fn new(speed: f64, epsilon: f64) -> Self {
        Self { speed, epsilon }
    }

    pub fn from_config(config: &TrackingConfig) -> Self {
        Self::new(config.smoothing_speed, config.smoothing_epsilon)
    }

    /// Lerp factor for a tick of `dt_secs`; NaN or negative ticks do nothing.
    #[inline]
    pub fn blend_factor(&self, dt_secs: f64) -> f64 {
        let t = dt_secs * self.speed;
        if t.is_nan() {
            0.0
        } else {
            t.clamp(0.0, 1.0)
        }
    }

    /// Run one smoothing pass; returns how many tracks moved.
    pub fn tick(&self, store: &mut TrackStore, dt_secs: f64) -> usize {
        let t = self.blend_factor(dt_secs);
        let mut moved = 0;

        for track in store.tracks_mut() {
            // A corrupted display position cannot converge; restart it at the target.
            if !track.current_position.iter().all(|c| c.is_finite()) {
                track.current_position = track.target_position;
                moved += 1;
                continue;
            }
            let remaining = track.target_position - track.current_position;
            let distance = remaining.norm();
            if distance <= self.epsilon {
                if distance > 0.0 {
                    track.current_position = track.target_position;
                    moved += 1;
                }
                continue;
            }
            if t == 0.0 {
                continue;
            }

            track.current_position += remaining * t;
            if (track.target_position - track.current_position).norm() <= self.epsilon {
                track.current_position = track.target_position;
            }
            moved += 1;
        }

        moved
    }
}

impl Default for SmoothingScheduler {
    fn default() -> Self {
        Self::from_config(&TrackingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{ObserverPose, METERS_PER_DEG_LAT};
    use crate::report::Report;
    use approx::assert_relative_eq;
    use std::time::Duration;

    fn observer() -> ObserverPose {
        ObserverPose::new(52.2387, 6.8564, 50.0)
    }

    /// Store with one track whose target sits 0.05 units north of its current position.
    fn store_with_moving_track() -> TrackStore {
        let mut store = TrackStore::with_defaults();
        store.apply_report(
            &Report::new("a").with_position(52.3, 6.8564, 10_000.0),
            Some(&observer()),
            Duration::ZERO,
        );
        let lat = 52.3 + 20_000.0 / METERS_PER_DEG_LAT;
        store.apply_report(
            &Report::new("a").with_position(lat, 6.8564, 10_000.0),
            Some(&observer()),
            Duration::from_secs(1),
        );
        store
    }

    #[test]
    fn test_blend_factor_clamped() {
        let smoother = SmoothingScheduler::new(5.0, 0.001);
        assert_relative_eq!(smoother.blend_factor(0.1), 0.5);
        assert_relative_eq!(smoother.blend_factor(1.0), 1.0);
        assert_relative_eq!(smoother.blend_factor(-1.0), 0.0);
        assert_relative_eq!(smoother.blend_factor(f64::NAN), 0.0);
    }

    #[test]
    fn test_tick_moves_part_way() {
        let mut store = store_with_moving_track();
        let before = store.get("a").unwrap().smoothing_error();
        assert_relative_eq!(before, 0.05, epsilon = 1e-9);

        let moved = SmoothingScheduler::new(5.0, 0.001).tick(&mut store, 0.1);

        assert_eq!(moved, 1);
        assert_relative_eq!(store.get("a").unwrap().smoothing_error(), 0.025, epsilon = 1e-9);
    }

    #[test]
    fn test_large_dt_lands_on_target() {
        let mut store = store_with_moving_track();
        SmoothingScheduler::new(5.0, 0.001).tick(&mut store, 10.0);

        let track = store.get("a").unwrap();
        assert_eq!(track.current_position, track.target_position);
    }

    #[test]
    fn test_snaps_inside_epsilon() {
        let mut store = store_with_moving_track();
        let smoother = SmoothingScheduler::new(5.0, 0.001);
        for _ in 0..20 {
            smoother.tick(&mut store, 0.1);
        }

        let track = store.get("a").unwrap();
        assert_eq!(track.current_position, track.target_position);
        assert_eq!(smoother.tick(&mut store, 0.1), 0);
    }

    #[test]
    fn test_new_track_needs_no_smoothing() {
        let mut store = TrackStore::with_defaults();
        store.apply_report(
            &Report::new("a").with_position(52.3, 6.9, 10_000.0),
            Some(&observer()),
            Duration::ZERO,
        );

        assert_eq!(SmoothingScheduler::default().tick(&mut store, 0.033), 0);
    }

    #[test]
    fn test_zero_dt_is_noop() {
        let mut store = store_with_moving_track();
        let before = store.get("a").unwrap().current_position;

        assert_eq!(SmoothingScheduler::default().tick(&mut store, 0.0), 0);
        assert_eq!(store.get("a").unwrap().current_position, before);
    }

    #[test]
    fn test_non_finite_position_snaps_to_target() {
        let mut store = store_with_moving_track();
        for track in store.tracks_mut() {
            track.current_position.x = f64::NAN;
        }

        assert_eq!(SmoothingScheduler::default().tick(&mut store, 0.033), 1);

        let track = store.get("a").unwrap();
        assert_eq!(track.current_position, track.target_position);
        assert_eq!(SmoothingScheduler::default().tick(&mut store, 0.033), 0);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_distance_never_increases(
                dts in proptest::collection::vec(0.0f64..0.5, 1..50),
                speed in 0.1f64..20.0,
                north_m in -50_000.0f64..50_000.0,
            ) {
                let mut store = TrackStore::with_defaults();
                store.apply_report(
                    &Report::new("a").with_position(52.3, 6.8564, 10_000.0),
                    Some(&observer()),
                    Duration::ZERO,
                );
                let lat = 52.3 + north_m / METERS_PER_DEG_LAT;
                store.apply_report(
                    &Report::new("a").with_position(lat, 6.9, 12_000.0),
                    Some(&observer()),
                    Duration::from_secs(1),
                );

                let smoother = SmoothingScheduler::new(speed, 0.001);
                let target = store.get("a").unwrap().target_position;
                let start = store.get("a").unwrap().current_position;
                let mut previous = store.get("a").unwrap().smoothing_error();

                for dt in dts {
                    smoother.tick(&mut store, dt);
                    let track = store.get("a").unwrap();
                    let error = track.smoothing_error();
                    prop_assert!(error <= previous + 1e-12);
                    // Stays on the segment between start and target: no overshoot
                    let along = (track.current_position - start).norm()
                        + (target - track.current_position).norm();
                    prop_assert!((along - (target - start).norm()).abs() < 1e-9);
                    previous = error;
                }
            }
        }
    }
}

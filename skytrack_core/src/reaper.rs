//! Per-tick eviction of tracks that stopped reporting.

use crate::config::TrackingConfig;
use crate::track_store::{RemovalReason, TrackStore};
use std::time::Duration;

/// Removes tracks whose last report of any kind is older than `threshold`.
///
/// This is the only deletion path in normal operation. It is independent
/// of rate limiting and movement filtering: any report, even a partial or
/// throttled one, keeps a track alive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaleReaper {
    threshold: Duration,
}

impl StaleReaper {
    pub fn new(threshold: Duration) -> Self {
        Self { threshold }
    }

    pub fn from_config(config: &TrackingConfig) -> Self {
        Self::new(config.stale_threshold())
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Ids that would be removed at `now`, sorted.
    pub fn stale_ids(&self, store: &TrackStore, now: Duration) -> Vec<String> {
        let mut ids: Vec<String> = store
            .tracks()
            .filter(|track| track.age(now) > self.threshold)
            .map(|track| track.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Remove every stale track, emitting `Removed { reason: Stale }` for each.
    ///
    /// Returns the removed ids in sorted order.
    pub fn reap(&self, store: &mut TrackStore, now: Duration) -> Vec<String> {
        let stale = self.stale_ids(store, now);
        for id in &stale {
            store.remove(id, RemovalReason::Stale);
        }
        stale
    }
}

impl Default for StaleReaper {
    fn default() -> Self {
        Self::from_config(&TrackingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::ObserverPose;
    use crate::report::Report;
    use crate::track_store::TrackEvent;

    fn observer() -> ObserverPose {
        ObserverPose::new(52.2387, 6.8564, 50.0)
    }

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    fn store_with(ids: &[(&str, u64)]) -> TrackStore {
        let mut store = TrackStore::with_defaults();
        for (id, at) in ids {
            store.apply_report(
                &Report::new(*id).with_position(52.3, 6.9, 10_000.0),
                Some(&observer()),
                secs(*at),
            );
        }
        store.drain_events();
        store
    }

    #[test]
    fn test_track_older_than_threshold_removed() {
        let mut store = store_with(&[("old", 0), ("fresh", 100)]);
        let reaper = StaleReaper::new(secs(120));

        let removed = reaper.reap(&mut store, secs(121));

        assert_eq!(removed, vec!["old"]);
        assert!(!store.contains("old"));
        assert!(store.contains("fresh"));

        let events = store.drain_events();
        assert_eq!(
            events,
            vec![TrackEvent::Removed {
                id: "old".to_string(),
                reason: RemovalReason::Stale
            }]
        );
    }

    #[test]
    fn test_track_at_threshold_survives() {
        let mut store = store_with(&[("edge", 0)]);
        let reaper = StaleReaper::new(secs(120));

        assert!(reaper.reap(&mut store, secs(120)).is_empty());
        assert!(store.contains("edge"));
        assert_eq!(reaper.reap(&mut store, secs(120) + Duration::from_millis(1)), vec!["edge"]);
    }

    #[test]
    fn test_partial_reports_keep_track_alive() {
        let mut store = store_with(&[("a", 0)]);
        let reaper = StaleReaper::new(secs(120));

        for t in (30..=300).step_by(30) {
            store.apply_report(&Report::new("a"), Some(&observer()), secs(t));
            assert!(reaper.reap(&mut store, secs(t)).is_empty());
        }
        assert!(store.contains("a"));
    }

    #[test]
    fn test_rate_limited_reports_keep_track_alive() {
        let mut store = store_with(&[("a", 0)]);
        let reaper = StaleReaper::new(secs(120));
        let report = Report::new("a").with_position(52.3, 6.9, 10_000.0);

        store.apply_report(&report, Some(&observer()), secs(119));
        assert!(reaper.reap(&mut store, secs(200)).is_empty());
        assert_eq!(reaper.reap(&mut store, secs(240)), vec!["a"]);
    }

    #[test]
    fn test_stale_ids_does_not_mutate() {
        let store = store_with(&[("b", 0), ("a", 0)]);
        let reaper = StaleReaper::default();

        assert_eq!(reaper.stale_ids(&store, secs(500)), vec!["a", "b"]);
        assert_eq!(store.len(), 2);
    }
}

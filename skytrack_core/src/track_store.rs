//! The "TRACK" Store - authoritative identifier → track mapping
//!
//! Converts raw geodetic reports into bounded, smoothed track state:
//! 1. Identifier validation (reject, no side effects)
//! 2. Liveness refresh (every report, complete or not)
//! 3. Completeness / observer classification
//! 4. Projection (GeoProjector + ScaledPositionMapper)
//! 5. Rate limiting, then movement-threshold filtering
//! 6. Velocity sampling and target update
//!
//! Deletion happens only through the reaper or an explicit clear.

use crate::config::TrackingConfig;
use crate::error::TrackingError;
use crate::geo::{self, ObserverPose};
use crate::mapper::map_to_visualization_space;
use crate::report::Report;
use crate::track::{Track, TrackDetail, TrackSnapshot};
use nalgebra::Vector3;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

// ============================================================================
// OUTCOMES & EVENTS
// ============================================================================

/// Classification of one `apply_report` call.
///
/// None of these are faults; most are the expected steady state of a
/// high-frequency feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UpdateOutcome {
    /// No identifier; nothing touched
    Invalid,

    /// Partial report for an unknown identifier; no track created
    RejectedIncomplete,

    /// Partial report for a known identifier; liveness refreshed only
    KeptIncomplete,

    /// Complete report but no observer pose; nothing projected
    Deferred,

    /// First complete report for an identifier
    Created,

    /// Arrived sooner than the update rate limit after the last position change
    RateLimited,

    /// Projected movement smaller than the minimum movement threshold
    BelowThreshold,

    /// Target position (and possibly velocity) updated
    Updated,
}

impl UpdateOutcome {
    pub const ALL: [UpdateOutcome; 8] = [
        UpdateOutcome::Invalid,
        UpdateOutcome::RejectedIncomplete,
        UpdateOutcome::KeptIncomplete,
        UpdateOutcome::Deferred,
        UpdateOutcome::Created,
        UpdateOutcome::RateLimited,
        UpdateOutcome::BelowThreshold,
        UpdateOutcome::Updated,
    ];

    /// The error a caller should log for this outcome, if any.
    pub fn as_error(&self) -> Option<TrackingError> {
        match self {
            UpdateOutcome::Invalid => Some(TrackingError::InvalidReport),
            UpdateOutcome::Deferred => Some(TrackingError::ObserverUnavailable),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            UpdateOutcome::Invalid => "invalid",
            UpdateOutcome::RejectedIncomplete => "rejected_incomplete",
            UpdateOutcome::KeptIncomplete => "kept_incomplete",
            UpdateOutcome::Deferred => "deferred",
            UpdateOutcome::Created => "created",
            UpdateOutcome::RateLimited => "rate_limited",
            UpdateOutcome::BelowThreshold => "below_threshold",
            UpdateOutcome::Updated => "updated",
        }
    }
}

/// Why a track left the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RemovalReason {
    /// No report for longer than the stale threshold
    Stale,

    /// The whole store was cleared (e.g. observer session reset)
    Cleared,
}

/// Change record for renderer / selection consumers.
///
/// Queued by the store and handed out by [`TrackStore::drain_events`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrackEvent {
    Created { id: String, position: Vector3<f64> },
    Updated { id: String, target: Vector3<f64> },
    Removed { id: String, reason: RemovalReason },
}

impl TrackEvent {
    pub fn id(&self) -> &str {
        match self {
            TrackEvent::Created { id, .. }
            | TrackEvent::Updated { id, .. }
            | TrackEvent::Removed { id, .. } => id,
        }
    }
}

// ============================================================================
// TRACK STORE
// ============================================================================

/// Owns every live [`Track`], one per identifier.
///
/// Not designed for concurrent mutation: all calls come from the single
/// update loop.
pub struct TrackStore {
    /// All live tracks, keyed by identifier
    tracks: HashMap<String, Track>,

    /// Runtime configuration
    config: TrackingConfig,

    /// Change records not yet drained
    events: Vec<TrackEvent>,
}

impl TrackStore {
    /// Create an empty store with the given configuration.
    pub fn new(config: TrackingConfig) -> Self {
        Self {
            tracks: HashMap::new(),
            config,
            events: Vec::new(),
        }
    }

    /// Create an empty store with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(TrackingConfig::default())
    }

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    // ========================================================================
    // INGESTION
    // ========================================================================

    /// Apply one report against the observer pose at instant `now`.
    ///
    /// `observer` is `None` when no live pose is available and no test pose
    /// is configured; complete reports are then `Deferred`, as they are for
    /// a pose that fails [`ObserverPose::is_valid`].
    pub fn apply_report(
        &mut self,
        report: &Report,
        observer: Option<&ObserverPose>,
        now: Duration,
    ) -> UpdateOutcome {
        if !report.has_valid_id() {
            return UpdateOutcome::Invalid;
        }
        let id = report.id.as_str();

        // Liveness is refreshed before anything else so tracks sending
        // partial or throttled data are never reaped for it.
        let exists = match self.tracks.get_mut(id) {
            Some(track) => {
                track.touch(report, now);
                true
            }
            None => false,
        };

        let Some((lat, lon, alt_feet)) = report.coordinates() else {
            return if exists {
                UpdateOutcome::KeptIncomplete
            } else {
                UpdateOutcome::RejectedIncomplete
            };
        };

        let Some(observer) = observer.filter(|pose| pose.is_valid()) else {
            return UpdateOutcome::Deferred;
        };

        let offset = geo::project(observer, lat, lon, alt_feet);
        let [east, north, up] = offset.as_enu();
        let new_target = map_to_visualization_space(east, up, north, &self.config.visualization);

        let Some(track) = self.tracks.get_mut(id) else {
            self.tracks
                .insert(id.to_string(), Track::new(report, offset, new_target, now));
            self.events.push(TrackEvent::Created {
                id: id.to_string(),
                position: new_target,
            });
            return UpdateOutcome::Created;
        };

        let elapsed = now.saturating_sub(track.last_position_update).as_secs_f64();
        if elapsed < self.config.update_rate_limit_secs {
            return UpdateOutcome::RateLimited;
        }

        let delta = new_target - track.target_position;
        if delta.norm() < self.config.min_movement {
            return UpdateOutcome::BelowThreshold;
        }

        if elapsed > self.config.velocity_sample_interval_secs {
            track.estimated_velocity = delta / elapsed;
        }
        track.target_position = new_target;
        track.last_position_update = now;
        track.real_world_distance_m = offset.planar_distance_m;
        track.real_world_offset = offset;
        track.last_full_report = report.clone();

        self.events.push(TrackEvent::Updated {
            id: id.to_string(),
            target: new_target,
        });
        UpdateOutcome::Updated
    }

    // ========================================================================
    // REMOVAL
    // ========================================================================

    /// Remove a single track, emitting a removal event.
    pub(crate) fn remove(&mut self, id: &str, reason: RemovalReason) -> Option<Track> {
        let track = self.tracks.remove(id)?;
        self.events.push(TrackEvent::Removed {
            id: track.id.clone(),
            reason,
        });
        Some(track)
    }

    /// Drop every track at once; returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let mut ids: Vec<String> = self.tracks.keys().cloned().collect();
        ids.sort();
        self.tracks.clear();

        let count = ids.len();
        self.events.extend(ids.into_iter().map(|id| TrackEvent::Removed {
            id,
            reason: RemovalReason::Cleared,
        }));
        count
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    /// Get a track by identifier.
    pub fn get(&self, id: &str) -> Option<&Track> {
        self.tracks.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tracks.contains_key(id)
    }

    /// Full data and last raw payload for the detail panel.
    pub fn detail(&self, id: &str) -> Option<TrackDetail> {
        self.tracks.get(id).map(Track::detail)
    }

    /// Read-only view of every live track, ordered by identifier.
    pub fn snapshot(&self) -> Vec<TrackSnapshot> {
        let mut snapshots: Vec<TrackSnapshot> = self.tracks.values().map(Track::snapshot).collect();
        snapshots.sort_by(|a, b| a.id.cmp(&b.id));
        snapshots
    }

    /// Identifiers of all live tracks, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.tracks.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Get all tracks as an iterator.
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    pub(crate) fn tracks_mut(&mut self) -> impl Iterator<Item = &mut Track> {
        self.tracks.values_mut()
    }

    /// Get the number of live tracks.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Take all change records queued since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<TrackEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }
}

// ============================================================================
// TESTS
// ============================================================================

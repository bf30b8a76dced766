//! Per-identifier track state and the read-only views handed to renderers.

use crate::geo::GeoOffset;
use crate::report::Report;
use nalgebra::Vector3;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Persistent state for one airborne object, keyed by its identifier.
///
/// Owned by [`TrackStore`](crate::track_store::TrackStore); outside the crate
/// it is only ever reachable through shared references.
#[derive(Debug, Clone)]
pub struct Track {
    /// Identifier, immutable for the lifetime of the track
    pub id: String,

    /// Most recent report that carried complete coordinates
    pub last_full_report: Report,

    /// Instant of the most recent report of any completeness
    pub last_update: Duration,

    /// Instant of the most recent accepted position change
    pub last_position_update: Duration,

    /// Planar distance from the observer at the last accepted position
    pub real_world_distance_m: f64,

    /// Real-world offset from the observer at the last accepted position
    pub real_world_offset: GeoOffset,

    /// Smoothed position currently shown (visualization space)
    pub current_position: Vector3<f64>,

    /// Latest projected position (visualization space)
    pub target_position: Vector3<f64>,

    /// Finite-difference rate of change of `target_position` (units/s).
    /// Exposed for consumers; never used to extrapolate motion.
    pub estimated_velocity: Vector3<f64>,

    /// Raw payload of the last report that touched this track
    pub last_raw: Option<Arc<Value>>,

    /// Number of reports applied, of any completeness
    pub report_count: u64,
}

impl Track {
    /// Create a track already sitting at its first target (no smoothing lag).
    pub(crate) fn new(
        report: &Report,
        offset: GeoOffset,
        position: Vector3<f64>,
        now: Duration,
    ) -> Self {
        Self {
            id: report.id.clone(),
            last_full_report: report.clone(),
            last_update: now,
            last_position_update: now,
            real_world_distance_m: offset.planar_distance_m,
            real_world_offset: offset,
            current_position: position,
            target_position: position,
            estimated_velocity: Vector3::zeros(),
            last_raw: report.raw.clone(),
            report_count: 1,
        }
    }

    /// Refresh liveness; never moves `last_update` backwards.
    pub(crate) fn touch(&mut self, report: &Report, now: Duration) {
        self.last_update = self.last_update.max(now);
        self.report_count += 1;
        if report.raw.is_some() {
            self.last_raw = report.raw.clone();
        }
    }

    /// Time since any report touched this track.
    #[inline]
    pub fn age(&self, now: Duration) -> Duration {
        now.saturating_sub(self.last_update)
    }

    /// Remaining distance between the shown and the target position.
    #[inline]
    pub fn smoothing_error(&self) -> f64 {
        (self.target_position - self.current_position).norm()
    }

    pub fn heading(&self) -> Option<f64> {
        self.last_full_report.normalized_heading()
    }

    pub fn label(&self) -> Option<&str> {
        self.last_full_report.label.as_deref()
    }

    pub fn snapshot(&self) -> TrackSnapshot {
        let report = &self.last_full_report;
        TrackSnapshot {
            id: self.id.clone(),
            position: self.current_position,
            heading: self.heading(),
            label: report.label.clone(),
            speed: report.speed,
            signal: report.signal,
            receiver: report.receiver.clone(),
            real_world_distance_m: self.real_world_distance_m,
            last_update_secs: self.last_update.as_secs_f64(),
            raw: self.last_raw.clone(),
        }
    }

    pub fn detail(&self) -> TrackDetail {
        TrackDetail {
            snapshot: self.snapshot(),
            target_position: self.target_position,
            estimated_velocity: self.estimated_velocity,
            real_world_offset: self.real_world_offset,
            altitude_feet: self.last_full_report.alt_feet,
            latitude: self.last_full_report.lat,
            longitude: self.last_full_report.lon,
            last_position_update_secs: self.last_position_update.as_secs_f64(),
            report_count: self.report_count,
        }
    }
}

/// What a renderer needs to draw one track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackSnapshot {
    pub id: String,
    pub position: Vector3<f64>,
    pub heading: Option<f64>,
    pub label: Option<String>,
    pub speed: Option<f64>,
    pub signal: Option<f64>,
    pub receiver: Option<String>,
    pub real_world_distance_m: f64,
    pub last_update_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<Arc<Value>>,
}

/// Full data for a selected track (detail panel).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackDetail {
    #[serde(flatten)]
    pub snapshot: TrackSnapshot,
    pub target_position: Vector3<f64>,
    pub estimated_velocity: Vector3<f64>,
    pub real_world_offset: GeoOffset,
    pub altitude_feet: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub last_position_update_secs: f64,
    pub report_count: u64,
}

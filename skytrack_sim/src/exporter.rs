//! JSON exporter for offline viewing of a run.
//!
//! Exports periodic frames of ground truth and track snapshots, both in
//! visualization-space coordinates.

use nalgebra::Vector3;
use serde::Serialize;
use skytrack_core::{TrackEvent, TrackSnapshot};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// A single frame of simulation data.
#[derive(Debug, Clone, Serialize)]
pub struct SimFrame {
    /// Simulation time in seconds
    pub time_sec: f64,

    /// Ground truth aircraft positions
    pub ground_truth: Vec<AircraftPosition>,

    /// Displayed tracks
    pub tracks: Vec<TrackSnapshot>,

    /// Track events since the previous frame
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<TrackEvent>,
}

/// Position of an aircraft in visualization space.
#[derive(Debug, Clone, Serialize)]
pub struct AircraftPosition {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl AircraftPosition {
    pub fn new(id: impl Into<String>, pos: Vector3<f64>) -> Self {
        Self {
            id: id.into(),
            x: pos.x,
            y: pos.y,
            z: pos.z,
        }
    }
}

/// Complete simulation export.
#[derive(Debug, Clone, Serialize)]
pub struct SimExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Duration in seconds
    pub duration_sec: f64,

    /// Ring radii for the range overlay
    pub ring_radii: Vec<f64>,

    /// All frames
    pub frames: Vec<SimFrame>,

    /// Final results
    pub passed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl SimExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64, ring_radii: Vec<f64>) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            duration_sec: 0.0,
            ring_radii,
            frames: Vec::new(),
            passed: false,
            failure_reason: None,
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: SimFrame) {
        self.duration_sec = frame.time_sec;
        self.frames.push(frame);
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool, failure_reason: Option<String>) {
        self.passed = passed;
        self.failure_reason = failure_reason;
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

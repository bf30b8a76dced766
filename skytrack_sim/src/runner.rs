//! Scenario runner - drives the tracker runtime with simulated traffic.
//!
//! Every scenario runs the real pipeline: the oracle's reports are encoded
//! as a JSON envelope, pushed through a [`ScriptedTransport`] into the
//! runtime's feed task, and applied on the next tick. After each tick the
//! harness checks the store against what it knows was sent.

use crate::context::SimContext;
use crate::exporter::{AircraftPosition, SimExport, SimFrame};
use crate::network::{ScriptHandle, ScriptedTransport};
use crate::oracle::Oracle;
use crate::scenarios::ScenarioId;

use serde::Serialize;
use skytrack_core::{
    map_to_visualization_space, ObserverPose, RemovalReason, Report, TickSummary, TrackEvent,
    TrackerRuntime, TrackingConfig, TrackingError, UpdateOutcome,
};
use skytrack_env::TrackerContext;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Observer used by every scenario (Enschede, 50 m).
pub const SIM_OBSERVER: ObserverPose = ObserverPose {
    latitude: 52.2387,
    longitude: 6.8564,
    altitude_m: 50.0,
};

/// Aircraft are spawned within this distance of the observer.
const SPAWN_RADIUS_M: f64 = 80_000.0;

/// Export one frame every N ticks.
const EXPORT_INTERVAL: u64 = 10;

/// Upper bound on scheduler yields while waiting for the feed task.
const MAX_FEED_YIELDS: usize = 64;

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Total ticks executed
    pub total_ticks: u64,

    /// Final simulation time in seconds
    pub final_time_secs: f64,

    /// Number of live tracks at end
    pub final_track_count: usize,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Metrics collected during run
    pub metrics: ScenarioMetrics,

    /// Frame export, when requested
    pub export: Option<SimExport>,
}

/// Metrics collected during scenario execution.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScenarioMetrics {
    /// Reports emitted by the oracle
    pub reports_sent: u64,

    /// Transport messages (one envelope per tick with traffic)
    pub messages_sent: u64,

    /// Outcome counts by name
    pub outcomes: BTreeMap<&'static str, u64>,

    /// Tracks removed as stale
    pub reaped: u64,

    /// Tracks removed by a session reset
    pub cleared: u64,

    /// Largest number of simultaneous tracks
    pub max_tracks: usize,

    /// Worst horizontal target error against ground truth (metres)
    pub max_position_error_m: f64,
}

impl ScenarioMetrics {
    fn absorb(&mut self, summary: &TickSummary) {
        for outcome in UpdateOutcome::ALL {
            let count = summary.count(outcome) as u64;
            if count > 0 {
                *self.outcomes.entry(outcome.name()).or_default() += count;
            }
        }
        self.max_tracks = self.max_tracks.max(summary.track_count);
    }

    pub fn outcome(&self, outcome: UpdateOutcome) -> u64 {
        self.outcomes.get(outcome.name()).copied().unwrap_or(0)
    }
}

/// Runs traffic scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    /// Number of simulated aircraft
    num_aircraft: usize,

    /// Maximum duration in seconds
    max_duration_secs: f64,

    /// Tracker configuration shared by all scenarios
    config: TrackingConfig,

    /// Record frames for export
    export: bool,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64, num_aircraft: usize) -> Self {
        Self {
            seed,
            num_aircraft,
            max_duration_secs: 60.0,
            config: TrackingConfig::default(),
            export: false,
        }
    }

    /// Sets the maximum duration.
    pub fn with_duration(mut self, secs: f64) -> Self {
        self.max_duration_secs = secs;
        self
    }

    /// Sets the tracker configuration.
    pub fn with_config(mut self, config: TrackingConfig) -> Self {
        self.config = config;
        self
    }

    /// Records frames into `ScenarioResult::export`.
    pub fn with_export(mut self, export: bool) -> Self {
        self.export = export;
        self
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);

        // Single-threaded so the feed task only runs when the harness yields
        let runtime = match tokio::runtime::Builder::new_current_thread().build() {
            Ok(runtime) => runtime,
            Err(e) => return self.aborted(scenario, format!("Failed to start runtime: {}", e)),
        };

        runtime.block_on(self.run_async(scenario))
    }

    async fn run_async(&self, scenario: ScenarioId) -> ScenarioResult {
        let config = self.config_for(scenario);
        let mut harness = match Harness::new(self.seed, config, self.export_for(scenario)) {
            Ok(harness) => harness,
            Err(e) => return self.aborted(scenario, format!("Invalid configuration: {}", e)),
        };

        match scenario {
            ScenarioId::SteadyTraffic => self.run_steady_traffic(&mut harness).await,
            ScenarioId::PartialBursts => self.run_partial_bursts(&mut harness).await,
            ScenarioId::SilentDropout => self.run_silent_dropout(&mut harness).await,
            ScenarioId::RateFlood => self.run_rate_flood(&mut harness).await,
            ScenarioId::ObserverLoss => self.run_observer_loss(&mut harness).await,
            ScenarioId::SessionReset => self.run_session_reset(&mut harness).await,
        }

        harness.into_result(scenario, self.seed)
    }

    fn config_for(&self, scenario: ScenarioId) -> TrackingConfig {
        let mut config = self.config.clone();
        if scenario == ScenarioId::SilentDropout {
            // Short enough that silent aircraft are reaped within the run
            config.stale_threshold_secs = (self.max_duration_secs / 4.0).max(3.0);
        }
        config
    }

    fn export_for(&self, scenario: ScenarioId) -> Option<SimExport> {
        self.export.then(|| {
            SimExport::new(
                scenario.name(),
                self.seed,
                self.config.visualization.ring_radii(),
            )
        })
    }

    fn target_ticks(&self, harness: &Harness) -> u64 {
        (self.max_duration_secs / harness.dt.as_secs_f64()) as u64
    }

    fn aborted(&self, scenario: ScenarioId, reason: String) -> ScenarioResult {
        warn!("{}", reason);
        ScenarioResult {
            scenario,
            seed: self.seed,
            passed: false,
            total_ticks: 0,
            final_time_secs: 0.0,
            final_track_count: 0,
            failure_reason: Some(reason),
            metrics: ScenarioMetrics::default(),
            export: None,
        }
    }

    /// SIM-001: SteadyTraffic - well-behaved 1 Hz traffic.
    ///
    /// **Assertion**: every aircraft that sent a complete report has exactly
    /// one track, nothing is reaped, and every target stays within the
    /// movement threshold plus noise and report lag of ground truth.
    async fn run_steady_traffic(&self, h: &mut Harness) {
        h.oracle.spawn_random(self.num_aircraft, SPAWN_RADIUS_M);

        for _ in 0..self.target_ticks(h) {
            h.step().await;
        }

        h.expect_tracks_match_completed();
        let reaped = h.metrics.reaped;
        h.expect(reaped == 0, || format!("{} tracks reaped in steady traffic", reaped));

        let error = h.max_position_error();
        let bound = h.position_error_bound();
        h.metrics.max_position_error_m = error;
        h.expect(error <= bound, || {
            format!("Target error {:.1}m exceeds bound {:.1}m", error, bound)
        });
    }

    /// SIM-002: PartialBursts - 40% of reports without coordinates.
    ///
    /// **Assertion**: no track is created from a partial report and partial
    /// reports keep existing tracks alive.
    async fn run_partial_bursts(&self, h: &mut Harness) {
        h.oracle.set_partial_probability(0.4);
        h.oracle.spawn_random(self.num_aircraft, SPAWN_RADIUS_M);

        for _ in 0..self.target_ticks(h) {
            h.step().await;
        }

        h.expect_tracks_match_completed();
        let created = h.metrics.outcome(UpdateOutcome::Created);
        let with_fix = h.completed.len() as u64;
        h.expect(created == with_fix, || {
            format!("{} tracks created for {} aircraft with fixes", created, with_fix)
        });
        if h.metrics.reports_sent >= 20 {
            let kept = h.metrics.outcome(UpdateOutcome::KeptIncomplete)
                + h.metrics.outcome(UpdateOutcome::RejectedIncomplete);
            h.expect(kept > 0, || "No partial report reached the store".to_string());
        }
    }

    /// SIM-003: SilentDropout - every other aircraft stops talking.
    ///
    /// **Assertion**: silent tracks disappear on the first tick after the
    /// stale threshold, talking tracks are never reaped.
    async fn run_silent_dropout(&self, h: &mut Harness) {
        let ids = h.oracle.spawn_random(self.num_aircraft, SPAWN_RADIUS_M);
        let silence_from = self.max_duration_secs * 0.25;
        let silenced: Vec<String> = ids.iter().step_by(2).cloned().collect();
        for id in &silenced {
            h.oracle.silence(id, silence_from, f64::INFINITY);
        }

        for _ in 0..self.target_ticks(h) {
            h.step().await;
        }

        let threshold = h.runtime.config().stale_threshold_secs;
        let now = h.context.now();
        for id in &ids {
            let Some(heard) = h.last_heard.get(id) else {
                continue;
            };
            let silent_for = now.saturating_sub(*heard).as_secs_f64();
            let present = h.runtime.store().contains(id);
            let is_silenced = silenced.contains(id);
            if is_silenced && silent_for > threshold {
                h.expect(!present, || format!("Silent aircraft {} still tracked", id));
            }
            if !is_silenced && h.completed.contains(id) {
                h.expect(present, || format!("Talking aircraft {} lost its track", id));
            }
        }

        debug!(reaped = h.metrics.reaped, threshold, "Dropout finished");
    }

    /// SIM-004: RateFlood - every aircraft reports on every tick.
    ///
    /// **Assertion**: target updates for one aircraft are never closer
    /// together than the update rate limit.
    async fn run_rate_flood(&self, h: &mut Harness) {
        h.oracle.set_report_interval(0.0);
        h.oracle.spawn_random(self.num_aircraft, SPAWN_RADIUS_M);
        h.track_update_spacing = true;

        for _ in 0..self.target_ticks(h) {
            h.step().await;
        }

        h.expect_tracks_match_completed();
        let rate_limit = h.runtime.config().update_rate_limit_secs;
        if rate_limit > h.dt.as_secs_f64() && h.total_ticks > 4 && self.num_aircraft > 0 {
            let limited = h.metrics.outcome(UpdateOutcome::RateLimited);
            h.expect(limited > 0, || "Flooded feed was never rate limited".to_string());
        }
    }

    /// SIM-005: ObserverLoss - observer pose missing from 30% to 60%.
    ///
    /// **Assertion**: nothing is created or moved without a pose, deferred
    /// reports keep tracks alive, and tracking resumes once the pose is back.
    async fn run_observer_loss(&self, h: &mut Harness) {
        h.oracle.spawn_random(self.num_aircraft, SPAWN_RADIUS_M);

        let ticks = self.target_ticks(h);
        let lost_at = ticks * 3 / 10;
        let restored_at = ticks * 6 / 10;

        for tick in 0..ticks {
            if tick == lost_at {
                info!("Observer pose lost");
                h.runtime.clear_observer();
            }
            if tick == restored_at {
                info!("Observer pose restored");
                h.runtime.set_observer(h.observer);
            }

            let summary = h.step().await;

            if (lost_at..restored_at).contains(&tick) {
                let moved = summary.count(UpdateOutcome::Created) + summary.count(UpdateOutcome::Updated);
                h.expect(moved == 0, || {
                    format!("{} tracks created or moved without an observer", moved)
                });
            }
        }

        h.expect_tracks_match_completed();
        if restored_at > lost_at + h.ticks_per_report() {
            let deferred = h.metrics.outcome(UpdateOutcome::Deferred);
            h.expect(deferred > 0, || "No report was deferred".to_string());
        }
    }

    /// SIM-006: SessionReset - store cleared halfway through.
    ///
    /// **Assertion**: the reset removes every track at once with a
    /// `Cleared` event each, and tracks are rebuilt from fresh reports only.
    async fn run_session_reset(&self, h: &mut Harness) {
        h.oracle.spawn_random(self.num_aircraft, SPAWN_RADIUS_M);

        let ticks = self.target_ticks(h);
        for tick in 0..ticks {
            if tick == ticks / 2 {
                h.reset_session();
            }
            h.step().await;
        }

        h.expect_tracks_match_completed();
    }
}

// ============================================================================
// HARNESS
// ============================================================================

/// Runtime, oracle and feed for one scenario run, plus the bookkeeping the
/// invariant checks need.
struct Harness {
    context: Arc<SimContext>,
    runtime: TrackerRuntime<SimContext>,
    oracle: Oracle,
    feed: ScriptHandle,
    observer: ObserverPose,

    /// Tick period
    dt: Duration,
    total_ticks: u64,

    /// Last time each aircraft was heard (any report)
    last_heard: HashMap<String, Duration>,

    /// Aircraft that sent a complete report while a pose was available
    /// (since the last reset)
    completed: HashSet<String>,

    /// Check spacing between target updates per aircraft
    track_update_spacing: bool,
    last_target_update: HashMap<String, Duration>,

    metrics: ScenarioMetrics,
    export: Option<SimExport>,
    unexported_events: Vec<TrackEvent>,
    failure: Option<String>,
}

/// Wire envelope for one batch of reports.
#[derive(Serialize)]
struct Envelope<'a> {
    aircraft: &'a [Report],
}

impl Harness {
    fn new(
        seed: u64,
        config: TrackingConfig,
        export: Option<SimExport>,
    ) -> Result<Self, TrackingError> {
        let context = SimContext::shared(seed);
        let mut runtime = TrackerRuntime::new(Arc::clone(&context), config)?;
        runtime.set_observer(SIM_OBSERVER);

        let (transport, feed) = ScriptedTransport::new("sim-feed");
        runtime.spawn_feed(Arc::new(transport));

        // Physics seed kept apart from the context seed
        let physics_seed = seed.wrapping_mul(0x9e3779b97f4a7c15);
        let dt = runtime.config().tick_interval();

        Ok(Self {
            context,
            runtime,
            oracle: Oracle::new(physics_seed, SIM_OBSERVER),
            feed,
            observer: SIM_OBSERVER,
            dt,
            total_ticks: 0,
            last_heard: HashMap::new(),
            completed: HashSet::new(),
            track_update_spacing: false,
            last_target_update: HashMap::new(),
            metrics: ScenarioMetrics::default(),
            export,
            unexported_events: Vec::new(),
            failure: None,
        })
    }

    /// Advance physics and the clock by one tick, deliver due reports
    /// through the feed, tick the runtime and check invariants.
    async fn step(&mut self) -> TickSummary {
        self.oracle.step(self.dt.as_secs_f64());
        self.context.advance_time(self.dt);
        let now = self.context.now();

        let reports = self.oracle.generate_reports();
        if !reports.is_empty() {
            self.send(&reports, now).await;
        }

        let summary = self.runtime.tick();
        self.total_ticks += 1;
        self.metrics.absorb(&summary);

        let events = self.runtime.drain_events();
        self.check_events(&events, now);
        self.check_liveness(now);
        self.capture_frame(events);

        if self.total_ticks % u64::from(self.runtime.config().tick_rate_hz.max(1)) == 0 {
            debug!(
                "  t={:.1}s | aircraft={} | tracks={} | reports={}",
                now.as_secs_f64(),
                self.oracle.active_aircraft().len(),
                summary.track_count,
                self.metrics.reports_sent
            );
        }

        summary
    }

    async fn send(&mut self, reports: &[Report], now: Duration) {
        let observed = self.runtime.observer().is_some();
        for report in reports {
            self.last_heard.insert(report.id.clone(), now);
            if observed && report.is_complete() {
                self.completed.insert(report.id.clone());
            }
        }

        let message = match serde_json::to_string(&Envelope { aircraft: reports }) {
            Ok(message) => message,
            Err(e) => {
                self.fail(format!("Failed to encode reports: {}", e));
                return;
            }
        };
        self.metrics.reports_sent += reports.len() as u64;
        self.metrics.messages_sent += 1;

        if !self.feed.send_message(message) {
            self.fail("Feed transport closed".to_string());
            return;
        }

        // Let the feed task receive, decode and hand off before the tick
        for _ in 0..MAX_FEED_YIELDS {
            if self.feed.pending() == 0 {
                return;
            }
            tokio::task::yield_now().await;
        }
        self.fail("Feed task did not drain the transport".to_string());
    }

    fn reset_session(&mut self) {
        let before = self.runtime.store().len();
        let removed = self.runtime.reset_session();
        self.expect(removed == before, || {
            format!("Reset removed {} of {} tracks", removed, before)
        });
        self.expect(self.runtime.store().is_empty(), || {
            "Tracks survived a session reset".to_string()
        });

        let events = self.runtime.drain_events();
        let cleared = events
            .iter()
            .filter(|e| matches!(e, TrackEvent::Removed { reason: RemovalReason::Cleared, .. }))
            .count();
        self.expect(cleared == before, || {
            format!("{} cleared events for {} tracks", cleared, before)
        });
        self.metrics.cleared += cleared as u64;
        self.unexported_events.extend(events);

        self.completed.clear();
        self.last_target_update.clear();
        self.runtime.set_observer(self.observer);
    }

    // ========================================================================
    // INVARIANTS
    // ========================================================================

    fn check_events(&mut self, events: &[TrackEvent], now: Duration) {
        let threshold = self.runtime.config().stale_threshold();
        let rate_limit = self.runtime.config().update_rate_limit_secs;

        for event in events {
            match event {
                TrackEvent::Removed { id, reason } => {
                    match reason {
                        RemovalReason::Stale => self.metrics.reaped += 1,
                        RemovalReason::Cleared => self.metrics.cleared += 1,
                    }
                    let age = self
                        .last_heard
                        .get(id)
                        .map(|heard| now.saturating_sub(*heard));
                    if *reason == RemovalReason::Stale && age.map_or(false, |age| age <= threshold) {
                        self.fail(format!("{} reaped while fresh", id));
                    }
                    self.last_target_update.remove(id);
                }
                TrackEvent::Created { id, .. } => {
                    self.last_target_update.insert(id.clone(), now);
                }
                TrackEvent::Updated { id, .. } => {
                    if let Some(previous) = self.last_target_update.insert(id.clone(), now) {
                        let spacing = now.saturating_sub(previous).as_secs_f64();
                        if self.track_update_spacing && spacing + 1e-9 < rate_limit {
                            self.fail(format!(
                                "{} updated {:.3}s after its previous update",
                                id, spacing
                            ));
                        }
                    }
                }
            }
        }
    }

    fn check_liveness(&mut self, now: Duration) {
        let threshold = self.runtime.config().stale_threshold();
        let mut violation = None;

        for track in self.runtime.store().tracks() {
            match self.last_heard.get(&track.id) {
                None => violation = Some(format!("Track {} was never reported", track.id)),
                Some(heard) if now.saturating_sub(*heard) > threshold => {
                    violation = Some(format!("Stale track {} survived the reaper", track.id))
                }
                Some(_) => {}
            }
        }

        if let Some(reason) = violation {
            self.fail(reason);
        }
    }

    fn expect_tracks_match_completed(&mut self) {
        let tracked = self.runtime.store().len();
        let unexpected: Vec<String> = self
            .runtime
            .store()
            .ids()
            .into_iter()
            .filter(|id| !self.completed.contains(id))
            .collect();

        self.expect(unexpected.is_empty(), || {
            format!("Tracks without a complete report: {:?}", unexpected)
        });

        let threshold = self.runtime.config().stale_threshold();
        let now = self.context.now();
        let expected = self
            .completed
            .iter()
            .filter(|id| {
                self.last_heard
                    .get(*id)
                    .map_or(false, |heard| now.saturating_sub(*heard) <= threshold)
            })
            .count();
        self.expect(tracked == expected, || {
            format!("{} tracks for {} live aircraft", tracked, expected)
        });
    }

    /// Worst horizontal distance between a track's target and the truth.
    fn max_position_error(&self) -> f64 {
        self.runtime
            .store()
            .tracks()
            .filter_map(|track| {
                let truth = self.oracle.aircraft(&track.id)?.position;
                let offset = &track.real_world_offset;
                Some((offset.east_m - truth.x).hypot(offset.north_m - truth.y))
            })
            .fold(0.0, f64::max)
    }

    /// How far a target may lag: the movement threshold in metres, report
    /// noise, and the distance flown since the last accepted report.
    fn position_error_bound(&self) -> f64 {
        let config = self.runtime.config();
        let threshold_m = config.min_movement / config.visualization.scale_factor();
        let lag_secs = self.oracle.report_interval()
            + self.dt.as_secs_f64()
            + config.update_rate_limit_secs;
        threshold_m + 8.0 * self.oracle.position_noise() + self.oracle.max_speed() * lag_secs
    }

    fn ticks_per_report(&self) -> u64 {
        (self.oracle.report_interval() / self.dt.as_secs_f64()).ceil() as u64 + 1
    }

    fn expect(&mut self, condition: bool, reason: impl FnOnce() -> String) {
        if !condition {
            self.fail(reason());
        }
    }

    fn fail(&mut self, reason: String) {
        if self.failure.is_none() {
            warn!("Invariant violated: {}", reason);
            self.failure = Some(reason);
        }
    }

    // ========================================================================
    // EXPORT
    // ========================================================================

    fn capture_frame(&mut self, events: Vec<TrackEvent>) {
        let Some(export) = self.export.as_mut() else {
            return;
        };
        self.unexported_events.extend(events);
        if self.total_ticks % EXPORT_INTERVAL != 0 {
            return;
        }

        let visualization = &self.runtime.config().visualization;
        let ground_truth = self
            .oracle
            .ground_truth_positions()
            .into_iter()
            .map(|(id, enu)| {
                AircraftPosition::new(
                    id,
                    map_to_visualization_space(enu.x, enu.z, enu.y, visualization),
                )
            })
            .collect();

        export.add_frame(SimFrame {
            time_sec: self.context.now().as_secs_f64(),
            ground_truth,
            tracks: self.runtime.snapshot(),
            events: std::mem::take(&mut self.unexported_events),
        });
    }

    fn into_result(mut self, scenario: ScenarioId, seed: u64) -> ScenarioResult {
        let passed = self.failure.is_none();
        if let Some(export) = self.export.as_mut() {
            export.finalize(passed, self.failure.clone());
        }

        ScenarioResult {
            scenario,
            seed,
            passed,
            total_ticks: self.total_ticks,
            final_time_secs: self.context.now().as_secs_f64(),
            final_track_count: self.runtime.store().len(),
            failure_reason: self.failure,
            metrics: self.metrics,
            export: self.export,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner() -> ScenarioRunner {
        ScenarioRunner::new(42, 8).with_duration(20.0)
    }

    #[test]
    fn test_all_scenarios_pass() {
        let runner = runner();
        for scenario in ScenarioId::all() {
            let result = runner.run(scenario);
            assert!(
                result.passed,
                "{} failed: {:?}",
                scenario,
                result.failure_reason
            );
            assert_eq!(result.total_ticks, 600);
        }
    }

    #[test]
    fn test_steady_traffic_tracks_every_aircraft() {
        let result = runner().run(ScenarioId::SteadyTraffic);

        assert!(result.passed, "{:?}", result.failure_reason);
        assert_eq!(result.final_track_count, 8);
        assert_eq!(result.metrics.outcome(UpdateOutcome::Created), 8);
        assert!(result.metrics.outcome(UpdateOutcome::Updated) > 0);
        assert_eq!(result.metrics.reaped, 0);
    }

    #[test]
    fn test_silent_dropout_reaps_half() {
        let result = runner().run(ScenarioId::SilentDropout);

        assert!(result.passed, "{:?}", result.failure_reason);
        assert_eq!(result.metrics.reaped, 4);
        assert_eq!(result.final_track_count, 4);
    }

    #[test]
    fn test_session_reset_clears_then_rebuilds() {
        let result = runner().run(ScenarioId::SessionReset);

        assert!(result.passed, "{:?}", result.failure_reason);
        assert_eq!(result.metrics.cleared, 8);
        assert_eq!(result.final_track_count, 8);
        assert_eq!(result.metrics.outcome(UpdateOutcome::Created), 16);
    }

    #[test]
    fn test_observer_loss_defers() {
        let result = runner().run(ScenarioId::ObserverLoss);

        assert!(result.passed, "{:?}", result.failure_reason);
        assert!(result.metrics.outcome(UpdateOutcome::Deferred) > 0);
        assert_eq!(result.metrics.reaped, 0);
    }

    #[test]
    fn test_same_seed_same_result() {
        let a = runner().run(ScenarioId::PartialBursts);
        let b = runner().run(ScenarioId::PartialBursts);

        assert_eq!(a.metrics.outcomes, b.metrics.outcomes);
        assert_eq!(a.metrics.reports_sent, b.metrics.reports_sent);
    }

    #[test]
    fn test_export_records_frames() {
        let result = runner().with_export(true).run(ScenarioId::SteadyTraffic);

        let export = result.export.expect("export requested");
        assert_eq!(export.frames.len(), 60);
        assert!(export.passed);
        assert_eq!(export.frames.last().unwrap().tracks.len(), 8);
    }

    #[test]
    fn test_invalid_config_aborts() {
        let config = TrackingConfig {
            tick_rate_hz: 0,
            ..Default::default()
        };
        let result = ScenarioRunner::new(1, 2)
            .with_config(config)
            .run(ScenarioId::SteadyTraffic);

        assert!(!result.passed);
        assert_eq!(result.total_ticks, 0);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(8))]

            #[test]
            fn prop_scenarios_hold_for_any_seed(seed in any::<u64>()) {
                let runner = ScenarioRunner::new(seed, 3).with_duration(5.0);
                for scenario in ScenarioId::all() {
                    let result = runner.run(scenario);
                    prop_assert!(
                        result.passed,
                        "{} seed {}: {:?}",
                        scenario,
                        seed,
                        result.failure_reason
                    );
                }
            }
        }
    }
}

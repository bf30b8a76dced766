//! Tracker Runtime - the single update loop around the track store.
//!
//! This module is the integration layer between the pure track logic
//! (store, smoothing, reaping) and the environment abstraction
//! (`TrackerContext`, `ReportTransport`, `Inbox`).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TrackerRuntime                         │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │              Context: TrackerContext                 │   │
//! │  │  • now()   → arrival and tick instants               │   │
//! │  │  • sleep() → tick rate / reconnect delay             │   │
//! │  │  • spawn() → transport receive tasks                 │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! │   feed task ──► Inbox ──► tick():                           │
//! │        ┌────────────┐ ┌─────────────┐ ┌─────────────┐       │
//! │        │ TrackStore │►│  Smoothing  │►│ StaleReaper │       │
//! │        │ (ingest)   │ │  Scheduler  │ │             │       │
//! │        └────────────┘ └─────────────┘ └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use skytrack_core::{TrackerRuntime, TrackingConfig};
//! use skytrack_env::TokioContext;
//!
//! let mut runtime = TrackerRuntime::new(TokioContext::shared(), TrackingConfig::default())?;
//! runtime.spawn_feed(transport);
//! runtime.set_observer(ObserverPose::new(52.2387, 6.8564, 50.0));
//! runtime.run_until(&stop).await;
//! ```

use crate::config::TrackingConfig;
use crate::error::TrackingError;
use crate::geo::ObserverPose;
use crate::reaper::StaleReaper;
use crate::report::{decode_message, Report};
use crate::smoothing::SmoothingScheduler;
use crate::track::{TrackDetail, TrackSnapshot};
use crate::track_store::{TrackEvent, TrackStore, UpdateOutcome};

use skytrack_env::{EnvError, Inbox, InboxSender, ReportTransport, TrackerContext};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A decoded report stamped with the instant it reached the runtime.
#[derive(Debug, Clone)]
pub struct Arrival {
    pub report: Report,
    pub received_at: Duration,
}

// ============================================================================
// OBSERVER STATE
// ============================================================================

/// Where the observer pose for the next tick comes from.
///
/// The live pose wins; the fixed test pose is used only when explicitly
/// configured. With neither, complete reports are deferred rather than
/// projected against a guessed origin.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObserverState {
    live: Option<ObserverPose>,
    fixed: Option<ObserverPose>,
}

impl ObserverState {
    pub fn new(fixed: Option<ObserverPose>) -> Self {
        Self { live: None, fixed }
    }

    pub fn set_live(&mut self, pose: ObserverPose) {
        self.live = Some(pose);
    }

    pub fn clear_live(&mut self) {
        self.live = None;
    }

    pub fn current(&self) -> Option<&ObserverPose> {
        self.live.as_ref().or(self.fixed.as_ref())
    }
}

// ============================================================================
// TICK SUMMARY
// ============================================================================

/// What one pass of the update loop did.
#[derive(Debug, Clone, Default)]
pub struct TickSummary {
    /// Tick number (1-based)
    pub tick: u64,

    /// Context time of the tick in seconds
    pub now_secs: f64,

    /// Reports drained from the inbox
    pub reports: usize,

    /// Count per outcome for this tick
    pub outcomes: HashMap<UpdateOutcome, usize>,

    /// Tracks whose displayed position moved
    pub smoothed: usize,

    /// Tracks reaped this tick
    pub removed: Vec<String>,

    /// Live tracks after the tick
    pub track_count: usize,
}

impl TickSummary {
    pub fn count(&self, outcome: UpdateOutcome) -> usize {
        self.outcomes.get(&outcome).copied().unwrap_or(0)
    }
}

/// Counters kept by a transport receive task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    pub messages: u64,
    pub reports: u64,
    /// Messages dropped whole: not JSON, or a framing error from the transport
    pub decode_errors: u64,
    /// Elements skipped inside otherwise decodable batches
    pub skipped_reports: u64,
    pub reconnects: u64,
}

// ============================================================================
// RUNTIME
// ============================================================================

/// Owns the store and runs ingestion, smoothing and reaping on one loop.
///
/// Generic over the context so the same loop runs against the system clock
/// or a virtual one.
pub struct TrackerRuntime<Ctx>
where
    Ctx: TrackerContext,
{
    /// Environment context
    pub context: Arc<Ctx>,

    /// Configuration
    config: TrackingConfig,

    /// Track store
    store: TrackStore,

    smoother: SmoothingScheduler,
    reaper: StaleReaper,

    /// Reports handed over by transports, drained once per tick
    inbox: Inbox<Arrival>,

    observer: ObserverState,

    /// Context time of the previous tick
    last_tick: Option<Duration>,

    /// Current tick number
    tick_count: u64,

    /// Outcome counts since start
    totals: HashMap<UpdateOutcome, u64>,
}

impl<Ctx> TrackerRuntime<Ctx>
where
    Ctx: TrackerContext,
{
    /// Creates a runtime after validating the configuration.
    pub fn new(context: Arc<Ctx>, config: TrackingConfig) -> Result<Self, TrackingError> {
        config.validate()?;

        Ok(Self {
            context,
            store: TrackStore::new(config.clone()),
            smoother: SmoothingScheduler::from_config(&config),
            reaper: StaleReaper::from_config(&config),
            inbox: Inbox::new(),
            observer: ObserverState::new(config.test_observer),
            last_tick: None,
            tick_count: 0,
            totals: HashMap::new(),
            config,
        })
    }

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    /// Read access to the store (renderer snapshot, selection lookups).
    pub fn store(&self) -> &TrackStore {
        &self.store
    }

    pub fn snapshot(&self) -> Vec<TrackSnapshot> {
        self.store.snapshot()
    }

    pub fn detail(&self, id: &str) -> Option<TrackDetail> {
        self.store.detail(id)
    }

    /// Change records (created/updated/removed) since the last drain.
    pub fn drain_events(&mut self) -> Vec<TrackEvent> {
        self.store.drain_events()
    }

    /// Returns the current tick count.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Outcome totals since the runtime started.
    pub fn total(&self, outcome: UpdateOutcome) -> u64 {
        self.totals.get(&outcome).copied().unwrap_or(0)
    }

    // ========================================================================
    // OBSERVER
    // ========================================================================

    /// Supply the live observer pose for subsequent ticks.
    ///
    /// An unusable fix (non-finite or out of range) drops the live pose, so
    /// the test pose takes over or complete reports are deferred.
    pub fn set_observer(&mut self, pose: ObserverPose) {
        if pose.is_valid() {
            self.observer.set_live(pose);
        } else {
            warn!(?pose, "Ignoring unusable observer fix");
            self.observer.clear_live();
        }
    }

    /// Forget the live pose (sensor lost); the test pose, if any, takes over.
    pub fn clear_observer(&mut self) {
        self.observer.clear_live();
    }

    pub fn observer(&self) -> Option<&ObserverPose> {
        self.observer.current()
    }

    /// Drop every track, every queued report and the live pose.
    ///
    /// Used when the observer session changes; returns the number of
    /// tracks removed.
    pub fn reset_session(&mut self) -> usize {
        let dropped = self.inbox.discard();
        let removed = self.store.clear();
        self.observer.clear_live();
        info!(removed, dropped, "Session reset");
        removed
    }

    // ========================================================================
    // INGESTION
    // ========================================================================

    /// A sender transports can move to other tasks or threads.
    pub fn inbox_sender(&self) -> InboxSender<Arrival> {
        self.inbox.sender()
    }

    /// Queue a report for the next tick, stamped with the current time.
    pub fn ingest(&self, report: Report) {
        let arrival = Arrival {
            report,
            received_at: self.context.now(),
        };
        if let Err(e) = self.inbox.sender().push(arrival) {
            debug!(error = %e, "Inbox closed, report dropped");
        }
    }

    /// Decode a raw transport message and queue its reports.
    ///
    /// Returns the number of reports queued.
    pub fn ingest_json(&self, message: &str) -> Result<usize, TrackingError> {
        let decoded = decode_message(message).map_err(|e| {
            warn!(error = %e, "Dropping undecodable message");
            e
        })?;
        let count = decoded.reports.len();
        for report in decoded.reports {
            self.ingest(report);
        }
        Ok(count)
    }

    /// Spawn a receive task that feeds `transport` into the inbox.
    pub fn spawn_feed<T: ReportTransport>(&self, transport: Arc<T>) {
        let name = format!("feed:{}", transport.source_name());
        let context = Arc::clone(&self.context);
        let sender = self.inbox.sender();
        let delay = self.config.reconnect_delay();

        self.context.spawn(&name, async move {
            let stats = pump_transport(context, transport, sender, delay).await;
            debug!(?stats, "Feed task finished");
        });
    }

    // ========================================================================
    // UPDATE LOOP
    // ========================================================================

    /// One pass of the update loop: ingest, smooth, reap.
    pub fn tick(&mut self) -> TickSummary {
        let now = self.context.now();
        let dt = self
            .last_tick
            .map(|prev| now.saturating_sub(prev).as_secs_f64())
            .unwrap_or(0.0);
        self.last_tick = Some(now);
        self.tick_count += 1;

        let mut summary = TickSummary {
            tick: self.tick_count,
            now_secs: now.as_secs_f64(),
            ..Default::default()
        };

        let observer = self.observer.current().copied();
        for arrival in self.inbox.drain() {
            let outcome =
                self.store
                    .apply_report(&arrival.report, observer.as_ref(), arrival.received_at);
            if let Some(err) = outcome.as_error() {
                debug!(id = %arrival.report.id, "Report not applied: {}", err);
            }
            *summary.outcomes.entry(outcome).or_default() += 1;
            *self.totals.entry(outcome).or_default() += 1;
            summary.reports += 1;
        }

        summary.smoothed = self.smoother.tick(&mut self.store, dt);
        summary.removed = self.reaper.reap(&mut self.store, now);
        if !summary.removed.is_empty() {
            debug!(removed = ?summary.removed, "Reaped stale tracks");
        }
        summary.track_count = self.store.len();

        summary
    }

    /// Tick at the configured rate until `stop` is set.
    ///
    /// Returns the number of ticks run.
    pub async fn run_until(&mut self, stop: &AtomicBool) -> u64 {
        let interval = self.config.tick_interval();
        let start = self.tick_count;
        info!(tick_rate_hz = self.config.tick_rate_hz, "Update loop started");

        while !stop.load(Ordering::Acquire) {
            self.tick();
            self.context.sleep(interval).await;
        }

        let ran = self.tick_count - start;
        info!(ticks = ran, tracks = self.store.len(), "Update loop stopped");
        ran
    }
}

/// Pull raw messages from `transport`, decode them and hand them to `sender`.
///
/// Recoverable transport errors wait `reconnect_delay` and try again;
/// undecodable messages are logged and skipped. Returns when the transport
/// closes or the inbox is dropped.
pub async fn pump_transport<Ctx, T>(
    context: Arc<Ctx>,
    transport: Arc<T>,
    sender: InboxSender<Arrival>,
    reconnect_delay: Duration,
) -> FeedStats
where
    Ctx: TrackerContext,
    T: ReportTransport,
{
    let mut stats = FeedStats::default();
    info!(source = transport.source_name(), "Feed started");

    loop {
        match transport.recv().await {
            Ok(Some(message)) => {
                stats.messages += 1;
                let decoded = match decode_message(&message) {
                    Ok(decoded) => decoded,
                    Err(e) => {
                        stats.decode_errors += 1;
                        warn!(source = transport.source_name(), error = %e, "Dropping undecodable message");
                        continue;
                    }
                };
                let received_at = context.now();
                stats.skipped_reports += decoded.skipped as u64;
                for report in decoded.reports {
                    if sender.push(Arrival { report, received_at }).is_err() {
                        debug!("Inbox closed, stopping feed");
                        return stats;
                    }
                    stats.reports += 1;
                }
            }
            Ok(None) => {
                info!(source = transport.source_name(), "Feed closed");
                return stats;
            }
            Err(EnvError::DecodeError(reason)) => {
                stats.decode_errors += 1;
                warn!(source = transport.source_name(), %reason, "Dropping unreadable frame");
            }
            Err(e) if e.is_retryable() => {
                stats.reconnects += 1;
                warn!(
                    source = transport.source_name(),
                    error = %e,
                    "Feed error, retrying in {:.1}s",
                    reconnect_delay.as_secs_f64()
                );
                context.sleep(reconnect_delay).await;
            }
            Err(e) => {
                warn!(source = transport.source_name(), error = %e, "Feed stopped");
                return stats;
            }
        }
    }
}

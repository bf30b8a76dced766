//! Core environment context trait for the SkyTrack update loop.

use async_trait::async_trait;
use std::future::Future;
use std::time::{Duration, SystemTime};

/// The central interface for environment interaction.
///
/// This trait abstracts the "real world" so that the track store and its
/// sweeps can run against the system clock in production and against a
/// manually advanced virtual clock in simulation.
///
/// # Implementations
///
/// - **Production**: `TokioContext` - wraps `tokio::time` and `Instant`
/// - **Simulation**: `SimContext` (in `skytrack_sim`) - virtual clock
#[async_trait]
pub trait TrackerContext: Send + Sync + 'static {
    /// Returns the current monotonic time since context creation.
    ///
    /// Every instant stored on a track (`last_update`,
    /// `last_position_update`) is a value returned by this method.
    fn now(&self) -> Duration;

    /// Returns the wall-clock time, for log lines and exports.
    fn system_time(&self) -> SystemTime;

    /// Suspends execution for the given duration.
    ///
    /// In production: wraps `tokio::time::sleep`
    /// In simulation: advances the virtual clock
    async fn sleep(&self, duration: Duration);

    /// Spawns a background task (e.g. a transport receive loop).
    fn spawn<F>(&self, name: &str, future: F)
    where
        F: Future<Output = ()> + Send + 'static;

    /// Returns the context's seed (for logging/debugging).
    ///
    /// In production, returns 0 (not seeded).
    fn seed(&self) -> u64;
}

//! SkyTrack Core - Track Manager & Local Projection Engine
//!
//! Turns a stream of live airborne position reports into a stable set of
//! tracks placed in a scaled local scene around a moving observer:
//! 1. **Projection**: geodetic fixes become metre offsets from the observer
//!    (equirectangular, valid for short ranges) and then scene coordinates
//! 2. **Tracking**: reports are keyed by identifier, rate limited, filtered
//!    for negligible movement and smoothed toward their targets per tick
//! 3. **Lifecycle**: tracks silent past the stale threshold are reaped

pub mod config;
pub mod error;
pub mod geo;
pub mod mapper;
pub mod reaper;
pub mod report;
pub mod runtime;
pub mod smoothing;
pub mod track;
pub mod track_store;

// Re-export key types for convenience
pub use config::TrackingConfig;
pub use error::TrackingError;
pub use geo::{project, GeoOffset, ObserverPose};
pub use mapper::{map_to_visualization_space, VisualizationConfig};
pub use reaper::StaleReaper;
pub use report::{decode_message, DecodedMessage, Report};
pub use runtime::{pump_transport, Arrival, FeedStats, ObserverState, TickSummary, TrackerRuntime};
pub use smoothing::SmoothingScheduler;
pub use track::{Track, TrackDetail, TrackSnapshot};
pub use track_store::{RemovalReason, TrackEvent, TrackStore, UpdateOutcome};

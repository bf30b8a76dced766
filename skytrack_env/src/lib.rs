//! SkyTrack Environment Abstraction Layer
//!
//! This crate provides the "Sans-IO" abstraction allowing the SkyTrack
//! update loop to run both in **Production** (tokio) and in the
//! deterministic **Simulation** harness.
//!
//! # Core Concept: One Update Loop
//!
//! The track store is not designed for concurrent mutation. Everything that
//! could touch it from the outside is intercepted here:
//! - Time (`now()`, `sleep()`)
//! - Report delivery (`ReportTransport::recv()`)
//! - Hand-off between the receive task and the loop (`Inbox`)
//!
//! # Example
//!
//! ```ignore
//! use skytrack_env::{Inbox, TrackerContext};
//!
//! async fn update_loop<Ctx: TrackerContext>(ctx: &Ctx, inbox: &mut Inbox<String>) {
//!     loop {
//!         for message in inbox.drain() {
//!             handle(message);
//!         }
//!         ctx.sleep(Duration::from_millis(33)).await;
//!     }
//! }
//! ```

mod context;
mod error;
mod inbox;
mod network;
mod tokio_impl;

pub use context::TrackerContext;
pub use error::EnvError;
pub use inbox::{Inbox, InboxSender};
pub use network::ReportTransport;
pub use tokio_impl::TokioContext;

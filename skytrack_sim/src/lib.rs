//! SkyTrack Deterministic Simulation Harness
//!
//! Runs the real tracker runtime against simulated traffic where every
//! source of non-determinism is controlled:
//! - **Time**: virtual clock advanced one tick at a time
//! - **Transport**: scripted in-memory feed, drained before each tick
//! - **Randomness**: all traffic and noise derived from a single 64-bit seed
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       ScenarioRunner                        │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │ SimContext (Virtual Clock)                           │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! │  ┌──────────┐  JSON  ┌──────────────┐  Inbox  ┌─────────┐  │
//! │  │  Oracle  │───────►│  Scripted    │────────►│ Tracker │  │
//! │  │ (truth)  │        │  Transport   │         │ Runtime │  │
//! │  └──────────┘        └──────────────┘         └────┬────┘  │
//! │       ▲                                            │       │
//! │       └────────────── invariant checks ◄───────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use skytrack_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let result = ScenarioRunner::new(42, 20)
//!     .with_duration(60.0)
//!     .run(ScenarioId::SilentDropout);
//! assert!(result.passed);
//! ```

mod context;
mod exporter;
mod network;
mod oracle;
mod runner;
pub mod scenarios;

pub use context::SimContext;
pub use exporter::{AircraftPosition, SimExport, SimFrame};
pub use network::{ScriptHandle, ScriptedTransport};
pub use oracle::{Oracle, SimAircraft};
pub use runner::{ScenarioMetrics, ScenarioResult, ScenarioRunner, SIM_OBSERVER};

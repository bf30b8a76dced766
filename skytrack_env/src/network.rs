//! Report transport abstraction.

use async_trait::async_trait;
use crate::error::EnvError;

/// Abstraction for the collaborator that delivers raw report messages.
///
/// # Implementations
///
/// - **Production**: wraps a websocket/TCP feed of JSON position messages
/// - **Simulation**: `ScriptedTransport` replaying generated messages
///
/// # Message Flow
///
/// ```text
/// Feed source             Transport               Receive task            Update loop
///   |                         |                         |                       |
///   |-- JSON message -------->|                         |                       |
///   |                         |-- recv() -> Some(msg) ->|                       |
///   |                         |                         |-- decode + Inbox ---->|
///   |                         |                         |                       |-- drain() per tick
/// ```
#[async_trait]
pub trait ReportTransport: Send + Sync + 'static {
    /// Receives the next raw message.
    ///
    /// # Returns
    /// * `Ok(Some(message))` - A message was received
    /// * `Ok(None)` - The transport is closed for good (shutdown)
    /// * `Err(EnvError)` - A recoverable failure; the caller may retry
    ///   after a reconnect delay
    async fn recv(&self) -> Result<Option<String>, EnvError>;

    /// Human-readable name of the source (for logging).
    fn source_name(&self) -> &str;
}

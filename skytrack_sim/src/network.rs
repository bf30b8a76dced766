//! Scripted report transport for feeding the runtime in simulation.

use async_trait::async_trait;
use skytrack_env::{EnvError, ReportTransport};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

type Script = Result<String, EnvError>;

/// In-memory transport: whatever the paired [`ScriptHandle`] sends is
/// returned by `recv`, in order. Dropping every handle closes the feed.
pub struct ScriptedTransport {
    name: String,

    /// Receiver for scripted messages (behind tokio mutex for async)
    rx: Mutex<mpsc::UnboundedReceiver<Script>>,

    /// Items handed out by `recv` so far
    delivered: Arc<AtomicU64>,
}

/// Sending side of a [`ScriptedTransport`].
#[derive(Clone)]
pub struct ScriptHandle {
    tx: mpsc::UnboundedSender<Script>,
    sent: Arc<AtomicU64>,
    delivered: Arc<AtomicU64>,
}

impl ScriptedTransport {
    /// Creates a transport and the handle that drives it.
    pub fn new(name: impl Into<String>) -> (Self, ScriptHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let delivered = Arc::new(AtomicU64::new(0));
        let transport = Self {
            name: name.into(),
            rx: Mutex::new(rx),
            delivered: Arc::clone(&delivered),
        };
        let handle = ScriptHandle {
            tx,
            sent: Arc::new(AtomicU64::new(0)),
            delivered,
        };
        (transport, handle)
    }

    /// Creates a transport pre-loaded with `script`, already closed behind it.
    pub fn from_script(name: impl Into<String>, script: Vec<Script>) -> Self {
        let (transport, handle) = Self::new(name);
        for item in script {
            handle.push(item);
        }
        transport
    }
}

impl ScriptHandle {
    fn push(&self, item: Script) -> bool {
        let accepted = self.tx.send(item).is_ok();
        if accepted {
            self.sent.fetch_add(1, Ordering::SeqCst);
        }
        accepted
    }

    /// Queues a raw message. Returns false if the transport is gone.
    pub fn send_message(&self, message: impl Into<String>) -> bool {
        self.push(Ok(message.into()))
    }

    /// Queues a transport fault.
    pub fn inject_fault(&self, error: EnvError) -> bool {
        self.push(Err(error))
    }

    /// Items queued but not yet received.
    pub fn pending(&self) -> u64 {
        self.sent
            .load(Ordering::SeqCst)
            .saturating_sub(self.delivered.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl ReportTransport for ScriptedTransport {
    async fn recv(&self) -> Result<Option<String>, EnvError> {
        let mut rx = self.rx.lock().await;
        let item = rx.recv().await;
        if item.is_some() {
            self.delivered.fetch_add(1, Ordering::SeqCst);
        }
        item.transpose()
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_transport_replays_in_order() {
        let transport = ScriptedTransport::from_script(
            "script",
            vec![
                Ok("one".to_string()),
                Err(EnvError::transport("reset")),
                Ok("two".to_string()),
            ],
        );

        assert_eq!(transport.recv().await.unwrap().as_deref(), Some("one"));
        assert!(transport.recv().await.unwrap_err().is_retryable());
        assert_eq!(transport.recv().await.unwrap().as_deref(), Some("two"));
        // Handle dropped: closed
        assert_eq!(transport.recv().await.unwrap(), None);
        assert_eq!(transport.source_name(), "script");
    }

    #[tokio::test]
    async fn test_pending_counts_undelivered() {
        let (transport, handle) = ScriptedTransport::new("live");
        assert!(handle.send_message("a"));
        assert!(handle.send_message("b"));
        assert_eq!(handle.pending(), 2);

        transport.recv().await.unwrap();
        assert_eq!(handle.pending(), 1);

        drop(transport);
        assert!(!handle.send_message("c"));
    }
}

//! Thread-safe hand-off queue between receive tasks and the update loop.

use crate::error::EnvError;
use tokio::sync::mpsc;

/// Cloneable producer half of an [`Inbox`].
///
/// Safe to move into any task or thread; pushing never blocks.
#[derive(Debug)]
pub struct InboxSender<T> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T> Clone for InboxSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> InboxSender<T> {
    /// Queues an item for the next drain.
    ///
    /// Fails with `EnvError::Closed` once the inbox has been dropped.
    pub fn push(&self, item: T) -> Result<(), EnvError> {
        self.tx.send(item).map_err(|_| EnvError::Closed)
    }

    /// Whether the consuming inbox is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half owned by the single update loop.
///
/// Items come out of [`Inbox::drain`] in the order they were pushed from a
/// given sender.
#[derive(Debug)]
pub struct Inbox<T> {
    tx: mpsc::UnboundedSender<T>,
    rx: mpsc::UnboundedReceiver<T>,
}

impl<T> Inbox<T> {
    /// Creates an empty inbox.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    /// Returns a new producer handle.
    pub fn sender(&self) -> InboxSender<T> {
        InboxSender {
            tx: self.tx.clone(),
        }
    }

    /// Takes everything queued so far without waiting.
    pub fn drain(&mut self) -> Vec<T> {
        let mut items = Vec::new();
        while let Ok(item) = self.rx.try_recv() {
            items.push(item);
        }
        items
    }

    /// Discards everything queued so far, returning how many were dropped.
    pub fn discard(&mut self) -> usize {
        self.drain().len()
    }
}

impl<T> Default for Inbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_preserves_order() {
        let mut inbox = Inbox::new();
        let sender = inbox.sender();
        for i in 0..5 {
            sender.push(i).unwrap();
        }

        assert_eq!(inbox.drain(), vec![0, 1, 2, 3, 4]);
        assert!(inbox.drain().is_empty());
    }

    #[test]
    fn test_push_after_drop_is_closed() {
        let inbox: Inbox<u32> = Inbox::new();
        let sender = inbox.sender();
        drop(inbox);

        assert!(sender.is_closed());
        assert!(matches!(sender.push(1), Err(EnvError::Closed)));
    }

    #[test]
    fn test_discard_counts() {
        let mut inbox = Inbox::new();
        let sender = inbox.sender();
        sender.push("a").unwrap();
        sender.push("b").unwrap();

        assert_eq!(inbox.discard(), 2);
        assert!(inbox.drain().is_empty());
    }

    #[tokio::test]
    async fn test_push_from_other_task() {
        let mut inbox = Inbox::new();
        let sender = inbox.sender();

        let handle = tokio::spawn(async move {
            for i in 0..100u32 {
                sender.push(i).unwrap();
            }
        });
        handle.await.unwrap();

        let items = inbox.drain();
        assert_eq!(items.len(), 100);
        assert!(items.windows(2).all(|w| w[0] < w[1]));
    }
}

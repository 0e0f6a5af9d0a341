//! In-process datagram link.
//!
//! Behaves like a multicast group with loopback: every datagram handed to a
//! [`MemorySink`] is delivered to every subscribed [`MemorySource`],
//! including the sender's own. Used for offline runs and tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::chat::error::ChatError;
use crate::chat::transport::{DatagramSink, DatagramSource};

type Subscribers = Arc<Mutex<Vec<mpsc::UnboundedSender<Vec<u8>>>>>;

/// Outbound half of a memory link. Cloning shares the same group.
#[derive(Clone)]
pub struct MemorySink {
    subscribers: Subscribers,
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
}

/// Inbound half of a memory link.
pub struct MemorySource {
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
}

/// Create a link with one subscribed source.
pub fn memory_link() -> (MemorySink, MemorySource) {
    let sink = MemorySink {
        subscribers: Arc::new(Mutex::new(Vec::new())),
        sent: Arc::new(Mutex::new(Vec::new())),
    };
    let source = sink.subscribe();
    (sink, source)
}

impl MemorySink {
    /// Attach another source to the group.
    pub fn subscribe(&self) -> MemorySource {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(tx);
        }
        MemorySource { rx }
    }

    /// Every payload sent so far, in order.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Drop all subscriptions; sources report closure once drained.
    pub fn close(&self) {
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.clear();
        }
    }
}

#[async_trait]
impl DatagramSink for MemorySink {
    async fn send(&self, payload: &[u8]) -> Result<usize, ChatError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(payload.to_vec());
        }
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.retain(|tx| tx.send(payload.to_vec()).is_ok());
        }
        Ok(payload.len())
    }
}

#[async_trait]
impl DatagramSource for MemorySource {
    async fn recv(&mut self) -> Result<Vec<u8>, ChatError> {
        self.rx.recv().await.ok_or(ChatError::TransportClosed)
    }
}

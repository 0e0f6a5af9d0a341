//! Transport layer for chat datagrams.
//!
//! The chat core only needs two things from the network: emit one datagram
//! to the group, and wait for the next datagram from the group. Those are
//! the [`DatagramSink`] and [`DatagramSource`] traits; the multicast
//! endpoint implements them over UDP and the memory link implements them
//! over a channel.

mod memory;
mod multicast;

pub use memory::{memory_link, MemorySink, MemorySource};
pub use multicast::{MulticastEndpoint, MulticastListener, MulticastSender};

use async_trait::async_trait;

use crate::chat::error::ChatError;

/// Outbound half: writes whole datagrams to the group.
#[async_trait]
pub trait DatagramSink: Send + Sync {
    /// Send one datagram. No fragmentation happens here.
    async fn send(&self, payload: &[u8]) -> Result<usize, ChatError>;
}

/// Inbound half: yields whole datagrams from the group.
#[async_trait]
pub trait DatagramSource: Send {
    /// Wait for the next datagram.
    ///
    /// Returns [`ChatError::TransportRead`] for transient failures and
    /// [`ChatError::TransportClosed`] once nothing more can arrive.
    async fn recv(&mut self) -> Result<Vec<u8>, ChatError>;
}

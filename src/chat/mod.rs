//! # lanchat chat module
//!
//! Serverless group chat over IPv4 multicast on the local segment.
//!
//! ## Security Model
//!
//! - **One shared passphrase**: SHA-256 of it is the AES-256-GCM key
//! - **Fresh random nonce** for every datagram
//! - **No sender authentication**: anyone with the passphrase can claim any name
//! - **No replay detection** and no forward secrecy
//! - Traffic from peers with a different passphrase fails authentication and
//!   is dropped quietly (shown only in debug mode)

mod config;
mod error;
pub mod inbound;
pub mod presenter;
pub mod protocol;
mod session;
pub mod transport;
pub mod tui;

pub use config::{
    ChatConfig, DEFAULT_GROUP, DEFAULT_MAX_PLAINTEXT_LEN, DEFAULT_PORT, DEFAULT_RECV_BUFFER_SIZE,
    MIN_RECV_BUFFER_SIZE,
};
pub use error::ChatError;
pub use inbound::{spawn_inbound, InboundHandle};
pub use presenter::{NoticeKind, Presenter};
pub use protocol::{ChatRecord, Timestamp};
pub use session::{ChatSession, Inbound, SendOutcome};

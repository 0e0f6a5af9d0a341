//! # lanchat - encrypted group chat on the local network
//!
//! lanchat is a serverless chat room for one network segment. Every peer
//! joins the same IPv4 multicast group and encrypts with a key derived from a
//! shared passphrase; whoever knows the passphrase is in the room.
//!
//! ## Overview
//!
//! - The passphrase is hashed with SHA-256 into a 32-byte AES-256-GCM key
//! - Each message becomes the plaintext `sender:HH:MM:SS:body`
//! - The plaintext is sealed with a fresh 96-bit nonce, base64-encoded and
//!   sent as `CHAT:<base64>` to `224.0.0.251:5353`
//! - Receivers drop anything that is not a chat frame, does not open under
//!   their key, or carries their own username (multicast loopback)
//!
//! ## Security Model
//!
//! - **Shared secret only**: the key is unsalted, so captured traffic can be
//!   attacked offline with a passphrase dictionary
//! - **No sender authentication**: anyone with the passphrase can use any name
//! - **No replay detection** and no forward secrecy
//!
//! ## Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use lanchat::chat::{ChatConfig, ChatSession, Inbound, Timestamp};
//! use lanchat::crypto::SessionKey;
//!
//! let config = ChatConfig::default();
//! let key = Arc::new(SessionKey::derive("hunter2"));
//! let alice = ChatSession::new("alice", key.clone(), &config).unwrap();
//! let bob = ChatSession::new("bob", key, &config).unwrap();
//!
//! let ts = Timestamp::from_hms(12, 34, 56).unwrap();
//! let (_, datagram) = alice.prepare_outgoing("hi bob", ts).unwrap();
//!
//! match bob.classify_datagram(&datagram) {
//!     Inbound::Delivered(record) => assert_eq!(record.body, "hi bob"),
//!     other => panic!("unexpected: {:?}", other),
//! }
//! ```
//!
//! ## Modules
//!
//! - [`crypto`]: Key derivation and the AES-256-GCM envelope
//! - [`chat`]: Wire format, transport, send/receive pipelines and the TUI

pub mod chat;
pub mod crypto;

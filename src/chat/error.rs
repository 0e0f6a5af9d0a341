//! Chat error types.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::crypto::EnvelopeError;

/// Errors that can occur during chat operations.
#[derive(Error, Debug)]
pub enum ChatError {
    /// Missing or invalid startup configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be read or parsed.
    #[error("Config file {path}: {reason}")]
    ConfigFile {
        /// Path of the offending file.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// Username is empty, contains `:` or control characters.
    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    /// Could not create, bind or join a socket.
    #[error("Failed to bind {addr}: {source}")]
    TransportBind {
        /// Endpoint being bound or joined.
        addr: SocketAddr,
        /// Underlying cause.
        #[source]
        source: io::Error,
    },

    /// Datagram could not be written.
    #[error("Send failed: {0}")]
    TransportSend(#[source] io::Error),

    /// Datagram could not be read.
    #[error("Read failed: {0}")]
    TransportRead(#[source] io::Error),

    /// The datagram source has been closed.
    #[error("Transport closed")]
    TransportClosed,

    /// Envelope sealing or opening failed.
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    /// Assembled plaintext exceeds the datagram-safe ceiling.
    #[error("Message too long: {len} bytes (max: {max})")]
    PlaintextTooLarge {
        /// Plaintext length in bytes.
        len: usize,
        /// Configured ceiling.
        max: usize,
    },

    /// Decrypted plaintext is not `sender:HH:MM:SS:body`.
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// System clipboard unavailable or rejected the text.
    #[error("Clipboard error: {0}")]
    Clipboard(String),

    /// Terminal setup or teardown failed.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

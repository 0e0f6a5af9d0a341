//! Chat session: the send and receive pipelines.
//!
//! A `ChatSession` holds the local username, the shared session key and the
//! plaintext ceiling. It is immutable after construction and is shared
//! between the inbound task and the sending task behind an `Arc`.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::chat::config::ChatConfig;
use crate::chat::error::ChatError;
use crate::chat::presenter::{NoticeKind, Presenter};
use crate::chat::protocol::{
    decode_frame, encode_frame, validate_username, ChatRecord, Timestamp, TIMESTAMP_LEN,
};
use crate::chat::transport::DatagramSink;
use crate::crypto::{open_envelope, seal_envelope, EnvelopeError, SessionKey};

/// What the receive pipeline made of one datagram.
#[derive(Debug)]
pub enum Inbound {
    /// Well-formed record from another peer.
    Delivered(ChatRecord),
    /// Not a chat frame (wrong prefix or not UTF-8).
    Foreign,
    /// Our own datagram looped back by the network.
    SelfEcho,
    /// Chat frame that did not open under our key.
    Undecryptable(EnvelopeError),
    /// Opened, but the plaintext is not a valid record.
    Malformed(ChatError),
}

/// What the send pipeline did with one line of input.
#[derive(Debug)]
pub enum SendOutcome {
    /// Nothing to send.
    Empty,
    /// Transmitted and rendered locally.
    Sent(ChatRecord),
    /// Transmit failed; rendered locally anyway.
    LocalOnly(ChatRecord),
    /// Refused before transmit; nothing rendered.
    Rejected,
}

/// RAM-only session state. The key is wiped when the last `Arc` drops.
pub struct ChatSession {
    username: String,
    key: Arc<SessionKey>,
    max_plaintext_len: usize,
}

impl ChatSession {
    /// Create a session for `username` using a derived key.
    pub fn new(
        username: impl Into<String>,
        key: Arc<SessionKey>,
        config: &ChatConfig,
    ) -> Result<Self, ChatError> {
        let username = username.into();
        validate_username(&username)?;
        Ok(Self {
            username,
            key,
            max_plaintext_len: config.max_plaintext_len,
        })
    }

    /// Local username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Shared session key.
    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    /// Largest body in bytes that keeps the plaintext under the ceiling.
    pub fn max_body_len(&self) -> usize {
        self.max_plaintext_len
            .saturating_sub(self.username.len() + TIMESTAMP_LEN + 2)
    }

    /// Build the record and the datagram for `body` stamped with `timestamp`.
    pub fn prepare_outgoing(
        &self,
        body: &str,
        timestamp: Timestamp,
    ) -> Result<(ChatRecord, Vec<u8>), ChatError> {
        let record = ChatRecord::new(self.username.clone(), timestamp, body);
        let plaintext = record.to_plaintext();

        if plaintext.len() > self.max_plaintext_len {
            return Err(ChatError::PlaintextTooLarge {
                len: plaintext.len(),
                max: self.max_plaintext_len,
            });
        }

        let envelope = seal_envelope(&plaintext, self.key.as_bytes())?;
        Ok((record, encode_frame(&envelope)))
    }

    /// Send `body` stamped with the current local time.
    pub async fn send<S, P>(&self, sink: &S, presenter: &P, body: &str) -> SendOutcome
    where
        S: DatagramSink + ?Sized,
        P: Presenter + ?Sized,
    {
        self.send_at(sink, presenter, body, Timestamp::now()).await
    }

    /// Send `body` with an explicit timestamp.
    ///
    /// Refusals (oversize, encryption failure) are reported to the presenter
    /// and nothing is transmitted or rendered. A failed transmit is reported
    /// but the record is still rendered locally, since our own datagram will
    /// be discarded as a self-echo either way.
    pub async fn send_at<S, P>(
        &self,
        sink: &S,
        presenter: &P,
        body: &str,
        timestamp: Timestamp,
    ) -> SendOutcome
    where
        S: DatagramSink + ?Sized,
        P: Presenter + ?Sized,
    {
        if body.is_empty() {
            return SendOutcome::Empty;
        }

        let (record, frame) = match self.prepare_outgoing(body, timestamp) {
            Ok(prepared) => prepared,
            Err(e) => {
                warn!(error = %e, "outgoing message rejected");
                presenter.notice(NoticeKind::Error, &format!("Message not sent: {}", e));
                return SendOutcome::Rejected;
            }
        };

        if presenter.debug_enabled() {
            presenter.notice(NoticeKind::Info, "Broadcasting encrypted message");
        }

        let outcome = match sink.send(&frame).await {
            Ok(bytes) => {
                debug!(bytes, "message broadcast");
                SendOutcome::Sent(record.clone())
            }
            Err(e) => {
                warn!(error = %e, "broadcast failed");
                presenter.notice(NoticeKind::Error, &format!("Error broadcasting: {}", e));
                SendOutcome::LocalOnly(record.clone())
            }
        };

        presenter.deliver(&record);
        outcome
    }

    /// Run one datagram through prefix check, decryption, parsing and
    /// self-echo suppression.
    pub fn classify_datagram(&self, datagram: &[u8]) -> Inbound {
        let Some(envelope) = decode_frame(datagram) else {
            return Inbound::Foreign;
        };

        let plaintext = match open_envelope(envelope, self.key.as_bytes()) {
            Ok(plaintext) => plaintext,
            Err(e) => return Inbound::Undecryptable(e),
        };

        match ChatRecord::from_plaintext(&plaintext) {
            Ok(record) if record.sender == self.username => Inbound::SelfEcho,
            Ok(record) => Inbound::Delivered(record),
            Err(e) => Inbound::Malformed(e),
        }
    }

    /// Classify a datagram and hand the result to the presenter.
    ///
    /// Only delivered records reach the presenter in normal mode. With debug
    /// enabled, frames that fail to open or parse are surfaced as warnings;
    /// on a shared group those are usually peers with another passphrase.
    pub fn handle_datagram<P>(&self, datagram: &[u8], presenter: &P) -> Inbound
    where
        P: Presenter + ?Sized,
    {
        let inbound = self.classify_datagram(datagram);
        match &inbound {
            Inbound::Delivered(record) => presenter.deliver(record),
            Inbound::Undecryptable(e) => {
                trace!(error = %e, "dropped undecryptable frame");
                if presenter.debug_enabled() {
                    presenter.notice(
                        NoticeKind::Warn,
                        &format!("Failed to decrypt message: {}", e),
                    );
                }
            }
            Inbound::Malformed(e) => {
                debug!(error = %e, "dropped malformed record");
                if presenter.debug_enabled() {
                    presenter.notice(NoticeKind::Warn, &format!("Dropped message: {}", e));
                }
            }
            Inbound::Foreign => trace!(bytes = datagram.len(), "ignored non-chat datagram"),
            Inbound::SelfEcho => trace!("suppressed self-echo"),
        }
        inbound
    }
}

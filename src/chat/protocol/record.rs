//! Chat records and their plaintext framing.
//!
//! A record travels as `sender ":" HH:MM:SS ":" body`. Only the first two
//! colons are delimiters; the timestamp's own colons are recovered by its
//! fixed width, and anything after it belongs to the body.

use std::fmt;

use chrono::{Local, NaiveTime, Timelike};

use crate::chat::error::ChatError;

/// Separator between the plaintext fields.
pub const FIELD_SEPARATOR: char = ':';

/// Width of `HH:MM:SS`.
pub const TIMESTAMP_LEN: usize = 8;

/// Local wall-clock time formatted as `HH:MM:SS` (24-hour, zero-padded).
///
/// Treated as a display string; no timezone or skew handling.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Timestamp(String);

impl Timestamp {
    /// Current local time.
    pub fn now() -> Self {
        Self::from_time(Local::now().time())
    }

    /// Format a time of day.
    pub fn from_time(time: NaiveTime) -> Self {
        Self(format!(
            "{:02}:{:02}:{:02}",
            time.hour(),
            time.minute(),
            time.second().min(59)
        ))
    }

    /// Build from components, rejecting out-of-range values.
    pub fn from_hms(hour: u32, minute: u32, second: u32) -> Result<Self, ChatError> {
        NaiveTime::from_hms_opt(hour, minute, second)
            .map(Self::from_time)
            .ok_or_else(|| {
                ChatError::MalformedRecord(format!(
                    "invalid time {}:{}:{}",
                    hour, minute, second
                ))
            })
    }

    /// Parse exactly the shape produced by [`Timestamp::from_time`].
    pub fn parse(s: &str) -> Result<Self, ChatError> {
        let bytes = s.as_bytes();
        let shape_ok = bytes.len() == TIMESTAMP_LEN
            && bytes[2] == b':'
            && bytes[5] == b':'
            && [0, 1, 3, 4, 6, 7].iter().all(|&i| bytes[i].is_ascii_digit());
        if !shape_ok {
            return Err(ChatError::MalformedRecord(format!("bad timestamp {:?}", s)));
        }

        let field = |i: usize| u32::from(bytes[i] - b'0') * 10 + u32::from(bytes[i + 1] - b'0');
        Self::from_hms(field(0), field(3), field(6))
    }

    /// The formatted string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Check that a name can be used as a record sender.
///
/// Must be non-empty, free of `:` and free of control characters.
pub fn validate_username(name: &str) -> Result<(), ChatError> {
    if name.is_empty() {
        return Err(ChatError::InvalidUsername("username is empty".to_string()));
    }
    if name.contains(FIELD_SEPARATOR) {
        return Err(ChatError::InvalidUsername(format!(
            "{:?} contains '{}'",
            name, FIELD_SEPARATOR
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(ChatError::InvalidUsername(format!(
            "{:?} contains control characters",
            name
        )));
    }
    Ok(())
}

/// One chat line: who, when, what.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRecord {
    /// Sender's username.
    pub sender: String,
    /// Sender's local time at send.
    pub timestamp: Timestamp,
    /// Message text. May contain colons.
    pub body: String,
}

impl ChatRecord {
    /// Create a new record.
    pub fn new(sender: impl Into<String>, timestamp: Timestamp, body: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            timestamp,
            body: body.into(),
        }
    }

    /// Join into `sender:HH:MM:SS:body`.
    pub fn to_plaintext(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            self.sender,
            self.timestamp,
            self.body,
            sep = FIELD_SEPARATOR
        )
    }

    /// Parse `sender:HH:MM:SS:body`.
    ///
    /// The sender ends at the first colon. The timestamp is the fixed-width
    /// field after it and must be followed by a colon; the rest is the body.
    pub fn from_plaintext(plaintext: &str) -> Result<Self, ChatError> {
        let (sender, rest) = plaintext
            .split_once(FIELD_SEPARATOR)
            .ok_or_else(|| ChatError::MalformedRecord("missing sender field".to_string()))?;

        validate_username(sender).map_err(|e| ChatError::MalformedRecord(e.to_string()))?;

        if rest.len() <= TIMESTAMP_LEN || !rest.is_char_boundary(TIMESTAMP_LEN) {
            return Err(ChatError::MalformedRecord(
                "missing timestamp or body field".to_string(),
            ));
        }
        let (timestamp, rest) = rest.split_at(TIMESTAMP_LEN);
        let body = rest.strip_prefix(FIELD_SEPARATOR).ok_or_else(|| {
            ChatError::MalformedRecord("timestamp not followed by separator".to_string())
        })?;

        Ok(Self {
            sender: sender.to_string(),
            timestamp: Timestamp::parse(timestamp)?,
            body: body.to_string(),
        })
    }
}

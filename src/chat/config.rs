//! Chat configuration.
//!
//! Resolved from three layers: built-in defaults, an optional TOML file, and
//! command-line overrides (highest precedence). The username and passphrase
//! never live here; they are supplied on the command line for each session.

use std::fs;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::chat::error::ChatError;
use crate::chat::protocol::FRAME_PREFIX;
use crate::crypto::envelope_text_len;

/// Well-known multicast group shared by all peers.
pub const DEFAULT_GROUP: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 251);

/// Well-known UDP port.
pub const DEFAULT_PORT: u16 = 5353;

/// Maximum plaintext length in bytes (`sender:HH:MM:SS:body`).
pub const DEFAULT_MAX_PLAINTEXT_LEN: usize = 768;

/// Default listener read buffer. Large enough for the biggest legal frame.
pub const DEFAULT_RECV_BUFFER_SIZE: usize = 2048;

/// Smallest read buffer accepted.
pub const MIN_RECV_BUFFER_SIZE: usize = 1024;

/// Default multicast TTL (stay on the local segment).
pub const DEFAULT_MULTICAST_TTL: u32 = 1;

/// Configuration for a chat session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChatConfig {
    /// Multicast group to join and send to.
    pub group: Ipv4Addr,

    /// UDP port.
    pub port: u16,

    /// Local interface used to join the group (`0.0.0.0` lets the OS pick).
    pub interface: Ipv4Addr,

    /// TTL for outgoing multicast datagrams.
    pub multicast_ttl: u32,

    /// Whether our own datagrams are looped back to us.
    pub multicast_loop: bool,

    /// Listener read buffer in bytes.
    pub recv_buffer_size: usize,

    /// Ceiling on the assembled plaintext in bytes.
    pub max_plaintext_len: usize,

    /// Directory where transcript snapshots are written.
    pub transcript_dir: PathBuf,

    /// Optional log file. Without one, logging is disabled.
    pub log_file: Option<PathBuf>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            group: DEFAULT_GROUP,
            port: DEFAULT_PORT,
            interface: Ipv4Addr::UNSPECIFIED,
            multicast_ttl: DEFAULT_MULTICAST_TTL,
            multicast_loop: true,
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
            max_plaintext_len: DEFAULT_MAX_PLAINTEXT_LEN,
            transcript_dir: PathBuf::from("."),
            log_file: None,
        }
    }
}

impl ChatConfig {
    /// Load configuration from a TOML file. Missing keys take defaults.
    pub fn from_file(path: &Path) -> Result<Self, ChatError> {
        let content = fs::read_to_string(path).map_err(|e| ChatError::ConfigFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ChatError::ConfigFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load from an explicit path, or from the default location if present.
    ///
    /// An explicit path must exist; the default file is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ChatError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// `<config_dir>/lanchat/config.toml`, if a config directory exists.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .map(|dir| dir.join("lanchat").join("config.toml"))
    }

    /// The group endpoint datagrams are sent to.
    pub fn group_addr(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.group, self.port)
    }

    /// The local address the listener binds.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, self.port))
    }

    /// Largest datagram the send path can produce under this config.
    pub fn max_datagram_len(&self) -> usize {
        FRAME_PREFIX.len() + envelope_text_len(self.max_plaintext_len)
    }

    /// Check that the resolved values can form a working session.
    pub fn validate(&self) -> Result<(), ChatError> {
        if !self.group.is_multicast() {
            return Err(ChatError::Config(format!(
                "{} is not a multicast address",
                self.group
            )));
        }
        if self.port == 0 {
            return Err(ChatError::Config("port must not be 0".to_string()));
        }
        if self.recv_buffer_size < MIN_RECV_BUFFER_SIZE {
            return Err(ChatError::Config(format!(
                "recv_buffer_size must be at least {} bytes",
                MIN_RECV_BUFFER_SIZE
            )));
        }
        if self.max_plaintext_len == 0 {
            return Err(ChatError::Config(
                "max_plaintext_len must be greater than 0".to_string(),
            ));
        }
        if self.max_datagram_len() > self.recv_buffer_size {
            return Err(ChatError::Config(format!(
                "max_plaintext_len {} produces {}-byte datagrams, larger than recv_buffer_size {}",
                self.max_plaintext_len,
                self.max_datagram_len(),
                self.recv_buffer_size
            )));
        }
        Ok(())
    }
}

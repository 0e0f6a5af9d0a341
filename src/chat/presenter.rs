//! The boundary between the chat core and whatever displays it.
//!
//! The core calls a presenter from two activities at once (the inbound task
//! and the sending task), so implementations must be `Send + Sync` and do
//! their own serialization.

use std::fmt;

use crate::chat::protocol::ChatRecord;

/// Severity of a diagnostic line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Warn,
    Error,
}

impl NoticeKind {
    /// Lowercase label.
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeKind::Info => "info",
            NoticeKind::Warn => "warn",
            NoticeKind::Error => "error",
        }
    }
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sink for records and notices produced by the chat core.
pub trait Presenter: Send + Sync {
    /// Render a received or locally sent record.
    fn deliver(&self, record: &ChatRecord);

    /// Surface a diagnostic line.
    fn notice(&self, kind: NoticeKind, text: &str);

    /// Whether verbose diagnostics should be surfaced.
    fn debug_enabled(&self) -> bool;
}

impl<P: Presenter + ?Sized> Presenter for std::sync::Arc<P> {
    fn deliver(&self, record: &ChatRecord) {
        (**self).deliver(record)
    }

    fn notice(&self, kind: NoticeKind, text: &str) {
        (**self).notice(kind, text)
    }

    fn debug_enabled(&self) -> bool {
        (**self).debug_enabled()
    }
}

//! Presenter backed by the TUI's update queue.
//!
//! Both the inbound task and the sending task push updates onto one channel;
//! the TUI loop drains it and applies updates in arrival order.

use tokio::sync::mpsc;

use crate::chat::presenter::{NoticeKind, Presenter};
use crate::chat::protocol::ChatRecord;

/// One queued change to the transcript.
#[derive(Debug, Clone)]
pub enum UiUpdate {
    /// Render a chat record.
    Record(ChatRecord),
    /// Render a diagnostic line.
    Notice(NoticeKind, String),
}

/// Presenter that forwards to the TUI loop.
#[derive(Clone)]
pub struct UiPresenter {
    tx: mpsc::UnboundedSender<UiUpdate>,
    debug: bool,
}

impl UiPresenter {
    /// Create the presenter and the receiving end the TUI loop drains.
    pub fn channel(debug: bool) -> (Self, mpsc::UnboundedReceiver<UiUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, debug }, rx)
    }
}

impl Presenter for UiPresenter {
    fn deliver(&self, record: &ChatRecord) {
        // The UI may already be gone during shutdown.
        let _ = self.tx.send(UiUpdate::Record(record.clone()));
    }

    fn notice(&self, kind: NoticeKind, text: &str) {
        let _ = self.tx.send(UiUpdate::Notice(kind, text.to_string()));
    }

    fn debug_enabled(&self) -> bool {
        self.debug
    }
}

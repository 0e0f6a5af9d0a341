//! Application state for the TUI.

use ratatui::layout::Rect;

use crate::chat::presenter::NoticeKind;
use crate::chat::protocol::{ChatRecord, Timestamp};

use super::presenter::UiUpdate;
use super::ui::scroll_limit;

/// Who a transcript line belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageAuthor {
    /// Message from the local user.
    You,
    /// Message from another peer.
    Peer(String),
    /// Diagnostic line (status, errors, operator actions).
    System(NoticeKind),
}

/// A transcript line with metadata.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    /// Who sent the message.
    pub author: MessageAuthor,
    /// Display name of the sender (empty for system lines).
    pub sender: String,
    /// The message content.
    pub content: String,
    /// `HH:MM:SS` as carried on the wire, or local time for system lines.
    pub timestamp: String,
}

impl ChatMessage {
    /// Build from a chat record, marking our own records as `You`.
    pub fn from_record(record: &ChatRecord, local_username: &str) -> Self {
        let author = if record.sender == local_username {
            MessageAuthor::You
        } else {
            MessageAuthor::Peer(record.sender.clone())
        };
        Self {
            author,
            sender: record.sender.clone(),
            content: record.body.clone(),
            timestamp: record.timestamp.to_string(),
        }
    }

    /// Create a system message stamped with the current time.
    pub fn system(kind: NoticeKind, content: impl Into<String>) -> Self {
        Self {
            author: MessageAuthor::System(kind),
            sender: String::new(),
            content: content.into(),
            timestamp: Timestamp::now().to_string(),
        }
    }

    /// Prefix shown before the content, e.g. `[12:34:56] alice: `.
    pub fn prefix(&self) -> String {
        match self.author {
            MessageAuthor::System(_) => format!("[{}] ", self.timestamp),
            _ => format!("[{}] {}: ", self.timestamp, self.sender),
        }
    }

    /// Plain text line for transcript export.
    pub fn transcript_line(&self) -> String {
        format!("{}{}", self.prefix(), self.content)
    }
}

/// Network status for the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Sockets not open yet.
    Disconnected,
    /// Joined and listening.
    Listening,
    /// Startup or runtime failure.
    Error(String),
}

impl ConnectionStatus {
    /// Get a display string for the status.
    pub fn display(&self) -> &str {
        match self {
            ConnectionStatus::Disconnected => "Disconnected",
            ConnectionStatus::Listening => "Listening",
            ConnectionStatus::Error(_) => "Error",
        }
    }
}

/// Application state for the chat TUI.
pub struct App {
    /// Local username.
    pub username: String,
    /// Multicast endpoint shown in the header.
    pub group: String,
    /// Session key fingerprint shown in the header.
    pub key_fingerprint: String,
    /// Current input text.
    pub input: String,
    /// Cursor position in the input (in characters).
    pub cursor_position: usize,
    /// Transcript.
    pub messages: Vec<ChatMessage>,
    /// Current network status.
    pub status: ConnectionStatus,
    /// Whether the app should quit.
    pub should_quit: bool,
    /// Scroll offset for message history (0 = bottom).
    pub scroll_offset: usize,
    /// Records we sent.
    pub messages_sent: u32,
    /// Records we received.
    pub messages_received: u32,
    /// Maximum input length in bytes.
    pub max_message_len: usize,
    /// Whether debug diagnostics are shown.
    pub debug: bool,
    /// Terminal area at the last draw, used for mouse hit-testing.
    pub viewport: Rect,
}

impl App {
    /// Create a new App instance.
    pub fn new(username: impl Into<String>, max_message_len: usize) -> Self {
        Self {
            username: username.into(),
            group: String::new(),
            key_fingerprint: String::new(),
            input: String::new(),
            cursor_position: 0,
            messages: Vec::new(),
            status: ConnectionStatus::Disconnected,
            should_quit: false,
            scroll_offset: 0,
            messages_sent: 0,
            messages_received: 0,
            max_message_len,
            debug: false,
            viewport: Rect::default(),
        }
    }

    /// Remaining bytes available for input.
    pub fn remaining_bytes(&self) -> usize {
        self.max_message_len.saturating_sub(self.input.len())
    }

    /// Check if input is at max length.
    pub fn is_input_at_max(&self) -> bool {
        self.input.len() >= self.max_message_len
    }

    /// Apply an update queued by the presenter.
    pub fn apply(&mut self, update: UiUpdate) {
        match update {
            UiUpdate::Record(record) => self.add_record(&record),
            UiUpdate::Notice(kind, text) => self.add_notice(kind, text),
        }
    }

    /// Add a chat record (ours or a peer's).
    pub fn add_record(&mut self, record: &ChatRecord) {
        let message = ChatMessage::from_record(record, &self.username);
        match message.author {
            MessageAuthor::You => self.messages_sent += 1,
            _ => self.messages_received += 1,
        }
        self.messages.push(message);
        self.scroll_to_bottom();
    }

    /// Add a diagnostic line.
    pub fn add_notice(&mut self, kind: NoticeKind, content: impl Into<String>) {
        self.messages.push(ChatMessage::system(kind, content));
        self.scroll_to_bottom();
    }

    /// Add an informational line.
    pub fn add_system_message(&mut self, content: impl Into<String>) {
        self.add_notice(NoticeKind::Info, content);
    }

    /// Set the network status.
    pub fn set_status(&mut self, status: ConnectionStatus) {
        self.status = status;
    }

    /// Whole transcript as plain text, one line per message.
    pub fn transcript(&self) -> String {
        let mut text = String::new();
        for message in &self.messages {
            text.push_str(&message.transcript_line());
            text.push('\n');
        }
        text
    }

    /// Byte offset of the `chars`-th character of the input.
    fn byte_at(&self, chars: usize) -> usize {
        self.input
            .char_indices()
            .nth(chars)
            .map_or(self.input.len(), |(i, _)| i)
    }

    /// Move cursor left.
    pub fn move_cursor_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    /// Move cursor right.
    pub fn move_cursor_right(&mut self) {
        self.cursor_position = (self.cursor_position + 1).min(self.input.chars().count());
    }

    /// Move cursor to start of input.
    pub fn move_cursor_home(&mut self) {
        self.cursor_position = 0;
    }

    /// Move cursor to end of input.
    pub fn move_cursor_end(&mut self) {
        self.cursor_position = self.input.chars().count();
    }

    /// Insert `c` at the cursor unless it would overflow the byte budget.
    pub fn enter_char(&mut self, c: char) {
        if c.len_utf8() > self.remaining_bytes() {
            return;
        }
        let at = self.byte_at(self.cursor_position);
        self.input.insert(at, c);
        self.cursor_position += 1;
    }

    /// Backspace.
    pub fn delete_char(&mut self) {
        if self.cursor_position == 0 {
            return;
        }
        self.cursor_position -= 1;
        let at = self.byte_at(self.cursor_position);
        self.input.remove(at);
    }

    /// Delete.
    pub fn delete_char_forward(&mut self) {
        if self.cursor_position < self.input.chars().count() {
            let at = self.byte_at(self.cursor_position);
            self.input.remove(at);
        }
    }

    /// Take the current input and clear it.
    pub fn take_input(&mut self) -> String {
        self.cursor_position = 0;
        std::mem::take(&mut self.input)
    }

    /// Jump back to the newest message.
    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = 0;
    }

    /// Scroll towards older lines, stopping once the first line is on screen.
    pub fn scroll_up(&mut self, n: usize) {
        let limit = scroll_limit(self);
        self.scroll_offset = (self.scroll_offset + n).min(limit);
    }

    /// Scroll towards newer lines.
    pub fn scroll_down(&mut self, n: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(n);
    }

    /// Check if the group is joined.
    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Listening
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(sender: &str, body: &str) -> ChatRecord {
        ChatRecord::new(sender, Timestamp::from_hms(12, 34, 56).unwrap(), body)
    }

    #[test]
    fn test_app_creation() {
        let app = App::new("alice", 100);
        assert_eq!(app.username, "alice");
        assert!(app.input.is_empty());
        assert!(app.messages.is_empty());
        assert!(!app.should_quit);
    }

    #[test]
    fn test_editing_in_the_middle() {
        let mut app = App::new("alice", 100);
        for c in "hllo".chars() {
            app.enter_char(c);
        }
        app.move_cursor_home();
        app.move_cursor_right();
        app.enter_char('e');
        assert_eq!(app.input, "hello");
        assert_eq!(app.cursor_position, 2);

        app.delete_char();
        assert_eq!(app.input, "hllo");
        app.delete_char_forward();
        assert_eq!(app.input, "hlo");
        assert_eq!(app.cursor_position, 1);

        app.move_cursor_end();
        app.move_cursor_right();
        assert_eq!(app.cursor_position, 3);
    }

    #[test]
    fn test_records_split_by_author() {
        let mut app = App::new("alice", 100);

        app.add_system_message("Joined");
        app.add_record(&record("alice", "Hello"));
        app.add_record(&record("bob", "Hi there"));

        assert_eq!(app.messages.len(), 3);
        assert_eq!(app.messages_sent, 1);
        assert_eq!(app.messages_received, 1);
        assert_eq!(app.messages[1].author, MessageAuthor::You);
        assert_eq!(app.messages[2].author, MessageAuthor::Peer("bob".to_string()));
    }

    #[test]
    fn test_apply_updates() {
        let mut app = App::new("alice", 100);
        app.apply(UiUpdate::Record(record("bob", "yo")));
        app.apply(UiUpdate::Notice(NoticeKind::Warn, "odd".to_string()));

        assert_eq!(app.messages.len(), 2);
        assert_eq!(app.messages[1].author, MessageAuthor::System(NoticeKind::Warn));
    }

    #[test]
    fn test_transcript_lines() {
        let mut app = App::new("alice", 100);
        app.add_record(&record("bob", "url: https://x/y:z"));
        assert_eq!(app.transcript(), "[12:34:56] bob: url: https://x/y:z\n");
    }

    #[test]
    fn test_take_input_resets_cursor() {
        let mut app = App::new("alice", 100);
        app.enter_char('o');
        app.enter_char('k');

        assert_eq!(app.take_input(), "ok");
        assert!(app.input.is_empty());
        assert_eq!(app.cursor_position, 0);
    }

    #[test]
    fn test_byte_budget() {
        let mut app = App::new("alice", 4);
        for c in "abcd!".chars() {
            app.enter_char(c);
        }
        assert_eq!(app.input, "abcd");
        assert_eq!(app.remaining_bytes(), 0);
        assert!(app.is_input_at_max());

        app.delete_char();
        assert!(!app.is_input_at_max());
        app.enter_char('?');
        assert_eq!(app.input, "abc?");
    }

    #[test]
    fn test_multibyte_counts_bytes() {
        let mut app = App::new("alice", 3);
        app.enter_char('é');
        assert_eq!(app.remaining_bytes(), 1);
        // Another two-byte char does not fit
        app.enter_char('é');
        assert_eq!(app.input, "é");
        app.enter_char('a');
        assert_eq!(app.input, "éa");
        app.move_cursor_home();
        app.delete_char_forward();
        assert_eq!(app.input, "a");
    }

    #[test]
    fn test_scroll_is_clamped() {
        let mut app = App::new("alice", 100);
        app.viewport = Rect::new(0, 0, 80, 24);
        app.add_system_message("one");
        app.add_system_message("two");
        // Both lines fit, nothing to scroll
        app.scroll_up(10);
        assert_eq!(app.scroll_offset, 0);

        // 16 rows inside the messages border
        for i in 0..20 {
            app.add_system_message(format!("line {}", i));
        }
        app.scroll_up(100);
        assert_eq!(app.scroll_offset, 22 - 16);
        app.scroll_down(2);
        assert_eq!(app.scroll_offset, 4);
        app.scroll_down(10);
        assert_eq!(app.scroll_offset, 0);
    }
}

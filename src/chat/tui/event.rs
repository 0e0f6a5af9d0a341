//! Event handling for the TUI.

use std::time::Duration;

use crossterm::event::{
    self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton,
    MouseEvent, MouseEventKind,
};
use tokio::sync::mpsc;

use super::app::App;
use super::ui::{layout_areas, visible_lines};

/// Application events.
#[derive(Debug)]
pub enum Event {
    /// Terminal tick (for refreshing UI).
    Tick,
    /// Keyboard event.
    Key(KeyEvent),
    /// Mouse event.
    Mouse(MouseEvent),
    /// Terminal resize.
    Resize(u16, u16),
}

/// Event handler that reads terminal events in a separate task.
pub struct EventHandler {
    /// Sender to main loop.
    tx: mpsc::UnboundedSender<Event>,
    /// Receiver in main loop.
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    /// Create a new event handler.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    /// Get the sender for spawning the event loop.
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.tx.clone()
    }

    /// Receive the next event.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Spawn the event reading task.
    ///
    /// Terminal polling blocks, so it runs on the blocking pool.
    pub fn spawn_reader(tx: mpsc::UnboundedSender<Event>, tick_rate: Duration) {
        tokio::task::spawn_blocking(move || loop {
            let sent = if event::poll(tick_rate).unwrap_or(false) {
                match event::read() {
                    Ok(CrosstermEvent::Key(key)) => tx.send(Event::Key(key)),
                    Ok(CrosstermEvent::Mouse(mouse)) => tx.send(Event::Mouse(mouse)),
                    Ok(CrosstermEvent::Resize(w, h)) => tx.send(Event::Resize(w, h)),
                    _ => Ok(()),
                }
            } else {
                tx.send(Event::Tick)
            };
            if sent.is_err() {
                break;
            }
        });
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Rows moved by PageUp/PageDown.
const PAGE_LINES: usize = 5;

/// Result of handling an input event.
#[derive(Debug, PartialEq, Eq)]
pub enum KeyAction {
    /// No action needed.
    None,
    /// Quit the application.
    Quit,
    /// Send the current input as a message.
    SendMessage,
    /// Write the transcript to a file.
    SaveTranscript,
    /// Copy the last transcript lines to the clipboard.
    CopyTranscript,
    /// Open a link in the browser.
    OpenUrl(String),
}

/// Map a key press to an edit of the input line or an action for the loop.
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> KeyAction {
    // Windows reports both press and release
    if key.kind == KeyEventKind::Release {
        return KeyAction::None;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let save_chord = ctrl || key.modifiers.contains(KeyModifiers::SUPER);

    match (key.code, ctrl) {
        (KeyCode::Esc, _) | (KeyCode::Char('c' | 'q'), true) => {
            app.should_quit = true;
            return KeyAction::Quit;
        }
        (KeyCode::Char('s'), _) if save_chord => return KeyAction::SaveTranscript,
        (KeyCode::Tab, _) => return KeyAction::CopyTranscript,
        (KeyCode::Enter, _) if !app.input.is_empty() => return KeyAction::SendMessage,

        (KeyCode::Up, true) => app.scroll_up(1),
        (KeyCode::Down, true) => app.scroll_down(1),
        (KeyCode::PageUp, _) => app.scroll_up(PAGE_LINES),
        (KeyCode::PageDown, _) => app.scroll_down(PAGE_LINES),

        (KeyCode::Left, _) => app.move_cursor_left(),
        (KeyCode::Right, _) => app.move_cursor_right(),
        (KeyCode::Home, _) => app.move_cursor_home(),
        (KeyCode::End, _) => app.move_cursor_end(),
        (KeyCode::Backspace, _) => app.delete_char(),
        (KeyCode::Delete, _) => app.delete_char_forward(),
        (KeyCode::Char(c), false) => app.enter_char(c),
        _ => {}
    }

    KeyAction::None
}

/// Handle a mouse event: left click on a link opens it, wheel scrolls.
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) -> KeyAction {
    match mouse.kind {
        MouseEventKind::ScrollUp => {
            app.scroll_up(1);
            KeyAction::None
        }
        MouseEventKind::ScrollDown => {
            app.scroll_down(1);
            KeyAction::None
        }
        MouseEventKind::Down(MouseButton::Left) => {
            let [_, area, _] = layout_areas(app.viewport);
            let inside = mouse.column > area.x
                && mouse.column < area.x + area.width.saturating_sub(1)
                && mouse.row > area.y
                && mouse.row < area.y + area.height.saturating_sub(1);
            if !inside {
                return KeyAction::None;
            }

            let row = (mouse.row - area.y - 1) as usize;
            let column = (mouse.column - area.x - 1) as usize;
            visible_lines(app, area)
                .get(row)
                .and_then(|line| line.link_at(app, column))
                .map(KeyAction::OpenUrl)
                .unwrap_or(KeyAction::None)
        }
        _ => KeyAction::None,
    }
}

/// Slash commands and their help lines.
const COMMANDS: &[(&str, &str)] = &[
    ("/quit, /q", "Leave the chat"),
    ("/status, /s", "Show group, key fingerprint and counters"),
    ("/save", "Save the transcript to a file (Ctrl+S)"),
    ("/copy", "Copy the last 10 lines to the clipboard (Tab)"),
    ("/clear, /c", "Clear the transcript"),
    ("/help, /h", "Show this help"),
];

/// Run `line` if it names a slash command.
///
/// Returns `None` when the first word is not a known command, in which case
/// the line is ordinary message text (`/usr/bin is full`).
pub fn handle_command(app: &mut App, line: &str) -> Option<KeyAction> {
    let name = line.split_whitespace().next()?;

    match name {
        "/quit" | "/q" | "/exit" => {
            app.should_quit = true;
            return Some(KeyAction::Quit);
        }
        "/save" => return Some(KeyAction::SaveTranscript),
        "/copy" => return Some(KeyAction::CopyTranscript),
        "/help" | "/h" | "/?" => {
            app.add_system_message("Commands:");
            for (names, help) in COMMANDS {
                app.add_system_message(format!("  {:<12} {}", names, help));
            }
        }
        "/status" | "/s" => {
            let lines = [
                format!("Status: {}", app.status.display()),
                format!("Group: {}  Key: {}", app.group, app.key_fingerprint),
                format!(
                    "{} sent, {} received",
                    app.messages_sent, app.messages_received
                ),
            ];
            for line in lines {
                app.add_system_message(line);
            }
        }
        "/clear" | "/c" => {
            app.messages.clear();
            app.scroll_to_bottom();
            app.add_system_message("Transcript cleared");
        }
        _ => return None,
    }

    Some(KeyAction::None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;
    use ratatui::layout::Rect;

    use crate::chat::protocol::{ChatRecord, Timestamp};

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn test_quit_command() {
        let mut app = App::new("test", 100);
        assert_eq!(handle_command(&mut app, "/q now"), Some(KeyAction::Quit));
        assert!(app.should_quit);
    }

    #[test]
    fn test_help_lists_every_command() {
        let mut app = App::new("test", 100);
        assert_eq!(handle_command(&mut app, "/help"), Some(KeyAction::None));
        assert_eq!(app.messages.len(), COMMANDS.len() + 1);
    }

    #[test]
    fn test_unknown_slash_is_message_text() {
        let mut app = App::new("test", 100);
        assert_eq!(handle_command(&mut app, "/usr/bin is full"), None);
        assert_eq!(handle_command(&mut app, "hello"), None);
        assert_eq!(handle_command(&mut app, ""), None);
        assert!(app.messages.is_empty());
    }

    #[test]
    fn test_clear_command() {
        let mut app = App::new("test", 100);
        app.add_system_message("old");
        handle_command(&mut app, "/clear");
        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.messages[0].content, "Transcript cleared");
    }

    #[test]
    fn test_export_commands() {
        let mut app = App::new("test", 100);
        assert_eq!(
            handle_command(&mut app, "/save"),
            Some(KeyAction::SaveTranscript)
        );
        assert_eq!(
            handle_command(&mut app, "/copy"),
            Some(KeyAction::CopyTranscript)
        );
    }

    #[test]
    fn test_enter_on_empty_input_does_nothing() {
        let mut app = App::new("test", 100);
        assert_eq!(
            handle_key_event(&mut app, key(KeyCode::Enter, KeyModifiers::NONE)),
            KeyAction::None
        );
        app.enter_char('x');
        assert_eq!(
            handle_key_event(&mut app, key(KeyCode::Enter, KeyModifiers::NONE)),
            KeyAction::SendMessage
        );
    }

    #[test]
    fn test_shortcuts() {
        let mut app = App::new("test", 100);
        assert_eq!(
            handle_key_event(&mut app, key(KeyCode::Char('s'), KeyModifiers::CONTROL)),
            KeyAction::SaveTranscript
        );
        assert_eq!(
            handle_key_event(&mut app, key(KeyCode::Tab, KeyModifiers::NONE)),
            KeyAction::CopyTranscript
        );
        assert!(app.input.is_empty());

        handle_key_event(&mut app, key(KeyCode::Char('s'), KeyModifiers::NONE));
        assert_eq!(app.input, "s");
    }

    #[test]
    fn test_click_on_link_opens_it() {
        let mut app = App::new("alice", 100);
        app.viewport = Rect::new(0, 0, 80, 24);
        app.add_record(&ChatRecord::new(
            "bob",
            Timestamp::from_hms(1, 2, 3).unwrap(),
            "see https://x.io",
        ));

        // Messages area starts at row 3; first line is row 4, text starts at column 1.
        // "[01:02:03] bob: see " is 20 chars, so the link starts at column 21.
        assert_eq!(
            handle_mouse_event(&mut app, click(22, 4)),
            KeyAction::OpenUrl("https://x.io".to_string())
        );
        assert_eq!(handle_mouse_event(&mut app, click(5, 4)), KeyAction::None);
        assert_eq!(handle_mouse_event(&mut app, click(22, 10)), KeyAction::None);
        assert_eq!(handle_mouse_event(&mut app, click(22, 0)), KeyAction::None);
    }

    #[test]
    fn test_click_on_wrapped_link_opens_whole_url() {
        let url = "https://example.com/a/very/long/path/that/keeps/going/and/going";
        let mut app = App::new("alice", 100);
        // Messages area is 42 wide: 40 columns inside, 24 after the prefix.
        app.viewport = Rect::new(0, 0, 42, 13);
        app.add_record(&ChatRecord::new(
            "bob",
            Timestamp::from_hms(1, 2, 3).unwrap(),
            format!("see {}", url),
        ));

        // Row 4 holds "see ", the link covers rows 5 to 7 from column 17.
        for (column, row) in [(17, 5), (19, 6), (20, 7)] {
            assert_eq!(
                handle_mouse_event(&mut app, click(column, row)),
                KeyAction::OpenUrl(url.to_string())
            );
        }
        assert_eq!(handle_mouse_event(&mut app, click(19, 4)), KeyAction::None);
        assert_eq!(handle_mouse_event(&mut app, click(38, 7)), KeyAction::None);
    }
}

//! Terminal User Interface for lanchat.
//!
//! This module provides the visual chat interface using ratatui. It is the
//! presenter realization: the core pipelines reach it only through
//! [`UiPresenter`].

mod app;
pub mod event;
pub mod export;
mod presenter;
mod ui;

pub use app::{App, ChatMessage, ConnectionStatus, MessageAuthor};
pub use event::{
    handle_command, handle_key_event, handle_mouse_event, Event, EventHandler, KeyAction,
};
pub use presenter::{UiPresenter, UiUpdate};
pub use ui::{layout_areas, render, transcript_lines, visible_lines, TranscriptLine};

use std::io;

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::chat::error::ChatError;

/// Terminal type used by the chat.
pub type ChatTerminal = Terminal<CrosstermBackend<io::Stdout>>;

/// Initialize the terminal for TUI mode.
pub fn init_terminal() -> Result<ChatTerminal, ChatError> {
    enable_raw_mode()
        .map_err(|e| ChatError::Terminal(format!("Failed to enable raw mode: {}", e)))?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .map_err(|e| ChatError::Terminal(format!("Failed to enter alternate screen: {}", e)))?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
        .map_err(|e| ChatError::Terminal(format!("Failed to create terminal: {}", e)))
}

/// Restore the terminal to normal mode.
pub fn restore_terminal(terminal: &mut ChatTerminal) -> Result<(), ChatError> {
    disable_raw_mode()
        .map_err(|e| ChatError::Terminal(format!("Failed to disable raw mode: {}", e)))?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .map_err(|e| ChatError::Terminal(format!("Failed to leave alternate screen: {}", e)))?;
    terminal
        .show_cursor()
        .map_err(|e| ChatError::Terminal(format!("Failed to show cursor: {}", e)))?;
    Ok(())
}

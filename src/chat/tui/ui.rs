//! UI rendering for the TUI.

use std::ops::Range;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::chat::presenter::NoticeKind;

use super::app::{App, ConnectionStatus, MessageAuthor};
use super::export::{find_urls, url_at};

/// One wrapped transcript line, before styling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptLine {
    /// Prefix (`[HH:MM:SS] name: `) on the first line, indentation after.
    pub prefix: String,
    /// Author of the message this line belongs to.
    pub author: MessageAuthor,
    /// Content fragment.
    pub text: String,
    /// Whether this is the first line of its message.
    pub first: bool,
    /// Index of the message in `App::messages`.
    pub message: usize,
    /// Character offset of `text` within the message content.
    pub offset: usize,
}

impl TranscriptLine {
    /// The full link under screen column `column` of this line.
    ///
    /// Links are matched against the whole message, so a link wrapped over
    /// several lines resolves to the same URL from any of them.
    pub fn link_at(&self, app: &App, column: usize) -> Option<String> {
        let within = column.checked_sub(self.prefix.chars().count())?;
        if within >= self.text.chars().count() {
            return None;
        }
        let message = app.messages.get(self.message)?;
        url_at(&message.content, self.offset + within)
    }

    /// Link ranges of the message clipped to this line, in `text` columns.
    fn links(&self, content: &str) -> Vec<Range<usize>> {
        let start = self.offset;
        let end = start + self.text.chars().count();
        find_urls(content)
            .into_iter()
            .filter(|range| range.start < end && range.end > start)
            .map(|range| range.start.max(start) - start..range.end.min(end) - start)
            .collect()
    }
}

/// Split the terminal into header, messages and input areas.
pub fn layout_areas(area: Rect) -> [Rect; 3] {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Length(3)])
        .split(area);
    [rows[0], rows[1], rows[2]]
}

/// Main render function.
pub fn render(frame: &mut Frame, app: &App) {
    let [header, messages, input] = layout_areas(frame.area());

    render_header(frame, app, header);
    render_messages(frame, app, messages);
    render_input(frame, app, input);
}

/// Render the header: status, group, key fingerprint and counters.
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let (status_text, status_color) = match &app.status {
        ConnectionStatus::Listening => ("Listening".to_string(), Color::Green),
        ConnectionStatus::Disconnected => ("Disconnected".to_string(), Color::DarkGray),
        ConnectionStatus::Error(e) => (format!("Error: {}", e), Color::Red),
    };

    let mut fields = vec![(
        status_text,
        Style::default().fg(status_color).add_modifier(Modifier::BOLD),
    )];
    if !app.group.is_empty() {
        fields.push((app.group.clone(), Style::default().fg(Color::Cyan)));
    }
    if !app.key_fingerprint.is_empty() {
        fields.push((
            format!("key {}", app.key_fingerprint),
            Style::default().fg(Color::Magenta),
        ));
    }
    if app.debug {
        fields.push(("debug".to_string(), Style::default().fg(Color::Yellow)));
    }
    fields.push((
        format!("{}↑ {}↓", app.messages_sent, app.messages_received),
        Style::default().fg(Color::DarkGray),
    ));

    let mut spans = vec![Span::raw(" ")];
    for (i, (text, style)) in fields.into_iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" | "));
        }
        spans.push(Span::styled(text, style));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" lanchat - {} ", app.username))
        .title_bottom(
            Line::from(" Ctrl+S save | Tab copy | click links to open ").right_aligned(),
        )
        .border_style(Style::default().fg(Color::Cyan));

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

/// Greedy word wrap to `width` columns; words longer than a line are split.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut out = Vec::new();
    let mut line = String::new();
    let mut used = 0;

    for word in text.split_inclusive(char::is_whitespace) {
        if used > 0 && used + word.chars().count() > width {
            out.push(std::mem::take(&mut line));
            used = 0;
        }
        for ch in word.chars() {
            if used == width {
                out.push(std::mem::take(&mut line));
                used = 0;
            }
            line.push(ch);
            used += 1;
        }
    }

    if !line.is_empty() || out.is_empty() {
        out.push(line);
    }
    out
}

/// Wrap every message to `inner_width` columns.
pub fn transcript_lines(app: &App, inner_width: usize) -> Vec<TranscriptLine> {
    let mut all_lines = Vec::new();

    for (index, msg) in app.messages.iter().enumerate() {
        let prefix = msg.prefix();
        let prefix_len = prefix.chars().count();
        let content_width = inner_width.saturating_sub(prefix_len);

        let parts = if content_width == 0 || msg.content.is_empty() {
            vec![msg.content.clone()]
        } else {
            wrap_text(&msg.content, content_width)
        };

        let mut offset = 0;
        for (i, part) in parts.into_iter().enumerate() {
            let len = part.chars().count();
            all_lines.push(TranscriptLine {
                prefix: if i == 0 {
                    prefix.clone()
                } else {
                    " ".repeat(prefix_len)
                },
                author: msg.author.clone(),
                text: part,
                first: i == 0,
                message: index,
                offset,
            });
            offset += len;
        }
    }

    all_lines
}

/// Index range of lines visible in a box of `inner_height` rows.
pub fn visible_range(
    total_lines: usize,
    inner_height: usize,
    scroll_offset: usize,
) -> (usize, usize) {
    let start_index = if total_lines > inner_height {
        total_lines
            .saturating_sub(inner_height)
            .saturating_sub(scroll_offset)
    } else {
        0
    };
    let end_index = start_index.saturating_add(inner_height).min(total_lines);
    (start_index, end_index)
}

/// Columns and rows inside the border of `area`.
fn inner_size(area: Rect) -> (usize, usize) {
    (
        area.width.saturating_sub(2) as usize,
        area.height.saturating_sub(2) as usize,
    )
}

/// Largest scroll offset that still fills the messages area of `app.viewport`.
pub fn scroll_limit(app: &App) -> usize {
    let [_, area, _] = layout_areas(app.viewport);
    let (inner_width, inner_height) = inner_size(area);
    transcript_lines(app, inner_width)
        .len()
        .saturating_sub(inner_height)
}

/// The lines currently on screen in the messages area `area`.
pub fn visible_lines(app: &App, area: Rect) -> Vec<TranscriptLine> {
    let (inner_width, inner_height) = inner_size(area);

    let all_lines = transcript_lines(app, inner_width);
    let (start, end) = visible_range(all_lines.len(), inner_height, app.scroll_offset);
    all_lines[start..end].to_vec()
}

fn prefix_style(author: &MessageAuthor) -> Style {
    match author {
        MessageAuthor::You => Style::default().fg(Color::Green),
        MessageAuthor::Peer(_) => Style::default().fg(Color::Blue),
        MessageAuthor::System(NoticeKind::Info) => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::ITALIC),
        MessageAuthor::System(NoticeKind::Warn) => Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::ITALIC),
        MessageAuthor::System(NoticeKind::Error) => Style::default()
            .fg(Color::Red)
            .add_modifier(Modifier::ITALIC),
    }
}

fn content_style(author: &MessageAuthor) -> Style {
    match author {
        MessageAuthor::System(NoticeKind::Error) => Style::default().fg(Color::Red),
        MessageAuthor::System(_) => Style::default().fg(Color::Gray),
        _ => Style::default(),
    }
}

/// Split `text` into spans, highlighting the character ranges in `links`.
fn content_spans(text: &str, links: &[Range<usize>], base: Style) -> Vec<Span<'static>> {
    let link_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::UNDERLINED);

    let chars: Vec<char> = text.chars().collect();
    let mut spans = Vec::new();
    let mut cursor = 0;

    for range in links {
        if range.start > cursor {
            spans.push(Span::styled(
                chars[cursor..range.start].iter().collect::<String>(),
                base,
            ));
        }
        spans.push(Span::styled(
            chars[range.start..range.end].iter().collect::<String>(),
            link_style,
        ));
        cursor = range.end;
    }
    if cursor < chars.len() {
        spans.push(Span::styled(chars[cursor..].iter().collect::<String>(), base));
    }

    spans
}

fn to_line(app: &App, line: &TranscriptLine) -> Line<'static> {
    let links = app
        .messages
        .get(line.message)
        .map_or_else(Vec::new, |message| line.links(&message.content));

    let mut spans = vec![Span::styled(
        line.prefix.clone(),
        if line.first {
            prefix_style(&line.author)
        } else {
            Style::default()
        },
    )];
    spans.extend(content_spans(
        &line.text,
        &links,
        content_style(&line.author),
    ));
    Line::from(spans)
}

/// Render the messages area.
fn render_messages(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = visible_lines(app, area)
        .iter()
        .map(|line| ListItem::new(to_line(app, line)))
        .collect();

    let scroll_indicator = if app.scroll_offset > 0 {
        format!(" [↑{}] ", app.scroll_offset)
    } else {
        String::new()
    };

    let messages_block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Messages{}", scroll_indicator))
        .border_style(Style::default().fg(Color::White));

    frame.render_widget(List::new(items).block(messages_block), area);
}

/// Render the input area.
fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let connected = app.is_connected();
    let width = (area.width.saturating_sub(2) as usize).max(1);

    // Slide the visible window so the cursor stays inside the box
    let first = (app.cursor_position + 1).saturating_sub(width);

    let (text, text_style) = if app.input.is_empty() {
        let hint = if connected {
            "Type a message... (/help for commands, Esc to quit)"
        } else {
            "Not receiving from the group"
        };
        (hint.to_string(), Style::default().fg(Color::DarkGray))
    } else {
        let shown: String = app.input.chars().skip(first).take(width).collect();
        let color = if connected { Color::White } else { Color::Gray };
        (shown, Style::default().fg(color))
    };

    let remaining = app.remaining_bytes();
    let counter_color = match remaining {
        0 => Color::Red,
        1..=20 => Color::Yellow,
        _ => Color::DarkGray,
    };
    let border_color = match (connected, remaining) {
        (false, _) => Color::DarkGray,
        (true, 0) => Color::Red,
        (true, _) => Color::Green,
    };
    let counter = Span::styled(
        format!(" {}/{} ", app.input.len(), app.max_message_len),
        Style::default().fg(counter_color),
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Input ")
        .title_bottom(Line::from(counter).right_aligned())
        .border_style(Style::default().fg(border_color));
    frame.render_widget(Paragraph::new(text).style(text_style).block(block), area);

    if connected {
        let column = (app.cursor_position - first) as u16;
        frame.set_cursor_position((area.x + 1 + column, area.y + 1));
    }
}

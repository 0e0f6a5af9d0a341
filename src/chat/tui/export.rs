//! Getting text out of the TUI: transcript files, the clipboard, and links.

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Local};

use crate::chat::error::ChatError;

/// Number of trailing transcript lines copied to the clipboard.
pub const COPY_LINES: usize = 10;

/// `chat_log_YYYY-MM-DD_HH-MM-SS.txt`
pub fn transcript_filename(at: DateTime<Local>) -> String {
    format!("chat_log_{}.txt", at.format("%Y-%m-%d_%H-%M-%S"))
}

/// Write `text` to a timestamped file in `dir` and return its path.
pub fn save_transcript(dir: &Path, text: &str) -> Result<PathBuf, ChatError> {
    let path = dir.join(transcript_filename(Local::now()));
    fs::write(&path, text)?;
    Ok(path)
}

/// Last `n` lines of `text`.
pub fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

/// Put `text` on the system clipboard.
pub fn copy_to_clipboard(text: &str) -> Result<(), ChatError> {
    arboard::Clipboard::new()
        .and_then(|mut clipboard| clipboard.set_text(text.to_string()))
        .map_err(|e| ChatError::Clipboard(e.to_string()))
}

/// Character ranges of `http://` and `https://` links in `line`.
///
/// A link runs from the scheme to the next whitespace.
pub fn find_urls(line: &str) -> Vec<Range<usize>> {
    let chars: Vec<char> = line.chars().collect();
    let mut ranges = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let rest: String = chars[i..chars.len().min(i + 8)].iter().collect();
        let scheme_len = if rest.starts_with("https://") {
            8
        } else if rest.starts_with("http://") {
            7
        } else {
            0
        };

        if scheme_len == 0 {
            i += 1;
            continue;
        }

        let mut end = i + scheme_len;
        while end < chars.len() && !chars[end].is_whitespace() {
            end += 1;
        }
        if end > i + scheme_len {
            ranges.push(i..end);
        }
        i = end;
    }

    ranges
}

/// The link covering character column `column`, if any.
pub fn url_at(line: &str, column: usize) -> Option<String> {
    find_urls(line)
        .into_iter()
        .find(|range| range.contains(&column))
        .map(|range| line.chars().skip(range.start).take(range.len()).collect())
}

/// Open `url` with the platform's default handler.
pub fn open_url(url: &str) -> Result<(), ChatError> {
    let mut command = if cfg!(target_os = "macos") {
        let mut c = Command::new("open");
        c.arg(url);
        c
    } else if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/c", "start", "", url]);
        c
    } else {
        let mut c = Command::new("xdg-open");
        c.arg(url);
        c
    };

    command.spawn()?;
    Ok(())
}

//! Chat command: join the LAN group and run the TUI.
//!
//! This is the session root. It resolves configuration, derives the session
//! key, opens the multicast sockets, starts the inbound task and then drives
//! the terminal until the user quits.

use std::ffi::OsString;
use std::fs::OpenOptions;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::builder::NonEmptyStringValueParser;
use clap::Args;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use super::CommandExecutor;

use lanchat::chat::transport::{DatagramSink, MulticastEndpoint};
use lanchat::chat::tui::export::{
    copy_to_clipboard, open_url, save_transcript, tail_lines, COPY_LINES,
};
use lanchat::chat::tui::{
    handle_command, handle_key_event, handle_mouse_event, init_terminal, render,
    restore_terminal, App, ChatTerminal, ConnectionStatus, Event, EventHandler, KeyAction,
    UiPresenter, UiUpdate,
};
use lanchat::chat::{
    spawn_inbound, ChatConfig, ChatError, ChatSession, InboundHandle, NoticeKind,
};
use lanchat::crypto::SessionKey;

/// Terminal poll interval.
const TICK_RATE: Duration = Duration::from_millis(100);

/// Flags that consume the following argument.
const VALUE_FLAGS: &[&str] = &[
    "-u",
    "--user",
    "-p",
    "--passphrase",
    "--config",
    "--log-file",
    "--group",
    "--port",
    "--interface",
];

/// Encrypted group chat on the local network.
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Your display name (no ':' allowed)
    #[arg(short = 'u', long = "user", value_parser = NonEmptyStringValueParser::new())]
    pub user: String,

    /// Shared passphrase; everyone in the room must use the same one
    #[arg(short = 'p', long = "passphrase", value_parser = NonEmptyStringValueParser::new())]
    pub passphrase: String,

    /// Show diagnostics for traffic that cannot be decrypted or parsed
    #[arg(long)]
    pub debug: bool,

    /// Path to a TOML config file (default: <config dir>/lanchat/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write logs to this file (the terminal is taken by the UI)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Multicast group to join
    #[arg(long)]
    pub group: Option<Ipv4Addr>,

    /// UDP port
    #[arg(long)]
    pub port: Option<u16>,

    /// Local interface address used to join the group
    #[arg(long)]
    pub interface: Option<Ipv4Addr>,
}

impl CommandExecutor for ChatCommand {
    fn execute(&self) -> Result<()> {
        let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
        rt.block_on(self.start_chat())
    }
}

impl ChatCommand {
    /// Layer CLI overrides on top of the config file and defaults.
    pub fn resolve_config(&self) -> Result<ChatConfig> {
        let mut config =
            ChatConfig::load(self.config.as_deref()).context("Failed to load configuration")?;

        if let Some(group) = self.group {
            config.group = group;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(interface) = self.interface {
            config.interface = interface;
        }
        if let Some(log_file) = &self.log_file {
            config.log_file = Some(log_file.clone());
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    async fn start_chat(&self) -> Result<()> {
        if self.user.is_empty() || self.passphrase.is_empty() {
            bail!(ChatError::Config(
                "username and passphrase are required".to_string()
            ));
        }

        let config = self.resolve_config()?;
        if let Some(path) = &config.log_file {
            init_logging(path, self.debug)?;
        }

        let key = Arc::new(SessionKey::derive(&self.passphrase));
        let session = Arc::new(
            ChatSession::new(self.user.clone(), key, &config).context("Invalid username")?,
        );

        let endpoint = MulticastEndpoint::open(&config)
            .with_context(|| format!("Failed to join multicast group {}", config.group_addr()))?;
        let (sender, listener) = endpoint.into_split();
        info!(
            user = %session.username(),
            group = %config.group_addr(),
            key = %session.key().fingerprint(),
            "session started"
        );

        let (presenter, updates) = UiPresenter::channel(self.debug);
        let inbound = spawn_inbound(session.clone(), listener, presenter.clone());

        let mut app = App::new(session.username(), session.max_body_len());
        app.group = config.group_addr().to_string();
        app.key_fingerprint = session.key().fingerprint();
        app.debug = self.debug;

        let ctx = SessionContext {
            session,
            sender: &sender,
            presenter,
            inbound: &inbound,
            transcript_dir: &config.transcript_dir,
        };
        let result = run_chat_loop(&mut app, updates, &ctx).await;
        drop(ctx);

        inbound.shutdown().await;
        info!("session ended");
        result
    }
}

/// Everything the TUI loop needs to act on user input.
struct SessionContext<'a, S: DatagramSink> {
    session: Arc<ChatSession>,
    sender: &'a S,
    presenter: UiPresenter,
    inbound: &'a InboundHandle,
    transcript_dir: &'a Path,
}

/// Replace the single-dash `-debug` spelling with `--debug`.
///
/// Values of flags such as `-p` are left alone even if they read `-debug`.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut normalized = Vec::new();
    let mut is_value = false;

    for arg in args {
        if !is_value && arg == "-debug" {
            normalized.push(OsString::from("--debug"));
            continue;
        }
        is_value = !is_value && VALUE_FLAGS.iter().any(|flag| arg == *flag);
        normalized.push(arg);
    }

    normalized
}

/// Send tracing output to `path`.
fn init_logging(path: &Path, debug: bool) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let default_filter = if debug { "lanchat=debug" } else { "lanchat=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(true)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}

/// Run the interactive chat loop with TUI.
async fn run_chat_loop<S: DatagramSink>(
    app: &mut App,
    mut updates: mpsc::UnboundedReceiver<UiUpdate>,
    ctx: &SessionContext<'_, S>,
) -> Result<()> {
    let mut terminal = init_terminal().context("Failed to initialize terminal")?;

    app.set_status(ConnectionStatus::Listening);
    app.add_system_message(format!(
        "Joined {} as {} (key {})",
        app.group, app.username, app.key_fingerprint
    ));
    app.add_system_message("Type /help for commands. Esc to quit.");

    let mut events = EventHandler::new();
    EventHandler::spawn_reader(events.sender(), TICK_RATE);

    let result = run_tui_loop(&mut terminal, app, &mut events, &mut updates, ctx).await;

    restore_terminal(&mut terminal).context("Failed to restore terminal")?;

    result
}

/// Inner TUI loop.
async fn run_tui_loop<S: DatagramSink>(
    terminal: &mut ChatTerminal,
    app: &mut App,
    events: &mut EventHandler,
    updates: &mut mpsc::UnboundedReceiver<UiUpdate>,
    ctx: &SessionContext<'_, S>,
) -> Result<()> {
    loop {
        terminal.draw(|frame| {
            app.viewport = frame.area();
            render(frame, app);
        })?;

        tokio::select! {
            event = events.next() => {
                let action = match event {
                    Some(Event::Key(key)) => match handle_key_event(app, key) {
                        KeyAction::SendMessage => submit_input(app, updates, ctx).await,
                        other => other,
                    },
                    Some(Event::Mouse(mouse)) => handle_mouse_event(app, mouse),
                    Some(Event::Tick) => {
                        check_receiver(app, ctx.inbound);
                        KeyAction::None
                    }
                    Some(Event::Resize(_, _)) => KeyAction::None,
                    None => return Ok(()),
                };

                run_action(app, action, ctx.transcript_dir);
                if app.should_quit {
                    return Ok(());
                }
            }

            Some(update) = updates.recv() => {
                app.apply(update);
            }
        }
    }
}

/// Flag the session once the inbound task has stopped on its own.
fn check_receiver(app: &mut App, inbound: &InboundHandle) {
    if app.is_connected() && inbound.is_finished() {
        warn!("inbound task stopped");
        app.set_status(ConnectionStatus::Error("receiver stopped".to_string()));
        app.add_notice(NoticeKind::Error, "No longer receiving messages");
    }
}

/// Send the input line, or run it if it is a slash command.
///
/// The input is cleared only once the local echo is in the transcript.
async fn submit_input<S: DatagramSink>(
    app: &mut App,
    updates: &mut mpsc::UnboundedReceiver<UiUpdate>,
    ctx: &SessionContext<'_, S>,
) -> KeyAction {
    let input = app.input.clone();
    if let Some(action) = handle_command(app, &input) {
        app.take_input();
        return action;
    }

    let outcome = ctx
        .session
        .send(ctx.sender, &ctx.presenter, &input)
        .await;
    debug!(?outcome, "send pipeline finished");

    apply_pending(app, updates);
    app.take_input();
    KeyAction::None
}

/// Apply every update already queued by the presenter.
fn apply_pending(app: &mut App, updates: &mut mpsc::UnboundedReceiver<UiUpdate>) {
    while let Ok(update) = updates.try_recv() {
        app.apply(update);
    }
}

/// Carry out the side effects the event handlers asked for.
fn run_action(app: &mut App, action: KeyAction, transcript_dir: &Path) {
    match action {
        KeyAction::None | KeyAction::SendMessage => {}
        KeyAction::Quit => {
            app.should_quit = true;
        }
        KeyAction::SaveTranscript => match save_transcript(transcript_dir, &app.transcript()) {
            Ok(path) => {
                info!(path = %path.display(), "transcript saved");
                app.add_system_message(format!("Chat log saved to {}", path.display()));
            }
            Err(e) => {
                warn!(error = %e, "transcript save failed");
                app.add_notice(NoticeKind::Error, format!("Error saving chat log: {}", e));
            }
        },
        KeyAction::CopyTranscript => {
            let text = tail_lines(&app.transcript(), COPY_LINES);
            match copy_to_clipboard(&text) {
                Ok(()) => app.add_system_message(format!(
                    "Copied last {} lines to clipboard",
                    text.lines().count()
                )),
                Err(e) => {
                    warn!(error = %e, "clipboard copy failed");
                    app.add_notice(NoticeKind::Error, e.to_string());
                }
            }
        }
        KeyAction::OpenUrl(url) => {
            app.add_system_message(format!("Opening URL: {}", url));
            if let Err(e) = open_url(&url) {
                warn!(error = %e, url = %url, "failed to open url");
                app.add_notice(NoticeKind::Error, format!("Failed to open URL: {}", e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanchat::chat::transport::{memory_link, MemorySink};

    fn args(list: &[&str]) -> Vec<OsString> {
        list.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_normalize_single_dash_debug() {
        assert_eq!(
            normalize_args(args(&["lanchat", "-u", "alice", "-p", "x", "-debug"])),
            args(&["lanchat", "-u", "alice", "-p", "x", "--debug"])
        );
    }

    #[test]
    fn test_normalize_keeps_flag_values() {
        assert_eq!(
            normalize_args(args(&["lanchat", "-p", "-debug", "-u", "bob"])),
            args(&["lanchat", "-p", "-debug", "-u", "bob"])
        );
        assert_eq!(
            normalize_args(args(&["lanchat", "--debug"])),
            args(&["lanchat", "--debug"])
        );
    }

    #[test]
    fn test_save_action_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new("alice", 100);
        app.add_system_message("hello");

        run_action(&mut app, KeyAction::SaveTranscript, dir.path());

        let last = app.messages.last().unwrap();
        assert!(last.content.starts_with("Chat log saved to"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_save_action_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new("alice", 100);

        run_action(&mut app, KeyAction::SaveTranscript, &dir.path().join("missing"));

        let last = app.messages.last().unwrap();
        assert!(last.content.starts_with("Error saving chat log"));
    }

    async fn submit(line: &str) -> (App, KeyAction, MemorySink) {
        let (sink, source) = memory_link();
        let key = Arc::new(SessionKey::derive("hunter2"));
        let session = Arc::new(ChatSession::new("alice", key, &ChatConfig::default()).unwrap());
        let (presenter, mut updates) = UiPresenter::channel(false);
        let inbound = spawn_inbound(session.clone(), source, presenter.clone());
        let dir = tempfile::tempdir().unwrap();

        let ctx = SessionContext {
            session,
            sender: &sink,
            presenter,
            inbound: &inbound,
            transcript_dir: dir.path(),
        };
        let mut app = App::new("alice", 100);
        for c in line.chars() {
            app.enter_char(c);
        }
        let action = submit_input(&mut app, &mut updates, &ctx).await;
        drop(ctx);
        inbound.shutdown().await;

        (app, action, sink)
    }

    #[tokio::test]
    async fn test_submit_shows_echo_when_input_clears() {
        let (app, action, sink) = submit("hello room").await;

        assert_eq!(action, KeyAction::None);
        assert!(app.input.is_empty());
        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.messages[0].content, "hello room");
        assert_eq!(sink.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_sends_unknown_slash_lines() {
        let (app, _, sink) = submit("/usr/bin is full").await;

        assert_eq!(app.messages[0].content, "/usr/bin is full");
        assert_eq!(sink.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_runs_known_commands() {
        let (app, action, sink) = submit("/save").await;

        assert_eq!(action, KeyAction::SaveTranscript);
        assert!(app.input.is_empty());
        assert!(sink.sent().is_empty());
    }

    #[test]
    fn test_quit_action() {
        let mut app = App::new("alice", 100);
        run_action(&mut app, KeyAction::Quit, Path::new("."));
        assert!(app.should_quit);
    }
}

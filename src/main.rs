//! lanchat - encrypted group chat on the local network
//!
//! Every peer joins the same IPv4 multicast group and encrypts with a key
//! derived from a shared passphrase. No server, no accounts.

mod commands;

use anyhow::Result;
use clap::Parser;

use commands::{normalize_args, ChatCommand, CommandExecutor};

/// lanchat - encrypted group chat on the local network
///
/// Everyone who starts lanchat with the same passphrase on the same network
/// segment lands in the same room. Messages are AES-256-GCM encrypted with a
/// key derived from the passphrase and sent to a multicast group.
#[derive(Parser)]
#[command(name = "lanchat")]
#[command(version)]
#[command(about = "Serverless encrypted group chat over LAN multicast")]
#[command(long_about = None)]
struct Cli {
    #[command(flatten)]
    chat: ChatCommand,
}

fn main() -> Result<()> {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));
    cli.chat.execute()
}

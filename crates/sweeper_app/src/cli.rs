use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use sweeper_logging::LogDestination;

/// Retention tooling for the community group: sweep old text-only messages
/// and diff mailing candidates against the sent ledger.
#[derive(Debug, Parser)]
#[command(name = "sweeper", version, about)]
pub struct Cli {
    /// Where log output goes.
    #[arg(long, value_enum, default_value_t = LogArg::Terminal, global = true)]
    pub log: LogArg,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogArg {
    Terminal,
    File,
    Both,
}

impl From<LogArg> for LogDestination {
    fn from(arg: LogArg) -> Self {
        match arg {
            LogArg::Terminal => LogDestination::Terminal,
            LogArg::File => LogDestination::File,
            LogArg::Both => LogDestination::Both,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Delete old text-only messages from a group, preserving media and
    /// anything sent today.
    Sweep(SweepArgs),
    /// Report candidate recipients not yet present in the sent ledger.
    Pending(PendingArgs),
}

#[derive(Debug, Args)]
pub struct SweepArgs {
    /// Identifier of the group to sweep. Group identifiers are commonly
    /// negative, so a leading dash is accepted.
    #[arg(allow_negative_numbers = true)]
    pub chat_id: i64,

    /// Chat-service endpoint, e.g. https://chat.example.com
    #[arg(long)]
    pub base_url: String,

    /// Identifiers per bulk-delete call.
    #[arg(long, default_value_t = 100)]
    pub batch_size: usize,

    /// Seconds to pause after each full batch.
    #[arg(long, default_value_t = 1)]
    pub pause_secs: u64,

    /// Classify and report without deleting anything. Skips the
    /// confirmation prompt.
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the interactive confirmation.
    #[arg(long)]
    pub yes: bool,
}

#[derive(Debug, Args)]
pub struct PendingArgs {
    /// Candidate list: CSV with at least Email, Name and id columns.
    #[arg(long)]
    pub csv: PathBuf,

    /// Newline-delimited ledger of addresses already handled.
    #[arg(long)]
    pub ledger: PathBuf,
}

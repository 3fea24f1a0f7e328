//! Clap derive structures for the `vicare-bridge` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// vicare-bridge -- publish ViCare heating telemetry as host sensors
#[derive(Debug, Parser)]
#[command(
    name = "vicare-bridge",
    version,
    about = "Publish Viessmann ViCare heating telemetry as host sensors",
    long_about = "Polls a Viessmann heating appliance through the ViCare API and\n\
        keeps a fixed set of sensor channels (temperatures, burner state,\n\
        active program) up to date in a local state file.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config dir)
    #[arg(long, env = "VICARE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the bridge and poll until Ctrl-C
    Run,

    /// Start the bridge, run a single cycle and print what it did
    Once(OnceArgs),

    /// Show the sensors recorded in the state file
    Status,

    /// List the channels the bridge publishes
    Channels,

    /// Manage configuration
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct OnceArgs {
    /// Leave the state file untouched and print the store calls instead
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the resolved configuration (secrets redacted)
    Show,

    /// Print the config file path
    Path,

    /// Store the ViCare password in the system keyring
    SetPassword {
        /// Account to store it for (defaults to the configured username)
        #[arg(long)]
        username: Option<String>,
    },
}

//! Clap derive structures for the `dfp` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// dfp -- read and drive a DFP/TFP device from the command line
#[derive(Debug, Parser)]
#[command(
    name = "dfp",
    version,
    about = "Read status and run actions on a DFP/TFP device",
    long_about = "Talks to a token-protected DFP/TFP device.\n\n\
        One-shot reads and actions, or `watch` to keep a cache refreshed\n\
        in the background and print the configured entities.",
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
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "DFP_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', default_value = "plain", global = true)]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Bare values, one per line
    Plain,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read one attribute of a module (dfp, dfpIO, tfp, tfpIO)
    #[command(alias = "st")]
    Status(StatusArgs),

    /// Run a named action on the module's family
    Action(ActionArgs),

    /// Read one attribute of a named tank
    Tank(TankArgs),

    /// Refresh in the background and print configured entities until Ctrl-C
    Watch(WatchArgs),

    /// Inspect the CLI configuration
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Module name
    pub module: String,

    /// Attribute name
    pub item: String,

    /// Skip the cache pass and fetch the module directly
    #[arg(long)]
    pub live: bool,
}

#[derive(Debug, Args)]
pub struct ActionArgs {
    /// Module name; selects the family the action runs on
    pub module: String,

    /// Action name
    pub name: String,
}

#[derive(Debug, Args)]
pub struct TankArgs {
    /// Tank name
    pub name: String,

    /// Attribute name
    pub item: String,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Seconds between entity updates
    #[arg(long, default_value = "5")]
    pub every: u64,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the resolved config (password masked)
    Show,
    /// Print the config file path in use
    Path,
}

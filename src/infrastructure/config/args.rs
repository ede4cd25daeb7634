use super::app_config::LogLevel;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "mosaicord",
    version,
    about = "A Discord bot that grows one shared image collage per server",
    long_about = None
)]
pub struct CliArgs {
    /// Bot token.
    #[arg(long, env = "DISCORD_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory for canvases, history logs, and the token file.
    #[arg(long, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Maximum queued requests before submissions are rejected as busy.
    #[arg(long)]
    pub queue_capacity: Option<usize>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// One-shot maintenance commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Register the slash command surface with Discord and exit.
    Sync,
}

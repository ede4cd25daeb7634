//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::entities::{DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH};

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Converts to tracing level.
    #[must_use]
    pub const fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Canvas sizing for newly created guilds.
///
/// Existing canvases keep the size they were created with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CanvasConfig {
    /// Canvas width in pixels.
    #[serde(default = "default_canvas_width")]
    pub width: u32,

    /// Canvas height in pixels.
    #[serde(default = "default_canvas_height")]
    pub height: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: default_canvas_width(),
            height: default_canvas_height(),
        }
    }
}

/// Request queue and fetch limits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Maximum queued requests before submissions are rejected as busy.
    #[serde(default = "default_queue_capacity")]
    pub capacity: usize,

    /// Timeout in seconds for fetching a source image.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_queue_capacity(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

/// Application configuration from the config file and CLI.
#[derive(Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Bot token from the command line or environment.
    #[serde(skip)]
    pub token: Option<String>,

    /// Log file path.
    #[serde(skip)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Directory for canvases, history logs, and the token file.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Canvas sizing.
    #[serde(default)]
    pub canvas: CanvasConfig,

    /// Queue sizing and fetch limits.
    #[serde(default)]
    pub queue: QueueConfig,
}

fn default_canvas_width() -> u32 {
    DEFAULT_CANVAS_WIDTH
}

fn default_canvas_height() -> u32 {
    DEFAULT_CANVAS_HEIGHT
}

fn default_queue_capacity() -> usize {
    32
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

use super::args::CliArgs;

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: CliArgs) {
        if args.token.is_some() {
            self.token = args.token;
        }
        if let Some(log_path) = args.log_path {
            self.log_path = Some(log_path);
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(data_dir) = args.data_dir {
            self.data_dir = Some(data_dir);
        }
        if let Some(queue_capacity) = args.queue_capacity {
            self.queue.capacity = queue_capacity;
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            token: None,
            log_path: None,
            log_level: LogLevel::Info,
            data_dir: None,
            canvas: CanvasConfig::default(),
            queue: QueueConfig::default(),
        }
    }
}

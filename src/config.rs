//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};

use clap::{Parser, ValueEnum};

/// Which context this process runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Controller, in-process display mirror and the control API
    Control,
    /// Read-only display following a control process through the store
    Display,
}

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "speaker-timer")]
#[command(about = "Presentation countdown timer with synchronized display mirrors")]
#[command(version)]
pub struct Config {
    /// Context to run in this process
    #[arg(short, long, value_enum, default_value = "control")]
    pub mode: Mode,

    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Directory for persisted snapshots. Without it, snapshots live in
    /// memory and are lost on exit. Required for display mode.
    #[arg(short, long)]
    pub store_dir: Option<PathBuf>,

    /// Tick and render interval in milliseconds
    #[arg(long, default_value = "1000")]
    pub tick_ms: u64,

    /// Sync channel buffer size
    #[arg(long, default_value = "64")]
    pub channel_capacity: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}

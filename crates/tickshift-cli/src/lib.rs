//! Tickshift command-line library
//!
//! Argument definitions and command handlers for the `tickshift` binary.
//! The binary itself only parses arguments, installs logging and calls
//! [`run`].

pub mod commands;
pub mod config;
pub mod output;
pub mod policy;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tickshift_formats::epoch::NUMBER_OF_COMPUTORS;
use tickshift_formats::{LayoutVersion, SnapshotKind};
use tracing::Level;

/// Migrate ledger node snapshots to a new tick duration
#[derive(Debug, Parser)]
#[command(
    name = "tickshift",
    about = "Migrate ledger node snapshots when the tick duration changes",
    version,
    long_about = "Rewrites the event-state and transaction-status snapshots of a node for a new \
                  TARGET_TICK_DURATION. Only tick-indexed arrays are resized; every other \
                  segment is copied byte-for-byte and the result is verified before it \
                  replaces anything."
)]
pub struct Cli {
    /// Set the logging level (RUST_LOG takes precedence)
    #[arg(short, long, value_enum, global = true, default_value = "info")]
    pub log_level: LogLevel,

    /// Output format
    #[arg(short = 'o', long, value_enum, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Committee size used to round the epoch capacity
    #[arg(
        long,
        global = true,
        env = "TICKSHIFT_COMPUTORS",
        default_value_t = NUMBER_OF_COMPUTORS
    )]
    pub computors: u64,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Migrate a logger event-state snapshot (logEventState.db)
    EventState {
        #[command(flatten)]
        migration: MigrationArgs,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Migrate a transaction-status snapshot (snapshotTxStatusData)
    TxStatus {
        #[command(flatten)]
        migration: MigrationArgs,
    },

    /// Show the epoch capacity for tick durations
    Calc {
        /// Tick durations in milliseconds
        #[arg(long, num_args = 1.., default_values_t = vec![1000u64, 2000, 3000, 4000, 5000])]
        durations: Vec<u64>,
    },

    /// Show layout, scalars and tick usage of a snapshot without changing it
    Inspect {
        /// Snapshot kind
        #[arg(value_enum)]
        kind: InspectKind,

        /// Snapshot file
        path: PathBuf,

        /// Tick duration the snapshot was written with, in milliseconds
        #[arg(long)]
        duration: u64,

        #[command(flatten)]
        layout: LayoutArgs,
    },
}

/// Options shared by both migration commands
#[derive(Debug, Clone, Args)]
pub struct MigrationArgs {
    /// Snapshot file to migrate
    pub path: PathBuf,

    /// Tick duration the snapshot was written with, in milliseconds
    #[arg(long, env = "TICKSHIFT_OLD_DURATION")]
    pub old_duration: u64,

    /// Tick duration to migrate to, in milliseconds
    #[arg(long, env = "TICKSHIFT_NEW_DURATION")]
    pub new_duration: u64,

    /// Output file (default: overwrite the input)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Do not copy the original to <path>.backup before overwriting it
    #[arg(long)]
    pub no_backup: bool,

    /// What to do when shrinking would discard recorded tick data; also
    /// answers an event-state file size outside the tolerated slack
    #[arg(
        long,
        value_enum,
        env = "TICKSHIFT_ON_DATA_LOSS",
        default_value = "prompt"
    )]
    pub on_data_loss: DataLossPolicy,
}

/// Event-state layout selection
#[derive(Debug, Clone, Args)]
pub struct LayoutArgs {
    /// Built-in event-state layout version
    #[arg(long, value_enum, default_value = "v2")]
    pub layout: LayoutPreset,

    /// TOML file overriding the event-state layout constants
    #[arg(long, env = "TICKSHIFT_LAYOUT_CONFIG", conflicts_with = "layout")]
    pub layout_config: Option<PathBuf>,
}

/// Logging verbosity
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    /// Everything
    Trace,
    /// Per-segment detail
    Debug,
    /// Migration summary
    Info,
    /// Only warnings
    Warn,
    /// Only errors
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

/// Output format options for the CLI
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain text output
    Text,
    /// JSON output
    Json,
}

/// Decision taken when a shrink would discard data or an event-state file
/// has an unexpected size
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataLossPolicy {
    /// Abort the migration
    Reject,
    /// Discard the data
    Accept,
    /// Ask on the terminal
    Prompt,
}

/// Event-state layout versions selectable on the command line
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutPreset {
    /// Legacy builds: combined trailer, 512-byte hash state
    V1,
    /// Current builds: split trailer, 448-byte hash state
    V2,
}

impl From<LayoutPreset> for LayoutVersion {
    fn from(preset: LayoutPreset) -> Self {
        match preset {
            LayoutPreset::V1 => Self::V1,
            LayoutPreset::V2 => Self::V2,
        }
    }
}

/// Snapshot kinds accepted by `inspect`
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum InspectKind {
    /// Logger event state
    EventState,
    /// Transaction status
    TxStatus,
}

impl From<InspectKind> for SnapshotKind {
    fn from(kind: InspectKind) -> Self {
        match kind {
            InspectKind::EventState => Self::EventState,
            InspectKind::TxStatus => Self::TxStatus,
        }
    }
}

/// Execute a parsed command line
pub fn run(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    let computors = cli.computors;
    match cli.command {
        Commands::EventState { migration, layout } => {
            commands::migrate::handle_event_state(&migration, &layout, computors, format)
        }
        Commands::TxStatus { migration } => {
            commands::migrate::handle_tx_status(&migration, computors, format)
        }
        Commands::Calc { durations } => commands::calc::handle(&durations, computors, format),
        Commands::Inspect {
            kind,
            path,
            duration,
            layout,
        } => commands::inspect::handle(kind.into(), &path, duration, &layout, computors, format),
    }
}

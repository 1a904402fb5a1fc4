//! Layout migration for tick-indexed ledger node snapshots
//!
#![allow(clippy::doc_markdown)] // Segment names read better without backticks
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::return_self_not_must_use)] // Builder patterns
//! A node persists two snapshots whose size depends on the configured tick
//! duration: the logger event state and the confirmed transaction status.
//! Both embed arrays with one element per tick of the epoch. Changing the
//! tick duration changes the epoch capacity, which changes the length of
//! those arrays and shifts every segment behind them.
//!
//! This crate rewrites a snapshot for a new tick duration without
//! interpreting its content:
//!
//! - [`epoch`]: integer capacity arithmetic
//! - [`layout`]: contiguous segment tables
//! - [`extract`], [`resize`], [`assemble`], [`verify`]: the pipeline stages
//! - [`format`]: the two snapshot layouts and the versioned event-state
//!   descriptor
//! - [`convert`]: the in-memory pipeline
//! - [`migrate`]: file-level migration with backup and atomic replacement
//! - [`inspect`]: read-only reporting
//!
//! # Example
//!
//! ```no_run
//! use tickshift_formats::{AutoReject, MigrationRequest, TxStatusFormat, migrate_file};
//!
//! let request = MigrationRequest::new("snapshotTxStatusData", 3000, 2000);
//! let _outcome = migrate_file(&TxStatusFormat::default(), &request, &mut AutoReject)?;
//! # Ok::<(), tickshift_formats::SnapshotError>(())
//! ```

#![warn(missing_docs)]

pub mod assemble;
pub mod convert;
pub mod epoch;
pub mod error;
pub mod extract;
/// Snapshot formats and the versioned event-state descriptor
pub mod format;
pub mod inspect;
/// Segment tables
pub mod layout;
pub mod migrate;
pub mod policy;
pub mod resize;
pub mod scalars;
pub mod verify;

pub use convert::{ArrayUsage, Conversion, ConversionReport, convert};
pub use epoch::{EpochParameters, max_ticks_per_epoch};
pub use error::{Result, SnapshotError};
pub use format::{
    EventStateDescriptor, EventStateFormat, LayoutVersion, SnapshotFormat, SnapshotKind,
    TrailerConvention, TxStatusFormat,
};
pub use inspect::{Inspection, inspect, inspect_file};
pub use migrate::{MigrationOutcome, MigrationRequest, migrate_file};
pub use policy::{AutoApprove, AutoReject, Confirmation, ConfirmationPolicy};
pub use resize::{ArrayStats, LossReport};
pub use scalars::{EventStateScalars, ScalarFields, TxStatusScalars};

//! Resolving command-line options into library configuration
//!
//! Options come from CLI arguments, `TICKSHIFT_*` environment variables and,
//! for the event-state layout, an optional TOML file:
//!
//! ```toml
//! version = "v1"
//! hash_state_size = 480
//! size_slack = 4096
//! ```
//!
//! Keys not present in the file keep the value of the named preset.

use crate::{LayoutArgs, MigrationArgs};
use std::path::PathBuf;
use thiserror::Error;
use tickshift_formats::{
    EventStateDescriptor, EventStateFormat, MigrationRequest, SnapshotError, TxStatusFormat,
};
use tracing::debug;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Layout TOML file could not be loaded
    #[error("Failed to load layout config {}: {source}", path.display())]
    LayoutConfig {
        /// File that was read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: SnapshotError,
    },
}

/// Event-state descriptor selected by `args`
pub fn resolve_descriptor(args: &LayoutArgs) -> Result<EventStateDescriptor, ConfigError> {
    let Some(path) = &args.layout_config else {
        return Ok(EventStateDescriptor::preset(args.layout.into()));
    };
    let descriptor =
        EventStateDescriptor::load(path).map_err(|source| ConfigError::LayoutConfig {
            path: path.clone(),
            source,
        })?;
    debug!(path = %path.display(), ?descriptor, "Loaded layout config");
    Ok(descriptor)
}

/// Event-state format for `args`
pub fn event_state_format(
    args: &LayoutArgs,
    computors: u64,
) -> Result<EventStateFormat, ConfigError> {
    Ok(EventStateFormat::new(resolve_descriptor(args)?).with_computors(computors))
}

/// Tx-status format for the configured computor count
pub fn tx_status_format(computors: u64) -> TxStatusFormat {
    TxStatusFormat::with_computors(computors)
}

/// Migration request described by `args`
pub fn migration_request(args: &MigrationArgs) -> MigrationRequest {
    let mut request = MigrationRequest::new(&args.path, args.old_duration, args.new_duration);
    if let Some(output) = &args.output {
        request = request.with_output(output);
    }
    if args.no_backup {
        request = request.without_backup();
    }
    request
}

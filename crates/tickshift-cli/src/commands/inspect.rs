//! `tickshift inspect`

use crate::{LayoutArgs, OutputFormat, config, output};
use anyhow::Context;
use std::path::Path;
use tickshift_formats::{SnapshotFormat, SnapshotKind, inspect_file};

fn run<F: SnapshotFormat>(
    format: &F,
    path: &Path,
    duration_ms: u64,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let inspection = inspect_file(format, path, duration_ms).with_context(|| {
        format!("Failed to inspect {} snapshot {}", format.kind(), path.display())
    })?;
    output::inspection(&mut std::io::stdout().lock(), &inspection, output_format)?;
    Ok(())
}

/// Print layout, scalars and tick usage of a snapshot
pub fn handle(
    kind: SnapshotKind,
    path: &Path,
    duration_ms: u64,
    layout: &LayoutArgs,
    computors: u64,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    match kind {
        SnapshotKind::EventState => {
            let format = config::event_state_format(layout, computors)?;
            run(&format, path, duration_ms, output_format)
        }
        SnapshotKind::TxStatus => run(
            &config::tx_status_format(computors),
            path,
            duration_ms,
            output_format,
        ),
    }
}

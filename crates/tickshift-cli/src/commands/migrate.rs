//! `tickshift event-state` and `tickshift tx-status`

use crate::{LayoutArgs, MigrationArgs, OutputFormat, config, output, policy};
use anyhow::Context;
use tickshift_formats::{SnapshotFormat, migrate_file};
use tracing::info;

fn run<F: SnapshotFormat>(
    format: &F,
    args: &MigrationArgs,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let request = config::migration_request(args);
    info!(
        kind = %format.kind(),
        path = %request.input.display(),
        target = %request.target().display(),
        "Starting migration"
    );

    let mut policy = policy::from_choice(args.on_data_loss);
    let outcome = migrate_file(format, &request, policy.as_mut()).with_context(|| {
        format!(
            "Failed to migrate {} snapshot {}",
            format.kind(),
            args.path.display()
        )
    })?;

    output::migration(&mut std::io::stdout().lock(), &outcome, output_format)?;
    Ok(())
}

/// Migrate an event-state snapshot
pub fn handle_event_state(
    args: &MigrationArgs,
    layout: &LayoutArgs,
    computors: u64,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let format = config::event_state_format(layout, computors)?;
    run(&format, args, output_format)
}

/// Migrate a tx-status snapshot
pub fn handle_tx_status(
    args: &MigrationArgs,
    computors: u64,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    run(&config::tx_status_format(computors), args, output_format)
}

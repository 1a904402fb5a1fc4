//! `tickshift calc`

use crate::OutputFormat;
use crate::output::{self, CapacityRow};
use anyhow::Context;
use tickshift_formats::epoch::{SECONDS_PER_WEEK, TICKS_TO_KEEP_FROM_PRIOR_EPOCH};
use tickshift_formats::max_ticks_per_epoch;

/// Capacity table rows for `durations`
pub fn rows(durations: &[u64], computors: u64) -> anyhow::Result<Vec<CapacityRow>> {
    durations
        .iter()
        .map(|&tick_duration_ms| {
            let max_ticks_per_epoch = max_ticks_per_epoch(tick_duration_ms, computors)
                .with_context(|| format!("tick duration {tick_duration_ms} ms"))?;
            Ok(CapacityRow {
                tick_duration_ms,
                ticks_per_week: SECONDS_PER_WEEK / (tick_duration_ms / 1000),
                max_ticks_per_epoch,
                tx_status_capacity: max_ticks_per_epoch + TICKS_TO_KEEP_FROM_PRIOR_EPOCH,
            })
        })
        .collect()
}

/// Print the capacity table
pub fn handle(durations: &[u64], computors: u64, format: OutputFormat) -> anyhow::Result<()> {
    let rows = rows(durations, computors)?;
    output::capacity_table(&mut std::io::stdout().lock(), &rows, format)?;
    Ok(())
}

//! Rendering command results as text or JSON
//!
//! Everything here writes to a caller-supplied writer; command handlers pass
//! stdout. Logging goes to stderr and never mixes with this output.

use crate::OutputFormat;
use serde::Serialize;
use std::io::{self, Write};
use tickshift_formats::inspect::Inspection;
use tickshift_formats::{ArrayStats, MigrationOutcome, ScalarFields};

/// One row of the capacity table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapacityRow {
    /// Tick duration in milliseconds
    pub tick_duration_ms: u64,
    /// Ticks in a week at that duration
    pub ticks_per_week: u64,
    /// Rounded epoch capacity
    pub max_ticks_per_epoch: u64,
    /// Tx-status array capacity including carried-over ticks
    pub tx_status_capacity: u64,
}

/// Write `value` as pretty JSON followed by a newline
pub fn write_json<T: Serialize>(out: &mut impl Write, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}

fn write_stats(out: &mut impl Write, segment: &str, stats: &ArrayStats) -> io::Result<()> {
    let highest = stats
        .highest_used_index
        .map_or_else(|| "none".to_string(), |i| i.to_string());
    writeln!(
        out,
        "  {segment:<22} {:>8} elements, {:>8} non-zero, highest used index {highest}",
        stats.capacity, stats.non_zero_elements
    )
}

/// Render the capacity table
pub fn capacity_table(
    out: &mut impl Write,
    rows: &[CapacityRow],
    format: OutputFormat,
) -> io::Result<()> {
    if format == OutputFormat::Json {
        return write_json(out, &rows);
    }

    writeln!(out, "MAX_NUMBER_OF_TICKS_PER_EPOCH")?;
    writeln!(out, "{}", "=".repeat(60))?;
    writeln!(
        out,
        "{:>10} {:>14} {:>16} {:>16}",
        "ms", "ticks/week", "max ticks", "tx-status cap"
    )?;
    for row in rows {
        writeln!(
            out,
            "{:>10} {:>14} {:>16} {:>16}",
            row.tick_duration_ms, row.ticks_per_week, row.max_ticks_per_epoch, row.tx_status_capacity
        )?;
    }
    Ok(())
}

/// Render a migration outcome
pub fn migration<S: ScalarFields>(
    out: &mut impl Write,
    outcome: &MigrationOutcome<S>,
    format: OutputFormat,
) -> io::Result<()> {
    if format == OutputFormat::Json {
        return write_json(out, outcome);
    }

    match outcome {
        MigrationOutcome::Unchanged { path } => writeln!(
            out,
            "Old and new durations are the same; {} left unchanged",
            path.display()
        ),
        MigrationOutcome::Written {
            path,
            backup,
            old_size,
            new_size,
            report,
        } => {
            writeln!(out, "Migrated {} snapshot {}", report.kind, path.display())?;
            if let Some(backup) = backup {
                writeln!(out, "  backup:        {}", backup.display())?;
            }
            writeln!(
                out,
                "  tick duration: {} ms -> {} ms",
                report.old_parameters.tick_duration_ms(),
                report.new_parameters.tick_duration_ms()
            )?;
            writeln!(
                out,
                "  capacity:      {} -> {} ticks",
                report.old_parameters.capacity(),
                report.new_parameters.capacity()
            )?;
            writeln!(out, "  size:          {old_size} -> {new_size} bytes")?;
            writeln!(out, "  scalars:       {:?}", report.scalars)?;
            for array in &report.arrays {
                write_stats(out, array.segment, &array.stats)?;
                if array.truncates_data() {
                    writeln!(
                        out,
                        "  WARNING: data beyond index {} was discarded",
                        array.new_capacity
                    )?;
                }
            }
            Ok(())
        }
    }
}

/// Render an inspection
pub fn inspection<S: ScalarFields>(
    out: &mut impl Write,
    inspection: &Inspection<S>,
    format: OutputFormat,
) -> io::Result<()> {
    if format == OutputFormat::Json {
        return write_json(out, inspection);
    }

    writeln!(out, "{} snapshot", inspection.kind)?;
    writeln!(
        out,
        "  tick duration: {} ms ({} ticks)",
        inspection.parameters.tick_duration_ms(),
        inspection.parameters.capacity()
    )?;
    writeln!(
        out,
        "  size:          {} bytes (nominal {})",
        inspection.file_size, inspection.nominal_size
    )?;
    writeln!(out, "  scalars:       {:?}", inspection.scalars)?;
    writeln!(out, "Segments:")?;
    for segment in &inspection.layout {
        writeln!(
            out,
            "  {:<22} offset {:>12} length {:>12}",
            segment.name, segment.offset, segment.length
        )?;
    }
    writeln!(out, "Tick arrays:")?;
    for array in &inspection.arrays {
        write_stats(out, array.segment, &array.stats)?;
    }
    Ok(())
}

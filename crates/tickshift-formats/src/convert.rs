//! In-memory conversion pipeline
//!
//! `convert` runs the whole migration on a byte buffer:
//!
//! 1. derive epoch parameters for the old and new durations
//! 2. check the buffer against the size predicted for the old duration
//! 3. slice the buffer along the source layout
//! 4. resize every tick-indexed array to the new capacity, asking the
//!    policy at most once for all arrays that would lose data
//! 5. concatenate segments along the target layout
//! 6. verify size and trailing scalars
//!
//! No I/O happens here; see [`crate::migrate`] for the file-level wrapper.

use crate::assemble::assemble;
use crate::epoch::EpochParameters;
use crate::error::{Result, SnapshotError};
use crate::extract::{SizeCheck, SizeVerdict, extract};
use crate::format::{SnapshotFormat, SnapshotKind};
use crate::policy::{Confirmation, ConfirmationPolicy};
use crate::resize::{ArrayStats, confirm_loss, resize_confirmed, scan_discarded};
use crate::scalars::ScalarFields;
use crate::verify::verify;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Usage of one tick-indexed array before migration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArrayUsage {
    /// Segment name
    pub segment: &'static str,
    /// Bytes per element
    pub element_size: usize,
    /// Statistics over the old array
    pub stats: ArrayStats,
    /// Element count after migration
    pub new_capacity: usize,
}

impl ArrayUsage {
    /// Whether recorded data lies beyond the new capacity
    pub fn truncates_data(&self) -> bool {
        self.stats.exceeds(self.new_capacity)
    }
}

/// Summary of a successful conversion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionReport<S> {
    /// Snapshot kind converted
    pub kind: SnapshotKind,
    /// Parameters the input was written with
    pub old_parameters: EpochParameters,
    /// Parameters of the output
    pub new_parameters: EpochParameters,
    /// Input size in bytes
    pub old_size: usize,
    /// Output size in bytes
    pub new_size: usize,
    /// Trailing scalars, identical before and after
    pub scalars: S,
    /// Per-array usage
    pub arrays: Vec<ArrayUsage>,
}

/// Converted buffer and its report
#[derive(Debug, Clone)]
pub struct Conversion<S> {
    /// Verified output bytes
    pub bytes: Vec<u8>,
    /// What was done
    pub report: ConversionReport<S>,
}

/// Compare the input size with the size predicted for `params`
///
/// Exact formats fail on any difference. Tolerant formats warn inside the
/// slack window and ask `policy` beyond it.
pub fn check_size<F: SnapshotFormat>(
    format: &F,
    params: &EpochParameters,
    actual: usize,
    policy: &mut dyn ConfirmationPolicy,
) -> Result<()> {
    let kind = format.kind();
    let expected = format.nominal_size(params)?;
    let check = format.size_check();
    let mismatch = || SnapshotError::LayoutMismatch {
        context: format!("{kind} file"),
        expected,
        actual,
    };

    match check.evaluate(expected, actual) {
        SizeVerdict::Exact => Ok(()),
        SizeVerdict::WithinSlack { difference } => {
            warn!(%kind, expected, actual, difference, "File size differs from nominal size");
            Ok(())
        }
        SizeVerdict::Mismatch { .. } if check == SizeCheck::Exact => Err(mismatch()),
        SizeVerdict::Mismatch { difference } => {
            if !policy.confirm(&Confirmation::SizeMismatch {
                kind,
                expected,
                actual,
            }) {
                return Err(mismatch());
            }
            warn!(%kind, expected, actual, difference, "Proceeding despite size mismatch");
            Ok(())
        }
    }
}

/// Convert a snapshot buffer from `old_duration_ms` to `new_duration_ms`
///
/// # Errors
///
/// - `InvalidParameter` for unusable durations
/// - `LayoutMismatch` when the buffer does not fit the old layout
/// - `DataLossRisk` when a shrink would drop data and `policy` declines
/// - `VerificationFailure` when the assembled buffer fails its cross-check
pub fn convert<F: SnapshotFormat>(
    format: &F,
    data: &[u8],
    old_duration_ms: u64,
    new_duration_ms: u64,
    policy: &mut dyn ConfirmationPolicy,
) -> Result<Conversion<F::Scalars>> {
    let kind = format.kind();
    let old_parameters = format.parameters(old_duration_ms)?;
    let new_parameters = format.parameters(new_duration_ms)?;
    info!(
        %kind,
        old_duration_ms,
        new_duration_ms,
        old_capacity = old_parameters.capacity(),
        new_capacity = new_parameters.capacity(),
        "Converting snapshot"
    );

    check_size(format, &old_parameters, data.len(), policy)?;

    let source = format.source_layout(&old_parameters, data.len())?;
    let segments = extract(data, &source)?;
    let scalar_segment = source.trailing_scalars().ok_or_else(|| {
        SnapshotError::invalid("layout", format!("{kind} layout has no trailing scalar block"))
    })?;
    if scalar_segment.length != <F::Scalars as ScalarFields>::SIZE {
        return Err(SnapshotError::LayoutMismatch {
            context: format!("segment '{}'", scalar_segment.name),
            expected: <F::Scalars as ScalarFields>::SIZE,
            actual: scalar_segment.length,
        });
    }
    let scalars = <F::Scalars as ScalarFields>::decode(&data[scalar_segment.range()])?;
    debug!(?scalars, offset = scalar_segment.offset, "Decoded trailing scalars");

    let target = format.target_layout(&source, &new_parameters)?;

    let mut arrays = Vec::new();
    let mut losses = Vec::new();
    for segment in source.tick_arrays() {
        let Some(element_size) = segment.element_size() else {
            continue;
        };
        let new_capacity = target
            .get(segment.name)
            .and_then(|s| s.capacity())
            .ok_or_else(|| {
                SnapshotError::invalid(
                    "layout",
                    format!("target layout lacks array '{}'", segment.name),
                )
            })?;
        let bytes = &data[segment.range()];

        let usage = ArrayUsage {
            segment: segment.name,
            element_size,
            stats: ArrayStats::of(bytes, element_size),
            new_capacity,
        };
        info!(
            segment = usage.segment,
            non_zero = usage.stats.non_zero_elements,
            highest_used = ?usage.stats.highest_used_index,
            "Tick array usage"
        );
        if usage.truncates_data() {
            warn!(
                segment = usage.segment,
                new_capacity, "Highest used tick index exceeds new capacity"
            );
        }
        losses.extend(scan_discarded(segment.name, bytes, element_size, new_capacity));
        arrays.push(usage);
    }

    // one decision covers every array of the file
    confirm_loss(&losses, policy)?;

    let mut resized = BTreeMap::new();
    for segment in source.tick_arrays() {
        let (Some(element_size), Some(old_capacity)) = (segment.element_size(), segment.capacity())
        else {
            continue;
        };
        let Some(usage) = arrays.iter().find(|usage| usage.segment == segment.name) else {
            continue;
        };
        let new_bytes = resize_confirmed(
            segment.name,
            &data[segment.range()],
            old_capacity,
            usage.new_capacity,
            element_size,
        )?;
        resized.insert(segment.name, new_bytes);
    }

    let assembled = assemble(&target, &segments, &resized)?;
    let scalars = verify(&assembled.bytes, assembled.expected_size, &scalars)?;

    if old_parameters.capacity() == new_parameters.capacity() {
        info!(%kind, "Capacity unchanged, output is identical to input");
    }
    info!(
        %kind,
        old_size = data.len(),
        new_size = assembled.bytes.len(),
        "Conversion verified"
    );

    Ok(Conversion {
        report: ConversionReport {
            kind,
            old_parameters,
            new_parameters,
            old_size: data.len(),
            new_size: assembled.bytes.len(),
            scalars,
            arrays,
        },
        bytes: assembled.bytes,
    })
}

//! Read-only snapshot inspection

use crate::epoch::EpochParameters;
use crate::error::{Result, SnapshotError};
use crate::extract::extract;
use crate::format::{SnapshotFormat, SnapshotKind};
use crate::layout::SegmentLayout;
use crate::migrate::read_snapshot;
use crate::resize::ArrayStats;
use crate::scalars::ScalarFields;
use serde::Serialize;
use std::path::Path;

/// Usage of one tick-indexed array
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArrayInspection {
    /// Segment name
    pub segment: &'static str,
    /// Bytes per element
    pub element_size: usize,
    /// Element statistics
    pub stats: ArrayStats,
}

/// Everything known about a snapshot without modifying it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inspection<S> {
    /// Snapshot kind
    pub kind: SnapshotKind,
    /// Parameters the file is assumed to be written with
    pub parameters: EpochParameters,
    /// Actual size in bytes
    pub file_size: usize,
    /// Size predicted from nominal constants
    pub nominal_size: usize,
    /// Segment table fitted to the file
    pub layout: SegmentLayout,
    /// Decoded trailing scalars
    pub scalars: S,
    /// Per-array usage
    pub arrays: Vec<ArrayInspection>,
}

/// Inspect a snapshot buffer assumed to be written with `duration_ms`
pub fn inspect<F: SnapshotFormat>(
    format: &F,
    data: &[u8],
    duration_ms: u64,
) -> Result<Inspection<F::Scalars>> {
    let parameters = format.parameters(duration_ms)?;
    let nominal_size = format.nominal_size(&parameters)?;
    let layout = format.source_layout(&parameters, data.len())?;
    let segments = extract(data, &layout)?;

    let scalar_segment = layout
        .trailing_scalars()
        .ok_or_else(|| SnapshotError::invalid("layout", "no trailing scalar block"))?;
    let scalars = segments
        .get(scalar_segment.name)
        .map(<F::Scalars as ScalarFields>::decode)
        .transpose()?
        .ok_or_else(|| SnapshotError::invalid("layout", "scalar block not extracted"))?;

    let arrays = layout
        .tick_arrays()
        .filter_map(|segment| {
            let element_size = segment.element_size()?;
            let bytes = segments.get(segment.name)?;
            Some(ArrayInspection {
                segment: segment.name,
                element_size,
                stats: ArrayStats::of(bytes, element_size),
            })
        })
        .collect();

    Ok(Inspection {
        kind: format.kind(),
        parameters,
        file_size: data.len(),
        nominal_size,
        scalars,
        arrays,
        layout,
    })
}

/// Read and inspect a snapshot file
pub fn inspect_file<F: SnapshotFormat>(
    format: &F,
    path: &Path,
    duration_ms: u64,
) -> Result<Inspection<F::Scalars>> {
    let data = read_snapshot(path)?;
    inspect(format, &data, duration_ms)
}

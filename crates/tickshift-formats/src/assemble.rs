//! Reassembling a file from extracted and resized segments

use crate::error::{Result, SnapshotError};
use crate::extract::ExtractedSegments;
use crate::layout::SegmentLayout;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Output buffer together with the size the target layout predicts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembled {
    /// Concatenated segments
    pub bytes: Vec<u8>,
    /// Size computed from the target layout alone
    pub expected_size: usize,
}

/// Concatenate segments in `target` order
///
/// Tick-indexed segments are taken from `resized`; every other segment is
/// copied verbatim from `source`. Piece lengths are not trusted here: the
/// verifier compares the result against `expected_size`.
pub fn assemble(
    target: &SegmentLayout,
    source: &ExtractedSegments<'_>,
    resized: &BTreeMap<&'static str, Vec<u8>>,
) -> Result<Assembled> {
    let expected_size = target.total_size();
    let mut bytes = Vec::with_capacity(expected_size);

    for segment in target {
        let piece = if segment.is_tick_indexed() {
            resized.get(segment.name).map(Vec::as_slice)
        } else {
            source.get(segment.name)
        };
        let piece = piece.ok_or_else(|| {
            SnapshotError::invalid(
                "layout",
                format!("no data available for segment '{}'", segment.name),
            )
        })?;

        if piece.len() == segment.length {
            debug!(
                segment = segment.name,
                offset = bytes.len(),
                length = piece.len(),
                "Copied segment"
            );
        } else {
            warn!(
                segment = segment.name,
                expected = segment.length,
                actual = piece.len(),
                "Segment length differs from target layout"
            );
        }
        bytes.extend_from_slice(piece);
    }

    Ok(Assembled {
        bytes,
        expected_size,
    })
}

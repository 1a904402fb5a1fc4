//! Slicing a file buffer into its named segments

use crate::error::{Result, SnapshotError};
use crate::layout::SegmentLayout;

/// How strictly a file's size must match the size its layout predicts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeCheck {
    /// Sizes must be equal
    Exact,
    /// Differences up to `slack` bytes only produce a warning
    Tolerant {
        /// Largest difference accepted without confirmation
        slack: usize,
    },
}

/// Outcome of comparing a file size with a predicted size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeVerdict {
    /// Sizes are equal
    Exact,
    /// Sizes differ by at most the tolerated slack
    WithinSlack {
        /// Absolute difference in bytes
        difference: usize,
    },
    /// Sizes differ by more than the check allows
    Mismatch {
        /// Absolute difference in bytes
        difference: usize,
    },
}

impl SizeCheck {
    /// Compare an actual size against an expected one
    pub fn evaluate(self, expected: usize, actual: usize) -> SizeVerdict {
        let difference = expected.abs_diff(actual);
        match self {
            _ if difference == 0 => SizeVerdict::Exact,
            Self::Tolerant { slack } if difference <= slack => {
                SizeVerdict::WithinSlack { difference }
            }
            _ => SizeVerdict::Mismatch { difference },
        }
    }
}

/// Borrowed views of every segment of a file, in layout order
#[derive(Debug)]
pub struct ExtractedSegments<'a> {
    entries: Vec<(&'static str, &'a [u8])>,
}

impl<'a> ExtractedSegments<'a> {
    /// Bytes of the named segment
    pub fn get(&self, name: &str) -> Option<&'a [u8]> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, bytes)| *bytes)
    }

    /// Iterate `(name, bytes)` pairs in file order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'a [u8])> + '_ {
        self.entries.iter().copied()
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no segments were extracted
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Slice `data` according to `layout`
///
/// The layout must describe exactly `data.len()` bytes. Size tolerance is
/// applied earlier, when the layout itself is chosen.
pub fn extract<'a>(data: &'a [u8], layout: &SegmentLayout) -> Result<ExtractedSegments<'a>> {
    if layout.total_size() != data.len() {
        return Err(SnapshotError::LayoutMismatch {
            context: "segment table".to_string(),
            expected: layout.total_size(),
            actual: data.len(),
        });
    }

    let entries = layout
        .iter()
        .map(|segment| (segment.name, &data[segment.range()]))
        .collect();

    Ok(ExtractedSegments { entries })
}

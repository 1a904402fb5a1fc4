//! Named byte ranges within a snapshot file

use serde::Serialize;
use std::ops::Range;

/// How a segment's bytes are treated during migration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SegmentKind {
    /// Copied verbatim, never interpreted
    Opaque,
    /// Array with one fixed-size element per tick, resized on migration
    TickIndexedArray {
        /// Bytes per element
        element_size: usize,
    },
    /// Small block of integer fields, copied verbatim
    ScalarBlock,
}

/// A contiguous, named byte range of a snapshot file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    /// Segment name, unique within a layout
    pub name: &'static str,
    /// Offset from the start of the file
    pub offset: usize,
    /// Length in bytes
    pub length: usize,
    /// Migration treatment
    pub kind: SegmentKind,
}

impl Segment {
    /// Byte range covered by this segment
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.length
    }

    /// Offset one past the last byte
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    /// Element size for tick-indexed arrays
    pub fn element_size(&self) -> Option<usize> {
        match self.kind {
            SegmentKind::TickIndexedArray { element_size } => Some(element_size),
            _ => None,
        }
    }

    /// Element count for tick-indexed arrays
    pub fn capacity(&self) -> Option<usize> {
        self.element_size().map(|size| self.length / size)
    }

    /// Whether the segment is resized on migration
    pub fn is_tick_indexed(&self) -> bool {
        matches!(self.kind, SegmentKind::TickIndexedArray { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_geometry() {
        let segment = Segment {
            name: "digests",
            offset: 64,
            length: 32 * 10,
            kind: SegmentKind::TickIndexedArray { element_size: 32 },
        };
        assert_eq!(segment.range(), 64..384);
        assert_eq!(segment.end(), 384);
        assert_eq!(segment.capacity(), Some(10));
        assert!(segment.is_tick_indexed());

        let opaque = Segment {
            name: "hash_state",
            offset: 0,
            length: 448,
            kind: SegmentKind::Opaque,
        };
        assert_eq!(opaque.capacity(), None);
        assert!(!opaque.is_tick_indexed());
    }
}

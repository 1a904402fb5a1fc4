//! Ordered, contiguous segment tables

use crate::error::{Result, SnapshotError};
use crate::layout::segment::{Segment, SegmentKind};
use serde::Serialize;

/// Ordered sequence of contiguous, non-overlapping segments
///
/// Segment `i + 1` starts exactly where segment `i` ends and the first
/// segment starts at offset 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentLayout {
    segments: Vec<Segment>,
}

impl SegmentLayout {
    /// All segments in file order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Iterate segments in file order
    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.segments.iter()
    }

    /// Look up a segment by name
    pub fn get(&self, name: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.name == name)
    }

    /// Total file size described by this layout
    pub fn total_size(&self) -> usize {
        self.segments.last().map_or(0, Segment::end)
    }

    /// Segments resized on migration
    pub fn tick_arrays(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter().filter(|s| s.is_tick_indexed())
    }

    /// The scalar block that ends the file, if the layout has one
    pub fn trailing_scalars(&self) -> Option<&Segment> {
        self.segments
            .last()
            .filter(|s| s.kind == SegmentKind::ScalarBlock)
    }

    /// Check contiguity and name uniqueness
    pub fn validate(&self) -> Result<()> {
        let mut expected_offset = 0usize;
        for (i, segment) in self.segments.iter().enumerate() {
            if segment.offset != expected_offset {
                return Err(SnapshotError::LayoutMismatch {
                    context: format!("offset of segment '{}'", segment.name),
                    expected: expected_offset,
                    actual: segment.offset,
                });
            }
            if let Some(size) = segment.element_size()
                && (size == 0 || segment.length % size != 0)
            {
                return Err(SnapshotError::invalid(
                    "layout",
                    format!(
                        "segment '{}' length {} is not a multiple of element size {}",
                        segment.name, segment.length, size
                    ),
                ));
            }
            if self.segments[..i].iter().any(|s| s.name == segment.name) {
                return Err(SnapshotError::invalid(
                    "layout",
                    format!("duplicate segment name '{}'", segment.name),
                ));
            }
            expected_offset = segment.end();
        }
        Ok(())
    }

    /// Same layout with every tick-indexed array holding `capacity` elements
    ///
    /// Opaque and scalar segments keep their lengths; offsets shift.
    pub fn resized(&self, capacity: usize) -> Result<Self> {
        let mut builder = LayoutBuilder::new();
        for segment in &self.segments {
            builder = match segment.kind {
                SegmentKind::TickIndexedArray { element_size } => {
                    builder.tick_array(segment.name, capacity, element_size)
                }
                kind => builder.push(segment.name, segment.length, kind),
            };
        }
        builder.build()
    }
}

impl<'a> IntoIterator for &'a SegmentLayout {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Builder that assigns offsets as segments are appended
#[derive(Debug, Default)]
pub struct LayoutBuilder {
    segments: Vec<Segment>,
    cursor: usize,
    overflow: Option<&'static str>,
}

impl LayoutBuilder {
    /// Create an empty builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a segment of the given kind and length
    #[must_use]
    pub fn push(mut self, name: &'static str, length: usize, kind: SegmentKind) -> Self {
        if self.overflow.is_some() {
            return self;
        }
        let Some(end) = self.cursor.checked_add(length) else {
            self.overflow = Some(name);
            return self;
        };
        self.segments.push(Segment {
            name,
            offset: self.cursor,
            length,
            kind,
        });
        self.cursor = end;
        self
    }

    /// Append an opaque block
    #[must_use]
    pub fn opaque(self, name: &'static str, length: usize) -> Self {
        self.push(name, length, SegmentKind::Opaque)
    }

    /// Append a scalar block
    #[must_use]
    pub fn scalar_block(self, name: &'static str, length: usize) -> Self {
        self.push(name, length, SegmentKind::ScalarBlock)
    }

    /// Append a tick-indexed array of `capacity` elements
    #[must_use]
    pub fn tick_array(mut self, name: &'static str, capacity: usize, element_size: usize) -> Self {
        match capacity.checked_mul(element_size) {
            Some(length) => self.push(
                name,
                length,
                SegmentKind::TickIndexedArray { element_size },
            ),
            None => {
                self.overflow.get_or_insert(name);
                self
            }
        }
    }

    /// Finish the layout
    pub fn build(self) -> Result<SegmentLayout> {
        if let Some(name) = self.overflow {
            return Err(SnapshotError::invalid(
                "layout",
                format!("size of segment '{name}' overflows the address space"),
            ));
        }
        let layout = SegmentLayout {
            segments: self.segments,
        };
        layout.validate()?;
        Ok(layout)
    }
}

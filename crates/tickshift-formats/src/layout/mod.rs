//! Segment layouts for snapshot files
//!
//! A layout is an ordered table of named byte ranges. Each segment is one of:
//!
//! - **Opaque**: copied byte-for-byte (VM dumps, hash state)
//! - **TickIndexedArray**: one fixed-size element per tick; the only kind
//!   whose length depends on the tick duration
//! - **ScalarBlock**: small integer fields, copied byte-for-byte; only their
//!   position moves when arrays before them are resized
//!
//! Layouts are built with [`LayoutBuilder`], which assigns offsets so the
//! contiguity invariant holds by construction.

pub mod segment;
pub mod table;

pub use segment::{Segment, SegmentKind};
pub use table::{LayoutBuilder, SegmentLayout};

//! Snapshot file formats
//!
//! A node persists two snapshots whose shape depends on the epoch capacity:
//!
//! - **event-state**: three VM dumps with trailers, the per-tick digest
//!   array, a serialized hash state and the logger variables
//! - **tx-status**: two per-tick counter arrays followed by the epoch begin
//!   ticks
//!
//! Each format describes its layout through [`SnapshotFormat`]; the
//! conversion pipeline in [`crate::convert`] is shared.

mod descriptor;
mod event_state;
mod tx_status;

pub use descriptor::{EventStateDescriptor, LayoutVersion, TrailerConvention};
pub use event_state::{DIGESTS, EventStateFormat, HASH_STATE, VARIABLES};
pub use tx_status::{EPOCH_BEGIN_TICKS, TICK_TX_COUNTER, TICK_TX_INDEX_START, TxStatusFormat};

use crate::epoch::EpochParameters;
use crate::error::Result;
use crate::extract::SizeCheck;
use crate::layout::SegmentLayout;
use crate::scalars::ScalarFields;
use serde::Serialize;
use std::fmt;

/// The two snapshot kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SnapshotKind {
    /// Logger event state
    EventState,
    /// Confirmed transaction status
    TxStatus,
}

impl SnapshotKind {
    /// File name the node uses for this snapshot
    pub const fn default_file_name(self) -> &'static str {
        match self {
            Self::EventState => "logEventState.db",
            Self::TxStatus => "snapshotTxStatusData",
        }
    }
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EventState => write!(f, "event-state"),
            Self::TxStatus => write!(f, "tx-status"),
        }
    }
}

/// Shape of one snapshot kind as a function of the tick duration
pub trait SnapshotFormat {
    /// Scalar block that ends the file
    type Scalars: ScalarFields;

    /// Which snapshot this is
    fn kind(&self) -> SnapshotKind;

    /// Epoch parameters for a tick duration
    fn parameters(&self, tick_duration_ms: u64) -> Result<EpochParameters>;

    /// File size predicted for `params` with nominal constants
    fn nominal_size(&self, params: &EpochParameters) -> Result<usize>;

    /// How closely a file must match [`Self::nominal_size`]
    fn size_check(&self) -> SizeCheck;

    /// Layout of an existing file of `file_size` bytes written with `params`
    fn source_layout(&self, params: &EpochParameters, file_size: usize) -> Result<SegmentLayout>;

    /// Layout the migrated file will have
    ///
    /// Only tick-indexed arrays change length. Segments whose size was
    /// derived from the source file keep that size.
    fn target_layout(
        &self,
        source: &SegmentLayout,
        params: &EpochParameters,
    ) -> Result<SegmentLayout> {
        source.resized(params.capacity_elements()?)
    }
}

//! Transaction-status snapshot
//!
//! ```text
//! [capacity x u32 tick_tx_counter]
//! [capacity x u32 tick_tx_index_start]
//! [u32 previous epoch begin tick][u32 current epoch begin tick]
//! ```
//!
//! `capacity` includes the ticks kept from the prior epoch. The file must
//! match the predicted size exactly: a misaligned counter array would be
//! silently misread.

use super::{SnapshotFormat, SnapshotKind};
use crate::epoch::{EpochParameters, NUMBER_OF_COMPUTORS, TICKS_TO_KEEP_FROM_PRIOR_EPOCH};
use crate::error::Result;
use crate::extract::SizeCheck;
use crate::layout::{LayoutBuilder, SegmentLayout};
use crate::scalars::{ScalarFields, TxStatusScalars};

/// Per-tick confirmed transaction counts
pub const TICK_TX_COUNTER: &str = "tick_tx_counter";
/// Per-tick index of the first confirmed transaction
pub const TICK_TX_INDEX_START: &str = "tick_tx_index_start";
/// Trailing epoch begin ticks
pub const EPOCH_BEGIN_TICKS: &str = "epoch_begin_ticks";

/// Transaction-status snapshot format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxStatusFormat {
    number_of_computors: u64,
    ticks_to_keep_from_prior_epoch: u64,
}

impl TxStatusFormat {
    /// Format with a custom computor count
    pub const fn with_computors(number_of_computors: u64) -> Self {
        Self {
            number_of_computors,
            ticks_to_keep_from_prior_epoch: TICKS_TO_KEEP_FROM_PRIOR_EPOCH,
        }
    }

    fn layout(params: &EpochParameters) -> Result<SegmentLayout> {
        let capacity = params.capacity_elements()?;
        LayoutBuilder::new()
            .tick_array(TICK_TX_COUNTER, capacity, 4)
            .tick_array(TICK_TX_INDEX_START, capacity, 4)
            .scalar_block(EPOCH_BEGIN_TICKS, TxStatusScalars::SIZE)
            .build()
    }
}

impl Default for TxStatusFormat {
    fn default() -> Self {
        Self::with_computors(NUMBER_OF_COMPUTORS)
    }
}

impl SnapshotFormat for TxStatusFormat {
    type Scalars = TxStatusScalars;

    fn kind(&self) -> SnapshotKind {
        SnapshotKind::TxStatus
    }

    fn parameters(&self, tick_duration_ms: u64) -> Result<EpochParameters> {
        EpochParameters::new(
            tick_duration_ms,
            self.number_of_computors,
            self.ticks_to_keep_from_prior_epoch,
        )
    }

    fn nominal_size(&self, params: &EpochParameters) -> Result<usize> {
        Ok(Self::layout(params)?.total_size())
    }

    fn size_check(&self) -> SizeCheck {
        SizeCheck::Exact
    }

    fn source_layout(&self, params: &EpochParameters, _file_size: usize) -> Result<SegmentLayout> {
        Self::layout(params)
    }
}

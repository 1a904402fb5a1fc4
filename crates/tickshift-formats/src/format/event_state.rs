//! Logger event-state snapshot
//!
//! ```text
//! [log buffer dump][trailer]
//! [log-id map dump][trailer]
//! [tx map dump][trailer]
//! [max_ticks x digest]
//! [hash state]
//! [variables]
//! ```
//!
//! The digest array holds no ticks from the prior epoch. The hash state is
//! a serialized hasher whose size changes between builds, so it is sized
//! from the file: whatever is left after every other segment.

use super::descriptor::{EventStateDescriptor, TrailerConvention};
use super::{SnapshotFormat, SnapshotKind};
use crate::epoch::{EpochParameters, NUMBER_OF_COMPUTORS};
use crate::error::{Result, SnapshotError};
use crate::extract::SizeCheck;
use crate::layout::{LayoutBuilder, SegmentLayout};
use tracing::debug;

/// Per-tick digests
pub const DIGESTS: &str = "digests";
/// Serialized hash state
pub const HASH_STATE: &str = "hash_state";
/// Trailing logger variables
pub const VARIABLES: &str = "variables";

struct VmDump {
    name: &'static str,
    trailer: &'static str,
    counters: [&'static str; 2],
}

const LOG_BUFFER: VmDump = VmDump {
    name: "log_buffer",
    trailer: "log_buffer.trailer",
    counters: ["log_buffer.counter_0", "log_buffer.counter_1"],
};

const MAP_LOG_ID: VmDump = VmDump {
    name: "map_log_id",
    trailer: "map_log_id.trailer",
    counters: ["map_log_id.counter_0", "map_log_id.counter_1"],
};

const MAP_TX: VmDump = VmDump {
    name: "map_tx",
    trailer: "map_tx.trailer",
    counters: ["map_tx.counter_0", "map_tx.counter_1"],
};

/// Event-state snapshot format for one layout version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventStateFormat {
    descriptor: EventStateDescriptor,
    number_of_computors: u64,
}

impl EventStateFormat {
    /// Format using `descriptor` and the default computor count
    pub fn new(descriptor: EventStateDescriptor) -> Self {
        Self {
            descriptor,
            number_of_computors: NUMBER_OF_COMPUTORS,
        }
    }

    /// Override the computor count
    #[must_use]
    pub fn with_computors(mut self, number_of_computors: u64) -> Self {
        self.number_of_computors = number_of_computors;
        self
    }

    /// Layout constants in use
    pub fn descriptor(&self) -> &EventStateDescriptor {
        &self.descriptor
    }

    fn dump(&self, builder: LayoutBuilder, dump: &VmDump, size: usize) -> LayoutBuilder {
        let builder = builder.opaque(dump.name, size);
        match self.descriptor.trailer {
            TrailerConvention::Combined => {
                builder.opaque(dump.trailer, self.descriptor.trailer.size())
            }
            TrailerConvention::Split => {
                let half = self.descriptor.trailer.size() / 2;
                builder
                    .scalar_block(dump.counters[0], half)
                    .scalar_block(dump.counters[1], half)
            }
        }
    }

    fn layout(&self, params: &EpochParameters, hash_state_size: usize) -> Result<SegmentLayout> {
        let d = &self.descriptor;
        let builder = self.dump(LayoutBuilder::new(), &LOG_BUFFER, d.log_buffer_size);
        let builder = self.dump(builder, &MAP_LOG_ID, d.map_log_id_size()?);
        let builder = self.dump(builder, &MAP_TX, d.map_tx_size()?);
        builder
            .tick_array(DIGESTS, params.capacity_elements()?, d.digest_size)
            .opaque(HASH_STATE, hash_state_size)
            .scalar_block(VARIABLES, d.variables_size)
            .build()
    }

    /// Size of every segment except the hash state
    pub fn fixed_size(&self, params: &EpochParameters) -> Result<usize> {
        Ok(self.layout(params, 0)?.total_size())
    }
}

impl Default for EventStateFormat {
    fn default() -> Self {
        Self::new(EventStateDescriptor::default())
    }
}

impl SnapshotFormat for EventStateFormat {
    type Scalars = crate::scalars::EventStateScalars;

    fn kind(&self) -> SnapshotKind {
        SnapshotKind::EventState
    }

    fn parameters(&self, tick_duration_ms: u64) -> Result<EpochParameters> {
        EpochParameters::new(tick_duration_ms, self.number_of_computors, 0)
    }

    fn nominal_size(&self, params: &EpochParameters) -> Result<usize> {
        Ok(self.layout(params, self.descriptor.hash_state_size)?.total_size())
    }

    fn size_check(&self) -> SizeCheck {
        SizeCheck::Tolerant {
            slack: self.descriptor.size_slack,
        }
    }

    fn source_layout(&self, params: &EpochParameters, file_size: usize) -> Result<SegmentLayout> {
        let fixed = self.fixed_size(params)?;
        let hash_state_size =
            file_size
                .checked_sub(fixed)
                .ok_or_else(|| SnapshotError::LayoutMismatch {
                    context: "event-state fixed segments".to_string(),
                    expected: fixed,
                    actual: file_size,
                })?;
        debug!(
            hash_state_size,
            nominal = self.descriptor.hash_state_size,
            "Derived hash state size from file"
        );
        self.layout(params, hash_state_size)
    }
}

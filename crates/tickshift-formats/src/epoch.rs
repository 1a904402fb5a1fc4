//! Epoch capacity arithmetic
//!
//! The number of ticks recorded per epoch is derived from the nominal tick
//! duration with integer arithmetic only:
//!
//! ```text
//! ticks_per_week = 604800 / (tick_duration_ms / 1000)
//! max_ticks      = ceil_to_multiple(ticks_per_week, number_of_computors)
//! ```
//!
//! Every division truncates. Sub-second durations truncate to zero seconds
//! and are rejected instead of dividing by zero.

use crate::error::{Result, SnapshotError};
use serde::Serialize;

/// Seconds in one week, the nominal epoch length
pub const SECONDS_PER_WEEK: u64 = 60 * 60 * 24 * 7;

/// Committee size used as the rounding modulus
pub const NUMBER_OF_COMPUTORS: u64 = 676;

/// Extra ticks carried over from the previous epoch by the tx-status snapshot
pub const TICKS_TO_KEEP_FROM_PRIOR_EPOCH: u64 = 100;

/// Compute the maximum number of ticks per epoch for a tick duration
///
/// # Errors
///
/// Returns `InvalidParameter` when the duration is below one second, when
/// the computor count is zero, or when the duration is so long that not a
/// single tick fits into a week.
pub fn max_ticks_per_epoch(tick_duration_ms: u64, number_of_computors: u64) -> Result<u64> {
    if number_of_computors == 0 {
        return Err(SnapshotError::invalid(
            "number_of_computors",
            "must be positive",
        ));
    }

    let tick_duration_seconds = tick_duration_ms / 1000;
    if tick_duration_seconds == 0 {
        return Err(SnapshotError::invalid(
            "tick_duration_ms",
            format!("{tick_duration_ms} ms truncates to 0 seconds (minimum is 1000 ms)"),
        ));
    }

    let ticks_per_week = SECONDS_PER_WEEK / tick_duration_seconds;
    if ticks_per_week == 0 {
        return Err(SnapshotError::invalid(
            "tick_duration_ms",
            format!("{tick_duration_ms} ms leaves no ticks in a week"),
        ));
    }

    Ok(ticks_per_week.div_ceil(number_of_computors) * number_of_computors)
}

/// Immutable epoch sizing parameters for one snapshot file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EpochParameters {
    tick_duration_ms: u64,
    number_of_computors: u64,
    ticks_to_keep_from_prior_epoch: u64,
    max_ticks_per_epoch: u64,
}

impl EpochParameters {
    /// Create parameters, deriving the epoch capacity
    pub fn new(
        tick_duration_ms: u64,
        number_of_computors: u64,
        ticks_to_keep_from_prior_epoch: u64,
    ) -> Result<Self> {
        let max_ticks_per_epoch = max_ticks_per_epoch(tick_duration_ms, number_of_computors)?;
        Ok(Self {
            tick_duration_ms,
            number_of_computors,
            ticks_to_keep_from_prior_epoch,
            max_ticks_per_epoch,
        })
    }

    /// Nominal tick duration in milliseconds
    pub fn tick_duration_ms(&self) -> u64 {
        self.tick_duration_ms
    }

    /// Rounding modulus
    pub fn number_of_computors(&self) -> u64 {
        self.number_of_computors
    }

    /// Ticks retained from the previous epoch
    pub fn ticks_to_keep_from_prior_epoch(&self) -> u64 {
        self.ticks_to_keep_from_prior_epoch
    }

    /// Maximum ticks per epoch
    pub fn max_ticks_per_epoch(&self) -> u64 {
        self.max_ticks_per_epoch
    }

    /// Element count of every tick-indexed array
    pub fn capacity(&self) -> u64 {
        self.max_ticks_per_epoch + self.ticks_to_keep_from_prior_epoch
    }

    /// Capacity as an in-memory element count
    pub fn capacity_elements(&self) -> Result<usize> {
        usize::try_from(self.capacity()).map_err(|_| {
            SnapshotError::invalid(
                "tick_duration_ms",
                format!("capacity {} does not fit in memory", self.capacity()),
            )
        })
    }
}

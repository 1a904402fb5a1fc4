//! Decisions the migration cannot make on its own
//!
//! Discarding non-zero tick data and accepting an unexpectedly sized
//! event-state file both require an explicit decision. The conversion asks
//! a [`ConfirmationPolicy`] instead of reading from a terminal, so the same
//! code runs unattended, interactively, or under test.

use crate::resize::LossReport;
use crate::SnapshotKind;

/// A question put to the policy
#[derive(Debug, Clone, Copy)]
pub enum Confirmation<'a> {
    /// Shrinking would discard non-zero elements, one report per affected
    /// array; asked once per conversion
    DataLoss(&'a [LossReport]),
    /// File size differs from the size predicted for the old duration
    SizeMismatch {
        /// Snapshot kind being migrated
        kind: SnapshotKind,
        /// Predicted size in bytes
        expected: usize,
        /// Actual size in bytes
        actual: usize,
    },
}

/// Answers confirmation requests raised during conversion
pub trait ConfirmationPolicy {
    /// Return `true` to proceed, `false` to abort
    fn confirm(&mut self, request: &Confirmation<'_>) -> bool;
}

/// Approves every request
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

impl ConfirmationPolicy for AutoApprove {
    fn confirm(&mut self, _request: &Confirmation<'_>) -> bool {
        true
    }
}

/// Rejects every request
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoReject;

impl ConfirmationPolicy for AutoReject {
    fn confirm(&mut self, _request: &Confirmation<'_>) -> bool {
        false
    }
}

impl<F> ConfirmationPolicy for F
where
    F: FnMut(&Confirmation<'_>) -> bool,
{
    fn confirm(&mut self, request: &Confirmation<'_>) -> bool {
        self(request)
    }
}

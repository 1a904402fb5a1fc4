//! Post-assembly verification
//!
//! Nothing is written unless the assembled buffer has exactly the size the
//! target layout predicts and its trailing scalar block, read back from the
//! end of the buffer, decodes to the values observed before migration.

use crate::error::{Result, SnapshotError};
use crate::scalars::ScalarFields;
use tracing::debug;

/// Whether `bytes` has exactly the expected size
pub fn verify_size(bytes: &[u8], expected_size: usize) -> bool {
    bytes.len() == expected_size
}

/// Check size and scalar integrity of an assembled buffer
///
/// Returns the scalars decoded from the new position on success.
pub fn verify<S: ScalarFields>(bytes: &[u8], expected_size: usize, before: &S) -> Result<S> {
    if !verify_size(bytes, expected_size) {
        return Err(SnapshotError::VerificationFailure(format!(
            "assembled size {} does not match expected size {}",
            bytes.len(),
            expected_size
        )));
    }

    let after = S::decode_tail(bytes).map_err(|e| {
        SnapshotError::VerificationFailure(format!("scalar block unreadable: {e}"))
    })?;
    if &after != before {
        return Err(SnapshotError::VerificationFailure(format!(
            "scalar block changed: before {before:?}, after {after:?}"
        )));
    }

    debug!(
        size = bytes.len(),
        scalar_offset = bytes.len() - S::SIZE,
        "Verified assembled buffer"
    );
    Ok(after)
}

//! Resizing tick-indexed arrays
//!
//! Element `i` of a tick-indexed array belongs to tick offset `i` of the
//! epoch. Tick numbers are absolute, so resizing never renumbers anything:
//!
//! - growing appends zero-filled elements
//! - shrinking drops the tail, after checking that every dropped element is
//!   all-zero; otherwise the [`ConfirmationPolicy`] decides whether the loss
//!   is acceptable
//!
//! A conversion touching several arrays scans them all first and settles
//! the loss with a single [`confirm_loss`] call, then uses
//! [`resize_confirmed`].

use crate::error::{Result, SnapshotError};
use crate::policy::{Confirmation, ConfirmationPolicy};
use serde::Serialize;
use tracing::{debug, warn};

/// Description of the non-zero data a shrink would discard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LossReport {
    /// Segment being shrunk
    pub segment: &'static str,
    /// Bytes per element
    pub element_size: usize,
    /// Element count before migration
    pub old_capacity: usize,
    /// Element count after migration
    pub new_capacity: usize,
    /// Lowest discarded index holding data
    pub first_index: usize,
    /// Highest discarded index holding data
    pub last_index: usize,
    /// Number of discarded non-zero elements
    pub lost_elements: usize,
}

impl LossReport {
    /// Error raised when the loss is not authorised
    pub fn to_error(&self) -> SnapshotError {
        SnapshotError::DataLossRisk {
            segment: self.segment.to_string(),
            first_index: self.first_index,
            last_index: self.last_index,
            lost_elements: self.lost_elements,
        }
    }
}

/// Usage statistics for one tick-indexed array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArrayStats {
    /// Element count
    pub capacity: usize,
    /// Elements with at least one non-zero byte
    pub non_zero_elements: usize,
    /// Highest index holding a non-zero element
    pub highest_used_index: Option<usize>,
}

impl ArrayStats {
    /// Compute statistics for `data` split into `element_size` chunks
    pub fn of(data: &[u8], element_size: usize) -> Self {
        let mut non_zero_elements = 0;
        let mut highest_used_index = None;
        for (index, element) in data.chunks_exact(element_size.max(1)).enumerate() {
            if is_non_zero(element) {
                non_zero_elements += 1;
                highest_used_index = Some(index);
            }
        }
        Self {
            capacity: data.len() / element_size.max(1),
            non_zero_elements,
            highest_used_index,
        }
    }

    /// Whether a shrink to `capacity` elements would drop recorded data
    pub fn exceeds(&self, capacity: usize) -> bool {
        self.highest_used_index.is_some_and(|i| i >= capacity)
    }
}

fn is_non_zero(element: &[u8]) -> bool {
    element.iter().any(|&b| b != 0)
}

/// Find non-zero elements at or beyond `new_capacity`
pub fn scan_discarded(
    segment: &'static str,
    data: &[u8],
    element_size: usize,
    new_capacity: usize,
) -> Option<LossReport> {
    let old_capacity = data.len() / element_size;
    let tail = data.get(new_capacity.saturating_mul(element_size)..)?;

    let mut first_index = None;
    let mut last_index = 0;
    let mut lost_elements = 0;
    for (offset, element) in tail.chunks_exact(element_size).enumerate() {
        if is_non_zero(element) {
            let index = new_capacity + offset;
            first_index.get_or_insert(index);
            last_index = index;
            lost_elements += 1;
        }
    }

    first_index.map(|first_index| LossReport {
        segment,
        element_size,
        old_capacity,
        new_capacity,
        first_index,
        last_index,
        lost_elements,
    })
}

/// Put every report to `policy` in one question
///
/// Returns `DataLossRisk` for the first report when the policy declines.
pub fn confirm_loss(reports: &[LossReport], policy: &mut dyn ConfirmationPolicy) -> Result<()> {
    let Some(first) = reports.first() else {
        return Ok(());
    };
    if !policy.confirm(&Confirmation::DataLoss(reports)) {
        return Err(first.to_error());
    }
    for report in reports {
        warn!(
            segment = report.segment,
            lost_elements = report.lost_elements,
            first_index = report.first_index,
            last_index = report.last_index,
            "Discarding non-zero tick data as authorised"
        );
    }
    Ok(())
}

/// Resize one tick-indexed array from `old_capacity` to `new_capacity`
///
/// # Errors
///
/// - `InvalidParameter` for a zero element size
/// - `LayoutMismatch` when `data` does not hold exactly `old_capacity`
///   elements
/// - `DataLossRisk` when shrinking would discard non-zero elements and the
///   policy declines
pub fn resize(
    segment: &'static str,
    data: &[u8],
    old_capacity: usize,
    new_capacity: usize,
    element_size: usize,
    policy: &mut dyn ConfirmationPolicy,
) -> Result<Vec<u8>> {
    let new_length = checked_length(segment, data, old_capacity, new_capacity, element_size)?;
    if let Some(report) = scan_discarded(segment, data, element_size, new_capacity) {
        confirm_loss(std::slice::from_ref(&report), policy)?;
    }
    Ok(reshape(segment, data, old_capacity, new_capacity, new_length))
}

/// Resize an array whose loss, if any, was already settled by
/// [`confirm_loss`]
pub fn resize_confirmed(
    segment: &'static str,
    data: &[u8],
    old_capacity: usize,
    new_capacity: usize,
    element_size: usize,
) -> Result<Vec<u8>> {
    let new_length = checked_length(segment, data, old_capacity, new_capacity, element_size)?;
    Ok(reshape(segment, data, old_capacity, new_capacity, new_length))
}

/// Validate `data` against `old_capacity` and return the new byte length
fn checked_length(
    segment: &'static str,
    data: &[u8],
    old_capacity: usize,
    new_capacity: usize,
    element_size: usize,
) -> Result<usize> {
    if element_size == 0 {
        return Err(SnapshotError::invalid(
            "element_size",
            format!("segment '{segment}' has zero-sized elements"),
        ));
    }

    let old_length = old_capacity
        .checked_mul(element_size)
        .ok_or_else(|| SnapshotError::invalid("old_capacity", "overflows the address space"))?;
    let new_length = new_capacity
        .checked_mul(element_size)
        .ok_or_else(|| SnapshotError::invalid("new_capacity", "overflows the address space"))?;

    if data.len() != old_length {
        return Err(SnapshotError::LayoutMismatch {
            context: format!("segment '{segment}'"),
            expected: old_length,
            actual: data.len(),
        });
    }
    Ok(new_length)
}

fn reshape(
    segment: &'static str,
    data: &[u8],
    old_capacity: usize,
    new_capacity: usize,
    new_length: usize,
) -> Vec<u8> {
    if new_capacity >= old_capacity {
        debug!(
            segment,
            old_capacity,
            new_capacity,
            "Zero-extending tick-indexed segment"
        );
        let mut resized = Vec::with_capacity(new_length);
        resized.extend_from_slice(data);
        resized.resize(new_length, 0);
        return resized;
    }

    debug!(
        segment,
        old_capacity,
        new_capacity,
        "Truncating tick-indexed segment"
    );
    data[..new_length].to_vec()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::policy::{AutoApprove, AutoReject};

    fn counters(values: &[u32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_grow_zero_extends() {
        let data = counters(&[1, 2, 3]);
        let resized = resize("counters", &data, 3, 5, 4, &mut AutoReject).unwrap();
        assert_eq!(resized, counters(&[1, 2, 3, 0, 0]));
    }

    #[test]
    fn test_same_capacity_is_identity() {
        let data = counters(&[9, 8]);
        let resized = resize("counters", &data, 2, 2, 4, &mut AutoReject).unwrap();
        assert_eq!(resized, data);
    }

    #[test]
    fn test_shrink_zero_tail_needs_no_confirmation() {
        let data = counters(&[7, 0, 0, 0]);
        let mut policy = |_: &Confirmation<'_>| -> bool { panic!("should not be asked") };
        let resized = resize("counters", &data, 4, 2, 4, &mut policy).unwrap();
        assert_eq!(resized, counters(&[7, 0]));
    }

    #[test]
    fn test_shrink_with_data_rejected() {
        let data = counters(&[1, 0, 5, 0, 6]);
        let err = resize("counters", &data, 5, 2, 4, &mut AutoReject).unwrap_err();
        match err {
            SnapshotError::DataLossRisk {
                segment,
                first_index,
                last_index,
                lost_elements,
            } => {
                assert_eq!(segment, "counters");
                assert_eq!(first_index, 2);
                assert_eq!(last_index, 4);
                assert_eq!(lost_elements, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_shrink_with_data_approved() {
        let data = counters(&[1, 0, 5]);
        let resized = resize("counters", &data, 3, 1, 4, &mut AutoApprove).unwrap();
        assert_eq!(resized, counters(&[1]));
    }

    #[test]
    fn test_policy_sees_report() {
        let mut digests = vec![0u8; 32 * 4];
        digests[3 * 32 + 31] = 0xFF;
        let mut seen = None;
        let mut policy = |request: &Confirmation<'_>| {
            if let Confirmation::DataLoss(reports) = request {
                seen = Some(reports.to_vec());
            }
            false
        };
        assert!(resize("digests", &digests, 4, 2, 32, &mut policy).is_err());
        let reports = seen.expect("policy should be asked");
        assert_eq!(reports.len(), 1);
        let report = &reports[0];
        assert_eq!(report.first_index, 3);
        assert_eq!(report.old_capacity, 4);
        assert_eq!(report.new_capacity, 2);
        assert_eq!(report.element_size, 32);
    }

    #[test]
    fn test_confirm_loss_asks_once_for_all_reports() {
        let first = scan_discarded("counters", &counters(&[0, 0, 4]), 4, 1).unwrap();
        let second = scan_discarded("starts", &counters(&[0, 0, 9]), 4, 1).unwrap();

        let mut questions = Vec::new();
        let mut policy = |request: &Confirmation<'_>| {
            if let Confirmation::DataLoss(reports) = request {
                questions.push(reports.iter().map(|r| r.segment).collect::<Vec<_>>());
            }
            true
        };
        confirm_loss(&[first, second], &mut policy).unwrap();
        assert_eq!(questions, vec![vec!["counters", "starts"]]);
    }

    #[test]
    fn test_confirm_loss_rejection_names_first_segment() {
        let first = scan_discarded("counters", &counters(&[0, 4]), 4, 1).unwrap();
        let second = scan_discarded("starts", &counters(&[0, 9]), 4, 1).unwrap();
        let err = confirm_loss(&[first, second], &mut AutoReject).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::DataLossRisk { ref segment, .. } if segment == "counters"
        ));

        let mut policy = |_: &Confirmation<'_>| -> bool { panic!("nothing to confirm") };
        confirm_loss(&[], &mut policy).unwrap();
    }

    #[test]
    fn test_resize_confirmed_truncates_without_asking() {
        let data = counters(&[1, 2, 3]);
        assert_eq!(resize_confirmed("counters", &data, 3, 1, 4).unwrap(), counters(&[1]));
        assert!(matches!(
            resize_confirmed("counters", &data, 4, 1, 4),
            Err(SnapshotError::LayoutMismatch { .. })
        ));
    }

    #[test]
    fn test_length_mismatch() {
        let data = counters(&[1, 2]);
        assert!(matches!(
            resize("counters", &data, 3, 4, 4, &mut AutoApprove),
            Err(SnapshotError::LayoutMismatch {
                expected: 12,
                actual: 8,
                ..
            })
        ));
        assert!(resize("counters", &data, 2, 4, 0, &mut AutoApprove).is_err());
    }

    #[test]
    fn test_array_stats() {
        let stats = ArrayStats::of(&counters(&[0, 3, 0, 4, 0]), 4);
        assert_eq!(stats.capacity, 5);
        assert_eq!(stats.non_zero_elements, 2);
        assert_eq!(stats.highest_used_index, Some(3));
        assert!(stats.exceeds(3));
        assert!(!stats.exceeds(4));

        let empty = ArrayStats::of(&counters(&[0, 0]), 4);
        assert_eq!(empty.highest_used_index, None);
        assert!(!empty.exceeds(0));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn growth_never_reports_loss(
                values in prop::collection::vec(any::<u32>(), 0..64),
                extra in 0usize..64
            ) {
                let data = counters(&values);
                let old = values.len();
                let mut policy = |_: &Confirmation<'_>| false;
                let resized = resize("counters", &data, old, old + extra, 4, &mut policy).unwrap();
                prop_assert_eq!(&resized[..data.len()], &data[..]);
                prop_assert!(resized[data.len()..].iter().all(|&b| b == 0));
            }

            #[test]
            fn shrink_below_highest_used_always_reports(
                values in prop::collection::vec(any::<u32>(), 1..64),
                cut in 0usize..64
            ) {
                let data = counters(&values);
                let old = values.len();
                let new = cut.min(old);
                let stats = ArrayStats::of(&data, 4);
                let result = resize("counters", &data, old, new, 4, &mut AutoReject);
                if stats.exceeds(new) {
                    let is_loss = matches!(result, Err(SnapshotError::DataLossRisk { .. }));
                    prop_assert!(is_loss);
                } else {
                    prop_assert_eq!(result.unwrap(), data[..new * 4].to_vec());
                }
            }
        }
    }
}

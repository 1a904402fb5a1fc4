#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! File-level migration of transaction-status snapshots
//!
//! Builds synthetic snapshots in temporary directories and migrates them
//! through `migrate_file`, checking the on-disk result, the backup and the
//! behaviour on rejected data loss.

use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tickshift_formats::{
    AutoApprove, AutoReject, Confirmation, MigrationOutcome, MigrationRequest, ScalarFields,
    SnapshotError, SnapshotFormat, TxStatusFormat, TxStatusScalars, migrate_file,
};

const SCALARS: TxStatusScalars = TxStatusScalars {
    confirmed_tx_previous_epoch_begin_tick: 5,
    confirmed_tx_current_epoch_begin_tick: 10,
};

fn capacity(duration_ms: u64) -> usize {
    TxStatusFormat::default()
        .parameters(duration_ms)
        .unwrap()
        .capacity_elements()
        .unwrap()
}

/// Snapshot with the given `(index, counter, index_start)` entries set
fn snapshot(duration_ms: u64, entries: &[(usize, u32, u32)]) -> Vec<u8> {
    let capacity = capacity(duration_ms);
    let mut counters = vec![0u8; capacity * 4];
    let mut starts = vec![0u8; capacity * 4];
    for &(index, counter, start) in entries {
        counters[index * 4..index * 4 + 4].copy_from_slice(&counter.to_le_bytes());
        starts[index * 4..index * 4 + 4].copy_from_slice(&start.to_le_bytes());
    }
    let mut bytes = counters;
    bytes.extend(starts);
    bytes.extend(SCALARS.encode().unwrap());
    bytes
}

fn counter_at(bytes: &[u8], index: usize) -> u32 {
    u32::from_le_bytes(bytes[index * 4..index * 4 + 4].try_into().unwrap())
}

fn write_snapshot(dir: &Path, bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.join("snapshotTxStatusData");
    fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn grow_all_zero_snapshot_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let original = snapshot(3000, &[]);
    let path = write_snapshot(dir.path(), &original);

    let request = MigrationRequest::new(&path, 3000, 2000);
    let outcome = migrate_file(&TxStatusFormat::default(), &request, &mut AutoReject).unwrap();

    let MigrationOutcome::Written {
        backup,
        old_size,
        new_size,
        report,
        ..
    } = outcome
    else {
        panic!("expected a written outcome");
    };
    assert!(new_size > old_size);
    assert_eq!(report.scalars, SCALARS);

    let migrated = fs::read(&path).unwrap();
    assert_eq!(migrated.len(), capacity(2000) * 8 + 8);
    assert_eq!(migrated.len(), new_size);
    assert!(migrated[..migrated.len() - 8].iter().all(|&b| b == 0));
    assert_eq!(
        TxStatusScalars::decode(&migrated[migrated.len() - 8..]).unwrap(),
        SCALARS
    );

    let backup = backup.expect("in-place migration makes a backup");
    assert_eq!(backup, dir.path().join("snapshotTxStatusData.backup"));
    assert_eq!(fs::read(&backup).unwrap(), original);
}

#[test]
fn grow_preserves_both_arrays() {
    let dir = tempfile::tempdir().unwrap();
    let old_capacity = capacity(3000);
    let entries = [(0, 4, 0), (1_000, 2, 4), (old_capacity - 1, 9, 6)];
    let path = write_snapshot(dir.path(), &snapshot(3000, &entries));
    let output = dir.path().join("migrated");

    let request = MigrationRequest::new(&path, 3000, 2000).with_output(&output);
    let outcome = migrate_file(&TxStatusFormat::default(), &request, &mut AutoReject).unwrap();
    assert!(matches!(
        outcome,
        MigrationOutcome::Written { backup: None, .. }
    ));

    let new_capacity = capacity(2000);
    let migrated = fs::read(&output).unwrap();
    for &(index, counter, start) in &entries {
        assert_eq!(counter_at(&migrated, index), counter);
        assert_eq!(counter_at(&migrated[new_capacity * 4..], index), start);
    }
    assert!(!dir.path().join("snapshotTxStatusData.backup").exists());
}

#[test]
fn shrink_with_data_rejected_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let old_capacity = capacity(3000);
    let original = snapshot(3000, &[(old_capacity - 1, 1, 0)]);
    let path = write_snapshot(dir.path(), &original);
    let output = dir.path().join("migrated");

    let request = MigrationRequest::new(&path, 3000, 10_000).with_output(&output);
    let err = migrate_file(&TxStatusFormat::default(), &request, &mut AutoReject).unwrap_err();

    match err {
        SnapshotError::DataLossRisk {
            segment,
            first_index,
            last_index,
            lost_elements,
        } => {
            assert_eq!(segment, "tick_tx_counter");
            assert_eq!(first_index, old_capacity - 1);
            assert_eq!(last_index, old_capacity - 1);
            assert_eq!(lost_elements, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!output.exists());
    assert_eq!(fs::read(&path).unwrap(), original);
}

#[test]
fn shrink_in_place_rejected_keeps_original_and_skips_backup() {
    let dir = tempfile::tempdir().unwrap();
    let original = snapshot(3000, &[(capacity(3000) - 1, 1, 0)]);
    let path = write_snapshot(dir.path(), &original);

    let request = MigrationRequest::new(&path, 3000, 10_000);
    assert!(migrate_file(&TxStatusFormat::default(), &request, &mut AutoReject).is_err());
    assert_eq!(fs::read(&path).unwrap(), original);
    assert!(!dir.path().join("snapshotTxStatusData.backup").exists());
}

#[test]
fn shrink_with_data_approved_truncates() {
    let dir = tempfile::tempdir().unwrap();
    let old_capacity = capacity(3000);
    let path = write_snapshot(dir.path(), &snapshot(3000, &[(3, 8, 1), (old_capacity - 1, 1, 0)]));

    let mut asked = Vec::new();
    let mut policy = |request: &Confirmation<'_>| {
        if let Confirmation::DataLoss(reports) = request {
            asked.push(reports.iter().map(|r| r.segment).collect::<Vec<_>>());
        }
        true
    };
    let request = MigrationRequest::new(&path, 3000, 10_000).without_backup();
    migrate_file(&TxStatusFormat::default(), &request, &mut policy).unwrap();
    assert_eq!(asked, vec![vec!["tick_tx_counter"]]);

    let migrated = fs::read(&path).unwrap();
    assert_eq!(migrated.len(), capacity(10_000) * 8 + 8);
    assert_eq!(counter_at(&migrated, 3), 8);
}

#[test]
fn shrink_losing_both_arrays_asks_once() {
    let dir = tempfile::tempdir().unwrap();
    let old_capacity = capacity(3000);
    let path = write_snapshot(dir.path(), &snapshot(3000, &[(old_capacity - 1, 2, 7)]));

    let mut asked = Vec::new();
    let mut policy = |request: &Confirmation<'_>| {
        if let Confirmation::DataLoss(reports) = request {
            asked.push(reports.iter().map(|r| r.segment).collect::<Vec<_>>());
        }
        true
    };
    let request = MigrationRequest::new(&path, 3000, 10_000).without_backup();
    migrate_file(&TxStatusFormat::default(), &request, &mut policy).unwrap();
    assert_eq!(asked, vec![vec!["tick_tx_counter", "tick_tx_index_start"]]);
    assert_eq!(fs::read(&path).unwrap().len(), capacity(10_000) * 8 + 8);
}

#[cfg(unix)]
#[test]
fn in_place_migration_keeps_file_mode() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = write_snapshot(dir.path(), &snapshot(3000, &[]));
    fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

    let request = MigrationRequest::new(&path, 3000, 2000);
    migrate_file(&TxStatusFormat::default(), &request, &mut AutoReject).unwrap();
    assert_eq!(fs::metadata(&path).unwrap().permissions().mode() & 0o777, 0o644);
}

#[test]
fn outcome_serializes_with_status_tag() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_snapshot(dir.path(), &snapshot(3000, &[(5, 1, 0)]));

    let request = MigrationRequest::new(&path, 3000, 2000);
    let outcome = migrate_file(&TxStatusFormat::default(), &request, &mut AutoReject).unwrap();
    let value = serde_json::to_value(&outcome).unwrap();
    assert_eq!(value["status"], "written");
    assert_eq!(value["backup"], dir.path().join("snapshotTxStatusData.backup").display().to_string());
    assert_eq!(value["report"]["arrays"][0]["stats"]["highest_used_index"], 5);
}

#[test]
fn shrink_with_zero_tail_needs_no_confirmation() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_snapshot(dir.path(), &snapshot(3000, &[(10, 1, 0)]));

    let request = MigrationRequest::new(&path, 3000, 10_000).without_backup();
    migrate_file(&TxStatusFormat::default(), &request, &mut AutoReject).unwrap();
    assert_eq!(fs::read(&path).unwrap().len(), capacity(10_000) * 8 + 8);
}

#[test]
fn size_mismatch_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut bytes = snapshot(3000, &[]);
    bytes.truncate(bytes.len() - 4);
    let path = write_snapshot(dir.path(), &bytes);

    let request = MigrationRequest::new(&path, 3000, 2000);
    let result = migrate_file(&TxStatusFormat::default(), &request, &mut AutoApprove);
    assert!(matches!(result, Err(SnapshotError::LayoutMismatch { .. })));
    assert_eq!(fs::read(&path).unwrap(), bytes);
}

#[test]
fn round_trip_restores_original() {
    let dir = tempfile::tempdir().unwrap();
    let original = snapshot(3000, &[(0, 1, 0), (77, 3, 1), (capacity(3000) - 1, 2, 4)]);
    let path = write_snapshot(dir.path(), &original);

    let there = MigrationRequest::new(&path, 3000, 2000).without_backup();
    migrate_file(&TxStatusFormat::default(), &there, &mut AutoReject).unwrap();
    assert_ne!(fs::read(&path).unwrap(), original);

    let back = MigrationRequest::new(&path, 2000, 3000).without_backup();
    migrate_file(&TxStatusFormat::default(), &back, &mut AutoReject).unwrap();
    assert_eq!(fs::read(&path).unwrap(), original);
}

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;
    use tickshift_formats::convert;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn round_trip_through_larger_capacity(
            entries in prop::collection::vec((0usize..121_104, any::<u32>(), any::<u32>()), 0..16),
            larger in prop::sample::select(vec![1000u64, 2000, 3000, 4000])
        ) {
            let format = TxStatusFormat::default();
            let original = snapshot(5000, &entries);
            let grown = convert(&format, &original, 5000, larger, &mut AutoReject).unwrap();
            let restored = convert(&format, &grown.bytes, larger, 5000, &mut AutoReject).unwrap();
            prop_assert_eq!(restored.bytes, original);
            prop_assert_eq!(restored.report.scalars, SCALARS);
        }
    }
}

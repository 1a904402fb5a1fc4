//! File-level migration
//!
//! Reads a snapshot, converts it in memory and replaces the target only
//! after verification succeeded. The replacement goes through a temporary
//! file in the target directory that is synced and then renamed over the
//! target, so an interrupted run leaves either the old or the new file.

use crate::convert::{ConversionReport, convert};
use crate::error::{Result, SnapshotError};
use crate::format::SnapshotFormat;
use crate::policy::ConfirmationPolicy;
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// What to migrate and where to put it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRequest {
    /// Snapshot to read
    pub input: PathBuf,
    /// Destination, `None` for in place
    pub output: Option<PathBuf>,
    /// Tick duration the snapshot was written with
    pub old_duration_ms: u64,
    /// Tick duration to migrate to
    pub new_duration_ms: u64,
    /// Copy the original to `<input>.backup` before an in-place write
    pub backup: bool,
}

impl MigrationRequest {
    /// In-place migration with backup
    pub fn new(input: impl Into<PathBuf>, old_duration_ms: u64, new_duration_ms: u64) -> Self {
        Self {
            input: input.into(),
            output: None,
            old_duration_ms,
            new_duration_ms,
            backup: true,
        }
    }

    /// Write to `output` instead of in place
    #[must_use]
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Skip the backup copy
    #[must_use]
    pub fn without_backup(mut self) -> Self {
        self.backup = false;
        self
    }

    /// Path that will receive the converted file
    pub fn target(&self) -> &Path {
        self.output.as_deref().unwrap_or(&self.input)
    }

    /// Whether the input itself is overwritten
    ///
    /// An existing output is compared by canonical path, so `./file` and
    /// `file` or a symlink to the input count as in place.
    pub fn is_in_place(&self) -> bool {
        match &self.output {
            None => true,
            Some(output) if *output == self.input => true,
            Some(output) => match (fs::canonicalize(output), fs::canonicalize(&self.input)) {
                (Ok(output), Ok(input)) => output == input,
                _ => false,
            },
        }
    }
}

/// Result of [`migrate_file`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MigrationOutcome<S> {
    /// Durations are equal, nothing was read or written
    Unchanged {
        /// Input path
        path: PathBuf,
    },
    /// Converted file was written
    Written {
        /// Path written
        path: PathBuf,
        /// Backup copy, if one was made
        backup: Option<PathBuf>,
        /// Input size in bytes
        old_size: usize,
        /// Output size in bytes
        new_size: usize,
        /// Conversion details
        report: ConversionReport<S>,
    },
}

/// `<path>.backup`
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".backup");
    PathBuf::from(name)
}

/// Read a whole snapshot, mapping a missing file to `FileNotFound`
pub fn read_snapshot(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => SnapshotError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => SnapshotError::io(path, e),
    })
}

/// Replace `path` with `bytes` via a synced temporary file
///
/// An existing target keeps its permissions.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| SnapshotError::io(dir, e))?;
    let temp_path = temp.path().to_path_buf();
    match fs::metadata(path) {
        Ok(metadata) => temp
            .as_file()
            .set_permissions(metadata.permissions())
            .map_err(|e| SnapshotError::io(&temp_path, e))?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(SnapshotError::io(path, e)),
    }
    temp.write_all(bytes)
        .map_err(|e| SnapshotError::io(&temp_path, e))?;
    temp.flush().map_err(|e| SnapshotError::io(&temp_path, e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| SnapshotError::io(&temp_path, e))?;
    debug!(temp = %temp_path.display(), size = bytes.len(), "Synced temporary file");

    temp.persist(path)
        .map_err(|e| SnapshotError::io(path, e.error))?;
    Ok(())
}

/// Migrate one snapshot file
///
/// Durations are validated before anything else; equal durations then
/// short-circuit to [`MigrationOutcome::Unchanged`]. The target is only
/// touched once the converted buffer passed verification.
pub fn migrate_file<F: SnapshotFormat>(
    format: &F,
    request: &MigrationRequest,
    policy: &mut dyn ConfirmationPolicy,
) -> Result<MigrationOutcome<F::Scalars>> {
    format.parameters(request.old_duration_ms)?;
    format.parameters(request.new_duration_ms)?;
    if request.old_duration_ms == request.new_duration_ms {
        info!(
            kind = %format.kind(),
            duration_ms = request.old_duration_ms,
            "Durations are equal, nothing to do"
        );
        return Ok(MigrationOutcome::Unchanged {
            path: request.input.clone(),
        });
    }

    let data = read_snapshot(&request.input)?;
    info!(
        path = %request.input.display(),
        size = data.len(),
        "Read snapshot"
    );

    let conversion = convert(
        format,
        &data,
        request.old_duration_ms,
        request.new_duration_ms,
        policy,
    )?;

    let backup = if request.is_in_place() && request.backup {
        let backup = backup_path(&request.input);
        fs::copy(&request.input, &backup).map_err(|e| SnapshotError::io(&backup, e))?;
        info!(backup = %backup.display(), "Backed up original");
        Some(backup)
    } else {
        None
    };

    let target = request.target();
    write_atomic(target, &conversion.bytes)?;
    info!(
        path = %target.display(),
        old_size = data.len(),
        new_size = conversion.bytes.len(),
        "Wrote migrated snapshot"
    );

    Ok(MigrationOutcome::Written {
        path: target.to_path_buf(),
        backup,
        old_size: data.len(),
        new_size: conversion.bytes.len(),
        report: conversion.report,
    })
}

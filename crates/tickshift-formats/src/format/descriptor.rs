//! Versioned constants for the event-state layout
//!
//! Builds of the node have shipped two event-state shapes. They agree on the
//! VM dump sizes but differ in how the 16-byte trailer after each dump is
//! split and in the nominal size of the serialized hash state:
//!
//! | Version | Trailer              | Nominal hash state |
//! |---------|----------------------|--------------------|
//! | `v1`    | one opaque 16 bytes  | 512 bytes          |
//! | `v2`    | two u64 counters     | 448 bytes          |
//!
//! The nominal hash-state size only feeds the advisory size check. The real
//! size is always derived from the file being migrated.

use crate::error::{Result, SnapshotError};
use crate::scalars::{EventStateScalars, ScalarFields};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Known event-state layout versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutVersion {
    /// Legacy builds
    V1,
    /// Current builds
    #[default]
    V2,
}

/// How the 16 bytes following each VM dump are segmented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailerConvention {
    /// One opaque 16-byte block
    Combined,
    /// Two 8-byte counters
    Split,
}

impl TrailerConvention {
    /// Trailer bytes per VM dump
    pub const fn size(self) -> usize {
        16
    }
}

/// Sizing constants for one event-state layout version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventStateDescriptor {
    /// Version these constants describe
    pub version: LayoutVersion,
    /// Log buffer page size in bytes
    pub log_buffer_size: usize,
    /// Entries in the log-id map
    pub map_log_id_entries: usize,
    /// Bytes per log-id map entry
    pub blob_info_size: usize,
    /// Entries in the tx map
    pub map_tx_entries: usize,
    /// Bytes per tx map entry
    pub tick_blob_info_size: usize,
    /// Bytes per tick digest
    pub digest_size: usize,
    /// Nominal serialized hash state size
    pub hash_state_size: usize,
    /// Trailing variables block size
    pub variables_size: usize,
    /// Trailer segmentation after each VM dump
    pub trailer: TrailerConvention,
    /// Largest size difference accepted without confirmation
    pub size_slack: usize,
}

impl EventStateDescriptor {
    /// Legacy layout
    pub fn v1() -> Self {
        Self {
            version: LayoutVersion::V1,
            hash_state_size: 512,
            trailer: TrailerConvention::Combined,
            ..Self::v2()
        }
    }

    /// Current layout
    pub fn v2() -> Self {
        Self {
            version: LayoutVersion::V2,
            log_buffer_size: 300_000_000,
            map_log_id_entries: 30_000_000,
            blob_info_size: 16,
            map_tx_entries: 10_000,
            tick_blob_info_size: 16_464,
            digest_size: 32,
            hash_state_size: 448,
            variables_size: EventStateScalars::SIZE,
            trailer: TrailerConvention::Split,
            size_slack: 1000,
        }
    }

    /// Built-in preset for a version
    pub fn preset(version: LayoutVersion) -> Self {
        match version {
            LayoutVersion::V1 => Self::v1(),
            LayoutVersion::V2 => Self::v2(),
        }
    }

    /// Parse a TOML descriptor
    ///
    /// The file names a base `version` (default `v2`); any other key
    /// overrides the matching preset field.
    pub fn from_toml(text: &str) -> Result<Self> {
        let overrides: DescriptorOverrides = toml::from_str(text)?;
        let descriptor = overrides.apply();
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Load a TOML descriptor from disk
    pub fn load(path: &Path) -> Result<Self> {
        let text =
            std::fs::read_to_string(path).map_err(|e| SnapshotError::io(path, e))?;
        Self::from_toml(&text)
    }

    /// Check the constants are usable
    pub fn validate(&self) -> Result<()> {
        if self.digest_size == 0 {
            return Err(SnapshotError::invalid("digest_size", "must be positive"));
        }
        if self.variables_size != EventStateScalars::SIZE {
            return Err(SnapshotError::invalid(
                "variables_size",
                format!(
                    "must be {} bytes, got {}",
                    EventStateScalars::SIZE,
                    self.variables_size
                ),
            ));
        }
        self.map_log_id_size()?;
        self.map_tx_size()?;
        Ok(())
    }

    /// Bytes of the log-id map dump, excluding its trailer
    pub fn map_log_id_size(&self) -> Result<usize> {
        self.map_log_id_entries
            .checked_mul(self.blob_info_size)
            .ok_or_else(|| SnapshotError::invalid("map_log_id_entries", "size overflows"))
    }

    /// Bytes of the tx map dump, excluding its trailer
    pub fn map_tx_size(&self) -> Result<usize> {
        self.map_tx_entries
            .checked_mul(self.tick_blob_info_size)
            .ok_or_else(|| SnapshotError::invalid("map_tx_entries", "size overflows"))
    }
}

impl Default for EventStateDescriptor {
    fn default() -> Self {
        Self::v2()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DescriptorOverrides {
    #[serde(default)]
    version: LayoutVersion,
    log_buffer_size: Option<usize>,
    map_log_id_entries: Option<usize>,
    blob_info_size: Option<usize>,
    map_tx_entries: Option<usize>,
    tick_blob_info_size: Option<usize>,
    digest_size: Option<usize>,
    hash_state_size: Option<usize>,
    variables_size: Option<usize>,
    trailer: Option<TrailerConvention>,
    size_slack: Option<usize>,
}

impl DescriptorOverrides {
    fn apply(self) -> EventStateDescriptor {
        let base = EventStateDescriptor::preset(self.version);
        EventStateDescriptor {
            version: self.version,
            log_buffer_size: self.log_buffer_size.unwrap_or(base.log_buffer_size),
            map_log_id_entries: self.map_log_id_entries.unwrap_or(base.map_log_id_entries),
            blob_info_size: self.blob_info_size.unwrap_or(base.blob_info_size),
            map_tx_entries: self.map_tx_entries.unwrap_or(base.map_tx_entries),
            tick_blob_info_size: self.tick_blob_info_size.unwrap_or(base.tick_blob_info_size),
            digest_size: self.digest_size.unwrap_or(base.digest_size),
            hash_state_size: self.hash_state_size.unwrap_or(base.hash_state_size),
            variables_size: self.variables_size.unwrap_or(base.variables_size),
            trailer: self.trailer.unwrap_or(base.trailer),
            size_slack: self.size_slack.unwrap_or(base.size_slack),
        }
    }
}

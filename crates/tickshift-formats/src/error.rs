//! Error types for snapshot layout migration

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while computing layouts or migrating snapshot files
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// A tick duration, computor count or other parameter is unusable
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// Input file does not exist
    #[error("File not found: {}", path.display())]
    FileNotFound {
        /// Path that was looked up
        path: PathBuf,
    },

    /// A file or segment does not have the size the layout predicts
    #[error("Layout mismatch in {context}: expected {expected} bytes, got {actual} bytes")]
    LayoutMismatch {
        /// File kind or segment name
        context: String,
        /// Size predicted by the layout
        expected: usize,
        /// Size actually observed
        actual: usize,
    },

    /// Shrinking a tick-indexed segment would discard recorded data
    #[error(
        "Data loss risk in segment '{segment}': {lost_elements} non-zero elements at tick indices {first_index}..={last_index} would be discarded"
    )]
    DataLossRisk {
        /// Segment that would lose data
        segment: String,
        /// Lowest discarded index holding data
        first_index: usize,
        /// Highest discarded index holding data
        last_index: usize,
        /// Number of discarded non-zero elements
        lost_elements: usize,
    },

    /// Reassembled output failed its size or scalar cross-check
    #[error("Verification failed: {0}")]
    VerificationFailure(String),

    /// Binary decode error
    #[error("Binary parsing error: {0}")]
    BinRead(String),

    /// Layout descriptor could not be decoded
    #[error("Layout descriptor error: {0}")]
    Config(String),

    /// IO error on a specific path
    #[error("IO error on {}: {source}", path.display())]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl SnapshotError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<binrw::Error> for SnapshotError {
    fn from(e: binrw::Error) -> Self {
        Self::BinRead(e.to_string())
    }
}

impl From<toml::de::Error> for SnapshotError {
    fn from(e: toml::de::Error) -> Self {
        Self::Config(e.to_string())
    }
}

/// Result type alias for snapshot operations
pub type Result<T> = std::result::Result<T, SnapshotError>;

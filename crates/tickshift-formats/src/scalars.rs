//! Trailing scalar blocks
//!
//! Both snapshot kinds end with a small block of little-endian integers.
//! Their values are never reinterpreted; they are decoded only to prove the
//! block survived migration at its new offset.

use crate::error::{Result, SnapshotError};
use binrw::{BinRead, BinWrite, io::Cursor};
use serde::Serialize;
use std::fmt;

/// A fixed-size block of integer fields at the end of a snapshot
pub trait ScalarFields: Sized + Clone + PartialEq + fmt::Debug + Serialize {
    /// Encoded size in bytes
    const SIZE: usize;

    /// Decode from exactly [`Self::SIZE`] bytes
    fn decode(bytes: &[u8]) -> Result<Self>;

    /// Encode to [`Self::SIZE`] bytes
    fn encode(&self) -> Result<Vec<u8>>;

    /// Decode the block occupying the last [`Self::SIZE`] bytes of a file
    fn decode_tail(file: &[u8]) -> Result<Self> {
        let start = file
            .len()
            .checked_sub(Self::SIZE)
            .ok_or_else(|| SnapshotError::LayoutMismatch {
                context: "scalar block".to_string(),
                expected: Self::SIZE,
                actual: file.len(),
            })?;
        Self::decode(&file[start..])
    }
}

fn check_len(bytes: &[u8], expected: usize) -> Result<()> {
    if bytes.len() == expected {
        Ok(())
    } else {
        Err(SnapshotError::LayoutMismatch {
            context: "scalar block".to_string(),
            expected,
            actual: bytes.len(),
        })
    }
}

/// Bookkeeping variables stored at the end of the event-state file
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite, Serialize)]
#[brw(little)]
pub struct EventStateScalars {
    /// Write position in the log buffer
    pub log_buffer_tail: u64,
    /// Next log id
    pub log_id: u64,
    /// First tick of the epoch
    pub tick_begin: u32,
    /// Last tick whose digest was updated
    pub last_updated_tick: u32,
    /// Transaction index within the current tick
    pub current_tx_id: u32,
    /// Tick being logged
    pub current_tick: u32,
}

impl ScalarFields for EventStateScalars {
    const SIZE: usize = 32;

    fn decode(bytes: &[u8]) -> Result<Self> {
        check_len(bytes, Self::SIZE)?;
        Ok(Self::read(&mut Cursor::new(bytes))?)
    }

    fn encode(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::with_capacity(Self::SIZE));
        self.write(&mut cursor)?;
        Ok(cursor.into_inner())
    }
}

/// Epoch boundary ticks stored at the end of the tx-status file
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite, Serialize)]
#[brw(little)]
pub struct TxStatusScalars {
    /// First confirmed tick of the previous epoch
    pub confirmed_tx_previous_epoch_begin_tick: u32,
    /// First confirmed tick of the current epoch
    pub confirmed_tx_current_epoch_begin_tick: u32,
}

impl ScalarFields for TxStatusScalars {
    const SIZE: usize = 8;

    fn decode(bytes: &[u8]) -> Result<Self> {
        check_len(bytes, Self::SIZE)?;
        Ok(Self::read(&mut Cursor::new(bytes))?)
    }

    fn encode(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::with_capacity(Self::SIZE));
        self.write(&mut cursor)?;
        Ok(cursor.into_inner())
    }
}

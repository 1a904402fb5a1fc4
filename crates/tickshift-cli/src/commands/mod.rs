//! Command handlers
//!
//! Each handler resolves its configuration, calls into `tickshift-formats`
//! and renders the result on stdout.

pub mod calc;
pub mod inspect;
pub mod migrate;

//! Run polyglot `.m5r` documents.
//!
//! This crate re-exports the engine from `m5r-core`; the `m5r` binary lives
//! in `m5r-cli`.

pub use m5r_core::*;

//! # SSTable — Sorted String Table
//!
//! Immutable, on-disk storage files for the MiniKV storage engine.
//!
//! When the in-memory memtable exceeds its operation threshold the engine
//! flushes it to disk as an SSTable. SSTables are *write-once,
//! read-many* — once created they are never modified, only superseded by
//! compaction and then deleted.
//!
//! ## File layout
//!
//! ```text
//! KEY \t VALUE \n      one record per line, strictly ascending by key
//! ```
//!
//! A tombstone is a record whose value is the literal sentinel
//! `__TOMBSTONE__`. There is no header, footer, or index; readers scan
//! lazily and point lookups stop early once the sorted order passes the
//! requested key.
//!
//! ## Naming
//!
//! Files are named `sst_NNNNNN.sst`, where `NNNNNN` is a zero-padded
//! creation ordinal. Greater ordinal means newer: the ordinal decides which
//! record wins when the same key appears in several files.

use std::io;

use thiserror::Error;

mod merge;
mod reader;
mod writer;

pub use merge::MergeIterator;
pub use reader::{Lookup, SstIter, SstReader};
pub use writer::SstWriter;

/// Errors that can occur while writing, reading, or merging SSTables.
#[derive(Debug, Error)]
pub enum SstError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A file that cannot be decoded (bad line, bad name, non-UTF-8 data).
    #[error("corrupt sstable: {0}")]
    Corrupt(String),

    /// The writer was handed zero records; no file is produced.
    #[error("refusing to write an empty sstable")]
    Empty,
}

/// Builds the canonical filename for the SSTable with the given ordinal,
/// e.g. `sst_000007.sst`.
pub fn sst_filename(ordinal: u64) -> String {
    format!("sst_{ordinal:06}.sst")
}

/// Parses the creation ordinal out of an SSTable filename; `None` when the
/// name does not match the `sst_NNNNNN.sst` pattern.
pub fn parse_ordinal(name: &str) -> Option<u64> {
    name.strip_prefix("sst_")?
        .strip_suffix(".sst")?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests;

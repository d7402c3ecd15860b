//! The engine's unified error type.
//!
//! Leaf crates report their own failures (`RecordError`, `WalError`,
//! `SstError`); at the engine boundary they collapse into the four kinds an
//! embedder can meaningfully react to. Decode failures below the torn WAL
//! tail are already tolerated inside replay, so any malformed record that
//! reaches this type is real corruption.

use std::io;

use minikv_record::RecordError;
use minikv_sstable::SstError;
use minikv_wal::WalError;
use thiserror::Error;

/// Result type alias using the engine [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by engine operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A key or value that may not enter the store: empty key, reserved
    /// bytes (`\t`, `\n`), or the tombstone sentinel used as a value.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A WAL or SSTable that no longer decodes cleanly.
    #[error("corruption: {0}")]
    Corruption(String),

    /// Underlying filesystem error (disk full, permissions, ...).
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Operation issued against a closed engine.
    #[error("engine is closed")]
    Closed,
}

impl From<RecordError> for Error {
    fn from(e: RecordError) -> Self {
        match e {
            RecordError::InvalidInput(reason) => Error::InvalidInput(reason),
            RecordError::Malformed(reason) => Error::Corruption(reason),
        }
    }
}

impl From<WalError> for Error {
    fn from(e: WalError) -> Self {
        match e {
            WalError::Io(e) => Error::Io(e),
            WalError::Corrupt(reason) => Error::Corruption(reason),
        }
    }
}

impl From<SstError> for Error {
    fn from(e: SstError) -> Self {
        match e {
            SstError::Io(e) => Error::Io(e),
            SstError::Corrupt(reason) => Error::Corruption(reason),
            // Compaction handles the empty case itself; a flush never writes
            // an empty memtable. Reaching this arm means a logic error
            // upstream, reported as corruption rather than a panic.
            SstError::Empty => Error::Corruption("unexpected empty sstable write".into()),
        }
    }
}

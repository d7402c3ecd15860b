//! # Record — line codec for MiniKV
//!
//! Encodes and decodes the single-record line format shared by the WAL and
//! the SSTable files. Every record is one `\n`-terminated line with
//! `\t`-separated fields, which keeps both file formats greppable and keeps
//! the decoder total: any line either decodes to exactly one record or is
//! rejected as malformed.
//!
//! ## Line formats
//!
//! ```text
//! WAL:  OP \t KEY \t VALUE \n     OP ∈ {PUT, DEL}, VALUE empty for DEL
//! SST:  KEY \t VALUE \n           VALUE = __TOMBSTONE__ marks a deletion
//! ```
//!
//! Because `\t` and `\n` frame the records, keys and values must not contain
//! them; [`validate_key`] and [`validate_value`] enforce that on the write
//! path. The tombstone sentinel is likewise reserved and rejected as a value.
//!
//! ## Example
//!
//! ```rust
//! use minikv_record::{decode_wal, encode_wal, Record};
//!
//! let rec = Record::Put { key: "user:1".into(), value: "alice".into() };
//! let line = encode_wal(&rec);
//! assert_eq!(line, "PUT\tuser:1\talice\n");
//! assert_eq!(decode_wal(line.trim_end()).unwrap(), rec);
//! ```

use thiserror::Error;

/// Sentinel written in the value slot of an SST line to mark a deletion.
///
/// The sentinel shadows any older value for the same key until a full
/// compaction has eliminated both.
pub const TOMBSTONE: &str = "__TOMBSTONE__";

/// Field separator inside a record line.
pub const FIELD_SEP: char = '\t';

const OP_PUT: &str = "PUT";
const OP_DEL: &str = "DEL";

/// Errors produced by the codec and the input validators.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    /// A line that does not decode to exactly one record (wrong field count,
    /// unknown op).
    #[error("malformed record: {0}")]
    Malformed(String),

    /// A key or value that may not enter the store (reserved bytes, empty
    /// key, reserved sentinel).
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// One logical operation, as stored in the WAL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// Insert or overwrite `key` with `value`.
    Put { key: String, value: String },
    /// Delete `key` (a tombstone once it reaches an SST).
    Delete { key: String },
}

impl Record {
    /// The key this operation applies to.
    pub fn key(&self) -> &str {
        match self {
            Record::Put { key, .. } => key,
            Record::Delete { key } => key,
        }
    }
}

/// Checks that `key` is usable: non-empty and free of `\t` / `\n`.
pub fn validate_key(key: &str) -> Result<(), RecordError> {
    if key.is_empty() {
        return Err(RecordError::InvalidInput("key must not be empty".into()));
    }
    if key.contains(['\t', '\n']) {
        return Err(RecordError::InvalidInput(
            "key contains a reserved byte (tab or newline)".into(),
        ));
    }
    Ok(())
}

/// Checks that `value` is storable: free of `\t` / `\n` and not the
/// tombstone sentinel (which is reserved for deletions).
pub fn validate_value(value: &str) -> Result<(), RecordError> {
    if value.contains(['\t', '\n']) {
        return Err(RecordError::InvalidInput(
            "value contains a reserved byte (tab or newline)".into(),
        ));
    }
    if value == TOMBSTONE {
        return Err(RecordError::InvalidInput(
            "value collides with the reserved tombstone sentinel".into(),
        ));
    }
    Ok(())
}

/// Encodes a WAL record as one `\n`-terminated line.
pub fn encode_wal(record: &Record) -> String {
    match record {
        Record::Put { key, value } => format!("{OP_PUT}{FIELD_SEP}{key}{FIELD_SEP}{value}\n"),
        Record::Delete { key } => format!("{OP_DEL}{FIELD_SEP}{key}{FIELD_SEP}\n"),
    }
}

/// Decodes one WAL line (without its trailing `\n`).
///
/// Accepts a delete spelled either as `DEL\tkey\t` or as a PUT whose value
/// is the tombstone sentinel. Rejects any other field count or op.
pub fn decode_wal(line: &str) -> Result<Record, RecordError> {
    let fields: Vec<&str> = line.split(FIELD_SEP).collect();
    if fields.len() != 3 {
        return Err(RecordError::Malformed(format!(
            "expected 3 fields, found {}",
            fields.len()
        )));
    }
    let (op, key, value) = (fields[0], fields[1], fields[2]);
    match op {
        OP_PUT if value == TOMBSTONE => Ok(Record::Delete { key: key.to_owned() }),
        OP_PUT => Ok(Record::Put {
            key: key.to_owned(),
            value: value.to_owned(),
        }),
        OP_DEL => Ok(Record::Delete { key: key.to_owned() }),
        other => Err(RecordError::Malformed(format!("unknown op {other:?}"))),
    }
}

/// Encodes one SST line. `None` writes the tombstone sentinel.
pub fn encode_sst(key: &str, value: Option<&str>) -> String {
    format!("{key}{FIELD_SEP}{}\n", value.unwrap_or(TOMBSTONE))
}

/// Decodes one SST line (without its trailing `\n`) into
/// `(key, Some(value))` or `(key, None)` for a tombstone.
pub fn decode_sst(line: &str) -> Result<(String, Option<String>), RecordError> {
    let fields: Vec<&str> = line.split(FIELD_SEP).collect();
    if fields.len() != 2 {
        return Err(RecordError::Malformed(format!(
            "expected 2 fields, found {}",
            fields.len()
        )));
    }
    let value = match fields[1] {
        TOMBSTONE => None,
        v => Some(v.to_owned()),
    };
    Ok((fields[0].to_owned(), value))
}

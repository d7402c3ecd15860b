use std::cmp::Ordering;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use minikv_record as record;

use crate::{parse_ordinal, SstError};

/// Outcome of an SSTable point lookup.
///
/// `Tombstone` is a real answer, not an absence: it tells the engine to stop
/// probing older SSTables and report the key as deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// The key is present with this value.
    Found(String),
    /// The key is present as a deletion marker.
    Tombstone,
    /// This SSTable knows nothing about the key.
    NotFound,
}

/// Read handle for one immutable SSTable.
///
/// The reader holds no open file descriptor; each [`iter`](SstReader::iter)
/// or [`lookup`](SstReader::lookup) opens the file and scans it lazily.
/// With no index in the format, a lookup is a linear scan that stops early
/// once the sorted order passes the requested key.
#[derive(Debug)]
pub struct SstReader {
    path: PathBuf,
    ordinal: u64,
}

impl SstReader {
    /// Opens an SSTable, deriving its creation ordinal from the filename.
    ///
    /// # Errors
    ///
    /// Returns [`SstError::Corrupt`] when the filename does not match the
    /// `sst_NNNNNN.sst` pattern, or [`SstError::Io`] when the file is
    /// missing or unreadable.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SstError> {
        let path = path.as_ref().to_path_buf();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let ordinal = parse_ordinal(name).ok_or_else(|| {
            SstError::Corrupt(format!("unrecognized sstable filename {name:?}"))
        })?;

        // Surface a missing or unreadable file at open time, not mid-read.
        fs::metadata(&path)?;

        Ok(Self { path, ordinal })
    }

    /// The creation ordinal encoded in the filename. Greater is newer.
    #[must_use]
    pub fn ordinal(&self) -> u64 {
        self.ordinal
    }

    /// Path of the underlying `.sst` file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lazy in-order iterator over all records in the file.
    pub fn iter(&self) -> Result<SstIter, SstError> {
        let file = File::open(&self.path)?;
        Ok(SstIter {
            rdr: BufReader::new(file),
            buf: Vec::with_capacity(256),
        })
    }

    /// Point lookup for a single key.
    ///
    /// Scans the file in order and exploits its sortedness: the scan stops
    /// at the first record whose key is greater than the one requested.
    pub fn lookup(&self, key: &str) -> Result<Lookup, SstError> {
        for entry in self.iter()? {
            let (k, value) = entry?;
            match k.as_str().cmp(key) {
                Ordering::Less => continue,
                Ordering::Equal => {
                    return Ok(match value {
                        Some(v) => Lookup::Found(v),
                        None => Lookup::Tombstone,
                    });
                }
                Ordering::Greater => return Ok(Lookup::NotFound),
            }
        }
        Ok(Lookup::NotFound)
    }
}

/// Streaming record iterator over one SSTable file.
///
/// Yields `(key, value)` pairs in file order (ascending by key for any file
/// the writer produced); `None` values are tombstones. Unlike the WAL,
/// SSTables are written atomically, so any undecodable line is reported as
/// [`SstError::Corrupt`] rather than tolerated.
pub struct SstIter {
    rdr: BufReader<File>,
    buf: Vec<u8>,
}

impl Iterator for SstIter {
    type Item = Result<(String, Option<String>), SstError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.rdr.read_until(b'\n', &mut self.buf) {
            Ok(0) => return None,
            Ok(_) => {}
            Err(e) => return Some(Err(SstError::Io(e))),
        }
        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
        }

        let line = match std::str::from_utf8(&self.buf) {
            Ok(line) => line,
            Err(_) => {
                return Some(Err(SstError::Corrupt(
                    "sstable line is not valid utf-8".into(),
                )))
            }
        };

        Some(record::decode_sst(line).map_err(|e| SstError::Corrupt(e.to_string())))
    }
}

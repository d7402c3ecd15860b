//! # WAL — Write-Ahead Log
//!
//! Provides crash-safe durability for the MiniKV storage engine.
//!
//! Every mutation (`PUT` or `DELETE`) is encoded as one text line and
//! appended to the WAL **before** the corresponding in-memory update. On
//! restart the WAL is replayed to reconstruct the memtable, guaranteeing
//! that no write which passed its durability barrier is lost.
//!
//! ## Record format
//!
//! One record per line, `OP\tKEY\tVALUE\n` (see [`minikv_record`]). A crash
//! mid-append can leave a torn final line; replay tolerates it and recovers
//! every record before it.
//!
//! ## Durability policies
//!
//! When `append` returns, the record has been written to the file — whether
//! it has also been *forced to stable storage* is decided by the configured
//! [`SyncPolicy`]:
//!
//! - [`SyncPolicy::Sync`] — one barrier per append, zero acknowledged loss.
//! - [`SyncPolicy::Batch`] — a barrier every `every_n` appends or `interval`,
//!   whichever comes first.
//! - [`SyncPolicy::Adaptive`] — the batch size tracks recent throughput,
//!   bounded by `min_batch..=max_batch`, with an idle cap for quiet periods.
//!
//! ## Example
//!
//! ```rust,no_run
//! use minikv_record::Record;
//! use minikv_wal::{SyncPolicy, Wal, WalReader};
//!
//! let mut wal = Wal::open("wal.log", SyncPolicy::Sync).unwrap();
//! wal.append(&Record::Put { key: "hello".into(), value: "world".into() }).unwrap();
//! drop(wal);
//!
//! let mut rdr = WalReader::open("wal.log").unwrap();
//! rdr.replay(|rec| println!("{rec:?}")).unwrap();
//! ```

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use minikv_record::{self as record, Record};
use thiserror::Error;
use tracing::{debug, trace, warn};

mod policy;

pub use policy::SyncPolicy;
use policy::PolicyState;

/// Errors that can occur during WAL operations.
#[derive(Debug, Error)]
pub enum WalError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A record failed to decode with well-formed records still following it.
    #[error("corrupt wal: {0}")]
    Corrupt(String),
}

/// Append-only WAL writer with a pluggable durability policy.
///
/// Records are encoded and written to the underlying file in a single
/// `write_all` call; the policy then decides whether `sync_all` (fsync) runs
/// before `append` returns. The WAL counts the barriers it has issued so
/// embedders and tests can observe policy behavior.
pub struct Wal {
    file: File,
    path: PathBuf,
    policy: PolicyState,
    sync_count: u64,
}

impl Wal {
    /// Opens (or creates) a WAL file in append mode.
    pub fn open<P: AsRef<Path>>(path: P, policy: SyncPolicy) -> Result<Self, WalError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&path)?;
        debug!(path = %path.display(), ?policy, "wal opened");
        Ok(Self {
            file,
            path,
            policy: PolicyState::new(policy, Instant::now()),
            sync_count: 0,
        })
    }

    /// Encodes `record` and appends it to the WAL.
    ///
    /// Returns only after the policy's barrier rule has been honored for
    /// this record: if the policy calls for a sync, the sync has completed.
    pub fn append(&mut self, record: &Record) -> Result<(), WalError> {
        let line = record::encode_wal(record);
        self.file.write_all(line.as_bytes())?;
        trace!(key = record.key(), "wal record appended");

        let now = Instant::now();
        if self.policy.on_append(now) {
            self.sync_at(now)?;
        }
        Ok(())
    }

    /// Forces any unsynced appends to stable storage.
    ///
    /// A no-op when nothing is pending (always the case under
    /// [`SyncPolicy::Sync`]).
    pub fn sync(&mut self) -> Result<(), WalError> {
        if self.policy.pending() == 0 {
            return Ok(());
        }
        self.sync_at(Instant::now())
    }

    /// Time-driven hook: issues the barrier if the policy's time cap has
    /// expired with records pending.
    ///
    /// In the single-threaded model there is no background timer, so the
    /// embedder calls this opportunistically (the engine forwards it).
    pub fn tick(&mut self) -> Result<(), WalError> {
        let now = Instant::now();
        if self.policy.due(now) {
            self.sync_at(now)?;
        }
        Ok(())
    }

    fn sync_at(&mut self, now: Instant) -> Result<(), WalError> {
        self.file.sync_all()?;
        self.sync_count += 1;
        self.policy.note_sync(now);
        trace!(syncs = self.sync_count, "wal barrier issued");
        Ok(())
    }

    /// Atomically replaces the WAL with an empty file.
    ///
    /// Callers must only do this after a flush or compaction has durably
    /// produced the SST(s) that subsume the WAL's contents.
    pub fn truncate(&mut self) -> Result<(), WalError> {
        self.file.set_len(0)?;
        self.file.sync_all()?;
        self.policy.note_sync(Instant::now());
        debug!(path = %self.path.display(), "wal truncated");
        Ok(())
    }

    /// Number of durability barriers issued so far.
    #[must_use]
    pub fn sync_count(&self) -> u64 {
        self.sync_count
    }

    /// Path of the underlying WAL file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Sequential WAL reader that replays decoded records.
///
/// Generic over any `Read` implementor so that corruption and torn-tail
/// handling can be unit-tested against in-memory buffers.
pub struct WalReader<R: Read> {
    rdr: BufReader<R>,
}

impl WalReader<File> {
    /// Opens an existing WAL file for sequential replay.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<WalReader<File>, WalError> {
        let f = File::open(path)?;
        Ok(WalReader {
            rdr: BufReader::new(f),
        })
    }
}

impl<R: Read> WalReader<R> {
    /// Constructs a reader from any `Read` implementor (e.g. a `Cursor` in
    /// tests).
    pub fn from_reader(reader: R) -> Self {
        WalReader {
            rdr: BufReader::new(reader),
        }
    }

    /// Replays every record in the WAL in order, calling `apply` for each.
    ///
    /// # Termination
    ///
    /// - **Clean EOF** → `Ok(())`.
    /// - **Torn tail** (the final record fails to decode — truncated line,
    ///   partial write, even non-UTF-8 garbage) → `Ok(())` after yielding
    ///   every record before it.
    /// - **Decode failure with well-formed data after it** →
    ///   `Err(WalError::Corrupt)`.
    /// - **I/O error** → `Err(WalError::Io)`.
    ///
    /// Empty lines are skipped.
    pub fn replay<F>(&mut self, mut apply: F) -> Result<(), WalError>
    where
        F: FnMut(Record),
    {
        let mut buf = Vec::with_capacity(256);

        loop {
            buf.clear();
            let n = self.rdr.read_until(b'\n', &mut buf)?;
            if n == 0 {
                return Ok(());
            }
            if buf.last() == Some(&b'\n') {
                buf.pop();
            }
            if buf.is_empty() {
                continue;
            }

            let decoded: Result<Record, String> = match std::str::from_utf8(&buf) {
                Ok(line) => record::decode_wal(line).map_err(|e| e.to_string()),
                Err(_) => Err("record is not valid utf-8".into()),
            };

            match decoded {
                Ok(rec) => apply(rec),
                Err(reason) => {
                    // A record that fails to decode with nothing after it is
                    // the torn tail of a crashed append; everything before it
                    // has already been applied.
                    if self.rdr.fill_buf()?.is_empty() {
                        warn!(%reason, "discarding torn record at wal tail");
                        return Ok(());
                    }
                    return Err(WalError::Corrupt(reason));
                }
            }
        }
    }
}

//! # MiniKV — an embedded, single-writer LSM key-value store
//!
//! The central orchestrator that ties together the [`minikv_memtable`],
//! [`minikv_wal`], and [`minikv_sstable`] crates into a complete LSM-tree
//! key-value store.
//!
//! ## Architecture
//!
//! ```text
//! Embedder
//!   |
//!   v
//! ┌───────────────────────────────────────────────┐
//! │                   ENGINE                      │
//! │                                               │
//! │ write.rs → WAL append → MemTable insert       │
//! │              |                                │
//! │              |  (op threshold reached?)       │
//! │              |            yes                 │
//! │              v                                │
//! │           flush() → new SSTable + checkpoint  │
//! │                                               │
//! │ compaction.rs → merge all SSTs → 1 snapshot   │
//! │                                               │
//! │ read.rs → MemTable → SSTs newest-to-oldest    │
//! │            (first match wins)                 │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Module responsibilities
//!
//! | Module         | Purpose                                             |
//! |----------------|-----------------------------------------------------|
//! | `lib.rs`       | `Engine` struct, open/close, accessors, `Debug`, `Drop` |
//! | [`recovery`]   | WAL replay, SSTable discovery, tmp file cleanup     |
//! | [`write`]      | `put()`, `delete()`, `flush()`                      |
//! | [`read`]       | `get()`                                             |
//! | [`compaction`] | `compact()`: full merge + tombstone reclamation     |
//!
//! ## Crash safety
//!
//! Every write is appended to the WAL **before** the MemTable update, and
//! the WAL is truncated only after a flush or compaction has durably
//! produced the SSTable(s) that subsume it. SSTables are written atomically
//! via temp file + rename. On open, the WAL is replayed into a fresh
//! MemTable and the SSTable stack is rediscovered from filenames.
//!
//! ## Concurrency
//!
//! None — by design. There is exactly one logical writer, reads and writes
//! never overlap, and flush/compaction run synchronously on the calling
//! path. Multiple engines over *different* directories may coexist; two
//! engines over the same directory are unsupported.
//!
//! ## Example
//!
//! ```rust,no_run
//! use minikv::{Config, Engine};
//!
//! let mut db = Engine::open("./data", Config::default()).unwrap();
//! db.put("user:1", "alice").unwrap();
//! assert_eq!(db.get("user:1").unwrap().as_deref(), Some("alice"));
//! db.delete("user:1").unwrap();
//! assert_eq!(db.get("user:1").unwrap(), None);
//! db.close().unwrap();
//! ```

mod compaction;
mod config;
mod error;
mod read;
mod recovery;
mod write;

pub use config::Config;
pub use error::{Error, Result};
pub use minikv_wal::SyncPolicy;

use std::fs;
use std::path::{Path, PathBuf};

use minikv_memtable::MemTable;
use minikv_sstable::SstReader;
use minikv_wal::Wal;
use tracing::info;

/// Name of the single WAL file inside the data directory.
const WAL_FILENAME: &str = "wal.log";

/// Engine lifecycle: operations are accepted only while `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ready,
    Closed,
}

/// The storage engine: a scoped resource opened against a directory and
/// released on [`close`](Engine::close).
///
/// # Write path
///
/// 1. Validate the key (and value) against the reserved bytes.
/// 2. Append the record to the WAL; the configured [`SyncPolicy`] decides
///    whether a durability barrier runs before the append returns.
/// 3. Apply the mutation to the MemTable.
/// 4. If the MemTable has absorbed `flush_threshold_ops` operations, flush
///    it to a new SSTable and truncate the WAL.
///
/// # Read path
///
/// 1. Check the MemTable (freshest data, tombstones included).
/// 2. Check SSTables from newest to oldest; the first value or tombstone
///    found decides the answer.
///
/// # Recovery
///
/// [`Engine::open`] deletes leftover temporary files, discovers SSTables by
/// filename ordinal, and replays the WAL into a fresh MemTable before
/// accepting operations.
pub struct Engine {
    dir: PathBuf,
    config: Config,
    wal: Wal,
    mem: MemTable,
    /// SSTable stack, newest (greatest ordinal) first.
    ssts: Vec<SstReader>,
    /// Ordinal the next flush or compaction output will be named with.
    next_ordinal: u64,
    state: State,
}

impl Engine {
    /// Opens (or creates) a store in `dir` and recovers its state.
    pub fn open<P: AsRef<Path>>(dir: P, config: Config) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        recovery::cleanup_tmp_files(&dir);

        let (ssts, next_ordinal) = recovery::scan_ssts(&dir)?;

        // Replay before opening the writer so the reader sees a quiescent
        // file.
        let wal_path = dir.join(WAL_FILENAME);
        let mut mem = MemTable::new();
        let replayed = recovery::replay_wal(&wal_path, &mut mem)?;

        let wal = Wal::open(&wal_path, config.wal_policy)?;

        info!(
            dir = %dir.display(),
            sstables = ssts.len(),
            replayed,
            "engine opened"
        );

        Ok(Self {
            dir,
            config,
            wal,
            mem,
            ssts,
            next_ordinal,
            state: State::Ready,
        })
    }

    /// Syncs any unsynced WAL tail and stops accepting operations.
    ///
    /// Idempotent. Unflushed MemTable contents are *not* written to an
    /// SSTable — the WAL holds them and the next [`open`](Engine::open)
    /// replays them.
    pub fn close(&mut self) -> Result<()> {
        if self.state == State::Closed {
            return Ok(());
        }
        self.wal.sync()?;
        self.state = State::Closed;
        info!(dir = %self.dir.display(), "engine closed");
        Ok(())
    }

    /// Time-driven hook for the WAL policy.
    ///
    /// With no background threads, a batched or adaptive policy can only
    /// honor its time cap when somebody asks; embedders call this
    /// opportunistically (e.g. from their own idle loop) to bound the loss
    /// window during quiet periods.
    pub fn tick(&mut self) -> Result<()> {
        self.ensure_ready()?;
        self.wal.tick()?;
        Ok(())
    }

    fn ensure_ready(&self) -> Result<()> {
        match self.state {
            State::Ready => Ok(()),
            State::Closed => Err(Error::Closed),
        }
    }

    // -------------------------------------------------------------------
    // Accessors (for embedders, tests, and debugging)
    // -------------------------------------------------------------------

    /// The data directory this engine owns.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The configuration the engine was opened with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of SSTables currently in the stack.
    #[must_use]
    pub fn sstable_count(&self) -> usize {
        self.ssts.len()
    }

    /// Operations absorbed by the MemTable since the last flush.
    #[must_use]
    pub fn memtable_ops(&self) -> usize {
        self.mem.size()
    }

    /// Durability barriers the WAL has issued so far.
    #[must_use]
    pub fn wal_sync_count(&self) -> u64 {
        self.wal.sync_count()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("dir", &self.dir)
            .field("flush_threshold_ops", &self.config.flush_threshold_ops)
            .field("wal_policy", &self.config.wal_policy)
            .field("memtable_ops", &self.mem.size())
            .field("memtable_keys", &self.mem.len())
            .field("sstable_count", &self.ssts.len())
            .field("next_ordinal", &self.next_ordinal)
            .field("state", &self.state)
            .finish()
    }
}

/// Best-effort barrier on drop.
///
/// Errors are ignored because `Drop` cannot propagate them; anything left
/// unsynced is at most one policy window of acknowledged-but-unsynced
/// records, exactly the loss the configured policy already permits.
impl Drop for Engine {
    fn drop(&mut self) {
        if self.state == State::Ready {
            let _ = self.wal.sync();
        }
    }
}

#[cfg(test)]
mod tests;

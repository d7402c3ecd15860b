//! Write path: `put()`, `delete()`, `flush()`, and the internal flush.
//!
//! All mutations flow through this module. Each write is validated, appended
//! to the WAL (which enforces the configured durability policy), and then
//! applied to the MemTable. When the MemTable has absorbed
//! `flush_threshold_ops` operations it is persisted to a new SSTable and the
//! WAL is truncated as a checkpoint.

use minikv_record::{self as record, Record};
use minikv_sstable::{sst_filename, SstReader, SstWriter};
use tracing::info;

use crate::{Engine, Result};

impl Engine {
    /// Inserts or overwrites a key-value pair.
    ///
    /// On return, the record is in the WAL and the MemTable; it is on
    /// stable storage as far as the configured [`SyncPolicy`] promises. If
    /// the WAL append fails the MemTable is left untouched and the error
    /// surfaces unchanged.
    ///
    /// [`SyncPolicy`]: crate::SyncPolicy
    pub fn put(&mut self, key: &str, value: &str) -> Result<()> {
        self.ensure_ready()?;
        record::validate_key(key)?;
        record::validate_value(value)?;

        self.wal.append(&Record::Put {
            key: key.to_owned(),
            value: value.to_owned(),
        })?;
        self.mem.put(key.to_owned(), value.to_owned());

        self.maybe_flush()
    }

    /// Deletes a key by recording a tombstone.
    ///
    /// The tombstone shadows any older value in the SSTables until a full
    /// compaction reclaims both. Deleting a key that was never written is
    /// legal and still records a tombstone.
    pub fn delete(&mut self, key: &str) -> Result<()> {
        self.ensure_ready()?;
        record::validate_key(key)?;

        self.wal.append(&Record::Delete {
            key: key.to_owned(),
        })?;
        self.mem.delete(key.to_owned());

        self.maybe_flush()
    }

    /// Forces the MemTable to disk regardless of its size. A no-op when the
    /// MemTable is empty.
    pub fn flush(&mut self) -> Result<()> {
        self.ensure_ready()?;
        self.flush_inner()
    }

    fn maybe_flush(&mut self) -> Result<()> {
        if self.mem.size() >= self.config.flush_threshold_ops {
            self.flush_inner()?;
        }
        Ok(())
    }

    /// Materializes the MemTable as the next SSTable and checkpoints.
    ///
    /// # Steps
    ///
    /// 1. Sync the WAL tail — the checkpoint must not outrun durability.
    /// 2. Write the drained entries to `sst_NNNNNN.sst` (temp + rename).
    /// 3. Push the new SSTable onto the stack as the newest layer.
    /// 4. Truncate the WAL — the SSTable now subsumes its contents.
    /// 5. The MemTable was reset by the drain.
    ///
    /// If the SSTable write fails, nothing became visible: the drained
    /// entries are restored into the MemTable, operation counter included
    /// (the WAL still holds every one of them), and the error propagates.
    pub(crate) fn flush_inner(&mut self) -> Result<()> {
        if self.mem.is_empty() {
            return Ok(());
        }

        self.wal.sync()?;

        let ordinal = self.next_ordinal;
        let path = self.dir.join(sst_filename(ordinal));
        let ops = self.mem.size();
        let entries: Vec<(String, Option<String>)> = self.mem.drain_sorted().collect();
        let records = entries.len();

        let written = SstWriter::write(
            &path,
            entries.iter().map(|(k, v)| (k.clone(), v.clone())),
        );
        if let Err(e) = written {
            self.mem.restore(entries, ops);
            return Err(e.into());
        }

        self.ssts.insert(0, SstReader::open(&path)?);
        self.next_ordinal = ordinal + 1;

        self.wal.truncate()?;

        info!(ordinal, records, "memtable flushed");
        Ok(())
    }
}

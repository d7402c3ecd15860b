//! Compaction: merges every SSTable into a single newest-wins snapshot.
//!
//! Uses [`MergeIterator`] for sorted, deduplicated streaming across all
//! input files. Because the merge spans *every* SSTable, a tombstone has
//! nothing left to shadow once its key wins the merge, so tombstoned keys
//! are dropped entirely. The result is written atomically (temp file +
//! rename), the input files are deleted, and the WAL is truncated as a
//! checkpoint.

use std::fs;

use minikv_sstable::{sst_filename, MergeIterator, SstError, SstReader, SstWriter};
use tracing::info;

use crate::{Engine, Result};

/// Runs the k-way merge over `inputs` and keeps the records that survive a
/// full compaction: for every key the greatest ordinal wins, and a winning
/// tombstone drops the key entirely (every older record for it is among the
/// inputs, so nothing is left to shadow).
fn collect_survivors(
    inputs: &[SstReader],
) -> std::result::Result<Vec<(String, Option<String>)>, SstError> {
    let mut merge = MergeIterator::new(inputs)?;
    let mut survivors = Vec::new();
    while let Some((key, value)) = merge.next_entry()? {
        if value.is_some() {
            survivors.push((key, value));
        }
    }
    Ok(survivors)
}

impl Engine {
    /// Compacts the whole store into (at most) one SSTable.
    ///
    /// Any unflushed MemTable contents are folded into the SSTable stack
    /// first; truncating the WAL at the checkpoint below would otherwise
    /// discard the only durable copy of an acknowledged write.
    ///
    /// For every key the record from the greatest ordinal wins. If the
    /// winning record is a tombstone the key is dropped — no output record
    /// — which is what reclaims deleted keys' space. If *every* key was
    /// tombstoned, no output file is produced at all and the store ends up
    /// logically empty.
    ///
    /// Compacting an already-compacted store rewrites the single SSTable
    /// under a fresh ordinal; the data content is unchanged.
    ///
    /// # Crash safety
    ///
    /// The new SSTable becomes visible atomically before any input is
    /// deleted. A crash in between leaves redundant input files behind;
    /// they are superseded on the next open by the newest-wins rule and
    /// removed by the next compaction.
    pub fn compact(&mut self) -> Result<()> {
        self.ensure_ready()?;

        self.flush_inner()?;

        if self.ssts.is_empty() {
            return Ok(());
        }

        let inputs = std::mem::take(&mut self.ssts);
        let ordinal = self.next_ordinal;
        let out_path = self.dir.join(sst_filename(ordinal));

        let survivors = match collect_survivors(&inputs) {
            Ok(s) => s,
            Err(e) => {
                self.ssts = inputs;
                return Err(e.into());
            }
        };

        match SstWriter::write(&out_path, survivors.into_iter()) {
            Ok(()) => {}
            Err(SstError::Empty) => {
                // Every key was tombstoned. Delete the inputs oldest-first:
                // if a deletion fails, the surviving newer files still carry
                // the tombstones that shadow everything older, so no key can
                // resurrect.
                let mut remaining = inputs;
                while let Some(r) = remaining.pop() {
                    if let Err(e) = fs::remove_file(r.path()) {
                        remaining.push(r);
                        self.ssts = remaining;
                        return Err(e.into());
                    }
                }
                self.wal.truncate()?;
                info!("compaction emptied the store");
                return Ok(());
            }
            Err(e) => {
                self.ssts = inputs;
                return Err(e.into());
            }
        }

        let reader = match SstReader::open(&out_path) {
            Ok(r) => r,
            Err(e) => {
                self.ssts = inputs;
                return Err(e.into());
            }
        };

        // The snapshot now owns this ordinal whatever happens below; a
        // later flush must not reuse it.
        self.next_ordinal = ordinal + 1;

        // The snapshot is visible and durable; the inputs are redundant
        // now. Delete them oldest-first and stop on the first failure:
        // everything still on disk is then newer than the undeleted file,
        // so its tombstones keep shadowing whatever that file holds and no
        // key can resurrect. The error path serves the snapshot plus the
        // undeleted tail; the next compaction retries the cleanup.
        let input_count = inputs.len();
        let mut remaining = inputs;
        while let Some(r) = remaining.pop() {
            if let Err(e) = fs::remove_file(r.path()) {
                remaining.push(r);
                remaining.insert(0, reader);
                self.ssts = remaining;
                return Err(e.into());
            }
        }

        info!(inputs = input_count, ordinal, "compaction complete");

        self.ssts = vec![reader];

        self.wal.truncate()?;

        Ok(())
    }
}

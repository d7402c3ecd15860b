use std::fs::{self, rename, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use minikv_record as record;
use tracing::debug;

use crate::SstError;

/// Writes a sorted record stream to disk as an immutable SSTable file.
///
/// The writer is stateless — all work happens inside the single static
/// method [`write`](SstWriter::write). The write is crash-safe: data is
/// first written to a temporary sibling, fsynced, and then atomically
/// renamed to the final path, so a partial file never becomes visible under
/// its final name.
pub struct SstWriter {}

impl SstWriter {
    /// Writes `entries` to a new SSTable at `path`.
    ///
    /// # Arguments
    ///
    /// * `path` – destination `.sst` file path.
    /// * `entries` – records in **ascending key order**, at most one per
    ///   key; `None` values are tombstones. The caller is responsible for
    ///   sorting and deduplication (the memtable and the merge iterator
    ///   both already guarantee it).
    ///
    /// # Errors
    ///
    /// Returns [`SstError::Empty`] if the iterator yields zero records (the
    /// temporary file is removed and nothing appears at `path`), or
    /// [`SstError::Io`] on any I/O failure.
    pub fn write<I>(path: &Path, entries: I) -> Result<(), SstError>
    where
        I: Iterator<Item = (String, Option<String>)>,
    {
        let tmp_path = tmp_sibling(path);
        let raw_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;
        let mut file = BufWriter::new(raw_file);

        let mut written = 0usize;
        for (key, value) in entries {
            let line = record::encode_sst(&key, value.as_deref());
            file.write_all(line.as_bytes())?;
            written += 1;
        }

        if written == 0 {
            drop(file);
            let _ = fs::remove_file(&tmp_path);
            return Err(SstError::Empty);
        }

        // Flush the BufWriter, then sync the underlying file.
        file.flush()?;
        file.into_inner().map_err(io::Error::from)?.sync_all()?;

        // Atomically move into place.
        rename(&tmp_path, path)?;

        // Fsync the parent directory so the rename itself survives a crash.
        if let Some(parent) = path.parent() {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }

        debug!(path = %path.display(), records = written, "sstable written");
        Ok(())
    }
}

/// The temporary path an in-progress SSTable is written under:
/// `sst_000001.sst` → `sst_000001.sst.tmp`.
pub(crate) fn tmp_sibling(path: &Path) -> PathBuf {
    path.with_extension("sst.tmp")
}

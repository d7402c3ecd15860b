//! Cold-start recovery: WAL replay, SSTable discovery, tmp cleanup.

use std::fs;
use std::path::{Path, PathBuf};

use minikv_memtable::MemTable;
use minikv_record::Record;
use minikv_sstable::{parse_ordinal, SstReader};
use minikv_wal::{WalError, WalReader};
use tracing::{debug, warn};

use crate::Result;

/// Replays the WAL at `path` into `mem`, returning the number of records
/// applied. A missing file is a fresh start, not an error.
///
/// Replay tolerates a torn trailing record (crash mid-append); a decode
/// failure anywhere else surfaces as corruption and aborts the open.
pub(crate) fn replay_wal(path: &Path, mem: &mut MemTable) -> Result<usize> {
    let mut reader = match WalReader::open(path) {
        Ok(r) => r,
        Err(WalError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut applied = 0usize;
    reader.replay(|rec| {
        match rec {
            Record::Put { key, value } => mem.put(key, value),
            Record::Delete { key } => mem.delete(key),
        }
        applied += 1;
    })?;

    debug!(records = applied, "wal replayed");
    Ok(applied)
}

/// Scans `dir` for SSTables and opens them newest-first, also computing the
/// ordinal the next created file will take (greatest existing + 1).
pub(crate) fn scan_ssts(dir: &Path) -> Result<(Vec<SstReader>, u64)> {
    let mut found: Vec<(u64, PathBuf)> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if let Some(ordinal) = parse_ordinal(name) {
                found.push((ordinal, path));
            }
        }
    }

    // Newest (greatest ordinal) first; ordinals are unique by construction.
    found.sort_by(|a, b| b.0.cmp(&a.0));
    let next_ordinal = found.first().map(|(o, _)| o + 1).unwrap_or(1);

    let mut readers = Vec::with_capacity(found.len());
    for (_, path) in &found {
        readers.push(SstReader::open(path)?);
    }
    Ok((readers, next_ordinal))
}

/// Removes leftover `*.sst.tmp` files from writes interrupted by a crash.
/// Best-effort: a file that cannot be deleted is only logged — it can never
/// become visible under a final name.
pub(crate) fn cleanup_tmp_files(dir: &Path) {
    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.ends_with(".sst.tmp") {
                    warn!(path = %path.display(), "removing leftover temporary sstable");
                    let _ = fs::remove_file(&path);
                }
            }
        }
    }
}

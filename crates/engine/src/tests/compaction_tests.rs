use anyhow::Result;
use tempfile::tempdir;

use super::helpers::{all_sst_text, count_sst_files, open_default, open_with, sst_file_names};
use crate::SyncPolicy;

// --------------------- Collapsing the stack ---------------------

#[test]
fn compaction_collapses_stack_to_one_sstable() -> Result<()> {
    let dir = tempdir()?;
    let mut engine = open_with(dir.path(), 3, SyncPolicy::Sync);

    for i in 0..10 {
        engine.put(&format!("k{i:02}"), &format!("v{i}"))?;
    }
    assert!(engine.sstable_count() >= 3, "ten puts at threshold three");

    engine.compact()?;
    assert_eq!(engine.sstable_count(), 1);
    assert_eq!(count_sst_files(dir.path()), 1);

    for i in 0..10 {
        assert_eq!(
            engine.get(&format!("k{i:02}"))?.as_deref(),
            Some(format!("v{i}").as_str())
        );
    }
    Ok(())
}

#[test]
fn compaction_keeps_newest_value_per_key() -> Result<()> {
    let dir = tempdir()?;
    let mut engine = open_default(dir.path());

    engine.put("k", "v1")?;
    engine.flush()?;
    engine.put("k", "v2")?;
    engine.flush()?;
    engine.put("k", "v3")?;

    engine.compact()?;
    assert_eq!(engine.get("k")?.as_deref(), Some("v3"));
    Ok(())
}

#[test]
fn compaction_folds_unflushed_writes_into_the_snapshot() -> Result<()> {
    let dir = tempdir()?;
    let mut engine = open_default(dir.path());

    engine.put("flushed", "1")?;
    engine.flush()?;
    engine.put("buffered", "2")?;

    engine.compact()?;
    assert_eq!(engine.sstable_count(), 1);
    assert_eq!(engine.memtable_ops(), 0);
    assert_eq!(engine.get("buffered")?.as_deref(), Some("2"));

    // The snapshot must hold the buffered write; the wal is a fresh
    // checkpoint.
    assert!(all_sst_text(dir.path()).contains("buffered\t2\n"));
    assert_eq!(
        std::fs::metadata(dir.path().join("wal.log"))?.len(),
        0
    );
    Ok(())
}

// --------------------- Equivalence ---------------------

#[test]
fn gets_are_identical_before_and_after_compaction() -> Result<()> {
    let dir = tempdir()?;
    let mut engine = open_with(dir.path(), 4, SyncPolicy::Sync);

    for i in 0..30 {
        engine.put(&format!("k{i:02}"), &format!("first{i}"))?;
    }
    for i in (0..30).step_by(3) {
        engine.put(&format!("k{i:02}"), &format!("second{i}"))?;
    }
    for i in (0..30).step_by(5) {
        engine.delete(&format!("k{i:02}"))?;
    }

    let before: Vec<Option<String>> = (0..30)
        .map(|i| engine.get(&format!("k{i:02}")).unwrap())
        .collect();

    engine.compact()?;

    let after: Vec<Option<String>> = (0..30)
        .map(|i| engine.get(&format!("k{i:02}")).unwrap())
        .collect();

    assert_eq!(before, after);
    Ok(())
}

#[test]
fn second_compaction_is_a_data_noop() -> Result<()> {
    let dir = tempdir()?;
    let mut engine = open_default(dir.path());

    engine.put("a", "1")?;
    engine.put("b", "2")?;
    engine.compact()?;
    let first = all_sst_text(dir.path());

    engine.compact()?;
    let second = all_sst_text(dir.path());

    assert_eq!(first, second, "same records, possibly a fresh filename");
    assert_eq!(engine.sstable_count(), 1);
    Ok(())
}

#[test]
fn compacting_an_empty_store_is_a_noop() -> Result<()> {
    let dir = tempdir()?;
    let mut engine = open_default(dir.path());

    engine.compact()?;
    assert_eq!(count_sst_files(dir.path()), 0);
    Ok(())
}

// --------------------- Tombstone reclamation ---------------------

#[test]
fn compaction_drops_tombstones_and_their_keys() -> Result<()> {
    let dir = tempdir()?;
    let mut engine = open_default(dir.path());

    engine.put("x", "1")?;
    engine.delete("x")?;
    engine.put("keep", "v")?;
    engine.flush()?;

    // Before compaction the tombstone is on disk.
    assert!(all_sst_text(dir.path()).contains("__TOMBSTONE__"));

    engine.compact()?;

    let text = all_sst_text(dir.path());
    assert!(!text.contains("__TOMBSTONE__"));
    assert!(!text.contains('x'), "no line mentions the deleted key");
    assert_eq!(engine.get("x")?, None);
    assert_eq!(engine.get("keep")?.as_deref(), Some("v"));
    Ok(())
}

#[test]
fn deleting_every_key_compacts_to_an_empty_store() -> Result<()> {
    let dir = tempdir()?;
    let mut engine = open_default(dir.path());

    engine.put("a", "1")?;
    engine.put("b", "2")?;
    engine.flush()?;
    engine.delete("a")?;
    engine.delete("b")?;

    engine.compact()?;
    assert_eq!(count_sst_files(dir.path()), 0);
    assert_eq!(engine.sstable_count(), 0);
    assert_eq!(engine.get("a")?, None);
    assert_eq!(engine.get("b")?, None);

    // The empty state survives a reopen.
    engine.close()?;
    let engine = open_default(dir.path());
    assert_eq!(engine.get("a")?, None);
    Ok(())
}

#[test]
fn compaction_output_takes_the_next_ordinal() -> Result<()> {
    let dir = tempdir()?;
    let mut engine = open_default(dir.path());

    engine.put("a", "1")?;
    engine.flush()?;
    engine.put("b", "2")?;
    engine.flush()?;

    engine.compact()?;
    assert_eq!(sst_file_names(dir.path()), vec!["sst_000003.sst"]);

    // Writes after the compaction stack on top of the snapshot.
    engine.put("c", "3")?;
    engine.flush()?;
    assert_eq!(
        sst_file_names(dir.path()),
        vec!["sst_000003.sst", "sst_000004.sst"]
    );
    Ok(())
}

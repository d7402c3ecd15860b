//! End-to-end scenarios exercising the full engine lifecycle: sessions,
//! simulated crashes, flush/compaction cycles, and the three durability
//! policies.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use minikv::{Config, Engine, SyncPolicy};
use tempfile::tempdir;

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

fn open(dir: &Path, flush_threshold_ops: usize, wal_policy: SyncPolicy) -> Engine {
    init_tracing();
    Engine::open(
        dir,
        Config {
            flush_threshold_ops,
            wal_policy,
        },
    )
    .unwrap()
}

/// Abandons the engine without running `Drop`, simulating a process crash.
fn crash(engine: Engine) {
    std::mem::forget(engine);
}

fn count_keys(engine: &Engine, n: usize) -> usize {
    (0..n)
        .filter(|i| engine.get(&format!("key{i:04}")).unwrap().is_some())
        .count()
}

// --------------------- Sessions ---------------------

#[test]
fn basic_session_reads_back_latest_writes() -> Result<()> {
    let dir = tempdir()?;
    let mut db = open(dir.path(), 1024, SyncPolicy::Sync);

    db.put("a", "1")?;
    db.put("b", "2")?;
    db.put("a", "3")?;

    assert_eq!(db.get("a")?.as_deref(), Some("3"));
    assert_eq!(db.get("b")?.as_deref(), Some("2"));
    assert_eq!(db.get("c")?, None);
    Ok(())
}

#[test]
fn crash_without_clean_close_preserves_synced_writes() -> Result<()> {
    let dir = tempdir()?;
    {
        let mut db = open(dir.path(), 1024, SyncPolicy::Sync);
        db.put("a", "1")?;
        db.put("b", "2")?;
        db.put("a", "3")?;
        crash(db);
    }

    let db = open(dir.path(), 1024, SyncPolicy::Sync);
    assert_eq!(db.get("a")?.as_deref(), Some("3"));
    assert_eq!(db.get("b")?.as_deref(), Some("2"));
    assert_eq!(db.get("c")?, None);
    Ok(())
}

#[test]
fn reopen_is_idempotent() -> Result<()> {
    let dir = tempdir()?;
    {
        let mut db = open(dir.path(), 3, SyncPolicy::Sync);
        for i in 0..7 {
            db.put(&format!("key{i:04}"), "v")?;
        }
        db.delete("key0003")?;
        db.close()?;
    }

    for _ in 0..2 {
        let mut db = open(dir.path(), 3, SyncPolicy::Sync);
        assert_eq!(count_keys(&db, 7), 6);
        assert_eq!(db.get("key0003")?, None);
        db.close()?;
    }
    Ok(())
}

// --------------------- Deletion through the layers ---------------------

#[test]
fn deleted_key_stays_absent_through_flush_and_compaction() -> Result<()> {
    let dir = tempdir()?;
    let mut db = open(dir.path(), 1024, SyncPolicy::Sync);

    db.put("x", "1")?;
    db.delete("x")?;
    assert_eq!(db.get("x")?, None);

    db.flush()?;
    assert_eq!(db.get("x")?, None);

    db.compact()?;
    assert_eq!(db.get("x")?, None);

    // After full compaction no sstable line mentions the key.
    for entry in fs::read_dir(dir.path())? {
        let path = entry?.path();
        if path.extension().map(|e| e == "sst").unwrap_or(false) {
            let text = fs::read_to_string(&path)?;
            assert!(!text.contains('x'), "{} mentions the deleted key", path.display());
        }
    }
    Ok(())
}

// --------------------- Flush / compaction lifecycle ---------------------

#[test]
fn flush_threshold_builds_a_stack_and_compaction_collapses_it() -> Result<()> {
    let dir = tempdir()?;
    let mut db = open(dir.path(), 3, SyncPolicy::Sync);

    for i in 0..10 {
        db.put(&format!("key{i:04}"), &format!("v{i}"))?;
    }
    assert!(db.sstable_count() >= 3);

    db.compact()?;
    assert_eq!(db.sstable_count(), 1);

    for i in 0..10 {
        assert_eq!(
            db.get(&format!("key{i:04}"))?.as_deref(),
            Some(format!("v{i}").as_str())
        );
    }
    Ok(())
}

#[test]
fn every_sstable_is_sorted_at_every_stage() -> Result<()> {
    let dir = tempdir()?;
    let mut db = open(dir.path(), 4, SyncPolicy::Sync);

    // Insertion order deliberately unsorted.
    for key in ["pear", "apple", "zebra", "mango", "fig", "kiwi", "date", "plum"] {
        db.put(key, "v")?;
    }
    db.flush()?;

    let assert_all_sorted = |stage: &str| {
        for entry in fs::read_dir(dir.path()).unwrap() {
            let path = entry.unwrap().path();
            if !path.extension().map(|e| e == "sst").unwrap_or(false) {
                continue;
            }
            let text = fs::read_to_string(&path).unwrap();
            let keys: Vec<&str> = text.lines().map(|l| l.split('\t').next().unwrap()).collect();
            let mut sorted = keys.clone();
            sorted.sort_unstable();
            assert_eq!(keys, sorted, "{} unsorted after {stage}", path.display());
        }
    };

    assert_all_sorted("flush");
    db.compact()?;
    assert_all_sorted("compaction");
    Ok(())
}

// --------------------- Durability policies ---------------------

#[test]
fn batch_policy_bounds_loss_and_sync_policy_loses_nothing() -> Result<()> {
    let workload = 250usize;

    // BATCH(100): everything up to the last synced batch must survive.
    let batch_dir = tempdir()?;
    {
        let mut db = open(
            batch_dir.path(),
            100_000,
            SyncPolicy::Batch {
                every_n: 100,
                interval: Duration::from_secs(3600),
            },
        );
        for i in 0..workload {
            db.put(&format!("key{i:04}"), "v")?;
        }
        crash(db);
    }
    let db = open(batch_dir.path(), 100_000, SyncPolicy::Sync);
    assert!(count_keys(&db, workload) >= 150);

    // SYNC: the whole workload survives.
    let sync_dir = tempdir()?;
    {
        let mut db = open(sync_dir.path(), 100_000, SyncPolicy::Sync);
        for i in 0..workload {
            db.put(&format!("key{i:04}"), "v")?;
        }
        crash(db);
    }
    let db = open(sync_dir.path(), 100_000, SyncPolicy::Sync);
    assert_eq!(count_keys(&db, workload), workload);
    Ok(())
}

#[test]
fn adaptive_syncs_less_than_small_batches_under_sustained_load() -> Result<()> {
    let workload = 2000usize;

    let batch_dir = tempdir()?;
    let batch_syncs = {
        let mut db = open(
            batch_dir.path(),
            1_000_000,
            SyncPolicy::Batch {
                every_n: 10,
                interval: Duration::from_secs(3600),
            },
        );
        for i in 0..workload {
            db.put(&format!("key{i:04}"), "v")?;
        }
        let syncs = db.wal_sync_count();
        db.close()?;
        syncs
    };

    let adaptive_dir = tempdir()?;
    let adaptive_syncs = {
        let mut db = open(
            adaptive_dir.path(),
            1_000_000,
            SyncPolicy::Adaptive {
                min_batch: 16,
                max_batch: 256,
                idle: Duration::from_millis(50),
            },
        );
        for i in 0..workload {
            db.put(&format!("key{i:04}"), "v")?;
        }
        let syncs = db.wal_sync_count();
        db.close()?;
        syncs
    };

    assert!(
        adaptive_syncs < batch_syncs,
        "adaptive issued {adaptive_syncs} barriers, batch(10) issued {batch_syncs}"
    );

    // A clean close means zero loss regardless of the policy.
    let db = open(adaptive_dir.path(), 1_000_000, SyncPolicy::Sync);
    assert_eq!(count_keys(&db, workload), workload);
    Ok(())
}

// --------------------- WAL robustness ---------------------

#[test]
fn arbitrary_garbage_at_wal_tail_does_not_prevent_recovery() -> Result<()> {
    let dir = tempdir()?;
    {
        let mut db = open(dir.path(), 1024, SyncPolicy::Sync);
        for i in 0..5 {
            db.put(&format!("key{i:04}"), "v")?;
        }
        crash(db);
    }

    // Shorter than one full record, not even valid UTF-8.
    let mut data = fs::read(dir.path().join("wal.log"))?;
    data.extend_from_slice(&[0x50, 0x55, 0x54, 0x09, 0xFF]);
    fs::write(dir.path().join("wal.log"), &data)?;

    let db = open(dir.path(), 1024, SyncPolicy::Sync);
    assert_eq!(count_keys(&db, 5), 5);
    Ok(())
}

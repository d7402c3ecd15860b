use std::fs;
use std::path::Path;

use crate::{Config, Engine, SyncPolicy};

pub fn open_with(dir: &Path, flush_threshold_ops: usize, wal_policy: SyncPolicy) -> Engine {
    Engine::open(
        dir,
        Config {
            flush_threshold_ops,
            wal_policy,
        },
    )
    .unwrap()
}

/// High flush threshold + every-append durability: the configuration most
/// tests want.
pub fn open_default(dir: &Path) -> Engine {
    open_with(dir, 1024, SyncPolicy::Sync)
}

/// Abandons the engine without running `Drop`, simulating a crash.
pub fn crash(engine: Engine) {
    std::mem::forget(engine);
}

pub fn count_sst_files(dir: &Path) -> usize {
    sst_file_names(dir).len()
}

/// Names of all `.sst` files in `dir`, sorted.
pub fn sst_file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".sst"))
        .collect();
    names.sort();
    names
}

/// Concatenated text of every `.sst` file in `dir`, in filename order.
pub fn all_sst_text(dir: &Path) -> String {
    sst_file_names(dir)
        .iter()
        .map(|n| fs::read_to_string(dir.join(n)).unwrap())
        .collect()
}

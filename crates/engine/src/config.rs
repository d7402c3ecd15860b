//! Engine configuration.

use minikv_wal::SyncPolicy;

/// Configuration for a MiniKV instance, passed to
/// [`Engine::open`](crate::Engine::open).
///
/// ```rust
/// use std::time::Duration;
/// use minikv::{Config, SyncPolicy};
///
/// let config = Config {
///     flush_threshold_ops: 4096,
///     wal_policy: SyncPolicy::Batch {
///         every_n: 64,
///         interval: Duration::from_millis(20),
///     },
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// MemTable operation count that triggers a flush to a new SSTable.
    /// Counts logical writes since the last flush, not distinct keys.
    /// Must be at least 1.
    pub flush_threshold_ops: usize,

    /// WAL durability policy: how often appended records are forced to
    /// stable storage. A successful `put` is durable exactly as far as this
    /// policy promises; callers that require zero-loss semantics must use
    /// [`SyncPolicy::Sync`].
    pub wal_policy: SyncPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            flush_threshold_ops: 1024,
            wal_policy: SyncPolicy::Sync,
        }
    }
}

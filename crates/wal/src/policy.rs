//! Durability policies: when does an append force a barrier?
//!
//! The WAL consults its policy after every append; the policy answers with
//! "issue the durability barrier now" or "defer". Policies are modeled as a
//! tagged variant — [`SyncPolicy`] is the caller-facing configuration, and
//! [`PolicyState`] is the stateful counterpart the WAL carries internally.
//!
//! Every policy guarantees bounded loss: a barrier occurs after at most a
//! fixed number of further appends (1 / `every_n` / `max_batch`) or a fixed
//! amount of time (`interval` / `idle`), whichever comes first.

use std::time::{Duration, Instant};

/// Window over which the adaptive policy averages the append rate.
const EWMA_WINDOW: Duration = Duration::from_millis(100);

/// Wall-clock span one adaptive batch should roughly cover at the estimated
/// rate; the batch size is `rate × horizon`, clamped to the configured range.
const BATCH_HORIZON: Duration = Duration::from_millis(10);

/// Floor for inter-append gaps, keeps the instantaneous rate finite.
const MIN_APPEND_GAP: Duration = Duration::from_micros(1);

/// Selects how aggressively the WAL forces appended records to stable
/// storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPolicy {
    /// Barrier after every append. Worst-case loss on crash: nothing that
    /// was acknowledged.
    Sync,

    /// Barrier once `every_n` appends have accumulated since the last sync,
    /// or once `interval` has elapsed since the last sync. Worst-case loss:
    /// `every_n - 1` records plus whatever fits in the interval.
    Batch {
        /// Appends per barrier. Must be at least 1.
        every_n: usize,
        /// Time-based cap between barriers.
        interval: Duration,
    },

    /// Barrier cadence follows recent write throughput: high throughput
    /// widens the batch (up to `max_batch`), low throughput shrinks it back
    /// toward `min_batch`, and `idle` caps how long unsynced records may sit
    /// during a quiet period.
    Adaptive {
        /// Lower bound on the batch size. Must be at least 1.
        min_batch: usize,
        /// Upper bound on the batch size.
        max_batch: usize,
        /// A gap this long without an append forces a barrier for anything
        /// still pending.
        idle: Duration,
    },
}

/// Stateful counterpart of [`SyncPolicy`], owned by the WAL.
#[derive(Debug)]
pub(crate) enum PolicyState {
    Sync,
    Batch(BatchState),
    Adaptive(AdaptiveState),
}

#[derive(Debug)]
pub(crate) struct BatchState {
    every_n: usize,
    interval: Duration,
    pub(crate) pending: usize,
    last_sync: Instant,
}

#[derive(Debug)]
pub(crate) struct AdaptiveState {
    min_batch: usize,
    max_batch: usize,
    idle: Duration,
    /// EWMA of the append rate, in records per second.
    rate: f64,
    /// Current batch size, recomputed from `rate` on every append.
    pub(crate) batch: usize,
    pub(crate) pending: usize,
    last_append: Option<Instant>,
}

impl PolicyState {
    pub(crate) fn new(policy: SyncPolicy, now: Instant) -> Self {
        match policy {
            SyncPolicy::Sync => PolicyState::Sync,
            SyncPolicy::Batch { every_n, interval } => PolicyState::Batch(BatchState {
                every_n: every_n.max(1),
                interval,
                pending: 0,
                last_sync: now,
            }),
            SyncPolicy::Adaptive {
                min_batch,
                max_batch,
                idle,
            } => {
                let min_batch = min_batch.max(1);
                PolicyState::Adaptive(AdaptiveState {
                    min_batch,
                    max_batch: max_batch.max(min_batch),
                    idle,
                    rate: 0.0,
                    batch: min_batch,
                    pending: 0,
                    last_append: None,
                })
            }
        }
    }

    /// Registers one appended record; returns `true` if the WAL must issue
    /// the durability barrier before acknowledging it.
    pub(crate) fn on_append(&mut self, now: Instant) -> bool {
        match self {
            PolicyState::Sync => true,
            PolicyState::Batch(b) => {
                b.pending += 1;
                b.pending >= b.every_n || now.duration_since(b.last_sync) >= b.interval
            }
            PolicyState::Adaptive(a) => {
                let gap = a.last_append.map(|prev| now.duration_since(prev));
                if let Some(gap) = gap {
                    let dt = gap.max(MIN_APPEND_GAP).as_secs_f64();
                    let alpha = 1.0 - (-dt / EWMA_WINDOW.as_secs_f64()).exp();
                    a.rate += alpha * (1.0 / dt - a.rate);
                    a.batch = ((a.rate * BATCH_HORIZON.as_secs_f64()) as usize)
                        .clamp(a.min_batch, a.max_batch);
                }
                let idle_expired = gap.map(|g| g >= a.idle).unwrap_or(false);
                a.last_append = Some(now);
                a.pending += 1;
                a.pending >= a.batch || idle_expired
            }
        }
    }

    /// Time-driven hook: `true` if unsynced records have outlived the
    /// policy's time cap and a barrier is overdue.
    pub(crate) fn due(&self, now: Instant) -> bool {
        match self {
            PolicyState::Sync => false,
            PolicyState::Batch(b) => {
                b.pending > 0 && now.duration_since(b.last_sync) >= b.interval
            }
            PolicyState::Adaptive(a) => {
                a.pending > 0
                    && a.last_append
                        .map(|prev| now.duration_since(prev) >= a.idle)
                        .unwrap_or(false)
            }
        }
    }

    /// Informs the policy that a barrier was issued.
    pub(crate) fn note_sync(&mut self, now: Instant) {
        match self {
            PolicyState::Sync => {}
            PolicyState::Batch(b) => {
                b.pending = 0;
                b.last_sync = now;
            }
            PolicyState::Adaptive(a) => {
                a.pending = 0;
            }
        }
    }

    /// Number of appends since the last barrier.
    pub(crate) fn pending(&self) -> usize {
        match self {
            PolicyState::Sync => 0,
            PolicyState::Batch(b) => b.pending,
            PolicyState::Adaptive(a) => a.pending,
        }
    }
}

//! # MemTable
//!
//! An in-memory, sorted, mutable write buffer for the MiniKV storage engine.
//!
//! The memtable is the first point of contact for every write operation. It
//! buffers recent `PUT` and `DELETE` operations in a sorted structure
//! (`BTreeMap`) before they are flushed to immutable on-disk SSTables. There
//! is exactly one writer, so a later write to a key unconditionally replaces
//! the earlier entry.
//!
//! ## Key properties
//! - **Sorted order**: entries are always in ascending key order, which is
//!   what the SSTable writer requires.
//! - **Tombstone support**: deletes are recorded as `None` slots and shadow
//!   older on-disk values during reads.
//! - **Operation counting**: [`MemTable::size`] counts logical writes
//!   absorbed since the last drain — not distinct keys — and drives the
//!   engine's flush threshold.
//!
//! ## Example
//! ```rust
//! use minikv_memtable::{LookupResult, MemTable};
//!
//! let mut m = MemTable::new();
//! m.put("hello".into(), "world".into());
//! assert_eq!(m.get("hello"), LookupResult::Found("world"));
//!
//! m.delete("hello".into());
//! assert_eq!(m.get("hello"), LookupResult::Tombstone);
//! assert_eq!(m.size(), 2); // two logical operations absorbed
//! ```

use std::collections::BTreeMap;

/// Outcome of a memtable point lookup.
///
/// Distinguishing [`Tombstone`](LookupResult::Tombstone) from
/// [`Absent`](LookupResult::Absent) matters to the engine: a tombstone stops
/// the read immediately, while an absent key sends the read on to the SSTs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupResult<'a> {
    /// The key holds a live value.
    Found(&'a str),
    /// The key was deleted; older on-disk values are shadowed.
    Tombstone,
    /// The memtable knows nothing about this key.
    Absent,
}

/// An ordered, in-memory write buffer backed by a `BTreeMap`.
///
/// Each key maps to `Some(value)` for a live entry or `None` for a
/// tombstone, holding at most one slot per key. The operation counter
/// ([`size`](MemTable::size)) is monotone between drains even when writes
/// overwrite each other, so a burst of updates to a single hot key still
/// reaches the flush threshold.
#[derive(Debug, Default)]
pub struct MemTable {
    map: BTreeMap<String, Option<String>>,
    /// Logical operations absorbed since the last drain.
    ops: usize,
}

impl MemTable {
    /// Creates a new, empty memtable.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites `key` with `value`.
    pub fn put(&mut self, key: String, value: String) {
        self.map.insert(key, Some(value));
        self.ops += 1;
    }

    /// Records a tombstone for `key`, replacing any prior entry.
    pub fn delete(&mut self, key: String) {
        self.map.insert(key, None);
        self.ops += 1;
    }

    /// Point lookup.
    pub fn get(&self, key: &str) -> LookupResult<'_> {
        match self.map.get(key) {
            Some(Some(value)) => LookupResult::Found(value),
            Some(None) => LookupResult::Tombstone,
            None => LookupResult::Absent,
        }
    }

    /// Number of logical operations absorbed since the last drain.
    ///
    /// This is what the engine compares against its flush threshold. It is
    /// **not** the number of distinct keys; see [`len`](MemTable::len).
    #[must_use]
    pub fn size(&self) -> usize {
        self.ops
    }

    /// Number of distinct keys currently buffered (including tombstones).
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the memtable holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Borrowing iterator over all entries in ascending key order,
    /// tombstones included.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Retires the memtable: consumes every entry in ascending key order and
    /// resets the operation counter.
    ///
    /// `None` values are tombstones. This is the flush path's source of
    /// records for the SSTable writer.
    pub fn drain_sorted(
        &mut self,
    ) -> std::collections::btree_map::IntoIter<String, Option<String>> {
        self.ops = 0;
        std::mem::take(&mut self.map).into_iter()
    }

    /// Reinstates entries drained by an aborted flush, putting the
    /// operation counter back to its pre-drain value.
    ///
    /// `ops` must be the [`size`](MemTable::size) observed before the
    /// drain; re-inserting through `put`/`delete` instead would leave the
    /// counter at the distinct-key count and skew the flush trigger.
    pub fn restore<I>(&mut self, entries: I, ops: usize)
    where
        I: IntoIterator<Item = (String, Option<String>)>,
    {
        self.map.extend(entries);
        self.ops = ops;
    }
}

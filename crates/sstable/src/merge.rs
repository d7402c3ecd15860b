//! Merge iterator over multiple [`SstReader`]s.
//!
//! Produces `(key, value_or_tombstone)` pairs in ascending key order. When
//! the same key appears in multiple SSTables, only the record from the file
//! with the **greatest ordinal** is emitted (newest wins); the older
//! duplicates are drained silently.
//!
//! This is the core primitive for compaction: walk N input SSTables in
//! sorted order, resolve duplicates by ordinal, and write the result to a
//! new SSTable.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::{SstError, SstIter, SstReader};

/// A pending record from one SSTable source, used for heap-based merge
/// ordering.
struct HeapEntry {
    key: String,
    value: Option<String>,
    /// Creation ordinal of the source file; decides who wins a key tie.
    ordinal: u64,
    /// Index into the `iters` array, to advance the right source.
    source: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.ordinal == other.ordinal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; we want the *smallest* key first, so
        // reverse the key comparison. On a key tie the greatest ordinal
        // must pop first — it wins the key, and the older duplicates behind
        // it are drained.
        other
            .key
            .cmp(&self.key)
            .then_with(|| self.ordinal.cmp(&other.ordinal))
    }
}

/// Merges multiple SSTables into a single sorted stream of
/// `(key, value_or_tombstone)` pairs.
///
/// The iterator is lazy — it holds one pending record per source file and
/// reads the next line of a source only when its current record has been
/// consumed. Tombstones are passed through: dropping them is the
/// compactor's decision, not the merge's.
pub struct MergeIterator {
    iters: Vec<SstIter>,
    ordinals: Vec<u64>,
    heap: BinaryHeap<HeapEntry>,
}

impl MergeIterator {
    /// Creates a merge iterator over the given readers (any order; the
    /// filename ordinals decide newest-wins).
    pub fn new(readers: &[SstReader]) -> Result<Self, SstError> {
        let mut iters = Vec::with_capacity(readers.len());
        let mut ordinals = Vec::with_capacity(readers.len());
        let mut heap = BinaryHeap::new();

        for (i, reader) in readers.iter().enumerate() {
            let mut iter = reader.iter()?;
            if let Some(first) = iter.next() {
                let (key, value) = first?;
                heap.push(HeapEntry {
                    key,
                    value,
                    ordinal: reader.ordinal(),
                    source: i,
                });
            }
            iters.push(iter);
            ordinals.push(reader.ordinal());
        }

        Ok(Self {
            iters,
            ordinals,
            heap,
        })
    }

    /// Pulls the next record from `source` onto the heap, if any remains.
    fn advance(&mut self, source: usize) -> Result<(), SstError> {
        if let Some(next) = self.iters[source].next() {
            let (key, value) = next?;
            self.heap.push(HeapEntry {
                key,
                value,
                ordinal: self.ordinals[source],
                source,
            });
        }
        Ok(())
    }

    /// Returns the next `(key, value_or_tombstone)` in ascending key order,
    /// or `None` when all sources are exhausted.
    ///
    /// For keys present in several SSTables, the record from the greatest
    /// ordinal is returned and the older duplicates are consumed silently.
    pub fn next_entry(&mut self) -> Result<Option<(String, Option<String>)>, SstError> {
        let top = match self.heap.pop() {
            Some(e) => e,
            None => return Ok(None),
        };
        self.advance(top.source)?;

        // Drain every older entry for the same key. The tie-break in `Ord`
        // guarantees `top` came from the newest ordinal.
        while let Some(peek) = self.heap.peek() {
            if peek.key != top.key {
                break;
            }
            let dup = self.heap.pop().unwrap();
            self.advance(dup.source)?;
        }

        Ok(Some((top.key, top.value)))
    }

    /// Collects all remaining entries into a `Vec`. Useful for tests.
    pub fn collect_all(&mut self) -> Result<Vec<(String, Option<String>)>, SstError> {
        let mut result = Vec::new();
        while let Some(pair) = self.next_entry()? {
            result.push(pair);
        }
        Ok(result)
    }
}

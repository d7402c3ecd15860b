//! Read path: `get()`.
//!
//! Point lookups check the MemTable first (freshest data), then the
//! SSTables from newest to oldest. The first layer that knows the key
//! decides the answer; a tombstone anywhere stops the probe and reports the
//! key as absent.

use minikv_memtable::LookupResult;
use minikv_sstable::Lookup;

use crate::{Engine, Result};

impl Engine {
    /// Looks up a key, returning its current value or `None` if the key is
    /// absent or deleted.
    ///
    /// A key containing reserved bytes cannot have been written and simply
    /// returns `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if an SSTable read fails (corruption, I/O) or if
    /// the engine is closed.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        self.ensure_ready()?;

        match self.mem.get(key) {
            LookupResult::Found(v) => return Ok(Some(v.to_owned())),
            LookupResult::Tombstone => return Ok(None),
            LookupResult::Absent => {}
        }

        for sst in &self.ssts {
            match sst.lookup(key)? {
                Lookup::Found(v) => return Ok(Some(v)),
                Lookup::Tombstone => return Ok(None),
                Lookup::NotFound => continue,
            }
        }

        Ok(None)
    }
}

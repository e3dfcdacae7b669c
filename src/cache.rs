//! Records read ahead while the quality encoding is still unknown.

use std::mem;

use crate::records::OwnedRecord;

const MIN_INCREMENT: usize = 16;
const MAX_INCREMENT: usize = 256;


/// Capacity to reserve so that at least `needed` records fit.
///
/// Small caches grow by 16 slots, medium ones double, large ones grow by 256.
pub fn next_capacity(current: usize, needed: usize) -> usize {
    let mut capacity = current;
    while capacity < needed {
        if capacity < MIN_INCREMENT {
            capacity += MIN_INCREMENT;
        } else if capacity > MAX_INCREMENT {
            capacity += MAX_INCREMENT;
        } else {
            capacity += capacity;
        }
    }
    capacity
}


/// Append-only store of records with a replay cursor.
///
/// Records of both files are stored interleaved, so every pair takes two
/// slots. Each record is handed back exactly once.
#[derive(Debug, Default)]
pub struct RecordCache {
    records: Vec<OwnedRecord>,
    capacity: usize,
    cursor: usize,
}

impl RecordCache {
    pub fn new() -> RecordCache {
        RecordCache::default()
    }

    pub fn append(&mut self, record: OwnedRecord) {
        let needed = self.records.len() + 1;
        if needed > self.capacity {
            let capacity = next_capacity(self.capacity, needed);
            self.records.reserve_exact(capacity - self.records.len());
            self.capacity = capacity;
        }
        self.records.push(record);
    }

    /// Take the next cached pair, if any is left.
    pub fn next_pair(&mut self) -> Option<(OwnedRecord, OwnedRecord)> {
        if self.cursor + 1 >= self.records.len() {
            return None;
        }
        let first = mem::take(&mut self.records[self.cursor]);
        let second = mem::take(&mut self.records[self.cursor + 1]);
        self.cursor += 2;
        if self.cursor == self.records.len() {
            // Replay is over, nothing is appended after it.
            self.clear();
        }
        Some((first, second))
    }

    /// Drop all records and reset the cache to its initial state.
    pub fn clear(&mut self) {
        self.records = Vec::new();
        self.capacity = 0;
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records that have not been replayed yet.
    #[cfg(test)]
    fn remaining(&self) -> usize {
        self.records.len() - self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[cfg(test)]
    fn cursor(&self) -> usize {
        self.cursor
    }
}

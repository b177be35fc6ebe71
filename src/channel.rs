//! The logical-channel allocation table.
//!
//! Bounded to [`CHANNEL_TABLE_SIZE`](crate::constants::CHANNEL_TABLE_SIZE)
//! entries; allocation past that bound evicts the oldest entry (FIFO, never
//! LRU — an active client can be silently invalidated by eviction pressure,
//! and that's accepted by design).

use heapless::Vec;

use crate::constants::CHANNEL_TABLE_SIZE;
use crate::types::Cid;

/// Ordered table of allocated channel identifiers.
#[derive(Debug, Default)]
pub struct ChannelTable {
    cids: Vec<Cid, CHANNEL_TABLE_SIZE>,
}

impl ChannelTable {
    pub fn new() -> Self {
        Self { cids: Vec::new() }
    }

    /// True if `cid` is currently allocated.
    pub fn contains(&self, cid: Cid) -> bool {
        self.cids.iter().any(|&known| known == cid)
    }

    pub fn len(&self) -> usize {
        self.cids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cids.is_empty()
    }

    /// Allocate `cid`, evicting the oldest entry first if the table is full.
    ///
    /// No collision check against existing entries: the source never
    /// performs one either, since duplicates don't violate any invariant
    /// (lookup via [`ChannelTable::contains`] returns true either way).
    pub fn allocate(&mut self, cid: Cid) {
        if self.cids.len() >= CHANNEL_TABLE_SIZE {
            self.cids.remove(0);
        }
        // capacity was just guaranteed above, push cannot fail.
        let _ = self.cids.push(cid);
    }

    /// Release every allocated channel. Called on engine teardown.
    pub fn clear(&mut self) {
        self.cids.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_then_contains() {
        let mut table = ChannelTable::new();
        table.allocate(42);
        assert!(table.contains(42));
        assert!(!table.contains(43));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn fifo_eviction_past_capacity() {
        let mut table = ChannelTable::new();
        for cid in 0..CHANNEL_TABLE_SIZE as Cid {
            table.allocate(cid);
        }
        assert_eq!(table.len(), CHANNEL_TABLE_SIZE);
        assert!(table.contains(0));

        // the 21st allocation evicts the first-allocated cid (0).
        table.allocate(CHANNEL_TABLE_SIZE as Cid);
        assert_eq!(table.len(), CHANNEL_TABLE_SIZE);
        assert!(!table.contains(0));
        assert!(table.contains(1));
        assert!(table.contains(CHANNEL_TABLE_SIZE as Cid));
    }

    #[test]
    fn clear_empties_table() {
        let mut table = ChannelTable::new();
        table.allocate(1);
        table.clear();
        assert!(table.is_empty());
        assert!(!table.contains(1));
    }
}

//! Holders with old→young references, recorded by the write barrier.
//!
//! When an old-generation holder stores a pointer to a young-generation
//! object, a minor collection must treat that holder as a root or the
//! young object would be collected out from under it. The write barrier
//! records such holders here.
//!
//! Dedup is deferred: stores append raw entries through a tiny critical
//! section, and the collector sorts and collapses them when it drains
//! the set. The mutator never pays for uniqueness.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Starting capacity of the holder buffer; drains re-reserve this much.
const BUFFER_CAPACITY: usize = 4096;

/// One recorded holder.
///
/// Only the holder address is kept: a minor collection rescans the
/// holder's slots anyway, so the entry does not need to say which slot
/// changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RememberedEntry {
    /// Address of the recorded holder.
    pub holder: usize,
}

/// Append-only buffer of holders awaiting the next minor collection.
///
/// Insertions come from mutator threads through the write barrier; the
/// collector takes the whole batch at a pause via
/// [`RememberedSet::drain`].
pub struct RememberedSet {
    /// Recorded holders, duplicates included. The lock guards a single
    /// push, so contention stays negligible.
    buffer: Mutex<Vec<RememberedEntry>>,

    /// Approximate entry count, kept outside the lock for cheap reads.
    count: AtomicUsize,
}

impl RememberedSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self {
            buffer: Mutex::new(Vec::with_capacity(BUFFER_CAPACITY)),
            count: AtomicUsize::new(0),
        }
    }

    /// Record `holder` as containing at least one young reference.
    ///
    /// Runs on the mutator's store path, so the critical section is a
    /// single push; uniqueness is the drain's problem.
    #[inline]
    pub fn insert(&self, holder: *const ()) {
        self.buffer.lock().push(RememberedEntry {
            holder: holder as usize,
        });
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Take every recorded holder, sorted and deduplicated.
    ///
    /// Clears the set. Sorting and collapsing duplicates here keeps
    /// that cost inside the collection pause instead of on the mutator.
    pub fn drain(&self) -> Vec<RememberedEntry> {
        let mut entries =
            std::mem::replace(&mut *self.buffer.lock(), Vec::with_capacity(BUFFER_CAPACITY));
        self.count.store(0, Ordering::Relaxed);

        entries.sort_unstable_by_key(|e| e.holder);
        entries.dedup();

        entries
    }

    /// Check whether a holder address has been recorded.
    ///
    /// O(n) scan; intended for assertions and tests, not the mutator
    /// path.
    pub fn contains_holder(&self, holder: *const ()) -> bool {
        let addr = holder as usize;
        let buffer = self.buffer.lock();
        buffer.iter().any(|e| e.holder == addr)
    }

    /// Approximate number of recorded entries, duplicates included.
    #[inline]
    pub fn len(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    /// True when nothing has been recorded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Discard every entry without returning them.
    pub fn clear(&self) {
        self.buffer.lock().clear();
        self.count.store(0, Ordering::Relaxed);
    }
}

impl Default for RememberedSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_set_is_empty() {
        let rs = RememberedSet::new();
        assert!(rs.is_empty());
        assert_eq!(rs.len(), 0);
    }

    #[test]
    fn test_insert_records_holder() {
        let rs = RememberedSet::new();
        let holder = 0x8000 as *const ();

        rs.insert(holder);

        assert_eq!(rs.len(), 1);
        assert!(rs.contains_holder(holder));
        assert!(!rs.contains_holder(0x9000 as *const ()));
    }

    #[test]
    fn test_drain_empties_the_set() {
        let rs = RememberedSet::new();
        for i in 0..12 {
            rs.insert((0x9000 + i * 0x40) as *const ());
        }

        let entries = rs.drain();
        assert_eq!(entries.len(), 12);
        assert!(rs.is_empty());
    }

    #[test]
    fn test_drain_collapses_duplicates() {
        let rs = RememberedSet::new();
        let holder = 0x7000 as *const ();

        // The same holder recorded on every store it makes.
        for _ in 0..33 {
            rs.insert(holder);
        }

        let entries = rs.drain();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].holder, 0x7000);
    }

    #[test]
    fn test_drain_sorts_holders() {
        let rs = RememberedSet::new();
        rs.insert(0xE000 as *const ());
        rs.insert(0xC000 as *const ());
        rs.insert(0xD000 as *const ());

        let entries = rs.drain();
        assert_eq!(entries[0].holder, 0xC000);
        assert_eq!(entries[1].holder, 0xD000);
        assert_eq!(entries[2].holder, 0xE000);
    }

    #[test]
    fn test_clear_discards_entries() {
        let rs = RememberedSet::new();
        for i in 0..16 {
            rs.insert((0x6000 + i * 0x20) as *const ());
        }
        assert_eq!(rs.len(), 16);

        rs.clear();
        assert!(rs.is_empty());
    }

    #[test]
    fn test_set_reusable_after_drain() {
        let rs = RememberedSet::new();
        rs.insert(0xA000 as *const ());
        rs.insert(0xB000 as *const ());
        assert_eq!(rs.drain().len(), 2);

        rs.insert(0xC000 as *const ());

        let entries = rs.drain();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].holder, 0xC000);
    }

    #[test]
    fn test_high_volume_past_initial_capacity() {
        let rs = RememberedSet::new();
        for i in 0..2 * BUFFER_CAPACITY {
            rs.insert((0x2_0000 + i * 8) as *const ());
        }

        assert_eq!(rs.len(), 2 * BUFFER_CAPACITY);
        let entries = rs.drain();
        assert_eq!(entries.len(), 2 * BUFFER_CAPACITY);
        assert!(rs.is_empty());
    }
}

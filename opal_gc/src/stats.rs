//! Heap and mutation statistics.
//!
//! Counts allocation activity and, more importantly for this runtime, the
//! slot-store protocol outcomes: how many stores took the barrier-free
//! scalar path, how many were elided entirely by reference identity, and
//! how many had to run the full write barrier. The counters are the
//! observable face of the barrier-elision protocol: tests assert against
//! them, and tuning work reads them.

use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics about heap and slot-store activity.
///
/// All counters are relaxed atomics: they are monotonically increasing
/// telemetry, never synchronization.
#[derive(Debug)]
pub struct GcStats {
    // =========================================================================
    // Allocation
    // =========================================================================
    /// Total bytes handed out by the heap since start (or last reset).
    pub bytes_allocated: AtomicU64,
    /// Total allocations since start (or last reset).
    pub objects_allocated: AtomicU64,

    // =========================================================================
    // Slot-store protocol
    // =========================================================================
    /// Stores that took the scalar fast path: both the old and new slot
    /// contents were immediates, so the bits were written with no barrier.
    pub scalar_stores: AtomicU64,
    /// Stores elided entirely: the slot already held the same reference,
    /// so nothing was written and no barrier ran.
    pub identity_elisions: AtomicU64,
    /// Stores that ran the full write path through the collector barrier
    /// because a reference may have been created, destroyed, or changed.
    pub barrier_stores: AtomicU64,

    // =========================================================================
    // Barrier outcomes
    // =========================================================================
    /// Old-holder/young-pointee stores recorded in the remembered set.
    pub remembered_inserts: AtomicU64,
}

impl GcStats {
    /// Create new empty statistics.
    pub const fn new() -> Self {
        Self {
            bytes_allocated: AtomicU64::new(0),
            objects_allocated: AtomicU64::new(0),
            scalar_stores: AtomicU64::new(0),
            identity_elisions: AtomicU64::new(0),
            barrier_stores: AtomicU64::new(0),
            remembered_inserts: AtomicU64::new(0),
        }
    }

    /// Record an allocation of `size` bytes.
    #[inline]
    pub fn record_allocation(&self, size: usize) {
        self.bytes_allocated
            .fetch_add(size as u64, Ordering::Relaxed);
        self.objects_allocated.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a barrier-free scalar store.
    #[inline]
    pub fn record_scalar_store(&self) {
        self.scalar_stores.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a store elided by reference identity.
    #[inline]
    pub fn record_identity_elision(&self) {
        self.identity_elisions.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a store that ran the full write path.
    #[inline]
    pub fn record_barrier_store(&self) {
        self.barrier_stores.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a remembered-set insertion.
    #[inline]
    pub fn record_remembered_insert(&self) {
        self.remembered_inserts.fetch_add(1, Ordering::Relaxed);
    }

    /// Current scalar-store count.
    #[inline]
    pub fn scalar_store_count(&self) -> u64 {
        self.scalar_stores.load(Ordering::Relaxed)
    }

    /// Current identity-elision count.
    #[inline]
    pub fn identity_elision_count(&self) -> u64 {
        self.identity_elisions.load(Ordering::Relaxed)
    }

    /// Current full-write-path count.
    #[inline]
    pub fn barrier_store_count(&self) -> u64 {
        self.barrier_stores.load(Ordering::Relaxed)
    }

    /// Current remembered-set insertion count.
    #[inline]
    pub fn remembered_insert_count(&self) -> u64 {
        self.remembered_inserts.load(Ordering::Relaxed)
    }

    /// Reset all statistics.
    pub fn reset(&self) {
        self.bytes_allocated.store(0, Ordering::Relaxed);
        self.objects_allocated.store(0, Ordering::Relaxed);
        self.scalar_stores.store(0, Ordering::Relaxed);
        self.identity_elisions.store(0, Ordering::Relaxed);
        self.barrier_stores.store(0, Ordering::Relaxed);
        self.remembered_inserts.store(0, Ordering::Relaxed);
    }

    /// Print a summary of activity to stderr.
    pub fn print_summary(&self) {
        eprintln!("=== Opal Heap Statistics ===");
        eprintln!(
            "Allocations: {} objects, {} bytes",
            self.objects_allocated.load(Ordering::Relaxed),
            self.bytes_allocated.load(Ordering::Relaxed)
        );
        eprintln!(
            "Slot stores: {} scalar fast-path, {} identity-elided, {} full barrier",
            self.scalar_store_count(),
            self.identity_elision_count(),
            self.barrier_store_count()
        );
        eprintln!("Remembered-set inserts: {}", self.remembered_insert_count());
    }
}

impl Default for GcStats {
    fn default() -> Self {
        Self::new()
    }
}

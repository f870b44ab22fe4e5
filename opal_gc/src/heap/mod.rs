//! Heap memory management.
//!
//! The heap is divided into two spaces:
//! - Nursery: young generation with bump-pointer allocation
//! - Old space: tenured generation with block-based allocation
//!
//! What the rest of the runtime leans on is the *generational
//! classification* of addresses ([`Heap::is_young`] / [`Heap::is_old`]),
//! which the write barrier and the container slot-store protocol
//! consult on every reference store.

mod nursery;
mod old_space;

pub use nursery::Nursery;
pub use old_space::OldSpace;

use crate::barrier::RememberedSet;
use crate::config::GcConfig;
use crate::stats::GcStats;
use crate::Generation;

use std::ptr::NonNull;

/// Main heap structure managing both generations.
pub struct Heap {
    /// Configuration parameters.
    config: GcConfig,

    /// Young generation (bump-pointer allocation).
    nursery: Nursery,

    /// Old generation (block-based allocation).
    old_space: OldSpace,

    /// Heap statistics.
    stats: GcStats,

    /// Remembered set for tracking old→young references.
    /// Fed by the write barrier and drained during minor GC.
    remembered_set: RememberedSet,
}

impl Heap {
    /// Create a new heap with the given configuration.
    pub fn new(config: GcConfig) -> Self {
        config.validate().expect("Invalid heap configuration");

        let nursery = Nursery::new(config.nursery_size);
        let old_space = OldSpace::new(config.old_block_size);

        if config.trace {
            eprintln!(
                "[opal-gc] heap created: nursery {} KB, old blocks {} KB",
                config.nursery_size / 1024,
                config.old_block_size / 1024
            );
        }

        Self {
            config,
            nursery,
            old_space,
            stats: GcStats::new(),
            remembered_set: RememberedSet::new(),
        }
    }

    /// Create a heap with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(GcConfig::default())
    }

    // =========================================================================
    // Allocation
    // =========================================================================

    /// Allocate memory for an object of the given size.
    ///
    /// Returns a pointer to zeroed memory that can hold `size` bytes.
    /// New objects are born in the nursery; when the nursery is full,
    /// allocation tenures directly rather than failing.
    #[inline]
    pub fn alloc(&self, size: usize) -> Option<NonNull<u8>> {
        let aligned_size = align_up(size, 8);

        // Try nursery first (fast path)
        if let Some(ptr) = self.nursery.alloc(aligned_size) {
            self.stats.record_allocation(aligned_size);
            return Some(ptr);
        }

        // Nursery full: fall through to the old space
        self.alloc_tenured(size)
    }

    /// Allocate directly in the old generation.
    ///
    /// Used for objects known to be long-lived, and by tests that need
    /// an old-generation holder.
    pub fn alloc_tenured(&self, size: usize) -> Option<NonNull<u8>> {
        let aligned_size = align_up(size, 8);
        let ptr = self.old_space.alloc(aligned_size)?;
        self.stats.record_allocation(aligned_size);
        Some(ptr)
    }

    // =========================================================================
    // Space Queries
    // =========================================================================

    /// Check if a pointer is in the nursery.
    #[inline]
    pub fn is_young(&self, ptr: *const ()) -> bool {
        self.nursery.contains(ptr)
    }

    /// Check if a pointer is in the old generation.
    #[inline]
    pub fn is_old(&self, ptr: *const ()) -> bool {
        self.old_space.contains(ptr)
    }

    /// Check if a pointer is managed by this heap.
    #[inline]
    pub fn contains(&self, ptr: *const ()) -> bool {
        self.nursery.contains(ptr) || self.old_space.contains(ptr)
    }

    /// Get the generation of an object, if this heap manages it.
    pub fn generation_of(&self, ptr: *const ()) -> Option<Generation> {
        if self.nursery.contains(ptr) {
            Some(Generation::Nursery)
        } else if self.old_space.contains(ptr) {
            Some(Generation::Tenured)
        } else {
            None
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the configuration.
    pub fn config(&self) -> &GcConfig {
        &self.config
    }

    /// Get heap statistics.
    pub fn stats(&self) -> &GcStats {
        &self.stats
    }

    /// Get the nursery.
    pub fn nursery(&self) -> &Nursery {
        &self.nursery
    }

    /// Get the old space.
    pub fn old_space(&self) -> &OldSpace {
        &self.old_space
    }

    // =========================================================================
    // Remembered Set (Write Barrier Integration)
    // =========================================================================

    /// Get the remembered set for write barrier marking.
    ///
    /// The write barrier calls this to record old→young references.
    #[inline]
    pub fn remembered_set(&self) -> &RememberedSet {
        &self.remembered_set
    }

    /// Drain the remembered set for GC root scanning.
    pub fn drain_remembered_set(&self) -> Vec<crate::barrier::RememberedEntry> {
        self.remembered_set.drain()
    }

    /// Clear the remembered set.
    pub fn clear_remembered_set(&self) {
        self.remembered_set.clear();
    }
}

impl Drop for Heap {
    fn drop(&mut self) {
        if self.config.trace {
            self.stats.print_summary();
        }
    }
}

/// Align a size up to the given alignment.
#[inline]
pub const fn align_up(size: usize, align: usize) -> usize {
    (size + align - 1) & !(align - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0, 8), 0);
        assert_eq!(align_up(1, 8), 8);
        assert_eq!(align_up(7, 8), 8);
        assert_eq!(align_up(8, 8), 8);
        assert_eq!(align_up(9, 8), 16);
    }

    #[test]
    fn test_heap_creation() {
        let heap = Heap::with_defaults();
        assert!(heap.remembered_set().is_empty());
        assert_eq!(heap.stats().scalar_store_count(), 0);
    }

    #[test]
    fn test_generation_classification() {
        let heap = Heap::with_defaults();

        let young = heap.alloc(32).expect("nursery alloc failed");
        let old = heap.alloc_tenured(32).expect("tenured alloc failed");

        assert!(heap.is_young(young.as_ptr() as *const ()));
        assert!(!heap.is_old(young.as_ptr() as *const ()));
        assert!(heap.is_old(old.as_ptr() as *const ()));
        assert!(!heap.is_young(old.as_ptr() as *const ()));

        assert_eq!(
            heap.generation_of(young.as_ptr() as *const ()),
            Some(Generation::Nursery)
        );
        assert_eq!(
            heap.generation_of(old.as_ptr() as *const ()),
            Some(Generation::Tenured)
        );
        assert_eq!(heap.generation_of(std::ptr::null()), None);
    }

    #[test]
    fn test_nursery_overflow_tenures() {
        let heap = Heap::new(GcConfig::low_memory());

        // Exhaust the nursery
        while heap.nursery().free() >= 4096 {
            heap.alloc(4096).expect("alloc failed");
        }

        // Next allocation lands in the old space
        let ptr = heap.alloc(4096).expect("overflow alloc failed");
        assert!(heap.is_old(ptr.as_ptr() as *const ()));
        assert!(!heap.is_young(ptr.as_ptr() as *const ()));
    }
}

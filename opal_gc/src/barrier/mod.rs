//! Write barriers for generational GC.
//!
//! Write barriers track old→young references to enable efficient
//! minor collection. Without barriers, we'd have to scan the entire
//! old generation to find references into the nursery.
//!
//! Container code is expected to *elide* this barrier whenever it can
//! prove no reference changed: see the slot-store protocol in the
//! runtime crate. When the barrier does run, the fast path is a single
//! address-range check.

mod remembered_set;

pub use remembered_set::{RememberedEntry, RememberedSet};

use crate::heap::Heap;
use opal_core::Value;

// =============================================================================
// Generational Write Barriers
// =============================================================================

/// Write barrier for value stores.
///
/// Call this after storing a value into a heap object. Immediates pass
/// through untouched; reference stores are tracked so old→young edges
/// land in the remembered set.
///
/// # Arguments
///
/// * `heap` - The heap
/// * `holder` - Pointer to the object containing the slot
/// * `new_value` - The value being stored
///
/// # Performance
///
/// This is on the mutator's store path, so it must be fast. The fast
/// path is one kind test plus one address-range check.
#[inline(always)]
pub fn write_barrier(heap: &Heap, holder: *const (), new_value: Value) {
    // Only object references need tracking
    if let Some(new_ptr) = new_value.as_object_ptr() {
        write_barrier_ptr(heap, holder, new_ptr);
    }
}

/// Write barrier for raw pointer stores.
#[inline(always)]
pub fn write_barrier_ptr(heap: &Heap, holder: *const (), new_ptr: *const ()) {
    // Fast path: if holder is young, no barrier needed
    if heap.is_young(holder) {
        return;
    }

    // Check if new_ptr points to young generation
    if heap.is_young(new_ptr) {
        // Old→Young reference: record in remembered set
        heap.remembered_set().insert(holder);
        heap.stats().record_remembered_insert();
    }
}

// =============================================================================
// Tests
// =============================================================================

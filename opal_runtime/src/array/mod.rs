//! Uniform array: fixed-length slot storage with barrier-elided stores.
//!
//! [`UniformArray`] is the runtime's low-level container for
//! heterogeneous values: each slot holds one tagged [`Value`], either an
//! immediate scalar or an opaque reference. Mutation goes through a
//! store protocol that runs the collector write barrier only when a
//! store can actually create or change a reference:
//!
//! 1. Read the old slot value.
//! 2. Old and new both immediates: raw bit store, no barrier.
//! 3. New is the identical reference already stored: no write at all.
//! 4. Otherwise: store plus the full write barrier.
//!
//! The other hazard this module owns is the layout chooser in
//! `raw::Block::realize`: an all-float fill realizes the dense unboxed
//! block, which a uniform array must never be backed by. Creation paths
//! route float-ambiguous fills through the zero-filled uniform
//! realization and overwrite slot by slot.

pub mod dense;
mod raw;

use opal_core::{OpalError, OpalResult, Value};
use opal_gc::{barrier, Heap};

use raw::{Block, BlockKind};

/// Fixed-length mutable array of tagged slot values.
///
/// The handle exclusively owns its storage block. Length is fixed at
/// creation and can only shrink, via [`UniformArray::truncate`].
/// Single-writer: callers synchronize externally.
pub struct UniformArray {
    /// Backing storage; always realized `Uniform`.
    block: Block,
    /// Current logical length. Slots at `len..capacity` are
    /// inaccessible.
    len: usize,
}

/// Validate that `[pos, pos + len)` falls inside an array of
/// `array_len` slots.
#[inline]
fn check_range(pos: usize, len: usize, array_len: usize) -> OpalResult<()> {
    match pos.checked_add(len) {
        Some(end) if end <= array_len => Ok(()),
        _ => Err(OpalError::range(pos, len, array_len)),
    }
}

impl UniformArray {
    // =========================================================================
    // Creation
    // =========================================================================

    /// Create an array of `len` slots, each holding the canonical zero
    /// scalar (tagged int 0).
    pub fn zeroed(len: usize) -> Self {
        Self {
            block: Block::uniform_zeroed(len),
            len,
        }
    }

    /// Create an array of `len` slots, each holding `value`.
    ///
    /// A float fill is representation-ambiguous: handed to the layout
    /// chooser it would realize the dense unboxed block. Such fills are
    /// realized zero-filled uniform first and then overwritten slot by
    /// slot through the scalar store path, so the chooser never sees
    /// them.
    pub fn filled(len: usize, value: Value) -> Self {
        let array = if value.is_float() {
            let mut array = Self::zeroed(len);
            let bits = value.to_bits();
            for i in 0..len {
                // Scalar-for-scalar overwrite of an unpublished array:
                // no barrier applies.
                // SAFETY: i < len == capacity.
                unsafe { array.block.set_word(i, bits) };
            }
            array
        } else {
            Self {
                block: Block::realize(len, value),
                len,
            }
        };
        array.assert_uniform();
        array
    }

    /// Create a one-slot array holding `value`.
    pub fn singleton(value: Value) -> Self {
        Self::filled(1, value)
    }

    /// Assert the representation invariant: the backing block is the
    /// tagged uniform realization, never the dense float one.
    ///
    /// A violation is an internal defect, not a recoverable condition,
    /// so this panics rather than returning an error.
    #[inline]
    pub fn assert_uniform(&self) {
        assert!(
            self.block.kind() == BlockKind::Uniform,
            "uniform array backed by dense float block"
        );
    }

    // =========================================================================
    // Length
    // =========================================================================

    /// Current length in slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the array has no slots.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Get the value at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> OpalResult<Value> {
        if index >= self.len {
            return Err(OpalError::index(index, self.len));
        }
        // SAFETY: bounds checked above.
        Ok(unsafe { self.get_unchecked(index) })
    }

    /// Get the value at `index` without bounds checking.
    ///
    /// # Safety
    /// `index` must be less than [`UniformArray::len`].
    #[inline]
    pub unsafe fn get_unchecked(&self, index: usize) -> Value {
        debug_assert!(index < self.len);
        // SAFETY: caller guarantees the index is within length.
        Value::from_bits(unsafe { self.block.word(index) })
    }

    // =========================================================================
    // Stores
    // =========================================================================

    /// Store `value` at `index`.
    #[inline]
    pub fn set(&mut self, heap: &Heap, index: usize, value: Value) -> OpalResult<()> {
        if index >= self.len {
            return Err(OpalError::index(index, self.len));
        }
        // SAFETY: bounds checked above.
        unsafe { self.set_unchecked(heap, index, value) };
        Ok(())
    }

    /// Store `value` at `index` without bounds checking.
    ///
    /// Runs the full store protocol: scalar-for-scalar stores skip the
    /// barrier, storing the identical reference skips the write
    /// entirely, and everything else takes the barriered path.
    ///
    /// # Safety
    /// `index` must be less than [`UniformArray::len`].
    #[inline]
    pub unsafe fn set_unchecked(&mut self, heap: &Heap, index: usize, value: Value) {
        debug_assert!(index < self.len);
        // SAFETY: caller guarantees the index is within length.
        let old = Value::from_bits(unsafe { self.block.word(index) });

        if old.is_immediate() && value.is_immediate() {
            // No reference is created or destroyed; the collector never
            // needs to hear about this store.
            // SAFETY: index is within length.
            unsafe { self.block.set_word(index, value.to_bits()) };
            heap.stats().record_scalar_store();
            return;
        }

        if old.same_object(value) {
            // The slot already holds this exact reference: skip the
            // store, and with it the barrier.
            heap.stats().record_identity_elision();
            return;
        }

        // SAFETY: index is within length.
        unsafe { self.store_with_barrier(heap, index, value) };
    }

    /// Store `value` at `index`, assuming it is not the reference
    /// already stored there.
    ///
    /// Skips the identity comparison of [`UniformArray::set_unchecked`];
    /// the scalar fast path still applies.
    ///
    /// # Safety
    /// `index` must be less than [`UniformArray::len`], and `value`
    /// must not be identical to the reference currently in the slot.
    #[inline]
    pub unsafe fn set_unchecked_assume_distinct(
        &mut self,
        heap: &Heap,
        index: usize,
        value: Value,
    ) {
        debug_assert!(index < self.len);
        // SAFETY: caller guarantees the index is within length.
        let old = Value::from_bits(unsafe { self.block.word(index) });
        debug_assert!(
            !old.same_object(value),
            "slot already holds this reference"
        );

        if old.is_immediate() && value.is_immediate() {
            // SAFETY: index is within length.
            unsafe { self.block.set_word(index, value.to_bits()) };
            heap.stats().record_scalar_store();
            return;
        }

        // SAFETY: index is within length.
        unsafe { self.store_with_barrier(heap, index, value) };
    }

    /// Store `value` at `index`, assuming the slot currently holds a
    /// scalar.
    ///
    /// Skips the old-value read: a scalar slot can neither alias the
    /// incoming reference nor hold one the collector is tracing.
    ///
    /// # Safety
    /// `index` must be less than [`UniformArray::len`], and the slot
    /// must currently hold an immediate scalar.
    #[inline]
    pub unsafe fn set_unchecked_assume_scalar(&mut self, heap: &Heap, index: usize, value: Value) {
        debug_assert!(index < self.len);
        debug_assert!(
            // SAFETY: index is within length.
            Value::from_bits(unsafe { self.block.word(index) }).is_immediate(),
            "slot holds a reference"
        );

        if value.is_immediate() {
            // SAFETY: index is within length.
            unsafe { self.block.set_word(index, value.to_bits()) };
            heap.stats().record_scalar_store();
        } else {
            // SAFETY: index is within length.
            unsafe { self.store_with_barrier(heap, index, value) };
        }
    }

    /// If the slot at `index` holds a reference, overwrite it with the
    /// canonical zero scalar so the collector stops tracing the old
    /// object through this array. Scalar slots are left untouched.
    ///
    /// # Safety
    /// `index` must be less than [`UniformArray::len`].
    #[inline]
    pub unsafe fn clear_if_ref(&mut self, index: usize) {
        debug_assert!(index < self.len);
        // SAFETY: caller guarantees the index is within length.
        let old = Value::from_bits(unsafe { self.block.word(index) });
        if old.is_object() {
            // Removing a reference creates no old→young edge; no
            // barrier applies.
            // SAFETY: index is within length.
            unsafe { self.block.set_word(index, Value::zero().to_bits()) };
        }
    }

    /// The store path that involves the collector: write the slot, then
    /// run the write barrier for the stored value.
    unsafe fn store_with_barrier(&mut self, heap: &Heap, index: usize, value: Value) {
        // SAFETY: caller guarantees the index is within length.
        unsafe { self.block.set_word(index, value.to_bits()) };
        barrier::write_barrier(heap, self.block.holder_ptr(), value);
        heap.stats().record_barrier_store();
    }

    // =========================================================================
    // Bulk copy
    // =========================================================================

    /// Copy `len` slots from `src` starting at `src_pos` into `dst`
    /// starting at `dst_pos`.
    ///
    /// The borrow rules make `src` and `dst` distinct arrays, so slots
    /// are copied in ascending order unconditionally. Each slot copy
    /// runs the same store protocol as [`UniformArray::set_unchecked`],
    /// so a bulk copy is never more expensive per slot than the
    /// equivalent sequence of `set` calls.
    pub fn blit(
        heap: &Heap,
        src: &UniformArray,
        src_pos: usize,
        dst: &mut UniformArray,
        dst_pos: usize,
        len: usize,
    ) -> OpalResult<()> {
        check_range(src_pos, len, src.len)?;
        check_range(dst_pos, len, dst.len)?;

        for i in 0..len {
            // SAFETY: both ranges validated above.
            let v = unsafe { src.get_unchecked(src_pos + i) };
            unsafe { dst.set_unchecked(heap, dst_pos + i, v) };
        }
        Ok(())
    }

    /// Copy `len` slots from `src_pos` to `dst_pos` within this array,
    /// with overlap allowed.
    ///
    /// Copy direction is chosen so no source slot is overwritten before
    /// it is read: `dst_pos < src_pos` copies ascending, otherwise
    /// descending. Per-slot semantics match [`UniformArray::blit`].
    pub fn blit_within(
        &mut self,
        heap: &Heap,
        src_pos: usize,
        dst_pos: usize,
        len: usize,
    ) -> OpalResult<()> {
        check_range(src_pos, len, self.len)?;
        check_range(dst_pos, len, self.len)?;

        if dst_pos < src_pos {
            // Copying down: each source slot is read before any write
            // can reach it.
            for i in 0..len {
                // SAFETY: ranges validated above.
                let v = unsafe { self.get_unchecked(src_pos + i) };
                unsafe { self.set_unchecked(heap, dst_pos + i, v) };
            }
        } else {
            // Copying up (or in place): walk backwards.
            for i in (0..len).rev() {
                // SAFETY: ranges validated above.
                let v = unsafe { self.get_unchecked(src_pos + i) };
                unsafe { self.set_unchecked(heap, dst_pos + i, v) };
            }
        }
        Ok(())
    }

    /// Create an independent copy of this array.
    ///
    /// The copy is realized zero-filled and populated through the store
    /// protocol; mutating either array never affects the other.
    pub fn copy(&self, heap: &Heap) -> UniformArray {
        let mut out = UniformArray::zeroed(self.len);
        for i in 0..self.len {
            // SAFETY: both arrays have exactly `self.len` slots.
            let v = unsafe { self.get_unchecked(i) };
            unsafe { out.set_unchecked(heap, i, v) };
        }
        out
    }

    /// Replace this array's contents with `src`'s. Lengths must match.
    pub fn copy_from(&mut self, heap: &Heap, src: &UniformArray) -> OpalResult<()> {
        if src.len != self.len {
            return Err(OpalError::range(0, src.len, self.len));
        }
        Self::blit(heap, src, 0, self, 0, src.len)
    }

    // =========================================================================
    // Truncation
    // =========================================================================

    /// Shrink the array to `new_len` slots.
    ///
    /// The storage block is not reallocated; the trailing slots become
    /// permanently inaccessible. Callers that held references in the
    /// dropped tail and want the collector to release them use
    /// [`UniformArray::clear_if_ref`] first.
    ///
    /// # Safety
    /// `1 <= new_len <= self.len()` must hold. There is no bounds check;
    /// violating the precondition leaves the array with a length beyond
    /// its initialized storage, and later accesses are undefined
    /// behavior.
    #[inline]
    pub unsafe fn truncate(&mut self, new_len: usize) {
        debug_assert!(new_len >= 1, "truncated length must be at least 1");
        debug_assert!(new_len <= self.len, "truncation cannot grow the array");
        self.len = new_len;
    }
}

impl std::fmt::Debug for UniformArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut list = f.debug_list();
        for i in 0..self.len {
            // SAFETY: i < self.len.
            list.entry(&unsafe { self.get_unchecked(i) });
        }
        list.finish()
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use opal_gc::GcConfig;
    use proptest::prelude::*;

    proptest! {
        /// `blit_within` must match the reference semantics of copying
        /// the source range out to a temporary and writing it back, for
        /// every overlap shape.
        #[test]
        fn blit_within_matches_temporary_copy(
            values in proptest::collection::vec(-1000i64..1000, 1..24),
            src_sel in any::<prop::sample::Index>(),
            dst_sel in any::<prop::sample::Index>(),
            len_sel in any::<prop::sample::Index>(),
        ) {
            let n = values.len();
            let src_pos = src_sel.index(n + 1);
            let dst_pos = dst_sel.index(n + 1);
            let len = len_sel.index(n - src_pos.max(dst_pos) + 1);

            let heap = Heap::new(GcConfig::low_memory());
            let mut array = UniformArray::zeroed(n);
            for (i, &v) in values.iter().enumerate() {
                array.set(&heap, i, Value::int(v).unwrap()).unwrap();
            }

            let mut expected = values.clone();
            let tmp: Vec<i64> = expected[src_pos..src_pos + len].to_vec();
            expected[dst_pos..dst_pos + len].copy_from_slice(&tmp);

            array.blit_within(&heap, src_pos, dst_pos, len).unwrap();

            for i in 0..n {
                prop_assert_eq!(array.get(i).unwrap().as_int(), Some(expected[i]));
            }
        }

        /// Workloads that only ever store scalars must never touch the
        /// collector write path.
        #[test]
        fn scalar_workloads_never_run_barrier(
            ops in proptest::collection::vec((0usize..16, -1000i64..1000), 1..64),
        ) {
            let heap = Heap::new(GcConfig::low_memory());
            let mut array = UniformArray::zeroed(16);
            for &(i, v) in &ops {
                array.set(&heap, i, Value::int(v).unwrap()).unwrap();
            }
            prop_assert_eq!(heap.stats().barrier_store_count(), 0);
            prop_assert_eq!(heap.stats().scalar_store_count(), ops.len() as u64);
        }
    }
}

//! Dense float array: the specialized all-float realization.
//!
//! When the layout chooser observes an all-float fill it realizes a
//! `FloatDense` block: raw `f64` words with no tags, nothing for the
//! collector to trace, and direct slice access for numeric kernels.
//! [`FloatArray`] is the owner of that realization. It is also the
//! reason [`super::UniformArray`] needs its creation guard: the two
//! layouts share a chooser but are mutually incompatible.

use super::raw::{Block, BlockKind};
use opal_core::{OpalError, OpalResult, Value};

/// Fixed-length array of unboxed `f64`s.
///
/// Slots are raw floats, never references; no store here ever involves
/// the collector.
pub struct FloatArray {
    /// Backing storage; always realized `FloatDense`.
    block: Block,
    /// Number of slots.
    len: usize,
}

impl FloatArray {
    /// Create an array of `len` zeros.
    pub fn zeroed(len: usize) -> Self {
        Self::filled(len, 0.0)
    }

    /// Create an array of `len` slots, each holding `x`.
    ///
    /// Goes through the shared layout chooser, which picks the dense
    /// realization for any float fill. NaN fills are canonicalized.
    pub fn filled(len: usize, x: f64) -> Self {
        let block = Block::realize(len, Value::float(x));
        debug_assert_eq!(block.kind(), BlockKind::FloatDense);
        Self { block, len }
    }

    /// Number of slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the array has no slots.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the float at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> OpalResult<f64> {
        if index >= self.len {
            return Err(OpalError::index(index, self.len));
        }
        // SAFETY: bounds checked above; block is FloatDense.
        Ok(unsafe { self.block.float(index) })
    }

    /// Store `x` at `index`.
    #[inline]
    pub fn set(&mut self, index: usize, x: f64) -> OpalResult<()> {
        if index >= self.len {
            return Err(OpalError::index(index, self.len));
        }
        // SAFETY: bounds checked above; block is FloatDense.
        unsafe { self.block.set_float(index, x) };
        Ok(())
    }

    /// View the contents as a float slice.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        // SAFETY: every slot was initialized at creation; block is
        // FloatDense.
        unsafe { self.block.float_slice(self.len) }
    }
}

impl std::fmt::Debug for FloatArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

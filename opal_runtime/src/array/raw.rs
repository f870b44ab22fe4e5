//! Raw storage blocks for array realizations.
//!
//! A block is a header followed by a payload of 64-bit slot words,
//! allocated in one piece and owned exclusively by the array handle.
//! The header carries the realized layout:
//!
//! - `Uniform`: every word is a tagged [`Value`]; slots may hold any
//!   mix of immediates and references.
//! - `FloatDense`: every word is a raw `f64`. This is the specialized
//!   layout the allocator picks when a fill looks all-float, and it is
//!   incompatible with tagged slot access.
//!
//! [`Block::realize`] is the shared layout chooser; uniform-array code
//! must route float-ambiguous fills around it (see `array/mod.rs`).

use opal_core::Value;
use std::ptr::NonNull;

/// Realized storage layout of a block.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Tagged slot words; heterogeneous contents.
    Uniform = 0,
    /// Raw `f64` words; no tags, no references.
    FloatDense = 1,
}

/// Header at the beginning of each storage block.
#[repr(C)]
pub struct BlockHeader {
    /// Realized layout of the payload.
    pub kind: BlockKind,
    /// Number of 64-bit slots in the payload.
    pub capacity: usize,
}

impl BlockHeader {
    /// Size of the block header. The payload starts at this offset and
    /// stays 8-aligned.
    pub const SIZE: usize = std::mem::size_of::<BlockHeader>();
}

/// A heap-allocated storage block: header plus slot payload.
///
/// The handle owns the allocation; dropping the block frees it. There
/// is no internal sharing or reference counting.
pub struct Block {
    /// Pointer to the start of the block (header).
    ptr: NonNull<u8>,
    /// Total size including header.
    total_size: usize,
}

impl Block {
    /// Allocate a block of `capacity` slots with the given layout tag.
    /// The payload is left uninitialized; callers fill every slot
    /// before the block escapes.
    ///
    /// # Panics
    ///
    /// Panics if the block size overflows `usize` or the allocation
    /// fails.
    fn alloc(kind: BlockKind, capacity: usize) -> Self {
        // Check for overflow using checked multiplication
        let Some(total_size) = capacity
            .checked_mul(8)
            .and_then(|payload| payload.checked_add(BlockHeader::SIZE))
        else {
            panic!("array block overflow: {} slots overflows usize", capacity);
        };
        let layout =
            std::alloc::Layout::from_size_align(total_size, 8).expect("Invalid block layout");

        let ptr = unsafe { std::alloc::alloc(layout) };
        if ptr.is_null() {
            panic!("Failed to allocate array block of {} bytes", total_size);
        }
        // SAFETY: just checked non-null.
        let ptr = unsafe { NonNull::new_unchecked(ptr) };

        // SAFETY: the allocation starts with header-sized, 8-aligned space.
        unsafe {
            std::ptr::write(ptr.as_ptr() as *mut BlockHeader, BlockHeader { kind, capacity });
        }

        Self { ptr, total_size }
    }

    /// Realize storage for `capacity` slots observed to hold `fill`.
    ///
    /// This is the runtime's shared layout chooser: an all-float fill
    /// selects the dense unboxed realization, anything else the tagged
    /// uniform one. Callers that must never receive `FloatDense` have
    /// to route ambiguous fills through [`Block::uniform_zeroed`]
    /// instead.
    pub fn realize(capacity: usize, fill: Value) -> Self {
        if let Some(x) = fill.as_float() {
            let mut block = Self::alloc(BlockKind::FloatDense, capacity);
            for i in 0..capacity {
                // SAFETY: i < capacity, block is FloatDense.
                unsafe { block.set_float(i, x) };
            }
            block
        } else {
            let mut block = Self::alloc(BlockKind::Uniform, capacity);
            let bits = fill.to_bits();
            for i in 0..capacity {
                // SAFETY: i < capacity.
                unsafe { block.set_word(i, bits) };
            }
            block
        }
    }

    /// Allocate a `Uniform` block with every slot holding the canonical
    /// zero scalar (tagged int 0, never the all-zero word, which would
    /// read back as float `+0.0`).
    pub fn uniform_zeroed(capacity: usize) -> Self {
        let mut block = Self::alloc(BlockKind::Uniform, capacity);
        let bits = Value::zero().to_bits();
        for i in 0..capacity {
            // SAFETY: i < capacity.
            unsafe { block.set_word(i, bits) };
        }
        block
    }

    /// Get the block header.
    #[inline]
    fn header(&self) -> &BlockHeader {
        // SAFETY: ptr points at a live, initialized header.
        unsafe { &*(self.ptr.as_ptr() as *const BlockHeader) }
    }

    /// Realized layout of this block.
    #[inline]
    pub fn kind(&self) -> BlockKind {
        self.header().kind
    }

    /// Number of slots in the payload.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.header().capacity
    }

    /// Start of the slot payload.
    #[inline]
    fn payload(&self) -> *mut u64 {
        // SAFETY: the payload begins immediately after the header and
        // stays within the allocation.
        unsafe { self.ptr.as_ptr().add(BlockHeader::SIZE) as *mut u64 }
    }

    /// Address identifying this block to the collector (the holder
    /// address recorded by write barriers).
    #[inline]
    pub fn holder_ptr(&self) -> *const () {
        self.ptr.as_ptr() as *const ()
    }

    /// Read the slot word at `index`.
    ///
    /// # Safety
    /// `index` must be less than [`Block::capacity`] and the slot must
    /// have been initialized.
    #[inline]
    pub unsafe fn word(&self, index: usize) -> u64 {
        debug_assert!(index < self.capacity());
        // SAFETY: caller guarantees index is in bounds.
        unsafe { *self.payload().add(index) }
    }

    /// Write the slot word at `index`.
    ///
    /// # Safety
    /// `index` must be less than [`Block::capacity`].
    #[inline]
    pub unsafe fn set_word(&mut self, index: usize, word: u64) {
        debug_assert!(index < self.capacity());
        // SAFETY: caller guarantees index is in bounds.
        unsafe { *self.payload().add(index) = word };
    }

    /// Read the raw `f64` at `index` of a `FloatDense` block.
    ///
    /// # Safety
    /// `index` must be in bounds and the block must be `FloatDense`.
    #[inline]
    pub unsafe fn float(&self, index: usize) -> f64 {
        debug_assert!(index < self.capacity());
        debug_assert_eq!(self.kind(), BlockKind::FloatDense);
        // SAFETY: caller guarantees index is in bounds.
        unsafe { *(self.payload() as *const f64).add(index) }
    }

    /// Write the raw `f64` at `index` of a `FloatDense` block.
    ///
    /// # Safety
    /// `index` must be in bounds and the block must be `FloatDense`.
    #[inline]
    pub unsafe fn set_float(&mut self, index: usize, x: f64) {
        debug_assert!(index < self.capacity());
        debug_assert_eq!(self.kind(), BlockKind::FloatDense);
        // SAFETY: caller guarantees index is in bounds.
        unsafe { *(self.payload() as *mut f64).add(index) = x };
    }

    /// View a `FloatDense` payload as a float slice.
    ///
    /// # Safety
    /// The block must be `FloatDense` with all slots initialized.
    #[inline]
    pub unsafe fn float_slice(&self, len: usize) -> &[f64] {
        debug_assert!(len <= self.capacity());
        debug_assert_eq!(self.kind(), BlockKind::FloatDense);
        // SAFETY: caller guarantees len is within the initialized payload.
        unsafe { std::slice::from_raw_parts(self.payload() as *const f64, len) }
    }
}

impl Drop for Block {
    fn drop(&mut self) {
        if let Ok(layout) = std::alloc::Layout::from_size_align(self.total_size, 8) {
            // SAFETY: ptr was allocated with this exact layout.
            unsafe {
                std::alloc::dealloc(self.ptr.as_ptr(), layout);
            }
        }
    }
}

// Safety: Block is an exclusively owned allocation; the handle can move
// between threads.
unsafe impl Send for Block {}

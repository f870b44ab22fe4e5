//! Old space (tenured generation) with block-based allocation.
//!
//! The old space holds long-lived objects. It grows as a chain of
//! fixed-size blocks, each bump-allocated; a block that cannot satisfy
//! a request is left behind and a fresh one is chained on. Membership
//! queries walk the chain, which is how the barrier classifies an
//! address as old.

use parking_lot::Mutex;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Old space (tenured generation) with block-based allocation.
pub struct OldSpace {
    /// Blocks in the old space. The last block is the current
    /// allocation target.
    blocks: Mutex<Vec<OldBlock>>,
    /// Total capacity in bytes.
    capacity: AtomicUsize,
    /// Total bytes allocated.
    allocated: AtomicUsize,
    /// Block size for new blocks.
    block_size: usize,
}

/// A single bump-allocated block in the old space.
struct OldBlock {
    /// Start of the block.
    start: *mut u8,
    /// End of the block (start + size).
    end: *mut u8,
    /// Next free byte. Guarded by the `OldSpace` block list lock.
    cursor: *mut u8,
    /// Size of the block.
    size: usize,
}

impl OldBlock {
    /// Allocate a new block of the given size.
    fn new(size: usize) -> Option<Self> {
        let layout = std::alloc::Layout::from_size_align(size, 8).ok()?;

        let ptr = unsafe { std::alloc::alloc_zeroed(layout) };
        let start = NonNull::new(ptr)?.as_ptr();
        let end = unsafe { start.add(size) };

        Some(Self {
            start,
            end,
            cursor: start,
            size,
        })
    }

    /// Try to allocate `size` bytes from this block.
    #[inline]
    fn alloc(&mut self, size: usize) -> Option<NonNull<u8>> {
        let remaining = self.end as usize - self.cursor as usize;
        if size > remaining {
            return None;
        }
        let ptr = self.cursor;
        self.cursor = unsafe { self.cursor.add(size) };
        NonNull::new(ptr)
    }

    /// Check if a pointer is within this block.
    #[inline]
    fn contains(&self, ptr: *const ()) -> bool {
        let addr = ptr as usize;
        addr >= self.start as usize && addr < self.end as usize
    }
}

impl Drop for OldBlock {
    fn drop(&mut self) {
        if !self.start.is_null() {
            let layout = std::alloc::Layout::from_size_align(self.size, 8).expect("Invalid layout");
            unsafe {
                std::alloc::dealloc(self.start, layout);
            }
        }
    }
}

// Safety: OldBlock mutation is guarded by the OldSpace block list lock.
unsafe impl Send for OldBlock {}
unsafe impl Sync for OldBlock {}

impl OldSpace {
    /// Create a new old space. One block is allocated eagerly so the
    /// space always has a current allocation target.
    pub fn new(block_size: usize) -> Self {
        let mut blocks = Vec::new();
        let mut capacity = 0;
        if let Some(block) = OldBlock::new(block_size) {
            capacity += block.size;
            blocks.push(block);
        }

        Self {
            blocks: Mutex::new(blocks),
            capacity: AtomicUsize::new(capacity),
            allocated: AtomicUsize::new(0),
            block_size,
        }
    }

    /// Allocate memory in the old space.
    pub fn alloc(&self, size: usize) -> Option<NonNull<u8>> {
        let mut blocks = self.blocks.lock();

        // Try the current (last) block first
        if let Some(block) = blocks.last_mut() {
            if let Some(ptr) = block.alloc(size) {
                self.allocated.fetch_add(size, Ordering::Relaxed);
                return Some(ptr);
            }
        }

        // Current block is full, chain on a new one
        let mut new_block = OldBlock::new(self.block_size.max(size))?;
        let ptr = new_block.alloc(size)?;

        self.capacity.fetch_add(new_block.size, Ordering::Relaxed);
        self.allocated.fetch_add(size, Ordering::Relaxed);
        blocks.push(new_block);

        Some(ptr)
    }

    /// Check if a pointer is in the old space.
    pub fn contains(&self, ptr: *const ()) -> bool {
        let blocks = self.blocks.lock();
        blocks.iter().any(|block| block.contains(ptr))
    }

    /// Get total capacity in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity.load(Ordering::Relaxed)
    }

    /// Get total bytes allocated.
    #[inline]
    pub fn usage(&self) -> usize {
        self.allocated.load(Ordering::Relaxed)
    }

    /// Get number of blocks.
    pub fn block_count(&self) -> usize {
        self.blocks.lock().len()
    }
}

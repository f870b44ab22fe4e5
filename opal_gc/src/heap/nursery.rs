//! Bump-allocated nursery for newly created objects.
//!
//! New objects are born here. Allocation advances a cursor through one
//! contiguous region and never frees individually. When the nursery
//! fills, allocation falls back to the old space; the generation of an
//! address is decided by which space contains it, which is what the
//! write barrier consults.

use std::ptr::NonNull;
use std::sync::atomic::{AtomicPtr, Ordering};

/// Nursery (young generation) backed by a single bump-allocated space.
pub struct Nursery {
    space: Space,
}

/// A contiguous allocation space.
struct Space {
    /// First byte of the region.
    start: *mut u8,
    /// One past the last byte (`start + size`).
    end: *mut u8,
    /// Bump cursor; grows upward from `start`.
    cursor: AtomicPtr<u8>,
    /// Region size in bytes.
    size: usize,
}

impl Space {
    /// Reserve a zeroed region of `size` bytes.
    fn new(size: usize) -> Self {
        let layout = std::alloc::Layout::from_size_align(size, 8).expect("Invalid space layout");

        let start = unsafe { std::alloc::alloc_zeroed(layout) };
        if start.is_null() {
            panic!("Failed to reserve {} bytes for the nursery", size);
        }

        Self {
            start,
            // SAFETY: one past the allocation, never dereferenced.
            end: unsafe { start.add(size) },
            cursor: AtomicPtr::new(start),
            size,
        }
    }

    /// Bump out `size` bytes, or `None` when the request no longer
    /// fits.
    #[inline]
    fn alloc(&self, size: usize) -> Option<NonNull<u8>> {
        loop {
            let current = self.cursor.load(Ordering::Relaxed);
            let remaining = self.end as usize - current as usize;
            if size > remaining {
                return None;
            }
            // In bounds: size <= end - current.
            let bumped = unsafe { current.add(size) };

            // CAS to claim [current, bumped)
            if self
                .cursor
                .compare_exchange_weak(current, bumped, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
            {
                return NonNull::new(current);
            }
        }
    }

    /// Whether `ptr` falls inside this region.
    #[inline]
    fn contains(&self, ptr: *const ()) -> bool {
        (self.start as usize..self.end as usize).contains(&(ptr as usize))
    }

    /// Bytes handed out so far.
    #[inline]
    fn allocated(&self) -> usize {
        (self.cursor.load(Ordering::Relaxed) as usize).saturating_sub(self.start as usize)
    }

    /// Bytes still available.
    #[inline]
    fn free(&self) -> usize {
        self.size.saturating_sub(self.allocated())
    }

    /// Rewind the cursor to the base of the region.
    fn reset(&self) {
        self.cursor.store(self.start, Ordering::Release);

        // Debug builds scrub the region so stale words are easy to spot.
        #[cfg(debug_assertions)]
        unsafe {
            std::ptr::write_bytes(self.start, 0, self.size);
        }
    }
}

impl Drop for Space {
    fn drop(&mut self) {
        if self.start.is_null() {
            return;
        }
        let layout =
            std::alloc::Layout::from_size_align(self.size, 8).expect("Invalid space layout");
        // SAFETY: start was returned by alloc_zeroed with this layout.
        unsafe { std::alloc::dealloc(self.start, layout) };
    }
}

// Safety: the bump cursor is atomic; start/end/size are immutable after
// construction.
unsafe impl Send for Space {}
unsafe impl Sync for Space {}

impl Nursery {
    /// Reserve a nursery of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self {
            space: Space::new(size),
        }
    }

    /// Bump-allocate `size` bytes out of the nursery.
    ///
    /// Returns None if the nursery is full (caller falls back to the
    /// old space).
    #[inline]
    pub fn alloc(&self, size: usize) -> Option<NonNull<u8>> {
        self.space.alloc(size)
    }

    /// Whether `ptr` was allocated here.
    #[inline]
    pub fn contains(&self, ptr: *const ()) -> bool {
        self.space.contains(ptr)
    }

    /// Bytes allocated since creation (or the last reset).
    #[inline]
    pub fn allocated(&self) -> usize {
        self.space.allocated()
    }

    /// Bytes still available.
    #[inline]
    pub fn free(&self) -> usize {
        self.space.free()
    }

    /// Nursery size in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.space.size
    }

    /// True when no free bytes remain.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.space.free() == 0
    }

    /// Fraction of the nursery in use (0.0 to 1.0).
    #[inline]
    pub fn usage_ratio(&self) -> f64 {
        self.allocated() as f64 / self.size() as f64
    }

    /// Forget every allocation and rewind to the base address.
    pub fn reset(&mut self) {
        self.space.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_nursery_is_empty() {
        let nursery = Nursery::new(64 * 1024);
        assert_eq!(nursery.size(), 64 * 1024);
        assert_eq!(nursery.allocated(), 0);
        assert_eq!(nursery.free(), 64 * 1024);
    }

    #[test]
    fn test_alloc_bumps_consecutively() {
        let nursery = Nursery::new(1024);

        let first = nursery.alloc(96).expect("first chunk");
        let second = nursery.alloc(32).expect("second chunk");

        // Bump allocation hands out adjacent chunks.
        assert_eq!(second.as_ptr() as usize - first.as_ptr() as usize, 96);
        assert_eq!(nursery.allocated(), 128);
    }

    #[test]
    fn test_exhausted_nursery_refuses() {
        let nursery = Nursery::new(128);

        assert!(nursery.alloc(128).is_some());
        assert!(nursery.alloc(1).is_none());
        assert!(nursery.is_full());
    }

    #[test]
    fn test_contains_is_range_based() {
        let nursery = Nursery::new(1024);
        let chunk = nursery.alloc(64).expect("chunk");

        assert!(nursery.contains(chunk.as_ptr() as *const ()));
        assert!(!nursery.contains(std::ptr::null::<()>()));
    }

    #[test]
    fn test_reset_rewinds_cursor() {
        let mut nursery = Nursery::new(1024);
        let _ = nursery.alloc(256);
        assert_eq!(nursery.allocated(), 256);

        nursery.reset();
        assert_eq!(nursery.allocated(), 0);
        assert_eq!(nursery.free(), 1024);
    }
}

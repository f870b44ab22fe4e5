//! Opal heap and write-barrier substrate.
//!
//! A generational heap for the Opal runtime. Objects are born in a
//! bump-allocated nursery and tenured into a block-chained old space;
//! the write barrier records old→young references in a remembered set
//! so a minor collection can treat those holders as roots.
//!
//! # Architecture
//!
//! - **Nursery (young generation)**: bump-pointer allocation. Most
//!   objects die here.
//! - **Old space (tenured generation)**: block-based allocation for
//!   long-lived objects.
//! - **Remembered set**: precise list of old-generation holders with
//!   young pointees, fed by the write barrier.
//!
//! # Write Barriers
//!
//! [`barrier::write_barrier`] is the full store path. Containers are
//! expected to elide it whenever a store provably creates no reference:
//! scalar-for-scalar overwrites and identity stores skip it entirely.
//! [`GcStats`] counts how often each path is taken, which is how that
//! elision is observed and tested.
//!
//! # Usage
//!
//! ```ignore
//! use opal_gc::{Heap, GcConfig, barrier};
//!
//! let heap = Heap::new(GcConfig::default());
//! let obj = heap.alloc(size).expect("out of memory");
//!
//! // After storing a reference into a heap object:
//! barrier::write_barrier(&heap, holder, new_value);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod barrier;
pub mod config;
pub mod heap;

mod stats;

// Re-exports for convenient access
pub use barrier::{RememberedEntry, RememberedSet};
pub use config::{ConfigError, GcConfig};
pub use heap::Heap;
pub use stats::GcStats;

/// Generation identifier for generational collection.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Generation {
    /// Young generation (nursery) - bump allocation.
    Nursery = 0,
    /// Old generation (tenured) - block allocation.
    Tenured = 1,
}

impl Generation {
    /// Check if this generation is the young space.
    #[inline]
    pub fn is_young(self) -> bool {
        matches!(self, Generation::Nursery)
    }

    /// Check if this generation is the old space.
    #[inline]
    pub fn is_old(self) -> bool {
        matches!(self, Generation::Tenured)
    }
}

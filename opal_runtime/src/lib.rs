//! Opal runtime containers.
//!
//! This crate provides:
//! - The uniform array: fixed-length tagged slot storage with the
//!   barrier-elided store protocol (`array`)
//! - The dense float realization that shares its layout chooser
//!   (`array::dense`)
//! - The strict-ordering scan collaborator (`sorted`)
//!
//! Mutating operations take a [`opal_gc::Heap`] so reference stores can
//! run the write barrier; scalar traffic never touches it.

#![deny(unsafe_op_in_unsafe_fn)]

pub mod array;
pub mod sorted;

// Re-export commonly used items
pub use array::dense::FloatArray;
pub use array::UniformArray;

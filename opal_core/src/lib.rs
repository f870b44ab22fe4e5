//! Opal core value representation.
//!
//! This crate defines the two things every other Opal crate agrees on:
//!
//! - [`Value`]: the NaN-boxed 64-bit word that is either an immediate
//!   scalar (int, float, bool, none) or an opaque object reference, and
//! - [`OpalError`]: the recoverable error surface of the runtime core.
//!
//! The value encoding is the load-bearing design decision for the storage
//! layer: floats are stored as their own bits, so a buffer whose every word
//! is a float is indistinguishable from a raw `f64` buffer. Storage code
//! that must keep tagged slots resolves that ambiguity at allocation time
//! (see `opal_runtime`).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod value;

pub use error::{OpalError, OpalResult};
pub use value::{Value, INT_MAX, INT_MIN};

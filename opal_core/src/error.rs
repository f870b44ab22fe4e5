//! Error types for the Opal runtime core.
//!
//! The runtime distinguishes recoverable usage errors (reported through
//! these types) from internal invariant violations (fatal asserts in the
//! code that detects them). Only bounds violations on checked operations
//! are recoverable.

/// Result alias for fallible runtime-core operations.
pub type OpalResult<T> = Result<T, OpalError>;

/// A recoverable runtime-core error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpalError {
    /// A checked indexed access fell outside `[0, len)`.
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The array length at the time of the access.
        len: usize,
    },
    /// A checked range operation (blit, whole-array copy) fell outside the
    /// array it addresses.
    RangeOutOfBounds {
        /// Start of the requested range.
        pos: usize,
        /// Number of slots requested.
        len: usize,
        /// Length of the array the range was checked against.
        array_len: usize,
    },
}

impl OpalError {
    /// Bounds-violation error for a single-slot access.
    #[inline]
    pub fn index(index: usize, len: usize) -> Self {
        OpalError::IndexOutOfRange { index, len }
    }

    /// Bounds-violation error for a slot range.
    #[inline]
    pub fn range(pos: usize, len: usize, array_len: usize) -> Self {
        OpalError::RangeOutOfBounds {
            pos,
            len,
            array_len,
        }
    }
}

impl std::fmt::Display for OpalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpalError::IndexOutOfRange { index, len } => {
                write!(f, "index {} out of range for array of length {}", index, len)
            }
            OpalError::RangeOutOfBounds {
                pos,
                len,
                array_len,
            } => {
                write!(
                    f,
                    "range [{}, {}) out of bounds for array of length {}",
                    pos,
                    pos.saturating_add(*len),
                    array_len
                )
            }
        }
    }
}

impl std::error::Error for OpalError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_error_display() {
        let err = OpalError::index(7, 5);
        assert_eq!(
            err.to_string(),
            "index 7 out of range for array of length 5"
        );
    }

    #[test]
    fn test_range_error_display() {
        let err = OpalError::range(3, 4, 5);
        assert_eq!(
            err.to_string(),
            "range [3, 7) out of bounds for array of length 5"
        );
    }

    #[test]
    fn test_error_equality() {
        assert_eq!(OpalError::index(1, 2), OpalError::index(1, 2));
        assert_ne!(OpalError::index(1, 2), OpalError::index(2, 2));
    }
}

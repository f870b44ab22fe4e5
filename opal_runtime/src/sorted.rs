//! Strict-ordering scan over indexed value sequences.
//!
//! A thin collaborator over the array types: it consumes only an
//! indexed read and a comparator, and never looks inside the storage.

use crate::array::UniformArray;
use opal_core::Value;
use std::cmp::Ordering;

/// Check that a sequence of `len` values is strictly ascending under
/// `cmp`.
///
/// `read(i)` produces the value at index `i`; it is called once per
/// index in order. Sequences of length 0 or 1 are trivially sorted.
/// Equal neighbors fail the check; the ordering is strict.
pub fn is_strictly_sorted_by<R, C>(len: usize, read: R, mut cmp: C) -> bool
where
    R: Fn(usize) -> Value,
    C: FnMut(Value, Value) -> Ordering,
{
    if len < 2 {
        return true;
    }
    let mut prev = read(0);
    for i in 1..len {
        let cur = read(i);
        if cmp(prev, cur) != Ordering::Less {
            return false;
        }
        prev = cur;
    }
    true
}

impl UniformArray {
    /// Check that this array's values are strictly ascending under
    /// `cmp`.
    pub fn is_strictly_sorted_by<C>(&self, cmp: C) -> bool
    where
        C: FnMut(Value, Value) -> Ordering,
    {
        // SAFETY: indices passed by the scan are below self.len().
        is_strictly_sorted_by(self.len(), |i| unsafe { self.get_unchecked(i) }, cmp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opal_gc::{GcConfig, Heap};

    fn by_int(a: Value, b: Value) -> Ordering {
        a.as_int().unwrap().cmp(&b.as_int().unwrap())
    }

    fn int_array(heap: &Heap, values: &[i64]) -> UniformArray {
        let mut array = UniformArray::zeroed(values.len());
        for (i, &v) in values.iter().enumerate() {
            array.set(heap, i, Value::int(v).unwrap()).unwrap();
        }
        array
    }

    #[test]
    fn test_sorted_sequence() {
        let heap = Heap::new(GcConfig::low_memory());
        let array = int_array(&heap, &[-3, 0, 1, 7]);
        assert!(array.is_strictly_sorted_by(by_int));
    }

    #[test]
    fn test_unsorted_sequence() {
        let heap = Heap::new(GcConfig::low_memory());
        let array = int_array(&heap, &[1, 3, 2]);
        assert!(!array.is_strictly_sorted_by(by_int));
    }

    #[test]
    fn test_equal_neighbors_fail_strictness() {
        let heap = Heap::new(GcConfig::low_memory());
        let array = int_array(&heap, &[1, 2, 2, 3]);
        assert!(!array.is_strictly_sorted_by(by_int));
    }

    #[test]
    fn test_trivial_lengths() {
        let heap = Heap::new(GcConfig::low_memory());
        assert!(int_array(&heap, &[]).is_strictly_sorted_by(by_int));
        assert!(int_array(&heap, &[5]).is_strictly_sorted_by(by_int));
    }

    #[test]
    fn test_free_function_with_synthetic_reads() {
        // The scan needs only a read function, not an array.
        let sorted = is_strictly_sorted_by(
            5,
            |i| Value::int(i as i64 * 10).unwrap(),
            by_int,
        );
        assert!(sorted);

        let constant = is_strictly_sorted_by(3, |_| Value::int(4).unwrap(), by_int);
        assert!(!constant);
    }
}

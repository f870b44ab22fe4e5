//! End-to-end tests for uniform array operations against a live heap.
//!
//! Coverage:
//! - Creation scenarios (zero fill, value fill, singleton, float-fill guard)
//! - Overlapping and cross-array bulk copies
//! - Truncation
//! - Store-protocol instrumentation (scalar fast path, identity elision,
//!   barrier stores) observed through heap statistics
//! - Old→young tracking through array stores

use opal_core::Value;
use opal_gc::{GcConfig, Heap};
use opal_runtime::{FloatArray, UniformArray};

fn test_heap() -> Heap {
    Heap::new(GcConfig::low_memory())
}

fn int(i: i64) -> Value {
    Value::int(i).unwrap()
}

fn int_array(heap: &Heap, values: &[i64]) -> UniformArray {
    let mut array = UniformArray::zeroed(values.len());
    for (i, &v) in values.iter().enumerate() {
        array.set(heap, i, int(v)).unwrap();
    }
    array
}

fn ints(array: &UniformArray) -> Vec<i64> {
    (0..array.len())
        .map(|i| array.get(i).unwrap().as_int().unwrap())
        .collect()
}

// =============================================================================
// Creation
// =============================================================================

mod creation {
    use super::*;

    #[test]
    fn test_filled_five_zeros() {
        let array = UniformArray::filled(5, int(0));
        assert_eq!(array.len(), 5);
        for i in 0..5 {
            assert_eq!(array.get(i).unwrap().as_int(), Some(0));
        }
    }

    #[test]
    fn test_singleton_holds_value() {
        let x = int(314);
        let array = UniformArray::singleton(x);
        assert_eq!(array.len(), 1);
        assert_eq!(array.get(0).unwrap().as_int(), Some(314));
    }

    #[test]
    fn test_zeroed_slots_are_scalar_zero() {
        let array = UniformArray::zeroed(4);
        array.assert_uniform();
        for i in 0..4 {
            let v = array.get(i).unwrap();
            assert_eq!(v.as_int(), Some(0));
            assert!(v.is_immediate());
            assert!(!v.is_object());
        }
    }

    #[test]
    fn test_filled_with_every_value_kind() {
        let fills = [
            int(-7),
            Value::bool(true),
            Value::none(),
            Value::float(0.5),
            Value::object_ptr(0xA000 as *const ()),
        ];
        for fill in fills {
            let array = UniformArray::filled(3, fill);
            array.assert_uniform();
            for i in 0..3 {
                assert_eq!(array.get(i).unwrap().to_bits(), fill.to_bits());
            }
        }
    }

    #[test]
    fn test_float_fill_never_realizes_dense() {
        // An all-float fill is exactly what the layout chooser
        // specializes on; the uniform constructor must not let it.
        for x in [0.0, -0.0, 2.5, f64::INFINITY, f64::NAN] {
            let array = UniformArray::filled(8, Value::float(x));
            array.assert_uniform();
        }
    }

    #[test]
    fn test_dense_realization_exists_for_float_arrays() {
        // The sibling type does take the dense layout; its payload is
        // indistinguishable from a raw f64 buffer.
        let floats = FloatArray::filled(4, 2.5);
        assert_eq!(floats.as_slice(), &[2.5; 4]);
    }
}

// =============================================================================
// Bulk copy and truncation scenarios
// =============================================================================

mod bulk_ops {
    use super::*;

    #[test]
    fn test_overlapping_shift_right() {
        let heap = test_heap();
        let mut t = int_array(&heap, &[1, 2, 3, 4, 5]);
        // Copy [0,3) up to 1: destination above source, descending.
        t.blit_within(&heap, 0, 1, 3).unwrap();
        assert_eq!(ints(&t), vec![1, 1, 2, 3, 5]);
    }

    #[test]
    fn test_overlapping_shift_left() {
        let heap = test_heap();
        let mut t = int_array(&heap, &[1, 2, 3, 4, 5]);
        // Copy [1,4) down to 0: destination below source, ascending.
        t.blit_within(&heap, 1, 0, 3).unwrap();
        assert_eq!(ints(&t), vec![2, 3, 4, 4, 5]);
    }

    #[test]
    fn test_truncate_to_three() {
        let heap = test_heap();
        let mut t = int_array(&heap, &[1, 2, 3, 4, 5]);
        // SAFETY: 1 <= 3 <= 5.
        unsafe { t.truncate(3) };
        assert_eq!(t.len(), 3);
        assert_eq!(ints(&t), vec![1, 2, 3]);
        assert!(t.get(3).is_err());
        assert!(t.get(4).is_err());
    }

    #[test]
    fn test_blit_across_arrays() {
        let heap = test_heap();
        let src = int_array(&heap, &[10, 20, 30, 40]);
        let mut dst = int_array(&heap, &[0, 0, 0, 0, 0]);
        UniformArray::blit(&heap, &src, 1, &mut dst, 2, 3).unwrap();
        assert_eq!(ints(&dst), vec![0, 0, 20, 30, 40]);
    }

    #[test]
    fn test_copy_is_content_equal_and_independent() {
        let heap = test_heap();
        let mut original = int_array(&heap, &[1, 2, 3]);
        let copy = original.copy(&heap);

        assert_eq!(ints(&copy), vec![1, 2, 3]);

        original.set(&heap, 1, int(99)).unwrap();
        assert_eq!(ints(&original), vec![1, 99, 3]);
        assert_eq!(ints(&copy), vec![1, 2, 3]);
    }

    #[test]
    fn test_blit_after_truncate_respects_new_length() {
        let heap = test_heap();
        let mut t = int_array(&heap, &[1, 2, 3, 4, 5]);
        // SAFETY: 1 <= 3 <= 5.
        unsafe { t.truncate(3) };

        // The dropped tail is out of range for blits now.
        assert!(t.blit_within(&heap, 1, 3, 1).is_err());
        assert!(t.blit_within(&heap, 3, 0, 1).is_err());
        t.blit_within(&heap, 0, 2, 1).unwrap();
        assert_eq!(ints(&t), vec![1, 2, 1]);
    }
}

// =============================================================================
// Store-protocol instrumentation
// =============================================================================

mod store_protocol {
    use super::*;

    #[test]
    fn test_scalar_workload_never_runs_barrier() {
        let heap = test_heap();
        let mut array = UniformArray::zeroed(32);

        for round in 0..4 {
            for i in 0..32 {
                let v = if (i + round) % 2 == 0 {
                    int(i as i64)
                } else {
                    Value::float(i as f64 * 0.5)
                };
                array.set(&heap, i, v).unwrap();
            }
        }

        assert_eq!(heap.stats().barrier_store_count(), 0);
        assert_eq!(heap.stats().identity_elision_count(), 0);
        assert_eq!(heap.stats().scalar_store_count(), 128);
    }

    #[test]
    fn test_identity_store_is_a_no_op() {
        let heap = test_heap();
        let obj = Value::object_ptr(0xB000 as *const ());
        let mut array = UniformArray::singleton(int(0));

        array.set(&heap, 0, obj).unwrap();
        let barriers_after_first = heap.stats().barrier_store_count();

        for _ in 0..10 {
            array.set(&heap, 0, obj).unwrap();
        }

        assert_eq!(heap.stats().barrier_store_count(), barriers_after_first);
        assert_eq!(heap.stats().identity_elision_count(), 10);
        assert_eq!(array.get(0).unwrap().as_object_ptr(), Some(0xB000 as *const ()));
    }

    #[test]
    fn test_reference_transitions_take_barrier_path() {
        let heap = test_heap();
        let mut array = UniformArray::zeroed(1);

        // scalar -> ref, ref -> distinct ref, ref -> scalar: all three
        // involve the collector.
        array.set(&heap, 0, Value::object_ptr(0xB000 as *const ())).unwrap();
        array.set(&heap, 0, Value::object_ptr(0xC000 as *const ())).unwrap();
        array.set(&heap, 0, int(0)).unwrap();

        assert_eq!(heap.stats().barrier_store_count(), 3);
    }

    #[test]
    fn test_repeated_copy_from_elides_identical_references() {
        let heap = test_heap();
        let mut src = UniformArray::zeroed(4);
        for i in 0..4 {
            let obj = Value::object_ptr(((i + 1) * 0x1000) as *const ());
            src.set(&heap, i, obj).unwrap();
        }

        let mut dst = UniformArray::zeroed(4);
        dst.copy_from(&heap, &src).unwrap();
        let barriers_after_first = heap.stats().barrier_store_count();

        // Second pass stores the same references again: every slot
        // copy is elided by identity.
        dst.copy_from(&heap, &src).unwrap();
        assert_eq!(heap.stats().barrier_store_count(), barriers_after_first);
        assert_eq!(heap.stats().identity_elision_count(), 4);
    }

    #[test]
    fn test_blit_per_slot_costs_match_set() {
        let heap = test_heap();
        let src = int_array(&heap, &[1, 2, 3, 4, 5, 6, 7, 8]);
        heap.stats().reset();

        let mut dst = UniformArray::zeroed(8);
        UniformArray::blit(&heap, &src, 0, &mut dst, 0, 8).unwrap();

        // All-scalar blit: eight scalar stores, zero barrier stores.
        assert_eq!(heap.stats().scalar_store_count(), 8);
        assert_eq!(heap.stats().barrier_store_count(), 0);
    }
}

// =============================================================================
// Generational flow
// =============================================================================

mod generational_flow {
    use super::*;

    #[test]
    fn test_young_pointee_lands_in_remembered_set() {
        let heap = test_heap();
        let young = heap.alloc(64).expect("nursery alloc failed");
        let mut array = UniformArray::zeroed(1);

        // The array block lives outside the nursery, so storing a
        // nursery pointer is an old→young edge the collector must see.
        array
            .set(&heap, 0, Value::object_ptr(young.as_ptr() as *const ()))
            .unwrap();

        assert_eq!(heap.remembered_set().len(), 1);
        assert_eq!(heap.stats().remembered_insert_count(), 1);
    }

    #[test]
    fn test_tenured_pointee_not_remembered() {
        let heap = test_heap();
        let old = heap.alloc_tenured(64).expect("tenured alloc failed");
        let mut array = UniformArray::zeroed(1);

        array
            .set(&heap, 0, Value::object_ptr(old.as_ptr() as *const ()))
            .unwrap();

        // Barrier ran, but an old pointee needs no remembered entry.
        assert_eq!(heap.stats().barrier_store_count(), 1);
        assert!(heap.remembered_set().is_empty());
    }

    #[test]
    fn test_drain_dedupes_repeated_array_stores() {
        let heap = test_heap();
        let mut array = UniformArray::zeroed(4);

        for i in 0..4 {
            let young = heap.alloc(32).expect("nursery alloc failed");
            array
                .set(&heap, i, Value::object_ptr(young.as_ptr() as *const ()))
                .unwrap();
        }

        // Four stores from the same holder collapse to one root entry.
        let entries = heap.drain_remembered_set();
        assert_eq!(entries.len(), 1);
        assert!(heap.remembered_set().is_empty());
    }
}

// =============================================================================
// Sortedness collaborator
// =============================================================================

mod sortedness {
    use super::*;

    #[test]
    fn test_sorted_scan_over_array() {
        let heap = test_heap();
        let sorted = int_array(&heap, &[1, 3, 5, 9]);
        let unsorted = int_array(&heap, &[1, 5, 3, 9]);

        let by_int = |a: Value, b: Value| a.as_int().unwrap().cmp(&b.as_int().unwrap());
        assert!(sorted.is_strictly_sorted_by(by_int));
        assert!(!unsorted.is_strictly_sorted_by(by_int));
    }
}

// Property tests for the partial heap

use concheap::memory::{Address, Heap, Value};
use proptest::prelude::*;

fn cells() -> impl Strategy<Value = Vec<(Address, Value)>> {
    prop::collection::vec((1..64 as Address, -100..100 as Value), 0..16)
}

proptest! {
    #[test]
    fn union_is_commutative(a in cells(), b in cells()) {
        let (ha, hb) = (Heap::from_cells(a), Heap::from_cells(b));
        prop_assert_eq!(ha.union(&hb), hb.union(&ha));
    }

    #[test]
    fn union_succeeds_exactly_when_disjoint(a in cells(), b in cells()) {
        let (ha, hb) = (Heap::from_cells(a), Heap::from_cells(b));
        prop_assert_eq!(ha.union(&hb).is_ok(), ha.disjoint(&hb));
    }

    #[test]
    fn union_lookup_prefers_the_owner(a in cells(), b in cells()) {
        let (ha, hb) = (Heap::from_cells(a), Heap::from_cells(b));
        if let Ok(joined) = ha.union(&hb) {
            prop_assert_eq!(joined.len(), ha.len() + hb.len());
            for addr in joined.domain() {
                let expected = ha.lookup(addr).or_else(|| hb.lookup(addr));
                prop_assert_eq!(joined.lookup(addr), expected);
            }
        }
    }

    #[test]
    fn allocated_block_was_fresh(a in cells(), size in 1usize..6) {
        let before = Heap::from_cells(a);
        let mut after = before.clone();
        let base = after.allocate_block(size).unwrap();
        prop_assert!(base > 0);
        for i in 0..size as Address {
            prop_assert!(!before.contains(base + i));
            prop_assert_eq!(after.lookup(base + i), Some(0));
        }
        prop_assert_eq!(after.len(), before.len() + size);
    }

    #[test]
    fn update_then_lookup(a in cells(), value in any::<Value>()) {
        let mut heap = Heap::from_cells(a);
        for addr in heap.domain() {
            heap.update(addr, value).unwrap();
            prop_assert_eq!(heap.lookup(addr), Some(value));
        }
    }

    #[test]
    fn free_after_update_equals_free(a in cells(), addr in 1..64 as Address, value in any::<Value>()) {
        let heap = Heap::from_cells(a);
        let mut updated = heap.clone();
        let update = updated.update(addr, value);
        prop_assert_eq!(update.is_ok(), heap.contains(addr));

        let mut freed_after_update = updated;
        let mut freed = heap;
        prop_assert_eq!(freed_after_update.free(addr), freed.free(addr));
        prop_assert_eq!(freed_after_update, freed);
    }

    #[test]
    fn zero_sized_alloc_is_fresh(a in cells()) {
        let heap = Heap::from_cells(a);
        let base = heap.fresh_block(0).unwrap();
        prop_assert!(base > 0);
        prop_assert!(!heap.contains(base));
    }

    #[test]
    fn free_removes_only_that_cell(a in cells()) {
        let heap = Heap::from_cells(a);
        for addr in heap.domain() {
            let mut freed = heap.clone();
            freed.free(addr).unwrap();
            prop_assert!(!freed.contains(addr));
            prop_assert_eq!(freed.len(), heap.len() - 1);
            prop_assert!(freed.free(addr).is_err());
        }
    }
}

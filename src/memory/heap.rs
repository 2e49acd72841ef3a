//! Heap implementation for the interpreter
//!
//! The heap is a partial finite map from addresses to integer values. An
//! address is either present (allocated, holding a value) or absent
//! (never allocated, or freed). There are no tombstones: once a cell is freed
//! it is indistinguishable from one that never existed, and a later
//! allocation may hand the same address out again.
//!
//! # Footprints
//!
//! Heaps double as memory *footprints*. Two footprints may only be combined
//! with [`Heap::union`] when they are [`Heap::disjoint`]; the union of
//! overlapping heaps is rejected with [`HeapError::Overlap`] rather than
//! silently picking one side.

use super::value::{Address, Value, NULL};
use crate::interpreter::errors::HeapError;
use rustc_hash::FxHashMap;
use std::fmt;

/// The heap
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Heap {
    cells: FxHashMap<Address, Value>,
}

impl Heap {
    /// Create an empty heap
    pub fn new() -> Self {
        Heap {
            cells: FxHashMap::default(),
        }
    }

    /// A heap with exactly one cell
    pub fn singleton(addr: Address, value: Value) -> Self {
        let mut heap = Heap::new();
        heap.cells.insert(addr, value);
        heap
    }

    /// Build a heap from explicit `(address, value)` pairs. Later pairs win.
    pub fn from_cells<I>(cells: I) -> Self
    where
        I: IntoIterator<Item = (Address, Value)>,
    {
        Heap {
            cells: cells.into_iter().collect(),
        }
    }

    /// Read the value at `addr`, or `None` when the address is absent
    pub fn lookup(&self, addr: Address) -> Option<Value> {
        self.cells.get(&addr).copied()
    }

    /// Check whether `addr` is allocated
    pub fn contains(&self, addr: Address) -> bool {
        self.cells.contains_key(&addr)
    }

    /// Overwrite the value at an allocated address
    pub fn update(&mut self, addr: Address, value: Value) -> Result<(), HeapError> {
        match self.cells.get_mut(&addr) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(HeapError::Absent(addr)),
        }
    }

    /// Remove an allocated address from the heap
    pub fn free(&mut self, addr: Address) -> Result<(), HeapError> {
        self.cells
            .remove(&addr)
            .map(|_| ())
            .ok_or(HeapError::Absent(addr))
    }

    /// Find the lowest base address `l >= 1` such that all of
    /// `[l, l + size)` is absent. A zero-sized request still gets an address
    /// that is not currently allocated.
    ///
    /// Fails with [`HeapError::BlockTooLarge`] when the range cannot be
    /// addressed.
    pub fn fresh_block(&self, size: usize) -> Result<Address, HeapError> {
        let width = Address::try_from(size.max(1)).map_err(|_| HeapError::BlockTooLarge(size))?;
        let mut base = NULL + 1;
        'search: loop {
            let end = base
                .checked_add(width)
                .ok_or(HeapError::BlockTooLarge(size))?;
            for addr in base..end {
                if self.cells.contains_key(&addr) {
                    // Nothing below the conflicting cell can start a free run
                    base = addr + 1;
                    continue 'search;
                }
            }
            return Ok(base);
        }
    }

    /// Allocate `size` consecutive cells initialised to zero and return the
    /// base address. The whole range was absent before the call.
    pub fn allocate_block(&mut self, size: usize) -> Result<Address, HeapError> {
        let base = self.fresh_block(size)?;
        // fresh_block proved base + size is addressable
        for addr in (base..).take(size) {
            self.cells.insert(addr, 0);
        }
        Ok(base)
    }

    /// True when no address is present in both heaps
    pub fn disjoint(&self, other: &Heap) -> bool {
        let (small, large) = if self.cells.len() <= other.cells.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.cells.keys().all(|addr| !large.cells.contains_key(addr))
    }

    /// Combine two disjoint footprints.
    ///
    /// Fails with the lowest shared address when the heaps overlap.
    pub fn union(&self, other: &Heap) -> Result<Heap, HeapError> {
        let overlap = self
            .cells
            .keys()
            .filter(|addr| other.cells.contains_key(addr))
            .min();
        if let Some(&addr) = overlap {
            return Err(HeapError::Overlap(addr));
        }

        let mut cells = self.cells.clone();
        cells.extend(other.cells.iter().map(|(&a, &v)| (a, v)));
        Ok(Heap { cells })
    }

    /// Number of allocated cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if no cell is allocated
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Allocated addresses in ascending order
    pub fn domain(&self) -> Vec<Address> {
        let mut addrs: Vec<Address> = self.cells.keys().copied().collect();
        addrs.sort_unstable();
        addrs
    }

    /// All cells in ascending address order
    pub fn cells(&self) -> Vec<(Address, Value)> {
        let mut cells: Vec<(Address, Value)> =
            self.cells.iter().map(|(&a, &v)| (a, v)).collect();
        cells.sort_unstable_by_key(|(a, _)| *a);
        cells
    }
}

impl fmt::Display for Heap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (addr, value)) in self.cells().into_iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} ↦ {}", addr, value)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_block_is_fresh_and_zeroed() {
        let mut heap = Heap::from_cells([(1, 7), (2, 8), (4, 9)]);
        let base = heap.allocate_block(2).unwrap();
        assert_eq!(base, 5);
        assert_eq!(heap.lookup(5), Some(0));
        assert_eq!(heap.lookup(6), Some(0));
        assert_eq!(heap.len(), 5);
    }

    #[test]
    fn test_allocate_reuses_freed_cells() {
        let mut heap = Heap::new();
        let a = heap.allocate_block(1).unwrap();
        let b = heap.allocate_block(1).unwrap();
        assert_eq!((a, b), (1, 2));
        heap.free(a).unwrap();
        assert_eq!(heap.allocate_block(1), Ok(a));
    }

    #[test]
    fn test_allocate_zero_size_returns_unallocated_address() {
        let mut heap = Heap::from_cells([(1, 0), (2, 0), (4, 0)]);
        let base = heap.allocate_block(0).unwrap();
        assert_ne!(base, NULL);
        assert!(!heap.contains(base));
        assert_eq!(base, 3);
        assert_eq!(heap.len(), 3);
    }

    #[test]
    fn test_allocate_rejects_unaddressable_size() {
        let mut heap = Heap::singleton(1, 5);
        let size = 1usize << 63;
        assert_eq!(heap.allocate_block(size), Err(HeapError::BlockTooLarge(size)));
        assert_eq!(heap, Heap::singleton(1, 5));

        // Fits in an address, but the range runs past the largest one
        let size = Address::MAX as usize;
        assert_eq!(heap.fresh_block(size), Err(HeapError::BlockTooLarge(size)));
    }

    #[test]
    fn test_update_and_free_require_presence() {
        let mut heap = Heap::singleton(3, 1);
        assert_eq!(heap.update(4, 1), Err(HeapError::Absent(4)));
        assert_eq!(heap.free(4), Err(HeapError::Absent(4)));
        heap.update(3, 10).unwrap();
        assert_eq!(heap.lookup(3), Some(10));
        heap.free(3).unwrap();
        assert_eq!(heap.free(3), Err(HeapError::Absent(3)));
        assert!(heap.is_empty());
    }

    #[test]
    fn test_union_rejects_overlap() {
        let h1 = Heap::from_cells([(1, 1), (5, 5)]);
        let h2 = Heap::from_cells([(5, 0), (3, 3)]);
        assert!(!h1.disjoint(&h2));
        assert_eq!(h1.union(&h2), Err(HeapError::Overlap(5)));
    }

    #[test]
    fn test_display_sorted() {
        let heap = Heap::from_cells([(2, 20), (1, 10)]);
        assert_eq!(heap.to_string(), "{1 ↦ 10, 2 ↦ 20}");
    }
}

//! Producer/consumer buffers
//!
//! Two implementations of the same interface:
//!
//! - [`OneSlot`]: a single-cell buffer guarded by two semaphores. `free` is
//!   held while the slot is full and `busy` while it is empty, so producers
//!   and consumers strictly alternate and the slot itself is only ever
//!   touched by the one branch holding the right semaphore.
//! - [`SharedList`]: an unbounded LIFO list behind a shared head cell.
//!   Producers build a node privately and link it with one atomic swap;
//!   consumers pop with one atomic read-and-unlink, then own the node and
//!   free it.

use super::semaphore::{acquire, release};
use crate::command::build::{
    alloc, atomic, bind, free, get, if_then_else, pure, repeat, seq, set,
};
use crate::command::Command;
use crate::memory::value::offset;
use crate::memory::{Address, Heap, Value};

/// One-slot buffer protected by a pair of semaphores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OneSlot {
    /// Held while the slot contains unconsumed data
    pub free: Address,
    /// Held while the slot is empty
    pub busy: Address,
    pub buffer: Address,
}

impl OneSlot {
    /// Words occupied by the buffer and its two locks
    pub const WORDS: usize = 3;

    /// The buffer laid out at `base`, `base + 1`, `base + 2`
    pub fn at(base: Address) -> Self {
        OneSlot {
            free: offset(base, 0),
            busy: offset(base, 1),
            buffer: offset(base, 2),
        }
    }

    /// Allocate and initialise a buffer, returning its base address
    pub fn setup() -> Command {
        bind(alloc(Self::WORDS), |base| {
            let q = OneSlot::at(base);
            seq(set(q.free, 1), seq(set(q.busy, 0), pure(base)))
        })
    }

    /// Initial footprint of an empty buffer: `free` available, `busy` held
    pub fn initial_heap(&self) -> Heap {
        Heap::from_cells([(self.free, 1), (self.busy, 0), (self.buffer, 0)])
    }

    pub fn produce(&self, data: Value) -> Command {
        let q = *self;
        seq(acquire(q.free), seq(set(q.buffer, data), release(q.busy)))
    }

    pub fn consume(&self) -> Command {
        let q = *self;
        seq(
            acquire(q.busy),
            bind(get(q.buffer), move |data| seq(release(q.free), pure(data))),
        )
    }
}

/// Unbounded list of `(data, next)` nodes behind a shared head pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharedList {
    pub head: Address,
}

impl SharedList {
    /// Words per node: data, then the link to the next node
    pub const NODE_WORDS: usize = 2;

    pub fn at(head: Address) -> Self {
        SharedList { head }
    }

    /// Allocate an empty list (a null head), returning the head address
    pub fn setup() -> Command {
        alloc(1)
    }

    /// Initial footprint of an empty list
    pub fn initial_heap(&self) -> Heap {
        Heap::singleton(self.head, 0)
    }

    /// Build a node privately, then swing the head to it in one atomic step
    pub fn produce(&self, data: Value) -> Command {
        let head = self.head;
        bind(alloc(Self::NODE_WORDS), move |node| {
            seq(
                set(node, data),
                atomic(bind(get(head), move |old| {
                    seq(set(offset(node, 1), old), set(head, node))
                })),
            )
        })
    }

    /// Atomically unlink the first node; returns its address, or null when
    /// the list was empty
    pub fn try_pop(&self) -> Command {
        let head = self.head;
        atomic(bind(get(head), move |node| {
            if_then_else(
                node,
                bind(get(offset(node, 1)), move |next| seq(set(head, next), pure(node))),
                pure(0),
            )
        }))
    }

    /// Pop a node (retrying while the list is empty), free it, and return
    /// its data
    pub fn consume(&self) -> Command {
        bind(repeat(self.try_pop()), |node| {
            bind(get(node), move |data| {
                seq(free(node), seq(free(offset(node, 1)), pure(data)))
            })
        })
    }
}

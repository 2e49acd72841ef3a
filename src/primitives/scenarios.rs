//! Ready-made programs exercising the primitives
//!
//! Each scenario bundles a command with the heap it starts from. The heap is
//! assembled from per-component footprints with [`Heap::union`], so a layout
//! mistake that makes two components share a cell fails loudly instead of
//! aliasing.

use super::queue::{OneSlot, SharedList};
use super::region::critical;
use crate::command::build::{bind, get, par, seq, set, skip};
use crate::command::Command;
use crate::interpreter::errors::HeapError;
use crate::memory::value::offset;
use crate::memory::{Address, Heap, Value};

/// Names accepted by [`by_name`]
pub const NAMES: [&str; 4] = ["one-slot", "shared-list", "counter", "racy-counter"];

/// A program together with its initial heap
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: &'static str,
    pub description: &'static str,
    pub command: Command,
    pub heap: Heap,
}

/// Look up a scenario by CLI name, with its default parameters
pub fn by_name(name: &str) -> Option<Result<Scenario, HeapError>> {
    match name {
        "one-slot" => Some(one_slot(1, 2)),
        "shared-list" => Some(shared_list(&[1, 2, 3])),
        "counter" => Some(counter(2)),
        "racy-counter" => Some(racy_counter()),
        _ => None,
    }
}

/// `count` zeroed result cells starting at `base`
fn result_cells(base: Address, count: usize) -> Heap {
    Heap::from_cells((0..count).map(|i| (offset(base, i), 0)))
}

/// Two producers race into a one-slot buffer while a consumer drains it
/// twice, storing what it received at addresses 4 and 5
pub fn one_slot(first: Value, second: Value) -> Result<Scenario, HeapError> {
    let q = OneSlot::at(1);
    let results = offset(q.buffer, 1);
    let heap = q.initial_heap().union(&result_cells(results, 2))?;

    let producers = par(q.produce(first), q.produce(second));
    let consumer = bind(q.consume(), move |x| {
        seq(
            set(results, x),
            bind(q.consume(), move |y| set(offset(results, 1), y)),
        )
    });

    Ok(Scenario {
        name: "one-slot",
        description: "two producers and one consumer share a semaphore-guarded slot",
        command: par(producers, consumer),
        heap,
    })
}

/// One producer pushes `values` onto a shared list while one consumer pops
/// the same number of items into result cells after the head
pub fn shared_list(values: &[Value]) -> Result<Scenario, HeapError> {
    let list = SharedList::at(1);
    let results = offset(list.head, 1);
    let heap = list.initial_heap().union(&result_cells(results, values.len()))?;

    let producer = values
        .iter()
        .rev()
        .fold(skip(), |rest, &v| seq(list.produce(v), rest));
    let consumer = (0..values.len()).rev().fold(skip(), |rest, i| {
        let slot = offset(results, i);
        seq(bind(list.consume(), move |data| set(slot, data)), rest)
    });

    Ok(Scenario {
        name: "shared-list",
        description: "a producer and a consumer share a lock-free linked list",
        command: par(producer, consumer),
        heap,
    })
}

/// Read-modify-write of a cell, with no protection of its own
pub fn increment(cell: Address) -> Command {
    bind(get(cell), move |n| set(cell, n + 1))
}

/// `threads` branches each increment a counter inside a critical region
pub fn counter(threads: usize) -> Result<Scenario, HeapError> {
    let (lock, cell) = (1, 2);
    let heap = Heap::singleton(lock, 1).union(&Heap::singleton(cell, 0))?;
    let command = (1..threads).fold(critical(lock, increment(cell)), |rest, _| {
        par(critical(lock, increment(cell)), rest)
    });

    Ok(Scenario {
        name: "counter",
        description: "lock-guarded increments of a shared counter",
        command,
        heap,
    })
}

/// Two unguarded increments of the same counter
pub fn racy_counter() -> Result<Scenario, HeapError> {
    let cell = 1;
    Ok(Scenario {
        name: "racy-counter",
        description: "unguarded concurrent increments (a data race)",
        command: par(increment(cell), increment(cell)),
        heap: Heap::singleton(cell, 0),
    })
}

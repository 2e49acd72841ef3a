//! Binary semaphores
//!
//! A lock is a single heap cell: zero means held, anything else means free.
//! `acquire` spins on an atomic swap-to-zero until the value it swapped out
//! was nonzero, i.e. until *it* performed the free-to-held transition.
//! `release` atomically stores 1.

use crate::command::build::{alloc, atomic, bind, get, pure, repeat, seq, set};
use crate::command::Command;
use crate::memory::{Address, Value};

/// Allocate a fresh lock cell and return its address
pub fn new_lock(initially_free: bool) -> Command {
    bind(alloc(1), move |lck| seq(set(lck, initially_free as Value), pure(lck)))
}

/// Atomically read the lock and mark it held, returning the old value
pub fn try_acquire(lck: Address) -> Command {
    atomic(bind(get(lck), move |old| seq(set(lck, 0), pure(old))))
}

/// Spin until this caller moves the lock from free to held
pub fn acquire(lck: Address) -> Command {
    repeat(try_acquire(lck))
}

pub fn release(lck: Address) -> Command {
    atomic(set(lck, 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::build::par;
    use crate::interpreter::explore::{explore, ExploreLimits};
    use crate::interpreter::{run, RunResult};
    use crate::memory::Heap;

    #[test]
    fn test_new_lock_initial_state() {
        let result = run(bind(new_lock(true), |l| get(l)), Heap::new());
        assert_eq!(result.value(), Some(1));
        let result = run(bind(new_lock(false), |l| get(l)), Heap::new());
        assert_eq!(result.value(), Some(0));
    }

    #[test]
    fn test_acquire_free_lock_then_release() {
        let heap = Heap::singleton(1, 1);
        let result = run(seq(acquire(1), bind(get(1), |held| seq(release(1), pure(held)))), heap);
        assert_eq!(
            result,
            RunResult::Completed {
                value: 0,
                heap: Heap::singleton(1, 1)
            }
        );
    }

    #[test]
    fn test_only_one_of_two_acquirers_wins() {
        // Each winner records itself; nobody releases, so the loser spins
        let heap = Heap::from_cells([(1, 1), (2, 0), (3, 0)]);
        let prog = par(seq(acquire(1), set(2, 1)), seq(acquire(1), set(3, 1)));
        let result = explore(
            prog,
            heap,
            ExploreLimits {
                max_depth: 40,
                ..ExploreLimits::default()
            },
        );
        assert!(result.is_fault_free());
        assert!(result.completed.is_empty());
        assert_eq!(result.stalled, 0);
        assert!(result.truncated > 0);
    }

    #[test]
    fn test_acquire_release_pairs_always_finish_free() {
        let heap = Heap::singleton(1, 1);
        let side = || seq(acquire(1), release(1));
        let result = explore(
            par(side(), side()),
            heap,
            ExploreLimits {
                max_depth: 60,
                ..ExploreLimits::default()
            },
        );
        assert!(result.is_fault_free());
        assert_eq!(result.completed, vec![(0, Heap::singleton(1, 1))]);
    }
}

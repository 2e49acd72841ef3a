//! Fuel-bounded safety checking
//!
//! `is_safe(c, h, n, post)` holds when no execution of `(c, h)` of fewer than
//! `n` steps reaches an erroneous configuration, and every execution that
//! finishes within that bound ends in a state satisfying `post`.
//!
//! This is an optional verification aid layered on the reduction relation.
//! The driver never consults it; it exists so a test can state "this program
//! is safe for its first `n` steps under every schedule" directly.

use super::constants::DEFAULT_ATOMIC_FUEL;
use super::fault::detect;
use super::step::successors;
use crate::command::Command;
use crate::memory::{Heap, Value};

/// Safety of `(command, heap)` for `fuel` steps with default atomic fuel
pub fn is_safe<P>(command: &Command, heap: &Heap, fuel: usize, post: P) -> bool
where
    P: Fn(Value, &Heap) -> bool,
{
    is_safe_with(command, heap, fuel, DEFAULT_ATOMIC_FUEL, &post)
}

/// Safety of `(command, heap)` for `fuel` steps
pub fn is_safe_with<P>(
    command: &Command,
    heap: &Heap,
    fuel: usize,
    atomic_fuel: usize,
    post: &P,
) -> bool
where
    P: Fn(Value, &Heap) -> bool,
{
    if fuel == 0 {
        return true;
    }
    if let Command::Pure(value) = command {
        return post(*value, heap);
    }
    if detect(command, heap, atomic_fuel).is_some() {
        return false;
    }
    successors(command, heap, atomic_fuel)
        .iter()
        .all(|(next, _)| is_safe_with(&next.command, &next.heap, fuel - 1, atomic_fuel, post))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::build::*;

    #[test]
    fn test_zero_fuel_is_trivially_safe() {
        assert!(is_safe(&get(5), &Heap::new(), 0, |_, _| false));
    }

    #[test]
    fn test_invalid_access_is_unsafe() {
        assert!(!is_safe(&get(5), &Heap::new(), 1, |_, _| true));
    }

    #[test]
    fn test_postcondition_checked_on_completion() {
        let prog = bind(alloc(1), |a| seq(set(a, 42), get(a)));
        assert!(is_safe(&prog, &Heap::new(), 20, |v, h| v == 42 && h.len() == 1));
        assert!(!is_safe(&prog, &Heap::new(), 20, |v, _| v == 0));
    }

    #[test]
    fn test_racy_program_is_unsafe_under_some_schedule() {
        let heap = Heap::singleton(1, 0);
        let prog = par(seq(skip(), set(1, 1)), seq(skip(), get(1)));
        assert!(!is_safe(&prog, &heap, 10, |_, _| true));
        // Too little fuel to reach the racy state
        assert!(is_safe(&prog, &heap, 2, |_, _| true));
    }
}

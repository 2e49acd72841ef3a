//! Race and fault detection
//!
//! A configuration is *erroneous* when its next step would touch memory it
//! must not touch. The detector is syntactic and conservative:
//!
//! - `Get`, `Set` and `Free` of an absent address is an invalid access.
//! - Inside `Par(c1, c2)`, any address in the immediate-access sets of both
//!   branches is a race, whether the accesses are reads or writes.
//! - Faults propagate out of `Let`, either `Par` branch, and atomic blocks.
//!   An atomic block is erroneous when *any* execution of its body within
//!   the atomic fuel reaches an erroneous configuration, even though that
//!   state would never be visible to a sibling.
//!
//! Whether a legal step also exists is irrelevant: a driver queries
//! [`detect`] first and never steps out of an erroneous configuration.

use super::errors::FaultKind;
use super::step::reduced_successors;
use crate::command::Command;
use crate::memory::{Address, Heap};
use rustc_hash::FxHashSet;

/// Addresses `cmd` could touch on its very next step
pub fn immediate_access(cmd: &Command) -> FxHashSet<Address> {
    let mut out = FxHashSet::default();
    collect_access(cmd, &mut out);
    out
}

fn collect_access(cmd: &Command, out: &mut FxHashSet<Address>) {
    match cmd {
        Command::Get(a) | Command::Set(a, _) | Command::Free(a) => {
            out.insert(*a);
        }
        Command::Let(c, _) => collect_access(c, out),
        Command::Par(c1, c2) => {
            collect_access(c1, out);
            collect_access(c2, out);
        }
        // Atomic blocks are one macro-step; the rest must unwind first
        Command::Pure(_)
        | Command::IfThenElse(..)
        | Command::Repeat(_)
        | Command::Atomic(_)
        | Command::Alloc(_) => {}
    }
}

/// True when nothing in `cmd` is visible to [`detect`]: no heap access and
/// no atomic block in a position that could run next
pub fn is_inert(cmd: &Command) -> bool {
    match cmd {
        Command::Get(_) | Command::Set(..) | Command::Free(_) | Command::Atomic(_) => false,
        Command::Let(c, _) => is_inert(c),
        Command::Par(c1, c2) => is_inert(c1) && is_inert(c2),
        Command::Pure(_) | Command::IfThenElse(..) | Command::Repeat(_) | Command::Alloc(_) => {
            true
        }
    }
}

/// Lowest address touched by both branches, if any
pub fn race_address(c1: &Command, c2: &Command) -> Option<Address> {
    let left = immediate_access(c1);
    let right = immediate_access(c2);
    left.intersection(&right).min().copied()
}

/// Classify `(cmd, heap)`; `None` means the configuration is not erroneous
pub fn detect(cmd: &Command, heap: &Heap, atomic_fuel: usize) -> Option<FaultKind> {
    match cmd {
        Command::Get(a) | Command::Set(a, _) | Command::Free(a) => {
            if heap.contains(*a) {
                None
            } else {
                Some(FaultKind::InvalidAccess { address: *a })
            }
        }

        Command::Let(c, _) => {
            detect(c, heap, atomic_fuel).map(|f| FaultKind::InSequence(Box::new(f)))
        }

        Command::Par(c1, c2) => {
            if let Some(address) = race_address(c1, c2) {
                return Some(FaultKind::Race { address });
            }
            detect(c1, heap, atomic_fuel)
                .map(|f| FaultKind::InLeft(Box::new(f)))
                .or_else(|| detect(c2, heap, atomic_fuel).map(|f| FaultKind::InRight(Box::new(f))))
        }

        Command::Atomic(body) => {
            atomic_fault(body, heap, atomic_fuel).map(|f| FaultKind::InAtomic(Box::new(f)))
        }

        Command::Pure(_) | Command::IfThenElse(..) | Command::Repeat(_) | Command::Alloc(_) => {
            None
        }
    }
}

/// Search every execution of an atomic body up to `atomic_fuel` steps for an
/// erroneous configuration
fn atomic_fault(body: &Command, heap: &Heap, atomic_fuel: usize) -> Option<FaultKind> {
    let mut pending = vec![(body.clone(), heap.clone(), 0usize)];

    while let Some((cmd, h, depth)) = pending.pop() {
        if let Some(fault) = detect(&cmd, &h, atomic_fuel) {
            return Some(fault);
        }
        if depth >= atomic_fuel {
            continue;
        }
        for (config, _) in reduced_successors(&cmd, &h, atomic_fuel) {
            pending.push((config.command, config.heap, depth + 1));
        }
    }

    None
}

/// True when [`detect`] finds a fault
pub fn is_erroneous(cmd: &Command, heap: &Heap, atomic_fuel: usize) -> bool {
    detect(cmd, heap, atomic_fuel).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::build::*;

    #[test]
    fn test_immediate_access_sees_through_let_and_par() {
        let cmd = par(seq(get(1), get(9)), bind(set(2, 0), |_| free(3)));
        let mut acc: Vec<Address> = immediate_access(&cmd).into_iter().collect();
        acc.sort();
        assert_eq!(acc, vec![1, 2]);
    }

    #[test]
    fn test_immediate_access_ignores_atomic_and_repeat() {
        assert!(immediate_access(&atomic(get(1))).is_empty());
        assert!(immediate_access(&repeat(get(1))).is_empty());
        assert!(immediate_access(&if_then_else(1, get(1), get(2))).is_empty());
    }

    #[test]
    fn test_inert_commands_hide_nothing_from_the_detector() {
        assert!(is_inert(&seq(skip(), get(1))));
        assert!(is_inert(&par(repeat(get(1)), alloc(2))));
        assert!(!is_inert(&bind(get(1), |_| skip())));
        assert!(!is_inert(&par(skip(), atomic(skip()))));
    }

    #[test]
    fn test_invalid_access_on_absent_address() {
        let heap = Heap::new();
        assert_eq!(
            detect(&get(5), &heap, 10),
            Some(FaultKind::InvalidAccess { address: 5 })
        );
        assert_eq!(
            detect(&seq(free(2), skip()), &heap, 10),
            Some(FaultKind::InSequence(Box::new(FaultKind::InvalidAccess {
                address: 2
            })))
        );
    }

    #[test]
    fn test_concurrent_reads_are_still_a_race() {
        let heap = Heap::singleton(4, 0);
        assert_eq!(
            detect(&par(get(4), get(4)), &heap, 10),
            Some(FaultKind::Race { address: 4 })
        );
    }

    #[test]
    fn test_disjoint_branches_are_fine() {
        let heap = Heap::from_cells([(1, 0), (2, 0)]);
        assert_eq!(detect(&par(set(1, 1), set(2, 2)), &heap, 10), None);
    }

    #[test]
    fn test_race_reports_smallest_shared_address() {
        let heap = Heap::from_cells([(1, 0), (2, 0), (3, 0)]);
        let cmd = par(par(get(3), get(2)), par(set(2, 1), set(3, 1)));
        // The inner pairs are disjoint; the outer node overlaps at 2 and 3
        assert_eq!(detect(&cmd, &heap, 10), Some(FaultKind::Race { address: 2 }));
    }

    #[test]
    fn test_nested_race_is_wrapped() {
        let heap = Heap::singleton(1, 0);
        let cmd = seq(par(get(1), set(1, 2)), skip());
        assert_eq!(
            detect(&cmd, &heap, 10),
            Some(FaultKind::InSequence(Box::new(FaultKind::Race { address: 1 })))
        );
    }

    #[test]
    fn test_atomic_shared_access_is_not_a_race() {
        let heap = Heap::singleton(1, 0);
        let cmd = par(atomic(set(1, 1)), atomic(set(1, 2)));
        assert_eq!(detect(&cmd, &heap, 10), None);
    }

    #[test]
    fn test_fault_deep_inside_atomic_block() {
        let heap = Heap::singleton(1, 0);
        // The bad read only happens after a few internal steps
        let body = seq(set(1, 7), bind(get(1), |v| get(v)));
        assert_eq!(
            detect(&atomic(body), &heap, 10),
            Some(FaultKind::InAtomic(Box::new(FaultKind::InvalidAccess {
                address: 7
            })))
        );
    }

    #[test]
    fn test_right_branch_fault_after_clean_left() {
        let heap = Heap::singleton(1, 0);
        let cmd = par(get(1), free(8));
        assert_eq!(
            detect(&cmd, &heap, 10),
            Some(FaultKind::InRight(Box::new(FaultKind::InvalidAccess {
                address: 8
            })))
        );
        assert!(is_erroneous(&cmd, &heap, 10));
    }
}

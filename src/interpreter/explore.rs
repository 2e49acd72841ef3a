//! Exhaustive schedule exploration
//!
//! Where a [`Scheduler`](crate::interpreter::scheduler::Scheduler) follows a
//! single interleaving, [`explore`] walks *every* interleaving of a program
//! depth-first, up to a step bound, and reports:
//!
//! - each distinct `(value, heap)` the program can finish with,
//! - each distinct fault some schedule runs into, with the first schedule
//!   that reached it as a counterexample,
//! - how many paths were cut short by the depth bound or stalled.
//!
//! # Local-step reduction
//!
//! `Bind`, `Branch`, `Unroll` and `Join` steps touch no heap cell. With
//! [`ExploreLimits::reduce_local_steps`] set, the explorer takes the leftmost
//! such step without branching, but only when its result is still inert: no
//! heap access and no atomic block becomes runnable. The detector cannot
//! tell the states before and after an inert step apart, so the step
//! commutes with every schedule of the siblings and the reduced search finds
//! the same outcomes and faults as the full one. A local step that would
//! expose an access is explored like any other step, since taking it early
//! can surface a race that hides what other schedules reach.

use super::constants::{DEFAULT_ATOMIC_FUEL, DEFAULT_EXPLORE_DEPTH, DEFAULT_EXPLORE_PATHS};
use super::errors::FaultKind;
use super::fault::detect;
use super::step::{reduced_successors, successors, StepEvent};
use crate::command::Command;
use crate::memory::{Heap, Value};
use tracing::debug;

/// Bounds for exhaustive exploration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExploreLimits {
    /// Longest path (in steps, local steps included) before it is truncated
    pub max_depth: usize,
    /// Leaves to visit before the search gives up
    pub max_paths: usize,
    /// Inner steps an atomic block may take
    pub atomic_fuel: usize,
    /// Collapse inert local steps instead of branching on them
    pub reduce_local_steps: bool,
}

impl Default for ExploreLimits {
    fn default() -> Self {
        ExploreLimits {
            max_depth: DEFAULT_EXPLORE_DEPTH,
            max_paths: DEFAULT_EXPLORE_PATHS,
            atomic_fuel: DEFAULT_ATOMIC_FUEL,
            reduce_local_steps: true,
        }
    }
}

/// Everything an exploration found
#[derive(Debug, Clone, Default)]
pub struct Exploration {
    /// Distinct final `(value, heap)` pairs
    pub completed: Vec<(Value, Heap)>,
    /// Distinct faults, in discovery order
    pub faults: Vec<FaultKind>,
    /// The schedule leading to the first fault found
    pub counterexample: Option<Vec<StepEvent>>,
    /// Paths cut off by `max_depth`
    pub truncated: usize,
    /// Paths that ended with nothing able to move
    pub stalled: usize,
    /// Leaves visited
    pub paths: usize,
    /// Set when `max_paths` stopped the search early
    pub path_limit_hit: bool,
}

impl Exploration {
    /// True when no explored schedule faulted
    pub fn is_fault_free(&self) -> bool {
        self.faults.is_empty()
    }

    /// True when some explored schedule hit a data race
    pub fn has_race(&self) -> bool {
        self.faults.iter().any(FaultKind::is_race)
    }

    /// Every path was followed to its end
    pub fn is_exhaustive(&self) -> bool {
        self.truncated == 0 && !self.path_limit_hit
    }

    /// Distinct final values, sorted
    pub fn values(&self) -> Vec<Value> {
        let mut values: Vec<Value> = self.completed.iter().map(|(v, _)| *v).collect();
        values.sort_unstable();
        values.dedup();
        values
    }
}

struct Explorer {
    limits: ExploreLimits,
    result: Exploration,
    path: Vec<StepEvent>,
}

impl Explorer {
    fn visit(&mut self, cmd: Command, heap: Heap, depth: usize) {
        if self.result.paths >= self.limits.max_paths {
            self.result.path_limit_hit = true;
            return;
        }

        if let Command::Pure(value) = cmd {
            self.result.paths += 1;
            if !self
                .result
                .completed
                .iter()
                .any(|(v, h)| *v == value && *h == heap)
            {
                self.result.completed.push((value, heap));
            }
            return;
        }

        if let Some(fault) = detect(&cmd, &heap, self.limits.atomic_fuel) {
            self.result.paths += 1;
            if self.result.counterexample.is_none() {
                self.result.counterexample = Some(self.path.clone());
            }
            if !self.result.faults.contains(&fault) {
                debug!(%fault, depth, "exploration found a fault");
                self.result.faults.push(fault);
            }
            return;
        }

        if depth >= self.limits.max_depth {
            self.result.paths += 1;
            self.result.truncated += 1;
            return;
        }

        let next = if self.limits.reduce_local_steps {
            reduced_successors(&cmd, &heap, self.limits.atomic_fuel)
        } else {
            successors(&cmd, &heap, self.limits.atomic_fuel)
        };

        if next.is_empty() {
            self.result.paths += 1;
            self.result.stalled += 1;
            return;
        }

        for (config, event) in next {
            self.path.push(event);
            self.visit(config.command, config.heap, depth + 1);
            self.path.pop();
        }
    }
}

/// Explore every interleaving of `command` from `heap` within `limits`
pub fn explore(command: Command, heap: Heap, limits: ExploreLimits) -> Exploration {
    let mut explorer = Explorer {
        limits,
        result: Exploration::default(),
        path: Vec::new(),
    };
    explorer.visit(command, heap, 0);

    debug!(
        paths = explorer.result.paths,
        outcomes = explorer.result.completed.len(),
        faults = explorer.result.faults.len(),
        truncated = explorer.result.truncated,
        "exploration finished"
    );
    explorer.result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::build::*;

    #[test]
    fn test_atomic_writes_give_both_orders() {
        let heap = Heap::singleton(1, 0);
        let prog = seq(par(atomic(set(1, 1)), atomic(set(1, 2))), get(1));
        let result = explore(prog, heap, ExploreLimits::default());
        assert!(result.is_fault_free());
        assert!(result.is_exhaustive());
        assert_eq!(result.values(), vec![1, 2]);
    }

    #[test]
    fn test_race_is_found_with_counterexample() {
        let heap = Heap::singleton(1, 0);
        // The race only appears once both sides have unwound their lets
        let prog = par(seq(skip(), set(1, 1)), seq(skip(), get(1)));
        let result = explore(prog, heap, ExploreLimits::default());
        assert!(result.has_race());
        let trace = result.counterexample.expect("counterexample");
        assert!(trace.iter().all(|e| e.action.is_local()));
    }

    fn full() -> ExploreLimits {
        ExploreLimits {
            reduce_local_steps: false,
            ..ExploreLimits::default()
        }
    }

    #[test]
    fn test_reduction_preserves_outcomes() {
        let heap = Heap::from_cells([(1, 0), (2, 0)]);
        let prog = || {
            par(
                bind(atomic(get(2)), |v| {
                    if_then_else(v, atomic(set(1, 1)), atomic(set(1, 3)))
                }),
                seq(atomic(set(2, 5)), skip()),
            )
        };
        let all = explore(prog(), heap.clone(), full());
        let reduced = explore(prog(), heap, ExploreLimits::default());

        assert!(all.is_exhaustive() && reduced.is_exhaustive());
        assert!(reduced.paths < all.paths);
        assert_eq!(all.values(), vec![0]);
        assert_eq!(all.completed.len(), 2);
        assert_eq!(all.completed.len(), reduced.completed.len());
        for outcome in &all.completed {
            assert!(reduced.completed.contains(outcome));
        }
    }

    #[test]
    fn test_reduction_keeps_completions_behind_a_late_race() {
        // Binding on the right first races with the left read; reading
        // first lets the program finish
        let heap = Heap::singleton(1, 0);
        let prog = || par(get(1), seq(skip(), get(1)));
        let all = explore(prog(), heap.clone(), full());
        let reduced = explore(prog(), heap.clone(), ExploreLimits::default());

        assert_eq!(all.completed, vec![(0, heap)]);
        assert_eq!(reduced.completed, all.completed);
        assert_eq!(reduced.faults, all.faults);
    }

    #[test]
    fn test_reduction_keeps_faults_behind_a_late_race() {
        let heap = Heap::singleton(1, 0);
        let prog = || par(seq(skip(), get(1)), free(1));
        let all = explore(prog(), heap.clone(), full());
        let reduced = explore(prog(), heap, ExploreLimits::default());

        assert!(all.faults.contains(&FaultKind::Race { address: 1 }));
        assert!(all.faults.contains(&FaultKind::InLeft(Box::new(
            FaultKind::InvalidAccess { address: 1 }
        ))));
        assert_eq!(reduced.faults.len(), all.faults.len());
        for fault in &all.faults {
            assert!(reduced.faults.contains(fault));
        }
    }

    #[test]
    fn test_spin_is_truncated_not_faulted() {
        let result = explore(
            repeat(pure(0)),
            Heap::new(),
            ExploreLimits {
                max_depth: 30,
                ..ExploreLimits::default()
            },
        );
        assert_eq!(result.truncated, 1);
        assert!(result.completed.is_empty());
        assert!(!result.is_exhaustive());
    }

    #[test]
    fn test_path_limit_stops_search() {
        let heap = Heap::from_cells([(1, 0), (2, 0), (3, 0), (4, 0)]);
        let side = |a, b| seq(atomic(set(a, 1)), seq(atomic(set(b, 1)), atomic(get(a))));
        let prog = par(side(1, 2), side(3, 4));
        let result = explore(
            prog,
            heap,
            ExploreLimits {
                max_paths: 3,
                ..ExploreLimits::default()
            },
        );
        assert!(result.path_limit_hit);
        assert_eq!(result.paths, 3);
    }
}

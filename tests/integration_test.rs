// Integration tests for the concurrent heap engine and its primitives

use concheap::command::build::*;
use concheap::interpreter::engine::{run_with, Limits};
use concheap::interpreter::explore::{explore, ExploreLimits};
use concheap::interpreter::safety::is_safe;
use concheap::interpreter::scheduler::{LeftFirst, Random, Replay};
use concheap::interpreter::step::Branch;
use concheap::interpreter::{run, FaultKind, RunResult};
use concheap::memory::Heap;
use concheap::primitives::region::{conditional, critical};
use concheap::primitives::scenarios::{counter, increment, one_slot, racy_counter, shared_list};

const SEEDS: std::ops::Range<u64> = 0..40;

#[test]
fn test_alloc_set_get() {
    let prog = bind(alloc(1), |l| seq(set(l, 42), get(l)));
    let result = run(prog, Heap::new());
    assert_eq!(
        result,
        RunResult::Completed {
            value: 42,
            heap: Heap::singleton(1, 42)
        }
    );
}

#[test]
fn test_read_of_unallocated_cell_faults() {
    let result = run(get(5), Heap::new());
    assert_eq!(
        result,
        RunResult::Faulted(FaultKind::InvalidAccess { address: 5 })
    );
}

#[test]
fn test_use_after_free_faults_in_sequence() {
    let prog = bind(alloc(1), |l| seq(free(l), get(l)));
    let result = run(prog, Heap::new());
    let fault = result.fault().expect("fault");
    assert!(fault.is_invalid_access());
    assert_eq!(fault.address(), 1);
}

#[test]
fn test_write_read_race_is_detected_before_stepping() {
    let result = run(par(set(1, 1), get(1)), Heap::singleton(1, 0));
    assert_eq!(
        result,
        RunResult::Faulted(FaultKind::Race { address: 1 })
    );
}

#[test]
fn test_zero_sized_alloc_skips_allocated_cells() {
    let result = run(alloc(0), Heap::singleton(1, 5));
    assert_eq!(
        result,
        RunResult::Completed {
            value: 2,
            heap: Heap::singleton(1, 5)
        }
    );
}

#[test]
fn test_unaddressable_alloc_cannot_step() {
    let result = run(alloc(usize::MAX), Heap::singleton(1, 5));
    assert_eq!(result, RunResult::DivergedOrBudgetExceeded { steps: 0 });
}

#[test]
fn test_disjoint_parallel_writes_complete() {
    let heap = Heap::from_cells([(1, 0), (2, 0)]);
    let result = run(par(set(1, 7), set(2, 8)), heap);
    assert_eq!(result.value(), Some(0));
    assert_eq!(result.heap(), Some(&Heap::from_cells([(1, 7), (2, 8)])));
}

#[test]
fn test_stalled_atomic_block_reports_divergence() {
    let limits = Limits {
        atomic_fuel: 50,
        ..Limits::default()
    };
    let result = run_with(atomic(repeat(pure(0))), Heap::new(), LeftFirst, limits);
    assert!(matches!(result, RunResult::DivergedOrBudgetExceeded { .. }));
}

#[test]
fn test_racy_counter_is_caught() {
    let scenario = racy_counter().unwrap();
    let result = run(scenario.command.clone(), scenario.heap.clone());
    assert!(result.fault().is_some_and(FaultKind::is_race));

    let exploration = explore(scenario.command, scenario.heap, ExploreLimits::default());
    assert!(exploration.has_race());
    assert!(exploration.completed.is_empty());
}

#[test]
fn test_locked_counter_under_random_schedules() {
    for seed in SEEDS {
        let scenario = counter(3).unwrap();
        let result = run_with(
            scenario.command,
            scenario.heap,
            Random::seeded(seed),
            Limits::default(),
        );
        assert_eq!(
            result.heap(),
            Some(&Heap::from_cells([(1, 1), (2, 3)])),
            "seed {}: {:?}",
            seed,
            result
        );
    }
}

#[test]
fn test_one_slot_delivers_each_value_once() {
    for seed in SEEDS {
        let scenario = one_slot(10, 20).unwrap();
        let result = run_with(
            scenario.command,
            scenario.heap,
            Random::seeded(seed),
            Limits::default(),
        );
        let heap = match &result {
            RunResult::Completed { heap, .. } => heap,
            other => panic!("seed {}: {:?}", seed, other),
        };

        let mut received = [heap.lookup(4).unwrap(), heap.lookup(5).unwrap()];
        received.sort_unstable();
        assert_eq!(received, [10, 20], "seed {}", seed);
        // Both semaphores back in their initial state
        assert_eq!(heap.lookup(1), Some(1));
        assert_eq!(heap.lookup(2), Some(0));
        assert_eq!(heap.len(), 5);
    }
}

#[test]
fn test_shared_list_delivers_a_permutation() {
    let values = [1, 2, 3];
    for seed in SEEDS {
        let scenario = shared_list(&values).unwrap();
        let result = run_with(
            scenario.command,
            scenario.heap,
            Random::seeded(seed),
            Limits::default(),
        );
        let heap = match &result {
            RunResult::Completed { heap, .. } => heap,
            other => panic!("seed {}: {:?}", seed, other),
        };

        // Every node was freed: only the head and result cells remain
        assert_eq!(heap.domain(), vec![1, 2, 3, 4], "seed {}", seed);
        assert_eq!(heap.lookup(1), Some(0));
        let mut received: Vec<_> = (2..=4).filter_map(|a| heap.lookup(a)).collect();
        received.sort_unstable();
        assert_eq!(received, values, "seed {}", seed);
    }
}

#[test]
fn test_random_schedule_is_reproducible_from_seed() {
    let scenario = one_slot(1, 2).unwrap();
    let first = run_with(
        scenario.command.clone(),
        scenario.heap.clone(),
        Random::seeded(7),
        Limits::default(),
    );
    let second = run_with(
        scenario.command,
        scenario.heap,
        Random::seeded(7),
        Limits::default(),
    );
    assert_eq!(first, second);
}

#[test]
fn test_replayed_schedule_picks_the_order() {
    let heap = Heap::singleton(1, 0);
    let prog = || seq(par(atomic(set(1, 1)), atomic(set(1, 2))), get(1));

    let left = run_with(prog(), heap.clone(), Replay::new(vec![Branch::Left]), Limits::default());
    let right = run_with(prog(), heap, Replay::new(vec![Branch::Right]), Limits::default());
    assert_eq!(left.value(), Some(2));
    assert_eq!(right.value(), Some(1));
}

#[test]
fn test_either_reaches_both_branches() {
    let result = explore(either(pure(10), pure(20)), Heap::new(), ExploreLimits::default());
    assert!(result.is_fault_free());
    assert!(result.is_exhaustive());
    assert_eq!(result.values(), vec![10, 20]);
    assert!(result.completed.iter().all(|(_, heap)| heap.is_empty()));
}

#[test]
fn test_conditional_region_waits_for_flag() {
    // lock at 1, flag at 2, data at 3
    let heap = Heap::from_cells([(1, 1), (2, 0), (3, 0)]);
    let waiter = conditional(1, get(2), increment(3));
    let setter = critical(1, set(2, 1));
    for seed in SEEDS {
        let result = run_with(
            par(waiter.clone(), setter.clone()),
            heap.clone(),
            Random::seeded(seed),
            Limits::default(),
        );
        assert_eq!(
            result.heap(),
            Some(&Heap::from_cells([(1, 1), (2, 1), (3, 1)])),
            "seed {}: {:?}",
            seed,
            result
        );
    }
}

#[test]
fn test_locked_counter_is_safe_for_every_schedule_prefix() {
    let scenario = counter(2).unwrap();
    assert!(is_safe(&scenario.command, &scenario.heap, 12, |_, heap| {
        heap.lookup(2) == Some(2)
    }));

    let racy = racy_counter().unwrap();
    assert!(!is_safe(&racy.command, &racy.heap, 12, |_, _| true));
}

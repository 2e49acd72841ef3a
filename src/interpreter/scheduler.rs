//! Interleaving policies for `Par`
//!
//! A [`Scheduler`] is consulted only when both branches of a `Par` can move.
//! It is the sole source of nondeterminism in a scheduled run; exhaustive
//! enumeration of schedules lives in [`crate::interpreter::explore`].

use super::step::Branch;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Chooses which branch of a `Par` advances next
pub trait Scheduler {
    /// Pick a branch. The other branch is tried if the pick cannot move.
    fn pick(&mut self) -> Branch;

    /// Human-readable policy name for status lines and logs
    fn name(&self) -> String;
}

/// Always schedule the left branch first
#[derive(Debug, Clone, Copy, Default)]
pub struct LeftFirst;

impl Scheduler for LeftFirst {
    fn pick(&mut self) -> Branch {
        Branch::Left
    }

    fn name(&self) -> String {
        "left-first".to_string()
    }
}

/// Alternate between left and right on every decision
#[derive(Debug, Clone, Copy)]
pub struct RoundRobin {
    next: Branch,
}

impl RoundRobin {
    pub fn new() -> Self {
        RoundRobin { next: Branch::Left }
    }
}

impl Default for RoundRobin {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for RoundRobin {
    fn pick(&mut self) -> Branch {
        let pick = self.next;
        self.next = pick.other();
        pick
    }

    fn name(&self) -> String {
        "round-robin".to_string()
    }
}

/// Pseudo-random choices from a seeded generator, so a failing schedule can
/// be reproduced from its seed
#[derive(Debug, Clone)]
pub struct Random {
    seed: u64,
    rng: StdRng,
}

impl Random {
    pub fn seeded(seed: u64) -> Self {
        Random {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Scheduler for Random {
    fn pick(&mut self) -> Branch {
        if self.rng.gen_bool(0.5) {
            Branch::Left
        } else {
            Branch::Right
        }
    }

    fn name(&self) -> String {
        format!("random (seed {})", self.seed)
    }
}

/// Replay a fixed script of choices, then fall back to the left branch
#[derive(Debug, Clone)]
pub struct Replay {
    script: Vec<Branch>,
    position: usize,
}

impl Replay {
    pub fn new(script: Vec<Branch>) -> Self {
        Replay {
            script,
            position: 0,
        }
    }

    /// Number of scripted choices consumed so far
    pub fn consumed(&self) -> usize {
        self.position.min(self.script.len())
    }
}

impl Scheduler for Replay {
    fn pick(&mut self) -> Branch {
        let pick = self
            .script
            .get(self.position)
            .copied()
            .unwrap_or(Branch::Left);
        self.position += 1;
        pick
    }

    fn name(&self) -> String {
        format!("replay ({} choices)", self.script.len())
    }
}

impl<S: Scheduler + ?Sized> Scheduler for &mut S {
    fn pick(&mut self) -> Branch {
        (**self).pick()
    }

    fn name(&self) -> String {
        (**self).name()
    }
}

impl<S: Scheduler + ?Sized> Scheduler for Box<S> {
    fn pick(&mut self) -> Branch {
        (**self).pick()
    }

    fn name(&self) -> String {
        (**self).name()
    }
}

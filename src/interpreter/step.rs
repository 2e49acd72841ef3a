//! Small-step reduction relation
//!
//! Two views of the same relation live here:
//!
//! - [`step`] takes exactly one step, asking a [`Scheduler`] which branch of
//!   a `Par` to advance when both could move. This is what the driver uses.
//! - [`successors`] enumerates *every* successor configuration: each branch
//!   choice, and each terminal outcome an atomic block can reach. This is
//!   what exhaustive exploration and the fault detector use.
//!
//! Atomic blocks run on a private copy of the heap and commit only when the
//! body reaches `Pure`, so no sibling ever observes an intermediate state.
//! A body that cannot finish within the atomic fuel has no successor.

use super::errors::FaultKind;
use super::fault::{detect, is_inert};
use super::scheduler::Scheduler;
use crate::command::build::{if_then_else, pure};
use crate::command::Command;
use crate::memory::value::truthy;
use crate::memory::{Address, Heap, Value};
use std::fmt;
use std::rc::Rc;
use tracing::warn;

/// Which side of a `Par` a step was taken in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Branch {
    Left,
    Right,
}

impl Branch {
    pub fn other(self) -> Branch {
        match self {
            Branch::Left => Branch::Right,
            Branch::Right => Branch::Left,
        }
    }
}

/// The reduction rule a step applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// `Let(Pure(x), f) -> f(x)`
    Bind,
    /// `IfThenElse` selected a branch
    Branch { taken: bool },
    /// `Repeat` unrolled one iteration
    Unroll,
    /// `Par(Pure, Pure) -> Pure(0)`
    Join,
    /// An atomic block ran to completion in `micro_steps` inner steps
    Atomic { micro_steps: usize },
    Alloc { base: Address, size: usize },
    Get { address: Address, value: Value },
    Set { address: Address, value: Value },
    Free { address: Address },
}

impl Action {
    /// Local steps touch no heap cell. They commute with every step of a
    /// sibling branch and have exactly one successor.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Action::Bind | Action::Branch { .. } | Action::Unroll | Action::Join
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Bind => write!(f, "bind"),
            Action::Branch { taken } => write!(f, "branch {}", if *taken { "then" } else { "else" }),
            Action::Unroll => write!(f, "unroll loop"),
            Action::Join => write!(f, "join"),
            Action::Atomic { micro_steps } => write!(f, "atomic ({} micro-steps)", micro_steps),
            Action::Alloc { base, size } => write!(f, "alloc {} word(s) at {}", size, base),
            Action::Get { address, value } => write!(f, "read {} = {}", address, value),
            Action::Set { address, value } => write!(f, "write {} := {}", address, value),
            Action::Free { address } => write!(f, "free {}", address),
        }
    }
}

/// One taken step: the `Par` choices leading to the redex, and the rule applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepEvent {
    pub path: Vec<Branch>,
    pub action: Action,
}

impl StepEvent {
    fn new(action: Action) -> Self {
        StepEvent {
            path: Vec::new(),
            action,
        }
    }

    fn under(mut self, branch: Branch) -> Self {
        self.path.insert(0, branch);
        self
    }
}

impl fmt::Display for StepEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "·")?;
        } else {
            for b in &self.path {
                write!(f, "{}", if *b == Branch::Left { 'L' } else { 'R' })?;
            }
        }
        write!(f, ": {}", self.action)
    }
}

/// A command paired with the heap it runs against
#[derive(Debug, Clone)]
pub struct Configuration {
    pub command: Command,
    pub heap: Heap,
}

impl Configuration {
    pub fn new(command: Command, heap: Heap) -> Self {
        Configuration { command, heap }
    }

    /// A configuration is terminal once its command is a pure value
    pub fn is_terminal(&self) -> bool {
        self.command.is_pure()
    }
}

/// Why a scheduled step could not be taken
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    /// No step exists: the command is terminal, or every runnable position is
    /// an atomic block that cannot finish within its fuel or an allocation
    /// too large to address
    Stalled,
    /// The step itself ran into a fault
    Fault(FaultKind),
}

/// Attribute a fault raised by a sub-command to its enclosing context
fn in_context(err: StepError, wrap: fn(Box<FaultKind>) -> FaultKind) -> StepError {
    match err {
        StepError::Fault(fault) => StepError::Fault(wrap(Box::new(fault))),
        stalled => stalled,
    }
}

/// Unroll `Repeat(body)` into `Let(body, b => if b then Pure(b) else Repeat(body))`
fn unroll(body: &Command) -> Command {
    let again = body.clone();
    Command::Let(
        Box::new(body.clone()),
        Rc::new(move |b| if_then_else(b, pure(b), Command::Repeat(Box::new(again.clone())))),
    )
}

/// Take one step of `cmd`, mutating `heap` in place.
///
/// The caller is expected to have run [`detect`] first; a configuration that
/// is erroneous may still report a fault here instead of stepping.
pub fn step(
    cmd: &Command,
    heap: &mut Heap,
    scheduler: &mut dyn Scheduler,
    atomic_fuel: usize,
) -> Result<(Command, StepEvent), StepError> {
    match cmd {
        Command::Pure(_) => Err(StepError::Stalled),

        Command::Let(c, f) => match c.as_ref() {
            Command::Pure(x) => Ok((f(*x), StepEvent::new(Action::Bind))),
            inner => {
                let (next, event) = step(inner, heap, scheduler, atomic_fuel)
                    .map_err(|e| in_context(e, FaultKind::InSequence))?;
                Ok((Command::Let(Box::new(next), Rc::clone(f)), event))
            }
        },

        Command::IfThenElse(b, c1, c2) => {
            let taken = truthy(*b);
            let next = if taken { c1.as_ref() } else { c2.as_ref() };
            Ok((next.clone(), StepEvent::new(Action::Branch { taken })))
        }

        Command::Repeat(body) => Ok((unroll(body), StepEvent::new(Action::Unroll))),

        Command::Par(c1, c2) => {
            if c1.is_pure() && c2.is_pure() {
                return Ok((Command::Pure(0), StepEvent::new(Action::Join)));
            }

            let first = if c1.is_pure() {
                Branch::Right
            } else if c2.is_pure() {
                Branch::Left
            } else {
                scheduler.pick()
            };

            match step_branch(first, c1, c2, heap, scheduler, atomic_fuel) {
                Err(StepError::Stalled) if !c1.is_pure() && !c2.is_pure() => {
                    step_branch(first.other(), c1, c2, heap, scheduler, atomic_fuel)
                }
                result => result,
            }
        }

        Command::Atomic(body) => {
            let (value, micro_steps) = run_atomic(body, heap, scheduler, atomic_fuel)?;
            Ok((
                Command::Pure(value),
                StepEvent::new(Action::Atomic { micro_steps }),
            ))
        }

        Command::Alloc(size) => {
            let base = heap.allocate_block(*size).map_err(|e| {
                warn!(error = %e, "allocation cannot be satisfied");
                StepError::Stalled
            })?;
            Ok((
                Command::Pure(base),
                StepEvent::new(Action::Alloc { base, size: *size }),
            ))
        }

        Command::Get(address) => {
            let value = heap
                .lookup(*address)
                .ok_or(StepError::Fault(FaultKind::InvalidAccess { address: *address }))?;
            Ok((
                Command::Pure(value),
                StepEvent::new(Action::Get {
                    address: *address,
                    value,
                }),
            ))
        }

        Command::Set(address, value) => {
            heap.update(*address, *value)
                .map_err(|_| StepError::Fault(FaultKind::InvalidAccess { address: *address }))?;
            Ok((
                Command::Pure(0),
                StepEvent::new(Action::Set {
                    address: *address,
                    value: *value,
                }),
            ))
        }

        Command::Free(address) => {
            heap.free(*address)
                .map_err(|_| StepError::Fault(FaultKind::InvalidAccess { address: *address }))?;
            Ok((
                Command::Pure(0),
                StepEvent::new(Action::Free { address: *address }),
            ))
        }
    }
}

/// Step one side of a `Par`, rebuilding the node around the result
fn step_branch(
    branch: Branch,
    c1: &Command,
    c2: &Command,
    heap: &mut Heap,
    scheduler: &mut dyn Scheduler,
    atomic_fuel: usize,
) -> Result<(Command, StepEvent), StepError> {
    let target = if branch == Branch::Left { c1 } else { c2 };
    let wrap = match branch {
        Branch::Left => FaultKind::InLeft,
        Branch::Right => FaultKind::InRight,
    };
    let (next, event) =
        step(target, heap, scheduler, atomic_fuel).map_err(|e| in_context(e, wrap))?;
    let rebuilt = match branch {
        Branch::Left => Command::Par(Box::new(next), Box::new(c2.clone())),
        Branch::Right => Command::Par(Box::new(c1.clone()), Box::new(next)),
    };
    Ok((rebuilt, event.under(branch)))
}

/// Run an atomic body to completion against a private copy of the heap.
///
/// The copy replaces `heap` only on success; a stalled or faulted body leaves
/// the caller's heap untouched.
fn run_atomic(
    body: &Command,
    heap: &mut Heap,
    scheduler: &mut dyn Scheduler,
    atomic_fuel: usize,
) -> Result<(Value, usize), StepError> {
    let mut local = heap.clone();
    let mut current = body.clone();
    let mut micro_steps = 0;

    loop {
        if let Command::Pure(value) = current {
            *heap = local;
            return Ok((value, micro_steps));
        }
        if micro_steps >= atomic_fuel {
            warn!(fuel = atomic_fuel, "atomic block did not finish within its fuel");
            return Err(StepError::Stalled);
        }
        if let Some(fault) = detect(&current, &local, atomic_fuel) {
            return Err(StepError::Fault(FaultKind::InAtomic(Box::new(fault))));
        }

        let (next, _) = step(&current, &mut local, scheduler, atomic_fuel)
            .map_err(|e| in_context(e, FaultKind::InAtomic))?;
        current = next;
        micro_steps += 1;
    }
}

/// Every configuration reachable from `(cmd, heap)` in exactly one step
pub fn successors(cmd: &Command, heap: &Heap, atomic_fuel: usize) -> Vec<(Configuration, StepEvent)> {
    match cmd {
        Command::Pure(_) => Vec::new(),

        Command::Let(c, f) => match c.as_ref() {
            Command::Pure(x) => vec![(
                Configuration::new(f(*x), heap.clone()),
                StepEvent::new(Action::Bind),
            )],
            inner => successors(inner, heap, atomic_fuel)
                .into_iter()
                .map(|(config, event)| {
                    let command = Command::Let(Box::new(config.command), Rc::clone(f));
                    (Configuration::new(command, config.heap), event)
                })
                .collect(),
        },

        Command::IfThenElse(b, c1, c2) => {
            let taken = truthy(*b);
            let next = if taken { c1.as_ref() } else { c2.as_ref() };
            vec![(
                Configuration::new(next.clone(), heap.clone()),
                StepEvent::new(Action::Branch { taken }),
            )]
        }

        Command::Repeat(body) => vec![(
            Configuration::new(unroll(body), heap.clone()),
            StepEvent::new(Action::Unroll),
        )],

        Command::Par(c1, c2) => {
            if c1.is_pure() && c2.is_pure() {
                return vec![(
                    Configuration::new(Command::Pure(0), heap.clone()),
                    StepEvent::new(Action::Join),
                )];
            }

            let mut out = Vec::new();
            for (config, event) in successors(c1, heap, atomic_fuel) {
                let command = Command::Par(Box::new(config.command), c2.clone());
                out.push((Configuration::new(command, config.heap), event.under(Branch::Left)));
            }
            for (config, event) in successors(c2, heap, atomic_fuel) {
                let command = Command::Par(c1.clone(), Box::new(config.command));
                out.push((Configuration::new(command, config.heap), event.under(Branch::Right)));
            }
            out
        }

        Command::Atomic(body) => atomic_outcomes(body, heap, atomic_fuel)
            .into_iter()
            .map(|(value, final_heap, micro_steps)| {
                (
                    Configuration::new(Command::Pure(value), final_heap),
                    StepEvent::new(Action::Atomic { micro_steps }),
                )
            })
            .collect(),

        Command::Alloc(size) => {
            let mut next = heap.clone();
            match next.allocate_block(*size) {
                Ok(base) => vec![(
                    Configuration::new(Command::Pure(base), next),
                    StepEvent::new(Action::Alloc { base, size: *size }),
                )],
                Err(_) => Vec::new(),
            }
        }

        Command::Get(address) => match heap.lookup(*address) {
            Some(value) => vec![(
                Configuration::new(Command::Pure(value), heap.clone()),
                StepEvent::new(Action::Get {
                    address: *address,
                    value,
                }),
            )],
            None => Vec::new(),
        },

        Command::Set(address, value) => {
            let mut next = heap.clone();
            match next.update(*address, *value) {
                Ok(()) => vec![(
                    Configuration::new(Command::Pure(0), next),
                    StepEvent::new(Action::Set {
                        address: *address,
                        value: *value,
                    }),
                )],
                Err(_) => Vec::new(),
            }
        }

        Command::Free(address) => {
            let mut next = heap.clone();
            match next.free(*address) {
                Ok(()) => vec![(
                    Configuration::new(Command::Pure(0), next),
                    StepEvent::new(Action::Free { address: *address }),
                )],
                Err(_) => Vec::new(),
            }
        }
    }
}

/// The leftmost enabled local step whose result is still inert, if any.
///
/// Such a step is deterministic, touches no heap cell, and changes nothing
/// the detector can see, so it commutes with every other step and an
/// explorer may take it without branching on the alternatives. A local step
/// that would expose a heap access or an atomic block is left for the full
/// relation: taking it early could surface a race that hides outcomes other
/// schedules reach.
pub fn local_step(cmd: &Command) -> Option<(Command, StepEvent)> {
    let (next, event) = match cmd {
        Command::Let(c, f) => match c.as_ref() {
            Command::Pure(x) => (f(*x), StepEvent::new(Action::Bind)),
            inner => {
                return local_step(inner)
                    .map(|(next, event)| (Command::Let(Box::new(next), Rc::clone(f)), event))
            }
        },
        Command::IfThenElse(b, c1, c2) => {
            let taken = truthy(*b);
            let next = if taken { c1.as_ref() } else { c2.as_ref() };
            (next.clone(), StepEvent::new(Action::Branch { taken }))
        }
        Command::Repeat(body) => (unroll(body), StepEvent::new(Action::Unroll)),
        Command::Par(c1, c2) => {
            if c1.is_pure() && c2.is_pure() {
                return Some((Command::Pure(0), StepEvent::new(Action::Join)));
            }
            if let Some((next, event)) = local_step(c1) {
                return Some((
                    Command::Par(Box::new(next), c2.clone()),
                    event.under(Branch::Left),
                ));
            }
            return local_step(c2).map(|(next, event)| {
                (
                    Command::Par(c1.clone(), Box::new(next)),
                    event.under(Branch::Right),
                )
            });
        }
        _ => return None,
    };
    is_inert(&next).then_some((next, event))
}

/// Successors with local steps collapsed: a single successor when any local
/// step is enabled, the full relation otherwise
pub fn reduced_successors(
    cmd: &Command,
    heap: &Heap,
    atomic_fuel: usize,
) -> Vec<(Configuration, StepEvent)> {
    match local_step(cmd) {
        Some((next, event)) => vec![(Configuration::new(next, heap.clone()), event)],
        None => successors(cmd, heap, atomic_fuel),
    }
}

/// All distinct `(value, heap, micro_steps)` results an atomic body can reach
/// within `atomic_fuel` steps. Paths that fault or run out of fuel contribute
/// nothing.
pub fn atomic_outcomes(body: &Command, heap: &Heap, atomic_fuel: usize) -> Vec<(Value, Heap, usize)> {
    let mut outcomes: Vec<(Value, Heap, usize)> = Vec::new();
    let mut pending = vec![(body.clone(), heap.clone(), 0usize)];

    while let Some((cmd, h, depth)) = pending.pop() {
        if let Command::Pure(value) = cmd {
            if !outcomes.iter().any(|(v, oh, _)| *v == value && *oh == h) {
                outcomes.push((value, h, depth));
            }
            continue;
        }
        if depth >= atomic_fuel || detect(&cmd, &h, atomic_fuel).is_some() {
            continue;
        }
        for (config, _) in reduced_successors(&cmd, &h, atomic_fuel) {
            pending.push((config.command, config.heap, depth + 1));
        }
    }

    outcomes
}

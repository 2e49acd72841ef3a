// Execution driver for the concurrent heap language

use crate::command::Command;
use crate::interpreter::constants::{DEFAULT_ATOMIC_FUEL, DEFAULT_STEP_BUDGET};
use crate::interpreter::errors::{EngineError, FaultKind};
use crate::interpreter::fault::detect;
use crate::interpreter::scheduler::{RoundRobin, Scheduler};
use crate::interpreter::step::{step, Configuration, StepError, StepEvent};
use crate::memory::{Heap, Value};
use crate::snapshot::{Snapshot, SnapshotManager};
use tracing::{debug, trace, warn};

/// Resource limits for a scheduled run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Scheduled steps before the run is abandoned
    pub step_budget: usize,
    /// Inner steps an atomic block may take
    pub atomic_fuel: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            step_budget: DEFAULT_STEP_BUDGET,
            atomic_fuel: DEFAULT_ATOMIC_FUEL,
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunResult {
    /// The program reduced to a value
    Completed { value: Value, heap: Heap },
    /// The detector flagged the configuration before a step was taken
    Faulted(FaultKind),
    /// The step budget ran out, or nothing could move (a stalled atomic block)
    DivergedOrBudgetExceeded { steps: usize },
}

impl RunResult {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunResult::Completed { .. })
    }

    /// The final value of a completed run
    pub fn value(&self) -> Option<Value> {
        match self {
            RunResult::Completed { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// The final heap of a completed run
    pub fn heap(&self) -> Option<&Heap> {
        match self {
            RunResult::Completed { heap, .. } => Some(heap),
            _ => None,
        }
    }

    pub fn fault(&self) -> Option<&FaultKind> {
        match self {
            RunResult::Faulted(fault) => Some(fault),
            _ => None,
        }
    }
}

/// Drives one configuration through a schedule, optionally recording every
/// intermediate state for stepping back and forth
pub struct Machine<S: Scheduler> {
    /// Live configuration; always the newest state
    config: Configuration,

    scheduler: S,

    limits: Limits,

    /// Steps taken so far
    steps: usize,

    /// The most recent step event
    last_event: Option<StepEvent>,

    /// Set once the run has ended
    outcome: Option<RunResult>,

    /// Recorded history, when enabled
    snapshot_manager: Option<SnapshotManager>,

    /// Cleared when the snapshot memory limit is hit; history is kept
    recording: bool,

    /// Snapshot index currently being viewed
    history_position: usize,
}

impl<S: Scheduler> Machine<S> {
    /// Create a machine that does not record history
    pub fn new(command: Command, heap: Heap, scheduler: S, limits: Limits) -> Self {
        Machine {
            config: Configuration::new(command, heap),
            scheduler,
            limits,
            steps: 0,
            last_event: None,
            outcome: None,
            snapshot_manager: None,
            recording: false,
            history_position: 0,
        }
    }

    /// Record every state from now on, within `snapshot_memory_limit` bytes
    pub fn with_trace(mut self, snapshot_memory_limit: usize) -> Result<Self, EngineError> {
        let mut manager = SnapshotManager::new(snapshot_memory_limit);
        manager.push(Snapshot::new(
            self.config.command.clone(),
            self.config.heap.clone(),
            self.last_event.clone(),
            self.steps,
        ))?;
        self.history_position = 0;
        self.snapshot_manager = Some(manager);
        self.recording = true;
        Ok(self)
    }

    /// Run until the program completes, faults, or exhausts its budget
    pub fn run(&mut self) -> RunResult {
        loop {
            if let Some(result) = self.advance() {
                return result;
            }
        }
    }

    /// Take one scheduled step. Returns the outcome once the run has ended.
    pub fn advance(&mut self) -> Option<RunResult> {
        if let Some(outcome) = &self.outcome {
            return Some(outcome.clone());
        }

        match self.try_step() {
            None => {
                self.record_step();
                None
            }
            Some(outcome) => {
                if let Some(last) = self.snapshot_manager.as_mut().and_then(|m| m.last_mut()) {
                    last.outcome = Some(outcome.clone());
                }
                self.outcome = Some(outcome.clone());
                Some(outcome)
            }
        }
    }

    /// Classify the live configuration, then step it if it is neither
    /// terminal nor erroneous
    fn try_step(&mut self) -> Option<RunResult> {
        if let Command::Pure(value) = self.config.command {
            debug!(steps = self.steps, value, "program completed");
            return Some(RunResult::Completed {
                value,
                heap: self.config.heap.clone(),
            });
        }

        let fault = detect(&self.config.command, &self.config.heap, self.limits.atomic_fuel);
        if let Some(fault) = fault {
            debug!(steps = self.steps, %fault, "fault detected");
            return Some(RunResult::Faulted(fault));
        }

        if self.steps >= self.limits.step_budget {
            debug!(budget = self.limits.step_budget, "step budget exhausted");
            return Some(RunResult::DivergedOrBudgetExceeded { steps: self.steps });
        }

        match step(
            &self.config.command,
            &mut self.config.heap,
            &mut self.scheduler,
            self.limits.atomic_fuel,
        ) {
            Ok((next, event)) => {
                trace!(step = self.steps, %event, "step");
                self.config.command = next;
                self.steps += 1;
                self.last_event = Some(event);
                None
            }
            Err(StepError::Stalled) => {
                debug!(steps = self.steps, "no branch can move");
                Some(RunResult::DivergedOrBudgetExceeded { steps: self.steps })
            }
            Err(StepError::Fault(fault)) => {
                debug!(steps = self.steps, %fault, "fault raised while stepping");
                Some(RunResult::Faulted(fault))
            }
        }
    }

    fn record_step(&mut self) {
        if !self.recording {
            return;
        }
        let Some(manager) = self.snapshot_manager.as_mut() else {
            return;
        };
        let snapshot = Snapshot::new(
            self.config.command.clone(),
            self.config.heap.clone(),
            self.last_event.clone(),
            self.steps,
        );
        if let Err(e) = manager.push(snapshot) {
            warn!(error = %e, "trace recording stopped");
            self.recording = false;
            return;
        }
        self.history_position = manager.len() - 1;
    }

    /// Step backward in the recorded history
    pub fn step_backward(&mut self) -> Result<(), EngineError> {
        if self.history_position == 0 {
            return Err(EngineError::AtStart);
        }
        self.history_position -= 1;
        Ok(())
    }

    /// Step forward: replay the next recorded state, or execute a new step
    /// when the view is at the newest state
    pub fn step_forward(&mut self) -> Result<(), EngineError> {
        let recorded = self.total_snapshots();
        if self.history_position + 1 < recorded {
            self.history_position += 1;
            return Ok(());
        }
        if self.outcome.is_some() {
            return Err(EngineError::AtEnd);
        }

        // A step that ends the run adds no state but still counts as progress
        self.advance();
        if self.total_snapshots() > recorded {
            self.history_position = self.total_snapshots() - 1;
        }
        Ok(())
    }

    /// Return the view to the initial state
    pub fn rewind_to_start(&mut self) {
        self.history_position = 0;
    }

    /// Move the view to the newest recorded state
    pub fn jump_to_end(&mut self) {
        self.history_position = self.total_snapshots().saturating_sub(1);
    }

    // ========== Getter methods for UI ==========

    /// The snapshot currently being viewed
    pub fn current_snapshot(&self) -> Option<&Snapshot> {
        self.snapshot_manager
            .as_ref()
            .and_then(|m| m.get(self.history_position))
    }

    /// All recorded snapshots
    pub fn snapshots(&self) -> Option<&SnapshotManager> {
        self.snapshot_manager.as_ref()
    }

    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    pub fn last_event(&self) -> Option<&StepEvent> {
        self.last_event.as_ref()
    }

    pub fn outcome(&self) -> Option<&RunResult> {
        self.outcome.as_ref()
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn history_position(&self) -> usize {
        self.history_position
    }

    pub fn total_snapshots(&self) -> usize {
        self.snapshot_manager.as_ref().map_or(0, |m| m.len())
    }

    pub fn scheduler_name(&self) -> String {
        self.scheduler.name()
    }
}

/// Run `command` against `heap` with default limits and a round-robin
/// schedule
pub fn run(command: Command, heap: Heap) -> RunResult {
    run_with(command, heap, RoundRobin::new(), Limits::default())
}

/// Run `command` against `heap` under an explicit schedule and limits
pub fn run_with<S: Scheduler>(
    command: Command,
    heap: Heap,
    scheduler: S,
    limits: Limits,
) -> RunResult {
    Machine::new(command, heap, scheduler, limits).run()
}

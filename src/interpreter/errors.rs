//! Error types for the interpreter
//!
//! - [`FaultKind`]: semantic faults of the modeled program (invalid memory
//!   access, data race, and the same faults surfaced through an enclosing
//!   context). A fault halts the simulated program; there is no recovery
//!   construct in the language.
//! - [`HeapError`]: precondition failures of raw heap operations.
//! - [`EngineError`]: failures of the driver itself (trace navigation,
//!   snapshot storage), never of the modeled program.
//!
//! Budget exhaustion is deliberately not an error type: it is a distinct
//! [`RunResult`](crate::interpreter::engine::RunResult) variant so it cannot
//! be mistaken for a fault.

use crate::memory::Address;
use thiserror::Error;

/// A fault detected in a configuration before any step is taken
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum FaultKind {
    /// `Get`, `Set` or `Free` of an address that is not allocated
    #[error("invalid access to address {address}")]
    InvalidAccess { address: Address },

    /// An address in the immediate-access sets of both branches of a `Par`
    #[error("data race on address {address}")]
    Race { address: Address },

    /// Fault in the left command of a `Let`
    #[error("in sequenced command: {0}")]
    InSequence(Box<FaultKind>),

    /// Fault in the left branch of a `Par`
    #[error("in left branch: {0}")]
    InLeft(Box<FaultKind>),

    /// Fault in the right branch of a `Par`
    #[error("in right branch: {0}")]
    InRight(Box<FaultKind>),

    /// Fault reachable somewhere inside an atomic block's execution
    #[error("inside atomic block: {0}")]
    InAtomic(Box<FaultKind>),
}

impl FaultKind {
    /// Strip every propagation wrapper and return the underlying fault
    pub fn root_cause(&self) -> &FaultKind {
        match self {
            FaultKind::InSequence(inner)
            | FaultKind::InLeft(inner)
            | FaultKind::InRight(inner)
            | FaultKind::InAtomic(inner) => inner.root_cause(),
            fault => fault,
        }
    }

    /// The offending address
    pub fn address(&self) -> Address {
        match self {
            FaultKind::InvalidAccess { address } | FaultKind::Race { address } => *address,
            FaultKind::InSequence(inner)
            | FaultKind::InLeft(inner)
            | FaultKind::InRight(inner)
            | FaultKind::InAtomic(inner) => inner.address(),
        }
    }

    /// Check if the underlying fault is a data race
    pub fn is_race(&self) -> bool {
        matches!(self.root_cause(), FaultKind::Race { .. })
    }

    /// Check if the underlying fault is an invalid memory access
    pub fn is_invalid_access(&self) -> bool {
        matches!(self.root_cause(), FaultKind::InvalidAccess { .. })
    }
}

/// Precondition failures of heap operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HeapError {
    #[error("address {0} is not allocated")]
    Absent(Address),

    #[error("heaps overlap at address {0}")]
    Overlap(Address),

    #[error("a block of {0} cells cannot be addressed")]
    BlockTooLarge(usize),
}

/// Driver failures that are not faults of the simulated program
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("already at the beginning of the trace")]
    AtStart,

    #[error("no further steps recorded (execution finished)")]
    AtEnd,

    #[error("snapshot memory limit exceeded: {current} bytes used, limit is {limit}")]
    SnapshotLimitExceeded { current: usize, limit: usize },
}

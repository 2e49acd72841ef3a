//! Concurrent execution engine
//!
//! This module provides the operational semantics and the tools built on it:
//! - [`step`]: the small-step reduction relation (scheduled and exhaustive)
//! - [`fault`]: immediate-access sets and the race/fault detector
//! - [`scheduler`]: interleaving policies for `Par`
//! - [`engine`]: the [`Machine`](engine::Machine) driver and [`run`](engine::run)
//! - [`explore`]: exhaustive enumeration of interleavings
//! - [`safety`]: fuel-bounded safety checking
//! - [`errors`]: fault and error types
//!
//! # Execution Model
//!
//! A configuration is a command plus the heap it runs against. Before every
//! step the driver asks the detector whether the configuration is erroneous;
//! if so the run ends with that fault and no step is taken. Otherwise one
//! step is taken, with the scheduler resolving which `Par` branch moves.
//! Atomic blocks execute to completion inside a single step.

pub mod constants;
pub mod engine;
pub mod errors;
pub mod explore;
pub mod fault;
pub mod safety;
pub mod scheduler;
pub mod step;

pub use engine::{run, run_with, Limits, Machine, RunResult};
pub use errors::FaultKind;

//! # Introduction
//!
//! concheap simulates a small ML-like language with a shared heap, parallel
//! composition and atomic blocks. Every state of a scheduled run can be
//! recorded and browsed forward and backward through a terminal UI built with
//! [ratatui](https://docs.rs/ratatui).
//!
//! ## Execution pipeline
//!
//! ```text
//! Command + Heap → Detector → Step (Scheduler) → Snapshots → TUI
//! ```
//!
//! 1. [`command`]: the command AST and smart constructors for writing
//!    programs in Rust.
//! 2. [`memory`]: the finite partial heap from addresses to values.
//! 3. [`interpreter`]: the reduction relation, the race/fault detector,
//!    schedulers, the [`interpreter::Machine`] driver and an exhaustive
//!    interleaving explorer.
//! 4. [`primitives`]: semaphores, critical regions and producer/consumer
//!    queues written in the command language, plus ready-made scenarios.
//! 5. [`snapshot`]: recorded history with a configurable memory limit.
//! 6. [`ui`]: ratatui-based trace viewer; not part of the stable library API.
//!
//! ## Faults
//!
//! A configuration is erroneous when it is about to touch an unallocated
//! cell, or when the two sides of a `Par` are both about to touch the same
//! cell. The driver checks before every step, so a faulted run ends in the
//! state that exhibited the fault.

pub mod command;
pub mod interpreter;
pub mod memory;
pub mod primitives;
pub mod snapshot;
pub mod ui;

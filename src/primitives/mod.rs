//! Concurrency primitives written in the command language
//!
//! Nothing here extends the engine: every primitive is an ordinary
//! [`Command`](crate::command::Command) built from heap operations, `Repeat`
//! and `Atomic`.
//!
//! - [`semaphore`]: binary semaphores via atomic swap
//! - [`region`]: critical and conditional critical regions
//! - [`queue`]: one-slot and shared-list producer/consumer buffers
//! - [`scenarios`]: complete programs used by the CLI and tests

pub mod queue;
pub mod region;
pub mod scenarios;
pub mod semaphore;

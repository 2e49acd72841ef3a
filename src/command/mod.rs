//! The command language
//!
//! - [`ast`]: the [`Command`] term and its pretty-printers
//! - [`build`]: boxed constructors plus the derived `skip`, `seq` and
//!   `either` forms
//!
//! Commands are immutable values. Reduction consumes a command and produces
//! the next one; unbounded loops are the [`Command::Repeat`] combinator,
//! unrolled one iteration at a time, never an infinite term.

pub mod ast;
pub mod build;

pub use ast::{Command, Continuation};

//! Memory model for the interpreter
//!
//! This module provides the core memory abstractions:
//! - [`value`]: Runtime values (machine integers) and addresses
//! - [`heap`]: Partial address map with allocation, disjointness and union
//!
//! # Word Addressing
//!
//! Every address names one integer-sized cell. A block of `n` words allocated
//! at `l` occupies `l, l + 1, ..., l + n - 1`; [`value::offset`] is the only
//! pointer arithmetic the language needs.

pub mod heap;
pub mod value;

pub use heap::Heap;
pub use value::{Address, Value, NULL};

//! Runtime value representation
//!
//! The language has exactly one kind of runtime value: a machine integer.
//! Addresses are integers too, so a heap cell can hold a pointer to another
//! cell (the shared-list queue relies on this for its `next` links).
//!
//! # Null
//!
//! Address [`NULL`] (zero) means "no address". Allocation never returns it,
//! so a zero read from a link field reliably marks the end of a list.

/// Runtime values in the interpreter
pub type Value = i64;

/// Memory address type
pub type Address = i64;

/// The reserved null address
pub const NULL: Address = 0;

/// Interpret a value as a boolean: zero is false, anything else is true
pub fn truthy(v: Value) -> bool {
    v != 0
}

/// Address of the `index`-th word of a block starting at `base`
pub fn offset(base: Address, index: usize) -> Address {
    base + index as Address
}

//! Constructor helpers and derived command forms
//!
//! The free functions here box their arguments so programs read close to
//! the term they describe:
//!
//! ```
//! use concheap::command::build::*;
//!
//! // let a = alloc(1) in a := 42; !a
//! let prog = bind(alloc(1), |a| seq(set(a, 42), get(a)));
//! assert_eq!(prog.kind(), "Let");
//! ```

use super::ast::Command;
use crate::memory::{Address, Value};
use std::rc::Rc;

pub fn pure(v: Value) -> Command {
    Command::Pure(v)
}

/// The trivial command, `Pure(0)`
pub fn skip() -> Command {
    Command::Pure(0)
}

/// Run `c`, then continue with `f` applied to its result
pub fn bind<F>(c: Command, f: F) -> Command
where
    F: Fn(Value) -> Command + 'static,
{
    Command::Let(Box::new(c), Rc::new(f))
}

/// Run `c1`, discard its result, then run `c2`
pub fn seq(c1: Command, c2: Command) -> Command {
    bind(c1, move |_| c2.clone())
}

pub fn if_then_else(b: Value, then_branch: Command, else_branch: Command) -> Command {
    Command::IfThenElse(b, Box::new(then_branch), Box::new(else_branch))
}

pub fn repeat(body: Command) -> Command {
    Command::Repeat(Box::new(body))
}

pub fn par(left: Command, right: Command) -> Command {
    Command::Par(Box::new(left), Box::new(right))
}

pub fn atomic(body: Command) -> Command {
    Command::Atomic(Box::new(body))
}

pub fn alloc(size: usize) -> Command {
    Command::Alloc(size)
}

pub fn get(addr: Address) -> Command {
    Command::Get(addr)
}

pub fn set(addr: Address, value: Value) -> Command {
    Command::Set(addr, value)
}

pub fn free(addr: Address) -> Command {
    Command::Free(addr)
}

/// Nondeterministic choice between two commands.
///
/// Built only from the primitive forms: a private coin cell receives two
/// competing atomic writes from the branches of a `Par`, and whichever write
/// the schedule lets land last decides the branch. The coin is freed before
/// the chosen command runs, so the choice leaves no trace on the heap.
pub fn either(c1: Command, c2: Command) -> Command {
    bind(alloc(1), move |coin| {
        let (c1, c2) = (c1.clone(), c2.clone());
        seq(
            par(atomic(set(coin, 1)), atomic(set(coin, 2))),
            bind(get(coin), move |side| {
                seq(
                    free(coin),
                    if_then_else((side == 1) as Value, c1.clone(), c2.clone()),
                )
            }),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_discards_left_result() {
        match seq(pure(5), pure(6)) {
            Command::Let(c, f) => {
                assert_eq!(c.as_pure(), Some(5));
                assert_eq!(f(5).as_pure(), Some(6));
                assert_eq!(f(99).as_pure(), Some(6));
            }
            other => panic!("expected Let, got {:?}", other),
        }
    }

    #[test]
    fn test_skip_is_pure_zero() {
        assert_eq!(skip().as_pure(), Some(0));
    }

    #[test]
    fn test_either_starts_with_private_alloc() {
        match either(pure(1), pure(2)) {
            Command::Let(c, _) => assert!(matches!(*c, Command::Alloc(1))),
            other => panic!("expected Let, got {:?}", other),
        }
    }
}

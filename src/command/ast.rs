//! Command language definitions
//!
//! A [`Command`] is a term of the concurrent heap language. There is no
//! surface syntax: programs are built directly from these constructors (see
//! [`crate::command::build`] for the derived forms).
//!
//! Operands of heap operations and conditionals are already-computed
//! [`Value`]s. Anything computed at run time flows through [`Command::Let`],
//! whose continuation receives the result of the left command.

use crate::memory::{Address, Value};
use std::fmt;
use std::rc::Rc;

/// The "rest of the program" after a [`Command::Let`]
pub type Continuation = Rc<dyn Fn(Value) -> Command>;

/// Commands of the language
#[derive(Clone)]
pub enum Command {
    /// A finished computation
    Pure(Value),
    /// Run the first command, then continue with its result
    Let(Box<Command>, Continuation),
    /// Zero selects the else branch, anything else the then branch
    IfThenElse(Value, Box<Command>, Box<Command>),
    /// Run the body until it returns nonzero
    Repeat(Box<Command>),
    /// Run both commands interleaved; joins to `Pure(0)`
    Par(Box<Command>, Box<Command>),
    /// Run the body to completion as one indivisible step
    Atomic(Box<Command>),
    /// Allocate a zeroed block of the given number of words
    Alloc(usize),
    Get(Address),
    Set(Address, Value),
    Free(Address),
}

impl Command {
    /// Check if this command is a finished value
    pub fn is_pure(&self) -> bool {
        matches!(self, Command::Pure(_))
    }

    /// The result value of a finished command
    pub fn as_pure(&self) -> Option<Value> {
        match self {
            Command::Pure(v) => Some(*v),
            _ => None,
        }
    }

    /// Short name of the outermost constructor
    pub fn kind(&self) -> &'static str {
        match self {
            Command::Pure(_) => "Pure",
            Command::Let(..) => "Let",
            Command::IfThenElse(..) => "If",
            Command::Repeat(_) => "Repeat",
            Command::Par(..) => "Par",
            Command::Atomic(_) => "Atomic",
            Command::Alloc(_) => "Alloc",
            Command::Get(_) => "Get",
            Command::Set(..) => "Set",
            Command::Free(_) => "Free",
        }
    }

    /// Number of constructor nodes in the visible part of the term.
    /// Continuations are opaque and count as nothing.
    pub fn size(&self) -> usize {
        match self {
            Command::Let(c, _) | Command::Repeat(c) | Command::Atomic(c) => 1 + c.size(),
            Command::IfThenElse(_, c1, c2) | Command::Par(c1, c2) => 1 + c1.size() + c2.size(),
            _ => 1,
        }
    }

    /// Render the command as an indented tree, one node per line
    pub fn tree_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        self.push_tree_lines(0, &mut lines);
        lines
    }

    fn push_tree_lines(&self, depth: usize, lines: &mut Vec<String>) {
        let pad = "  ".repeat(depth);
        match self {
            Command::Let(c, _) => {
                lines.push(format!("{}let", pad));
                c.push_tree_lines(depth + 1, lines);
                lines.push(format!("{}in <continuation>", pad));
            }
            Command::IfThenElse(b, c1, c2) => {
                lines.push(format!("{}if {}", pad, b));
                c1.push_tree_lines(depth + 1, lines);
                lines.push(format!("{}else", pad));
                c2.push_tree_lines(depth + 1, lines);
            }
            Command::Repeat(c) => {
                lines.push(format!("{}repeat", pad));
                c.push_tree_lines(depth + 1, lines);
            }
            Command::Par(c1, c2) => {
                lines.push(format!("{}par", pad));
                c1.push_tree_lines(depth + 1, lines);
                lines.push(format!("{}||", pad));
                c2.push_tree_lines(depth + 1, lines);
            }
            Command::Atomic(c) => {
                lines.push(format!("{}atomic", pad));
                c.push_tree_lines(depth + 1, lines);
            }
            leaf => lines.push(format!("{}{}", pad, leaf)),
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Pure(v) => write!(f, "Pure({})", v),
            Command::Let(c, _) => write!(f, "Let({:?}, <fn>)", c),
            Command::IfThenElse(b, c1, c2) => write!(f, "IfThenElse({}, {:?}, {:?})", b, c1, c2),
            Command::Repeat(c) => write!(f, "Repeat({:?})", c),
            Command::Par(c1, c2) => write!(f, "Par({:?}, {:?})", c1, c2),
            Command::Atomic(c) => write!(f, "Atomic({:?})", c),
            Command::Alloc(n) => write!(f, "Alloc({})", n),
            Command::Get(l) => write!(f, "Get({})", l),
            Command::Set(l, v) => write!(f, "Set({}, {})", l, v),
            Command::Free(l) => write!(f, "Free({})", l),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Pure(v) => write!(f, "{}", v),
            Command::Let(c, _) => write!(f, "let _ = {} in …", c),
            Command::IfThenElse(b, c1, c2) => write!(f, "if {} then {} else {}", b, c1, c2),
            Command::Repeat(c) => write!(f, "repeat {{ {} }}", c),
            Command::Par(c1, c2) => write!(f, "({} || {})", c1, c2),
            Command::Atomic(c) => write!(f, "atomic {{ {} }}", c),
            Command::Alloc(n) => write!(f, "alloc({})", n),
            Command::Get(l) => write!(f, "!{}", l),
            Command::Set(l, v) => write!(f, "{} := {}", l, v),
            Command::Free(l) => write!(f, "free({})", l),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::build::{bind, par, seq};

    #[test]
    fn test_display_leaves() {
        assert_eq!(Command::Get(3).to_string(), "!3");
        assert_eq!(Command::Set(3, 4).to_string(), "3 := 4");
        assert_eq!(
            par(Command::Free(1), Command::Alloc(2)).to_string(),
            "(free(1) || alloc(2))"
        );
    }

    #[test]
    fn test_tree_lines_for_par() {
        let cmd = par(seq(Command::Set(1, 1), Command::Get(1)), Command::Get(2));
        let lines = cmd.tree_lines();
        assert_eq!(lines[0], "par");
        assert_eq!(lines[1], "  let");
        assert_eq!(lines[2], "    1 := 1");
        assert!(lines.contains(&"||".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("  !2"));
    }

    #[test]
    fn test_size_ignores_continuations() {
        let cmd = bind(Command::Alloc(1), |a| Command::Get(a));
        assert_eq!(cmd.size(), 2);
        assert_eq!(cmd.kind(), "Let");
    }
}

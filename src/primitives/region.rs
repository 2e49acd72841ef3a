//! Critical regions built on binary semaphores
//!
//! There is no exception path in the language, so a region that finishes
//! its body always reaches the release.

use super::semaphore::{acquire, release};
use crate::command::build::{bind, if_then_else, pure, repeat, seq};
use crate::command::Command;
use crate::memory::Address;

/// `acquire(lck); r = body; release(lck); r`
pub fn critical(lck: Address, body: Command) -> Command {
    seq(
        acquire(lck),
        bind(body, move |result| seq(release(lck), pure(result))),
    )
}

/// Wait until `cond` holds under the lock, then run `body` under the same
/// hold.
///
/// Each attempt takes the lock and evaluates `cond`. On nonzero the body runs
/// and the lock is released; on zero the lock is released and the attempt
/// repeats. Returns 1 once the body has run.
pub fn conditional(lck: Address, cond: Command, body: Command) -> Command {
    let attempt = seq(
        acquire(lck),
        bind(cond, move |ok| {
            if_then_else(
                ok,
                seq(body.clone(), seq(release(lck), pure(1))),
                seq(release(lck), pure(0)),
            )
        }),
    );
    repeat(attempt)
}

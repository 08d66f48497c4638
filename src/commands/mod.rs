//! Typed command families.
//!
//! Each module exposes free builder functions named after the command
//! (returning the [`Command`] or an argument error) and a thin facade that
//! submits through the shared [`crate::invoker::Invoker`] and normalizes the
//! reply.

pub mod bitmaps;
pub mod hashes;
pub mod hyperloglog;
pub mod keys;
pub mod lists;
pub mod sets;
pub mod strings;
pub mod zsets;

pub use bitmaps::Bitmaps;
pub use hashes::{HashFields, Hashes};
pub use hyperloglog::HyperLogLog;
pub use keys::Keys;
pub use lists::Lists;
pub use sets::Sets;
pub use strings::Strings;
pub use zsets::{ScoredMembers, ZSets};

use std::time::Duration;

use crate::command::{Arg, Command};
use crate::error::{ProxyError, Result};

/// Collect a variadic tail, rejecting it when empty.
fn non_empty<I, A>(command: &'static str, what: &str, items: I) -> Result<Vec<Arg>>
where
    I: IntoIterator<Item = A>,
    A: Into<Arg>,
{
    let items: Vec<Arg> = items.into_iter().map(Into::into).collect();
    if items.is_empty() {
        return Err(ProxyError::argument(
            command,
            format!("at least one {} is required", what),
        ));
    }
    Ok(items)
}

/// `name key item [item ...]`.
fn keyed_variadic<I, A>(name: &'static str, key: &str, what: &str, items: I) -> Result<Command>
where
    I: IntoIterator<Item = A>,
    A: Into<Arg>,
{
    let items = non_empty(name, what, items)?;
    Ok(Command::new(name).arg(key).args(items))
}

/// Blocking timeout in seconds; zero blocks forever.
fn timeout_arg(timeout: Duration) -> Arg {
    if timeout.subsec_nanos() == 0 {
        Arg::from(timeout.as_secs())
    } else {
        Arg::from(timeout.as_secs_f64())
    }
}

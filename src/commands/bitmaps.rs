//! Bit-level operations on string values.

use crate::bitfield::Fragment;
use crate::command::Command;
use crate::error::{ProxyError, Result};
use crate::invoker::Invoker;
use crate::reply;
use crate::types::BitOperation;

/// Bit offsets address at most a 512MB string.
const MAX_BIT_OFFSET: u64 = 1 << 32;

fn check_offset(command: &'static str, offset: u64) -> Result<()> {
    if offset >= MAX_BIT_OFFSET {
        return Err(ProxyError::argument(
            command,
            format!("offset {} is out of range (must be < 2^32)", offset),
        ));
    }
    Ok(())
}

pub fn setbit(key: &str, offset: u64, value: bool) -> Result<Command> {
    check_offset("SETBIT", offset)?;
    Ok(Command::new("SETBIT").arg(key).arg(offset).arg(i64::from(value)))
}

pub fn getbit(key: &str, offset: u64) -> Result<Command> {
    check_offset("GETBIT", offset)?;
    Ok(Command::new("GETBIT").arg(key).arg(offset))
}

/// Optional inclusive byte range.
pub fn bitcount(key: &str, range: Option<(i64, i64)>) -> Command {
    let command = Command::new("BITCOUNT").arg(key);
    match range {
        Some((start, end)) => command.arg(start).arg(end),
        None => command,
    }
}

pub fn bitpos(key: &str, bit: bool, start: Option<i64>, end: Option<i64>) -> Result<Command> {
    if start.is_none() && end.is_some() {
        return Err(ProxyError::argument("BITPOS", "end requires start"));
    }
    Ok(Command::new("BITPOS")
        .arg(key)
        .arg(i64::from(bit))
        .args(start)
        .args(end))
}

pub fn bitop(operation: BitOperation, destination: &str, keys: &[&str]) -> Result<Command> {
    let keys = super::non_empty("BITOP", "source key", keys.iter().copied())?;
    if operation == BitOperation::Not && keys.len() != 1 {
        return Err(ProxyError::argument(
            "BITOP",
            format!("NOT takes exactly one source key, got {}", keys.len()),
        ));
    }
    Ok(Command::new("BITOP")
        .arg(operation.as_str())
        .arg(destination)
        .args(keys))
}

/// `BITFIELD key fragment...`; fragments are concatenated in order.
pub fn bitfield<I>(key: &str, fragments: I) -> Command
where
    I: IntoIterator<Item = Fragment>,
{
    fragments
        .into_iter()
        .fold(Command::new("BITFIELD").arg(key), |command, fragment| {
            command.args(fragment.into_tokens())
        })
}

pub struct Bitmaps<'a> {
    invoker: &'a Invoker,
}

impl<'a> Bitmaps<'a> {
    pub(crate) fn new(invoker: &'a Invoker) -> Self {
        Self { invoker }
    }

    /// Previous value of the bit.
    pub async fn setbit(&self, key: &str, offset: u64, value: bool) -> Result<bool> {
        reply::boolean("SETBIT", self.invoker.invoke(setbit(key, offset, value)?).await?)
    }

    pub async fn getbit(&self, key: &str, offset: u64) -> Result<bool> {
        reply::boolean("GETBIT", self.invoker.invoke(getbit(key, offset)?).await?)
    }

    pub async fn bitcount(&self, key: &str, range: Option<(i64, i64)>) -> Result<i64> {
        reply::integer("BITCOUNT", self.invoker.invoke(bitcount(key, range)).await?)
    }

    /// Position of the first matching bit, or -1.
    pub async fn bitpos(
        &self,
        key: &str,
        bit: bool,
        start: Option<i64>,
        end: Option<i64>,
    ) -> Result<i64> {
        let command = bitpos(key, bit, start, end)?;
        reply::integer("BITPOS", self.invoker.invoke(command).await?)
    }

    /// Length of the destination string.
    pub async fn bitop(&self, operation: BitOperation, destination: &str, keys: &[&str]) -> Result<i64> {
        let command = bitop(operation, destination, keys)?;
        reply::integer("BITOP", self.invoker.invoke(command).await?)
    }

    /// One slot per GET/SET/INCRBY fragment, `None` where an increment was
    /// refused under `OVERFLOW FAIL`.
    pub async fn bitfield<I>(&self, key: &str, fragments: I) -> Result<Vec<Option<i64>>>
    where
        I: IntoIterator<Item = Fragment>,
    {
        reply::bitfield("BITFIELD", self.invoker.invoke(bitfield(key, fragments)).await?)
    }
}

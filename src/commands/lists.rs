//! Lists, including the blocking pops.
//!
//! Blocking timeouts are only shaped and forwarded; the wait happens on the
//! server and holds the shared connection for its duration.

use std::time::Duration;

use crate::command::{Arg, Command};
use crate::error::Result;
use crate::invoker::Invoker;
use crate::reply;
use crate::types::InsertPosition;

pub fn lpush<I, A>(key: &str, values: I) -> Result<Command>
where
    I: IntoIterator<Item = A>,
    A: Into<Arg>,
{
    super::keyed_variadic("LPUSH", key, "value", values)
}

pub fn lpushx<I, A>(key: &str, values: I) -> Result<Command>
where
    I: IntoIterator<Item = A>,
    A: Into<Arg>,
{
    super::keyed_variadic("LPUSHX", key, "value", values)
}

pub fn rpush<I, A>(key: &str, values: I) -> Result<Command>
where
    I: IntoIterator<Item = A>,
    A: Into<Arg>,
{
    super::keyed_variadic("RPUSH", key, "value", values)
}

pub fn rpushx<I, A>(key: &str, values: I) -> Result<Command>
where
    I: IntoIterator<Item = A>,
    A: Into<Arg>,
{
    super::keyed_variadic("RPUSHX", key, "value", values)
}

pub fn lpop(key: &str) -> Command {
    Command::new("LPOP").arg(key)
}

pub fn rpop(key: &str) -> Command {
    Command::new("RPOP").arg(key)
}

pub fn rpoplpush(source: &str, destination: &str) -> Command {
    Command::new("RPOPLPUSH").arg(source).arg(destination)
}

pub fn lrem(key: &str, count: i64, value: impl Into<Arg>) -> Command {
    Command::new("LREM").arg(key).arg(count).arg(value)
}

pub fn llen(key: &str) -> Command {
    Command::new("LLEN").arg(key)
}

pub fn lindex(key: &str, index: i64) -> Command {
    Command::new("LINDEX").arg(key).arg(index)
}

pub fn linsert(
    key: &str,
    position: InsertPosition,
    pivot: impl Into<Arg>,
    value: impl Into<Arg>,
) -> Command {
    Command::new("LINSERT")
        .arg(key)
        .arg(position.as_str())
        .arg(pivot)
        .arg(value)
}

pub fn lset(key: &str, index: i64, value: impl Into<Arg>) -> Command {
    Command::new("LSET").arg(key).arg(index).arg(value)
}

pub fn lrange(key: &str, start: i64, stop: i64) -> Command {
    Command::new("LRANGE").arg(key).arg(start).arg(stop)
}

pub fn ltrim(key: &str, start: i64, stop: i64) -> Command {
    Command::new("LTRIM").arg(key).arg(start).arg(stop)
}

pub fn blpop(keys: &[&str], timeout: Duration) -> Result<Command> {
    let keys = super::non_empty("BLPOP", "key", keys.iter().copied())?;
    Ok(Command::new("BLPOP").args(keys).arg(super::timeout_arg(timeout)))
}

pub fn brpop(keys: &[&str], timeout: Duration) -> Result<Command> {
    let keys = super::non_empty("BRPOP", "key", keys.iter().copied())?;
    Ok(Command::new("BRPOP").args(keys).arg(super::timeout_arg(timeout)))
}

pub fn brpoplpush(source: &str, destination: &str, timeout: Duration) -> Command {
    Command::new("BRPOPLPUSH")
        .arg(source)
        .arg(destination)
        .arg(super::timeout_arg(timeout))
}

pub struct Lists<'a> {
    invoker: &'a Invoker,
}

impl<'a> Lists<'a> {
    pub(crate) fn new(invoker: &'a Invoker) -> Self {
        Self { invoker }
    }

    /// Length of the list after the push.
    pub async fn lpush<I, A>(&self, key: &str, values: I) -> Result<i64>
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        reply::integer("LPUSH", self.invoker.invoke(lpush(key, values)?).await?)
    }

    /// Pushes only onto an existing list; 0 otherwise.
    pub async fn lpushx<I, A>(&self, key: &str, values: I) -> Result<i64>
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        reply::integer("LPUSHX", self.invoker.invoke(lpushx(key, values)?).await?)
    }

    pub async fn rpush<I, A>(&self, key: &str, values: I) -> Result<i64>
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        reply::integer("RPUSH", self.invoker.invoke(rpush(key, values)?).await?)
    }

    pub async fn rpushx<I, A>(&self, key: &str, values: I) -> Result<i64>
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        reply::integer("RPUSHX", self.invoker.invoke(rpushx(key, values)?).await?)
    }

    pub async fn lpop(&self, key: &str) -> Result<Option<String>> {
        reply::opt_string("LPOP", self.invoker.invoke(lpop(key)).await?)
    }

    pub async fn rpop(&self, key: &str) -> Result<Option<String>> {
        reply::opt_string("RPOP", self.invoker.invoke(rpop(key)).await?)
    }

    pub async fn rpoplpush(&self, source: &str, destination: &str) -> Result<Option<String>> {
        let command = rpoplpush(source, destination);
        reply::opt_string("RPOPLPUSH", self.invoker.invoke(command).await?)
    }

    pub async fn lrem(&self, key: &str, count: i64, value: impl Into<Arg>) -> Result<i64> {
        reply::integer("LREM", self.invoker.invoke(lrem(key, count, value)).await?)
    }

    pub async fn llen(&self, key: &str) -> Result<i64> {
        reply::integer("LLEN", self.invoker.invoke(llen(key)).await?)
    }

    pub async fn lindex(&self, key: &str, index: i64) -> Result<Option<String>> {
        reply::opt_string("LINDEX", self.invoker.invoke(lindex(key, index)).await?)
    }

    /// New length, or -1 when the pivot is not found.
    pub async fn linsert(
        &self,
        key: &str,
        position: InsertPosition,
        pivot: impl Into<Arg>,
        value: impl Into<Arg>,
    ) -> Result<i64> {
        let command = linsert(key, position, pivot, value);
        reply::integer("LINSERT", self.invoker.invoke(command).await?)
    }

    pub async fn lset(&self, key: &str, index: i64, value: impl Into<Arg>) -> Result<()> {
        reply::ok("LSET", self.invoker.invoke(lset(key, index, value)).await?)
    }

    pub async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        reply::string_list("LRANGE", self.invoker.invoke(lrange(key, start, stop)).await?)
    }

    pub async fn ltrim(&self, key: &str, start: i64, stop: i64) -> Result<()> {
        reply::ok("LTRIM", self.invoker.invoke(ltrim(key, start, stop)).await?)
    }

    /// `(key, element)` from the first non-empty list, `None` on timeout.
    pub async fn blpop(&self, keys: &[&str], timeout: Duration) -> Result<Option<(String, String)>> {
        reply::blocking_pop("BLPOP", self.invoker.invoke(blpop(keys, timeout)?).await?)
    }

    pub async fn brpop(&self, keys: &[&str], timeout: Duration) -> Result<Option<(String, String)>> {
        reply::blocking_pop("BRPOP", self.invoker.invoke(brpop(keys, timeout)?).await?)
    }

    pub async fn brpoplpush(
        &self,
        source: &str,
        destination: &str,
        timeout: Duration,
    ) -> Result<Option<String>> {
        let command = brpoplpush(source, destination, timeout);
        reply::opt_string("BRPOPLPUSH", self.invoker.invoke(command).await?)
    }
}

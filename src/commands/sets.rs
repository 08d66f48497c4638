//! Unordered sets and set algebra.

use crate::command::{Arg, Command};
use crate::error::Result;
use crate::invoker::Invoker;
use crate::reply;

pub fn sadd<I, A>(key: &str, members: I) -> Result<Command>
where
    I: IntoIterator<Item = A>,
    A: Into<Arg>,
{
    super::keyed_variadic("SADD", key, "member", members)
}

pub fn srem<I, A>(key: &str, members: I) -> Result<Command>
where
    I: IntoIterator<Item = A>,
    A: Into<Arg>,
{
    super::keyed_variadic("SREM", key, "member", members)
}

pub fn sismember(key: &str, member: impl Into<Arg>) -> Command {
    Command::new("SISMEMBER").arg(key).arg(member)
}

pub fn spop(key: &str) -> Command {
    Command::new("SPOP").arg(key)
}

pub fn srandmember(key: &str) -> Command {
    Command::new("SRANDMEMBER").arg(key)
}

/// Positive `count`: distinct members, at most the set size. Negative:
/// exactly `|count|` samples, repeats allowed.
pub fn srandmember_count(key: &str, count: i64) -> Command {
    Command::new("SRANDMEMBER").arg(key).arg(count)
}

pub fn smove(source: &str, destination: &str, member: impl Into<Arg>) -> Command {
    Command::new("SMOVE").arg(source).arg(destination).arg(member)
}

pub fn scard(key: &str) -> Command {
    Command::new("SCARD").arg(key)
}

pub fn smembers(key: &str) -> Command {
    Command::new("SMEMBERS").arg(key)
}

fn algebra(name: &'static str, keys: &[&str]) -> Result<Command> {
    Ok(Command::new(name).args(super::non_empty(name, "key", keys.iter().copied())?))
}

fn algebra_store(name: &'static str, destination: &str, keys: &[&str]) -> Result<Command> {
    super::keyed_variadic(name, destination, "source key", keys.iter().copied())
}

pub fn sinter(keys: &[&str]) -> Result<Command> {
    algebra("SINTER", keys)
}

pub fn sinterstore(destination: &str, keys: &[&str]) -> Result<Command> {
    algebra_store("SINTERSTORE", destination, keys)
}

pub fn sunion(keys: &[&str]) -> Result<Command> {
    algebra("SUNION", keys)
}

pub fn sunionstore(destination: &str, keys: &[&str]) -> Result<Command> {
    algebra_store("SUNIONSTORE", destination, keys)
}

pub fn sdiff(keys: &[&str]) -> Result<Command> {
    algebra("SDIFF", keys)
}

pub fn sdiffstore(destination: &str, keys: &[&str]) -> Result<Command> {
    algebra_store("SDIFFSTORE", destination, keys)
}

pub struct Sets<'a> {
    invoker: &'a Invoker,
}

impl<'a> Sets<'a> {
    pub(crate) fn new(invoker: &'a Invoker) -> Self {
        Self { invoker }
    }

    /// Number of members that were not already present.
    pub async fn sadd<I, A>(&self, key: &str, members: I) -> Result<i64>
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        reply::integer("SADD", self.invoker.invoke(sadd(key, members)?).await?)
    }

    pub async fn srem<I, A>(&self, key: &str, members: I) -> Result<i64>
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        reply::integer("SREM", self.invoker.invoke(srem(key, members)?).await?)
    }

    pub async fn sismember(&self, key: &str, member: impl Into<Arg>) -> Result<bool> {
        reply::boolean("SISMEMBER", self.invoker.invoke(sismember(key, member)).await?)
    }

    pub async fn spop(&self, key: &str) -> Result<Option<String>> {
        reply::opt_string("SPOP", self.invoker.invoke(spop(key)).await?)
    }

    pub async fn srandmember(&self, key: &str) -> Result<Option<String>> {
        reply::opt_string("SRANDMEMBER", self.invoker.invoke(srandmember(key)).await?)
    }

    pub async fn srandmember_count(&self, key: &str, count: i64) -> Result<Vec<String>> {
        let command = srandmember_count(key, count);
        reply::string_list("SRANDMEMBER", self.invoker.invoke(command).await?)
    }

    pub async fn smove(&self, source: &str, destination: &str, member: impl Into<Arg>) -> Result<bool> {
        let command = smove(source, destination, member);
        reply::boolean("SMOVE", self.invoker.invoke(command).await?)
    }

    pub async fn scard(&self, key: &str) -> Result<i64> {
        reply::integer("SCARD", self.invoker.invoke(scard(key)).await?)
    }

    pub async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        reply::string_list("SMEMBERS", self.invoker.invoke(smembers(key)).await?)
    }

    pub async fn sinter(&self, keys: &[&str]) -> Result<Vec<String>> {
        reply::string_list("SINTER", self.invoker.invoke(sinter(keys)?).await?)
    }

    /// Cardinality of the stored result.
    pub async fn sinterstore(&self, destination: &str, keys: &[&str]) -> Result<i64> {
        let command = sinterstore(destination, keys)?;
        reply::integer("SINTERSTORE", self.invoker.invoke(command).await?)
    }

    pub async fn sunion(&self, keys: &[&str]) -> Result<Vec<String>> {
        reply::string_list("SUNION", self.invoker.invoke(sunion(keys)?).await?)
    }

    pub async fn sunionstore(&self, destination: &str, keys: &[&str]) -> Result<i64> {
        let command = sunionstore(destination, keys)?;
        reply::integer("SUNIONSTORE", self.invoker.invoke(command).await?)
    }

    pub async fn sdiff(&self, keys: &[&str]) -> Result<Vec<String>> {
        reply::string_list("SDIFF", self.invoker.invoke(sdiff(keys)?).await?)
    }

    pub async fn sdiffstore(&self, destination: &str, keys: &[&str]) -> Result<i64> {
        let command = sdiffstore(destination, keys)?;
        reply::integer("SDIFFSTORE", self.invoker.invoke(command).await?)
    }
}

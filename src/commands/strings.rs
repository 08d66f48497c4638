//! String values and counters.

use crate::command::{Arg, Command};
use crate::error::{ProxyError, Result};
use crate::invoker::Invoker;
use crate::reply;
use crate::types::{Expiry, SetCondition, SetOptions};

/// `SET key value [EX s|PX ms] [NX|XX|KEEPTTL] [flag]`.
pub fn set(key: &str, value: impl Into<Arg>, options: &SetOptions) -> Result<Command> {
    if options.condition == Some(SetCondition::KeepTtl) && options.expiry.is_some() {
        return Err(ProxyError::argument(
            "SET",
            "KEEPTTL cannot be combined with an expiry",
        ));
    }

    if matches!(
        options.expiry,
        Some(Expiry::Seconds(0)) | Some(Expiry::Milliseconds(0))
    ) {
        return Err(ProxyError::argument("SET", "expiry must be positive"));
    }

    let mut command = Command::new("SET").arg(key).arg(value);
    match options.expiry {
        Some(Expiry::Seconds(s)) => command = command.arg("EX").arg(s),
        Some(Expiry::Milliseconds(ms)) => command = command.arg("PX").arg(ms),
        None => {}
    }
    if let Some(condition) = options.condition {
        command = command.arg(condition.as_str());
    }
    if let Some(flag) = options.flag {
        command = command.arg(flag.as_str());
    }
    Ok(command)
}

pub fn get(key: &str) -> Command {
    Command::new("GET").arg(key)
}

pub fn getset(key: &str, value: impl Into<Arg>) -> Command {
    Command::new("GETSET").arg(key).arg(value)
}

pub fn strlen(key: &str) -> Command {
    Command::new("STRLEN").arg(key)
}

pub fn append(key: &str, value: impl Into<Arg>) -> Command {
    Command::new("APPEND").arg(key).arg(value)
}

pub fn incr(key: &str) -> Command {
    Command::new("INCR").arg(key)
}

pub fn incrby(key: &str, increment: i64) -> Command {
    Command::new("INCRBY").arg(key).arg(increment)
}

pub fn incrbyfloat(key: &str, increment: f64) -> Command {
    Command::new("INCRBYFLOAT").arg(key).arg(increment)
}

pub fn decr(key: &str) -> Command {
    Command::new("DECR").arg(key)
}

pub fn decrby(key: &str, decrement: i64) -> Command {
    Command::new("DECRBY").arg(key).arg(decrement)
}

fn pairs<I, K, V>(name: &'static str, pairs: I) -> Result<Command>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<Arg>,
    V: Into<Arg>,
{
    let flat = pairs
        .into_iter()
        .flat_map(|(k, v)| -> [Arg; 2] { [k.into(), v.into()] });
    Ok(Command::new(name).args(super::non_empty(name, "key/value pair", flat)?))
}

pub fn mset<I, K, V>(entries: I) -> Result<Command>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<Arg>,
    V: Into<Arg>,
{
    pairs("MSET", entries)
}

pub fn msetnx<I, K, V>(entries: I) -> Result<Command>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<Arg>,
    V: Into<Arg>,
{
    pairs("MSETNX", entries)
}

pub fn mget(keys: &[&str]) -> Result<Command> {
    Ok(Command::new("MGET").args(super::non_empty("MGET", "key", keys.iter().copied())?))
}

pub struct Strings<'a> {
    invoker: &'a Invoker,
}

impl<'a> Strings<'a> {
    pub(crate) fn new(invoker: &'a Invoker) -> Self {
        Self { invoker }
    }

    /// Returns `false` when an NX/XX condition prevented the write.
    pub async fn set(&self, key: &str, value: impl Into<Arg>, options: &SetOptions) -> Result<bool> {
        let reply = self.invoker.invoke(set(key, value, options)?).await?;
        if reply.is_null() {
            return Ok(false);
        }
        reply::ok("SET", reply).map(|_| true)
    }

    /// `None` for a missing key; an empty value is `Some("")`.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        reply::opt_string("GET", self.invoker.invoke(get(key)).await?)
    }

    pub async fn getset(&self, key: &str, value: impl Into<Arg>) -> Result<Option<String>> {
        reply::opt_string("GETSET", self.invoker.invoke(getset(key, value)).await?)
    }

    pub async fn strlen(&self, key: &str) -> Result<i64> {
        reply::integer("STRLEN", self.invoker.invoke(strlen(key)).await?)
    }

    /// Length of the value after the append.
    pub async fn append(&self, key: &str, value: impl Into<Arg>) -> Result<i64> {
        reply::integer("APPEND", self.invoker.invoke(append(key, value)).await?)
    }

    pub async fn incr(&self, key: &str) -> Result<i64> {
        reply::integer("INCR", self.invoker.invoke(incr(key)).await?)
    }

    pub async fn incrby(&self, key: &str, increment: i64) -> Result<i64> {
        reply::integer("INCRBY", self.invoker.invoke(incrby(key, increment)).await?)
    }

    pub async fn incrbyfloat(&self, key: &str, increment: f64) -> Result<f64> {
        reply::float("INCRBYFLOAT", self.invoker.invoke(incrbyfloat(key, increment)).await?)
    }

    pub async fn decr(&self, key: &str) -> Result<i64> {
        reply::integer("DECR", self.invoker.invoke(decr(key)).await?)
    }

    pub async fn decrby(&self, key: &str, decrement: i64) -> Result<i64> {
        reply::integer("DECRBY", self.invoker.invoke(decrby(key, decrement)).await?)
    }

    pub async fn mset<I, K, V>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Arg>,
        V: Into<Arg>,
    {
        reply::ok("MSET", self.invoker.invoke(mset(entries)?).await?)
    }

    /// `false` (and nothing written) when any key already exists.
    pub async fn msetnx<I, K, V>(&self, entries: I) -> Result<bool>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Arg>,
        V: Into<Arg>,
    {
        reply::boolean("MSETNX", self.invoker.invoke(msetnx(entries)?).await?)
    }

    pub async fn mget(&self, keys: &[&str]) -> Result<Vec<Option<String>>> {
        reply::opt_string_list("MGET", self.invoker.invoke(mget(keys)?).await?)
    }
}

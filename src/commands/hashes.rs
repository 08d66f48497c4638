//! Hash fields.

use std::collections::{BTreeMap, HashMap};

use crate::command::{Arg, Command};
use crate::error::{ProxyError, Result};
use crate::invoker::Invoker;
use crate::reply;

/// Field/value input of HMSET: either a flat alternating list or pairs.
/// Both encode identically on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum HashFields {
    Flat(Vec<Arg>),
    Pairs(Vec<(Arg, Arg)>),
}

impl HashFields {
    /// `field, value, field, value, ...`
    pub fn flat<I, A>(items: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        HashFields::Flat(items.into_iter().map(Into::into).collect())
    }

    fn into_args(self) -> Result<Vec<Arg>> {
        let args = match self {
            HashFields::Flat(items) => {
                if items.len() % 2 != 0 {
                    return Err(ProxyError::argument(
                        "HMSET",
                        format!("odd number of field/value arguments ({})", items.len()),
                    ));
                }
                items
            }
            HashFields::Pairs(pairs) => pairs.into_iter().flat_map(|(f, v)| [f, v]).collect(),
        };
        if args.is_empty() {
            return Err(ProxyError::argument("HMSET", "at least one field is required"));
        }
        Ok(args)
    }
}

impl<K: Into<Arg>, V: Into<Arg>> From<Vec<(K, V)>> for HashFields {
    fn from(pairs: Vec<(K, V)>) -> Self {
        HashFields::Pairs(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<Arg>, V: Into<Arg>, const N: usize> From<[(K, V); N]> for HashFields {
    fn from(pairs: [(K, V); N]) -> Self {
        HashFields::Pairs(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<'a> From<&'a [(&'a str, &'a str)]> for HashFields {
    fn from(pairs: &'a [(&'a str, &'a str)]) -> Self {
        HashFields::Pairs(pairs.iter().map(|(k, v)| (Arg::from(*k), Arg::from(*v))).collect())
    }
}

impl<K: Into<Arg>, V: Into<Arg>> From<HashMap<K, V>> for HashFields {
    fn from(map: HashMap<K, V>) -> Self {
        HashFields::Pairs(map.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<Arg>, V: Into<Arg>> From<BTreeMap<K, V>> for HashFields {
    fn from(map: BTreeMap<K, V>) -> Self {
        HashFields::Pairs(map.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

pub fn hset(key: &str, field: &str, value: impl Into<Arg>) -> Command {
    Command::new("HSET").arg(key).arg(field).arg(value)
}

pub fn hsetnx(key: &str, field: &str, value: impl Into<Arg>) -> Command {
    Command::new("HSETNX").arg(key).arg(field).arg(value)
}

pub fn hget(key: &str, field: &str) -> Command {
    Command::new("HGET").arg(key).arg(field)
}

pub fn hexists(key: &str, field: &str) -> Command {
    Command::new("HEXISTS").arg(key).arg(field)
}

pub fn hdel(key: &str, fields: &[&str]) -> Result<Command> {
    super::keyed_variadic("HDEL", key, "field", fields.iter().copied())
}

pub fn hlen(key: &str) -> Command {
    Command::new("HLEN").arg(key)
}

pub fn hstrlen(key: &str, field: &str) -> Command {
    Command::new("HSTRLEN").arg(key).arg(field)
}

pub fn hincrby(key: &str, field: &str, increment: i64) -> Command {
    Command::new("HINCRBY").arg(key).arg(field).arg(increment)
}

pub fn hincrbyfloat(key: &str, field: &str, increment: f64) -> Command {
    Command::new("HINCRBYFLOAT").arg(key).arg(field).arg(increment)
}

pub fn hmset(key: &str, fields: impl Into<HashFields>) -> Result<Command> {
    Ok(Command::new("HMSET").arg(key).args(fields.into().into_args()?))
}

pub fn hmget(key: &str, fields: &[&str]) -> Result<Command> {
    super::keyed_variadic("HMGET", key, "field", fields.iter().copied())
}

pub fn hkeys(key: &str) -> Command {
    Command::new("HKEYS").arg(key)
}

pub fn hvals(key: &str) -> Command {
    Command::new("HVALS").arg(key)
}

pub fn hgetall(key: &str) -> Command {
    Command::new("HGETALL").arg(key)
}

pub struct Hashes<'a> {
    invoker: &'a Invoker,
}

impl<'a> Hashes<'a> {
    pub(crate) fn new(invoker: &'a Invoker) -> Self {
        Self { invoker }
    }

    /// `true` when the field is new.
    pub async fn hset(&self, key: &str, field: &str, value: impl Into<Arg>) -> Result<bool> {
        reply::boolean("HSET", self.invoker.invoke(hset(key, field, value)).await?)
    }

    pub async fn hsetnx(&self, key: &str, field: &str, value: impl Into<Arg>) -> Result<bool> {
        reply::boolean("HSETNX", self.invoker.invoke(hsetnx(key, field, value)).await?)
    }

    pub async fn hget(&self, key: &str, field: &str) -> Result<Option<String>> {
        reply::opt_string("HGET", self.invoker.invoke(hget(key, field)).await?)
    }

    pub async fn hexists(&self, key: &str, field: &str) -> Result<bool> {
        reply::boolean("HEXISTS", self.invoker.invoke(hexists(key, field)).await?)
    }

    pub async fn hdel(&self, key: &str, fields: &[&str]) -> Result<i64> {
        reply::integer("HDEL", self.invoker.invoke(hdel(key, fields)?).await?)
    }

    pub async fn hlen(&self, key: &str) -> Result<i64> {
        reply::integer("HLEN", self.invoker.invoke(hlen(key)).await?)
    }

    pub async fn hstrlen(&self, key: &str, field: &str) -> Result<i64> {
        reply::integer("HSTRLEN", self.invoker.invoke(hstrlen(key, field)).await?)
    }

    pub async fn hincrby(&self, key: &str, field: &str, increment: i64) -> Result<i64> {
        reply::integer("HINCRBY", self.invoker.invoke(hincrby(key, field, increment)).await?)
    }

    pub async fn hincrbyfloat(&self, key: &str, field: &str, increment: f64) -> Result<f64> {
        let command = hincrbyfloat(key, field, increment);
        reply::float("HINCRBYFLOAT", self.invoker.invoke(command).await?)
    }

    pub async fn hmset(&self, key: &str, fields: impl Into<HashFields>) -> Result<()> {
        reply::ok("HMSET", self.invoker.invoke(hmset(key, fields)?).await?)
    }

    pub async fn hmget(&self, key: &str, fields: &[&str]) -> Result<Vec<Option<String>>> {
        reply::opt_string_list("HMGET", self.invoker.invoke(hmget(key, fields)?).await?)
    }

    pub async fn hkeys(&self, key: &str) -> Result<Vec<String>> {
        reply::string_list("HKEYS", self.invoker.invoke(hkeys(key)).await?)
    }

    pub async fn hvals(&self, key: &str) -> Result<Vec<String>> {
        reply::string_list("HVALS", self.invoker.invoke(hvals(key)).await?)
    }

    /// Empty map for a missing key.
    pub async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        reply::field_map("HGETALL", self.invoker.invoke(hgetall(key)).await?)
    }
}

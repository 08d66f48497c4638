//! MULTI/EXEC batches.
//!
//! Appends are chained by value. A typed append whose arguments are invalid
//! poisons the batch; `exec` then returns that error without touching the
//! connection.

use crate::command::{Arg, Command};
use crate::commands::{hashes, keys, lists, sets, strings, zsets, ScoredMembers};
use crate::error::{ProxyError, Result};
use crate::invoker::Invoker;
use crate::resp::RespValue;
use crate::types::SetOptions;

#[must_use = "a batch does nothing until exec is called"]
pub struct Batch<'a> {
    invoker: &'a Invoker,
    commands: Vec<Command>,
    error: Option<ProxyError>,
}

impl<'a> Batch<'a> {
    pub(crate) fn new(invoker: &'a Invoker) -> Self {
        Self {
            invoker,
            commands: Vec::new(),
            error: None,
        }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Append any command, e.g. one made by a family builder.
    pub fn add(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    fn push(mut self, command: Result<Command>) -> Self {
        match command {
            Ok(command) => self.commands.push(command),
            Err(err) => {
                self.error.get_or_insert(err);
            }
        }
        self
    }

    pub fn set(self, key: &str, value: impl Into<Arg>, options: &SetOptions) -> Self {
        self.push(strings::set(key, value, options))
    }

    pub fn get(self, key: &str) -> Self {
        self.add(strings::get(key))
    }

    pub fn incr(self, key: &str) -> Self {
        self.add(strings::incr(key))
    }

    pub fn incrby(self, key: &str, increment: i64) -> Self {
        self.add(strings::incrby(key, increment))
    }

    pub fn del(self, keys: &[&str]) -> Self {
        self.push(keys::del(keys))
    }

    pub fn expire(self, key: &str, seconds: u64) -> Self {
        self.add(keys::expire(key, seconds))
    }

    pub fn hset(self, key: &str, field: &str, value: impl Into<Arg>) -> Self {
        self.add(hashes::hset(key, field, value))
    }

    pub fn hget(self, key: &str, field: &str) -> Self {
        self.add(hashes::hget(key, field))
    }

    pub fn rpush<I, A>(self, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        self.push(lists::rpush(key, values))
    }

    pub fn lpush<I, A>(self, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        self.push(lists::lpush(key, values))
    }

    pub fn sadd<I, A>(self, key: &str, members: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        self.push(sets::sadd(key, members))
    }

    pub fn zadd(self, key: &str, members: impl Into<ScoredMembers>) -> Self {
        self.push(zsets::zadd(key, members))
    }

    /// Submit the batch. Resolves to one raw reply per appended command, in
    /// order. Any failure aborts the whole batch.
    pub async fn exec(self) -> Result<Vec<RespValue>> {
        if let Some(err) = self.error {
            return Err(err);
        }
        self.invoker.exec_batch(self.commands).await
    }
}

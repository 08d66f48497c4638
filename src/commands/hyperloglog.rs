//! HyperLogLog cardinality estimators.

use crate::command::{Arg, Command};
use crate::error::Result;
use crate::invoker::Invoker;
use crate::reply;

pub fn pfadd<I, A>(key: &str, elements: I) -> Result<Command>
where
    I: IntoIterator<Item = A>,
    A: Into<Arg>,
{
    super::keyed_variadic("PFADD", key, "element", elements)
}

pub fn pfcount(keys: &[&str]) -> Result<Command> {
    Ok(Command::new("PFCOUNT").args(super::non_empty("PFCOUNT", "key", keys.iter().copied())?))
}

/// The destination is created when missing.
pub fn pfmerge(destination: &str, sources: &[&str]) -> Result<Command> {
    super::keyed_variadic("PFMERGE", destination, "source key", sources.iter().copied())
}

pub struct HyperLogLog<'a> {
    invoker: &'a Invoker,
}

impl<'a> HyperLogLog<'a> {
    pub(crate) fn new(invoker: &'a Invoker) -> Self {
        Self { invoker }
    }

    /// `true` when the estimate changed.
    pub async fn pfadd<I, A>(&self, key: &str, elements: I) -> Result<bool>
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        reply::boolean("PFADD", self.invoker.invoke(pfadd(key, elements)?).await?)
    }

    /// Approximate cardinality of the union of `keys`.
    pub async fn pfcount(&self, keys: &[&str]) -> Result<i64> {
        reply::integer("PFCOUNT", self.invoker.invoke(pfcount(keys)?).await?)
    }

    pub async fn pfmerge(&self, destination: &str, sources: &[&str]) -> Result<()> {
        reply::ok("PFMERGE", self.invoker.invoke(pfmerge(destination, sources)?).await?)
    }
}

//! Sorted sets.
//!
//! The wire order of ZADD is `score member`; callers supply members first
//! and the builder swaps each pair.

use crate::command::{Arg, Command};
use crate::error::{ProxyError, Result};
use crate::invoker::Invoker;
use crate::reply;
use crate::types::ZMember;

/// Member/score input of ZADD.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoredMembers {
    Pairs(Vec<ZMember>),
    /// `member, score, member, score, ...`
    Interleaved(Vec<Arg>),
}

impl ScoredMembers {
    pub fn interleaved<I, A>(items: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        ScoredMembers::Interleaved(items.into_iter().map(Into::into).collect())
    }

    /// Wire tokens in `score member` order.
    fn into_args(self) -> Result<Vec<Arg>> {
        let args: Vec<Arg> = match self {
            ScoredMembers::Pairs(members) => members
                .into_iter()
                .flat_map(|m| [Arg::from(m.score), Arg::from(m.member)])
                .collect(),
            ScoredMembers::Interleaved(items) => {
                if items.len() % 2 != 0 {
                    return Err(ProxyError::argument(
                        "ZADD",
                        format!("odd number of member/score arguments ({})", items.len()),
                    ));
                }
                let mut args = Vec::with_capacity(items.len());
                let mut items = items.into_iter();
                while let (Some(member), Some(score)) = (items.next(), items.next()) {
                    let score = score.as_f64().ok_or_else(|| {
                        ProxyError::argument("ZADD", format!("score '{}' is not a number", score))
                    })?;
                    args.push(Arg::from(score));
                    args.push(member);
                }
                args
            }
        };
        if args.is_empty() {
            return Err(ProxyError::argument("ZADD", "at least one member is required"));
        }
        Ok(args)
    }
}

impl From<Vec<ZMember>> for ScoredMembers {
    fn from(members: Vec<ZMember>) -> Self {
        ScoredMembers::Pairs(members)
    }
}

impl From<&[ZMember]> for ScoredMembers {
    fn from(members: &[ZMember]) -> Self {
        ScoredMembers::Pairs(members.to_vec())
    }
}

impl<M: Into<String>> From<Vec<(M, f64)>> for ScoredMembers {
    fn from(pairs: Vec<(M, f64)>) -> Self {
        ScoredMembers::Pairs(pairs.into_iter().map(|(m, s)| ZMember::new(m, s)).collect())
    }
}

impl<M: Into<String>, const N: usize> From<[(M, f64); N]> for ScoredMembers {
    fn from(pairs: [(M, f64); N]) -> Self {
        ScoredMembers::Pairs(pairs.into_iter().map(|(m, s)| ZMember::new(m, s)).collect())
    }
}

pub fn zadd(key: &str, members: impl Into<ScoredMembers>) -> Result<Command> {
    Ok(Command::new("ZADD").arg(key).args(members.into().into_args()?))
}

pub fn zscore(key: &str, member: impl Into<Arg>) -> Command {
    Command::new("ZSCORE").arg(key).arg(member)
}

pub fn zincrby(key: &str, increment: f64, member: impl Into<Arg>) -> Command {
    Command::new("ZINCRBY").arg(key).arg(increment).arg(member)
}

pub fn zcard(key: &str) -> Command {
    Command::new("ZCARD").arg(key)
}

/// Bounds accept numbers or the textual forms `-inf`, `+inf`, `(1.5`.
pub fn zcount(key: &str, min: impl Into<Arg>, max: impl Into<Arg>) -> Command {
    Command::new("ZCOUNT").arg(key).arg(min).arg(max)
}

pub fn zrange(key: &str, start: i64, stop: i64) -> Command {
    Command::new("ZRANGE").arg(key).arg(start).arg(stop)
}

pub fn zrange_with_scores(key: &str, start: i64, stop: i64) -> Command {
    zrange(key, start, stop).arg("WITHSCORES")
}

pub fn zrevrange(key: &str, start: i64, stop: i64) -> Command {
    Command::new("ZREVRANGE").arg(key).arg(start).arg(stop)
}

pub fn zrevrange_with_scores(key: &str, start: i64, stop: i64) -> Command {
    zrevrange(key, start, stop).arg("WITHSCORES")
}

pub fn zrank(key: &str, member: impl Into<Arg>) -> Command {
    Command::new("ZRANK").arg(key).arg(member)
}

pub fn zrevrank(key: &str, member: impl Into<Arg>) -> Command {
    Command::new("ZREVRANK").arg(key).arg(member)
}

pub fn zrem<I, A>(key: &str, members: I) -> Result<Command>
where
    I: IntoIterator<Item = A>,
    A: Into<Arg>,
{
    super::keyed_variadic("ZREM", key, "member", members)
}

pub struct ZSets<'a> {
    invoker: &'a Invoker,
}

impl<'a> ZSets<'a> {
    pub(crate) fn new(invoker: &'a Invoker) -> Self {
        Self { invoker }
    }

    /// Number of members newly added.
    pub async fn zadd(&self, key: &str, members: impl Into<ScoredMembers>) -> Result<i64> {
        reply::integer("ZADD", self.invoker.invoke(zadd(key, members)?).await?)
    }

    /// `None` when the member (or key) is absent. A score of zero is
    /// `Some(0.0)`.
    pub async fn zscore(&self, key: &str, member: impl Into<Arg>) -> Result<Option<f64>> {
        reply::opt_float("ZSCORE", self.invoker.invoke(zscore(key, member)).await?)
    }

    /// New score of the member.
    pub async fn zincrby(&self, key: &str, increment: f64, member: impl Into<Arg>) -> Result<f64> {
        let command = zincrby(key, increment, member);
        reply::float("ZINCRBY", self.invoker.invoke(command).await?)
    }

    pub async fn zcard(&self, key: &str) -> Result<i64> {
        reply::integer("ZCARD", self.invoker.invoke(zcard(key)).await?)
    }

    pub async fn zcount(&self, key: &str, min: impl Into<Arg>, max: impl Into<Arg>) -> Result<i64> {
        reply::integer("ZCOUNT", self.invoker.invoke(zcount(key, min, max)).await?)
    }

    pub async fn zrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        reply::string_list("ZRANGE", self.invoker.invoke(zrange(key, start, stop)).await?)
    }

    /// Ascending by score.
    pub async fn zrange_with_scores(&self, key: &str, start: i64, stop: i64) -> Result<Vec<ZMember>> {
        let command = zrange_with_scores(key, start, stop);
        reply::scored_members("ZRANGE", self.invoker.invoke(command).await?)
    }

    pub async fn zrevrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        let command = zrevrange(key, start, stop);
        reply::string_list("ZREVRANGE", self.invoker.invoke(command).await?)
    }

    pub async fn zrevrange_with_scores(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> Result<Vec<ZMember>> {
        let command = zrevrange_with_scores(key, start, stop);
        reply::scored_members("ZREVRANGE", self.invoker.invoke(command).await?)
    }

    pub async fn zrank(&self, key: &str, member: impl Into<Arg>) -> Result<Option<i64>> {
        reply::opt_integer("ZRANK", self.invoker.invoke(zrank(key, member)).await?)
    }

    pub async fn zrevrank(&self, key: &str, member: impl Into<Arg>) -> Result<Option<i64>> {
        reply::opt_integer("ZREVRANK", self.invoker.invoke(zrevrank(key, member)).await?)
    }

    pub async fn zrem<I, A>(&self, key: &str, members: I) -> Result<i64>
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        reply::integer("ZREM", self.invoker.invoke(zrem(key, members)?).await?)
    }
}

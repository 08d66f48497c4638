//! Key lifecycle: existence, deletion, expiry.

use crate::command::Command;
use crate::error::Result;
use crate::invoker::Invoker;
use crate::reply;
use crate::types::Ttl;

pub fn ping(message: Option<&str>) -> Command {
    Command::new("PING").args(message)
}

pub fn exists(keys: &[&str]) -> Result<Command> {
    Ok(Command::new("EXISTS").args(super::non_empty("EXISTS", "key", keys.iter().copied())?))
}

pub fn del(keys: &[&str]) -> Result<Command> {
    Ok(Command::new("DEL").args(super::non_empty("DEL", "key", keys.iter().copied())?))
}

pub fn expire(key: &str, seconds: u64) -> Command {
    Command::new("EXPIRE").arg(key).arg(seconds)
}

pub fn expireat(key: &str, unix_secs: u64) -> Command {
    Command::new("EXPIREAT").arg(key).arg(unix_secs)
}

pub fn pexpire(key: &str, millis: u64) -> Command {
    Command::new("PEXPIRE").arg(key).arg(millis)
}

pub fn pexpireat(key: &str, unix_millis: u64) -> Command {
    Command::new("PEXPIREAT").arg(key).arg(unix_millis)
}

pub fn ttl(key: &str) -> Command {
    Command::new("TTL").arg(key)
}

pub fn pttl(key: &str) -> Command {
    Command::new("PTTL").arg(key)
}

pub fn persist(key: &str) -> Command {
    Command::new("PERSIST").arg(key)
}

pub struct Keys<'a> {
    invoker: &'a Invoker,
}

impl<'a> Keys<'a> {
    pub(crate) fn new(invoker: &'a Invoker) -> Self {
        Self { invoker }
    }

    pub async fn ping(&self, message: Option<&str>) -> Result<String> {
        reply::string("PING", self.invoker.invoke(ping(message)).await?)
    }

    /// Number of the given keys that exist (repeats count twice).
    pub async fn exists(&self, keys: &[&str]) -> Result<i64> {
        reply::integer("EXISTS", self.invoker.invoke(exists(keys)?).await?)
    }

    /// Number of keys actually removed.
    pub async fn del(&self, keys: &[&str]) -> Result<i64> {
        reply::integer("DEL", self.invoker.invoke(del(keys)?).await?)
    }

    /// `false` when the key does not exist.
    pub async fn expire(&self, key: &str, seconds: u64) -> Result<bool> {
        reply::boolean("EXPIRE", self.invoker.invoke(expire(key, seconds)).await?)
    }

    pub async fn expireat(&self, key: &str, unix_secs: u64) -> Result<bool> {
        reply::boolean("EXPIREAT", self.invoker.invoke(expireat(key, unix_secs)).await?)
    }

    pub async fn pexpire(&self, key: &str, millis: u64) -> Result<bool> {
        reply::boolean("PEXPIRE", self.invoker.invoke(pexpire(key, millis)).await?)
    }

    pub async fn pexpireat(&self, key: &str, unix_millis: u64) -> Result<bool> {
        reply::boolean("PEXPIREAT", self.invoker.invoke(pexpireat(key, unix_millis)).await?)
    }

    pub async fn ttl(&self, key: &str) -> Result<Ttl> {
        reply::ttl("TTL", self.invoker.invoke(ttl(key)).await?, false)
    }

    pub async fn pttl(&self, key: &str) -> Result<Ttl> {
        reply::ttl("PTTL", self.invoker.invoke(pttl(key)).await?, true)
    }

    /// `false` when the key is missing or has no expiry.
    pub async fn persist(&self, key: &str) -> Result<bool> {
        reply::boolean("PERSIST", self.invoker.invoke(persist(key)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{invoker, wire};
    use crate::error::ProxyError;
    use crate::resp::RespValue;
    use std::time::Duration;

    #[test]
    fn test_builders() {
        assert_eq!(wire(&ping(None)), "PING");
        assert_eq!(wire(&ping(Some("hi"))), "PING hi");
        assert_eq!(wire(&del(&["a", "b"]).unwrap()), "DEL a b");
        assert_eq!(wire(&pexpire("k", 1500)), "PEXPIRE k 1500");
        assert!(matches!(del(&[]), Err(ProxyError::Argument { .. })));
        assert!(exists(&[]).is_err());
    }

    #[tokio::test]
    async fn test_expire_and_ttl() {
        let (invoker, connector) = invoker(|cmd| {
            if cmd.is("EXPIRE") {
                RespValue::Integer(0)
            } else {
                RespValue::Integer(-2)
            }
        })
        .await;
        let keys = Keys::new(&invoker);

        assert!(!keys.expire("missing", 10).await.unwrap());
        assert_eq!(keys.ttl("missing").await.unwrap(), Ttl::Missing);
        assert_eq!(wire(&connector.last().unwrap()), "TTL missing");
    }

    #[tokio::test]
    async fn test_pttl_millis() {
        let (invoker, _) = invoker(|_| RespValue::Integer(2500)).await;
        let keys = Keys::new(&invoker);
        assert_eq!(
            keys.pttl("k").await.unwrap(),
            Ttl::ExpiresIn(Duration::from_millis(2500))
        );
    }

    #[tokio::test]
    async fn test_ping() {
        let (invoker, _) = invoker(|_| RespValue::SimpleString("PONG".into())).await;
        assert_eq!(Keys::new(&invoker).ping(None).await.unwrap(), "PONG");
    }
}

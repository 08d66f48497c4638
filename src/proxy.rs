use std::sync::Arc;

use crate::batch::Batch;
use crate::command::{Arg, Command};
use crate::commands::{Bitmaps, Hashes, HyperLogLog, Keys, Lists, Sets, Strings, ZSets};
use crate::config::ProxyConfig;
use crate::connection::{ConnectionManager, ConnectionObserver, ConnectionState};
use crate::error::Result;
use crate::invoker::Invoker;
use crate::logging::{LogSink, TracingSink};
use crate::reply;
use crate::resp::RespValue;
use crate::transport::{Connector, TcpConnector};

/// Typed client for one server. Owns exactly one connection.
///
/// ```no_run
/// use kvproxy::{Proxy, ProxyConfig, SetOptions};
///
/// # async fn demo() -> kvproxy::Result<()> {
/// let proxy = Proxy::new(ProxyConfig::from_url("redis://127.0.0.1:6379")?);
/// proxy.connect().await?;
///
/// proxy.strings().set("greeting", "hello", &SetOptions::new()).await?;
/// assert_eq!(proxy.strings().get("greeting").await?, Some("hello".to_string()));
///
/// proxy.stop(false).await?;
/// # Ok(())
/// # }
/// ```
pub struct Proxy {
    connection: Arc<ConnectionManager>,
    invoker: Invoker,
}

impl Proxy {
    /// TCP transport, `tracing` log sink.
    pub fn new(config: ProxyConfig) -> Self {
        Self::with_parts(Arc::new(TcpConnector::new(config)), Arc::new(TracingSink))
    }

    pub fn with_parts(connector: Arc<dyn Connector>, log: Arc<dyn LogSink>) -> Self {
        let connection = Arc::new(ConnectionManager::new(connector, log));
        let invoker = Invoker::new(connection.clone());
        Self { connection, invoker }
    }

    /// Resolves once the socket is established (before AUTH/SELECT).
    pub async fn start(&self) -> Result<()> {
        self.connection.start().await
    }

    pub async fn wait_ready(&self) -> Result<()> {
        self.connection.wait_ready().await
    }

    /// `start` followed by `wait_ready`.
    pub async fn connect(&self) -> Result<()> {
        self.connection.start().await?;
        self.connection.wait_ready().await
    }

    pub async fn stop(&self, flush: bool) -> Result<()> {
        self.connection.stop(flush).await
    }

    /// Ask the server to close the connection, then wait for the end.
    pub async fn quit(&self) -> Result<()> {
        let reply = self.invoker.invoke(Command::new("QUIT")).await?;
        reply::ok("QUIT", reply)?;
        self.connection.wait_closed().await
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn observe(&self, observer: Arc<dyn ConnectionObserver>) {
        self.connection.observe(observer);
    }

    pub fn error_count(&self) -> u64 {
        self.connection.error_count()
    }

    pub fn invoker(&self) -> &Invoker {
        &self.invoker
    }

    /// Raw command with untyped reply.
    pub async fn call<I, A>(&self, name: &str, args: I) -> Result<RespValue>
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        self.invoker.call(name, args).await
    }

    pub fn multi(&self) -> Batch<'_> {
        Batch::new(&self.invoker)
    }

    pub fn keys(&self) -> Keys<'_> {
        Keys::new(&self.invoker)
    }

    pub fn strings(&self) -> Strings<'_> {
        Strings::new(&self.invoker)
    }

    pub fn hashes(&self) -> Hashes<'_> {
        Hashes::new(&self.invoker)
    }

    pub fn lists(&self) -> Lists<'_> {
        Lists::new(&self.invoker)
    }

    pub fn sets(&self) -> Sets<'_> {
        Sets::new(&self.invoker)
    }

    pub fn zsets(&self) -> ZSets<'_> {
        ZSets::new(&self.invoker)
    }

    pub fn bitmaps(&self) -> Bitmaps<'_> {
        Bitmaps::new(&self.invoker)
    }

    pub fn hyperloglog(&self) -> HyperLogLog<'_> {
        HyperLogLog::new(&self.invoker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProxyError;
    use crate::logging::NoopSink;
    use crate::transport::mock::MockConnector;

    fn proxy(connector: &MockConnector) -> Proxy {
        Proxy::with_parts(Arc::new(connector.clone()), Arc::new(NoopSink))
    }

    #[tokio::test]
    async fn test_commands_fail_fast_before_connect() {
        let connector = MockConnector::ok();
        let proxy = proxy(&connector);

        let err = proxy.strings().get("k").await.unwrap_err();
        assert_eq!(err, ProxyError::NotConnected);
        assert!(connector.commands().is_empty());
    }

    #[tokio::test]
    async fn test_quit_closes() {
        let connector = MockConnector::ok();
        let proxy = proxy(&connector);
        proxy.connect().await.unwrap();

        proxy.quit().await.unwrap();
        assert_eq!(proxy.state(), ConnectionState::Closed);
        assert_eq!(
            proxy.keys().ping(None).await.unwrap_err(),
            ProxyError::NotConnected
        );
    }

    #[tokio::test]
    async fn test_call_raw() {
        let connector = MockConnector::new(|_| RespValue::Integer(3));
        let proxy = proxy(&connector);
        proxy.connect().await.unwrap();

        let reply = proxy.call("DBSIZE", Vec::<Arg>::new()).await.unwrap();
        assert_eq!(reply, RespValue::Integer(3));
    }
}

//! The one bridge between typed operations and the transport.

use std::sync::Arc;

use tracing::Level;

use crate::command::{Arg, Command};
use crate::connection::ConnectionManager;
use crate::error::{ProxyError, Result, TransportError};
use crate::resp::RespValue;

#[derive(Clone)]
pub struct Invoker {
    connection: Arc<ConnectionManager>,
}

impl Invoker {
    pub fn new(connection: Arc<ConnectionManager>) -> Self {
        Self { connection }
    }

    /// Submit one command. Fails fast with `NotConnected` unless the
    /// connection is ready, or reconnecting after having been ready; error
    /// replies become
    /// `TransportError::Server`. Never retries.
    pub async fn invoke(&self, command: Command) -> Result<RespValue> {
        let result: Result<RespValue> = match self.connection.transport() {
            Ok(transport) => match transport.invoke(&command).await {
                Ok(RespValue::Error(msg)) => Err(TransportError::Server(msg).into()),
                Ok(reply) => Ok(reply),
                Err(err) => Err(err.into()),
            },
            Err(err) => Err(err),
        };
        if let Err(err) = &result {
            self.report(command.name(), err);
        }
        result
    }

    pub async fn call<I, A>(&self, name: &str, args: I) -> Result<RespValue>
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        self.invoke(Command::new(name).args(args)).await
    }

    /// Run `commands` inside MULTI/EXEC as one write. Resolves to the
    /// per-command replies, or to the first failure as `ProxyError::Batch`.
    pub async fn exec_batch(&self, commands: Vec<Command>) -> Result<Vec<RespValue>> {
        let result = self.run_batch(commands).await;
        if let Err(err) = &result {
            self.report("EXEC", err);
        }
        result
    }

    async fn run_batch(&self, commands: Vec<Command>) -> Result<Vec<RespValue>> {
        let transport = self.connection.transport()?;
        if commands.is_empty() {
            return Ok(Vec::new());
        }

        let queued = commands.len();
        let mut frames = Vec::with_capacity(queued + 2);
        frames.push(Command::new("MULTI"));
        frames.extend(commands);
        frames.push(Command::new("EXEC"));

        let replies = transport.pipeline(&frames).await.map_err(ProxyError::Batch)?;
        let mut replies = replies.into_iter();

        if let Some(RespValue::Error(msg)) = replies.next() {
            return Err(batch_error(msg));
        }
        let mut first_error = None;
        for reply in replies.by_ref().take(queued) {
            if let RespValue::Error(msg) = reply {
                first_error.get_or_insert(msg);
            }
        }

        let exec = replies.next().ok_or_else(|| {
            ProxyError::Batch(TransportError::Protocol("missing EXEC reply".to_string()))
        })?;
        if let Some(msg) = first_error {
            return Err(batch_error(msg));
        }

        match exec {
            RespValue::Array(Some(results)) => {
                if let Some(msg) = results.iter().find_map(|r| match r {
                    RespValue::Error(msg) => Some(msg.clone()),
                    _ => None,
                }) {
                    return Err(batch_error(msg));
                }
                Ok(results)
            }
            RespValue::Error(msg) => Err(batch_error(msg)),
            RespValue::Array(None) | RespValue::BulkString(None) => {
                Err(batch_error("EXECABORT transaction aborted".to_string()))
            }
            other => Err(ProxyError::unexpected("EXEC", other)),
        }
    }

    fn report(&self, command: &str, err: &ProxyError) {
        self.connection
            .log(Level::WARN, &format!("command '{}' failed: {}", command, err));
    }
}

fn batch_error(msg: String) -> ProxyError {
    ProxyError::Batch(TransportError::Server(msg))
}

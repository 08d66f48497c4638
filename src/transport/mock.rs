//! Scripted in-memory transport for unit tests.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{Connector, EventSender, LifecycleEvent, Transport};
use crate::command::Command;
use crate::error::TransportError;
use crate::resp::RespValue;

type Handler = Box<dyn Fn(&Command) -> RespValue + Send + Sync>;

struct Inner {
    handler: Handler,
    auto_ready: bool,
    commands: Mutex<Vec<Command>>,
    events: Mutex<Option<EventSender>>,
}

/// Answers every command through `handler` and records what was sent.
#[derive(Clone)]
pub(crate) struct MockConnector {
    inner: Arc<Inner>,
}

impl MockConnector {
    pub(crate) fn new(handler: impl Fn(&Command) -> RespValue + Send + Sync + 'static) -> Self {
        Self::build(handler, true)
    }

    /// Emits `Connect` on start but never `Ready`.
    pub(crate) fn without_ready(
        handler: impl Fn(&Command) -> RespValue + Send + Sync + 'static,
    ) -> Self {
        Self::build(handler, false)
    }

    /// Replies `+OK` to everything.
    pub(crate) fn ok() -> Self {
        Self::new(|_| RespValue::ok())
    }

    fn build(handler: impl Fn(&Command) -> RespValue + Send + Sync + 'static, auto_ready: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                handler: Box::new(handler),
                auto_ready,
                commands: Mutex::new(Vec::new()),
                events: Mutex::new(None),
            }),
        }
    }

    pub(crate) fn commands(&self) -> Vec<Command> {
        self.inner.commands.lock().clone()
    }

    pub(crate) fn last(&self) -> Option<Command> {
        self.inner.commands.lock().last().cloned()
    }

    /// Inject a lifecycle event as if the wire produced it.
    pub(crate) fn emit(&self, event: LifecycleEvent) {
        let ended = event == LifecycleEvent::End;
        let mut events = self.inner.events.lock();
        if let Some(sender) = events.as_ref() {
            let _ = sender.send(event);
        }
        if ended {
            *events = None;
        }
    }
}

impl Connector for MockConnector {
    fn connect(&self, events: EventSender) -> Arc<dyn Transport> {
        let _ = events.send(LifecycleEvent::Connect);
        if self.inner.auto_ready {
            let _ = events.send(LifecycleEvent::Ready);
        }
        *self.inner.events.lock() = Some(events);
        Arc::new(MockTransport {
            inner: self.inner.clone(),
        })
    }
}

struct MockTransport {
    inner: Arc<Inner>,
}

impl MockTransport {
    fn answer(&self, command: &Command) -> Result<RespValue, TransportError> {
        if self.inner.events.lock().is_none() {
            return Err(TransportError::Closed);
        }
        self.inner.commands.lock().push(command.clone());
        Ok((self.inner.handler)(command))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn invoke(&self, command: &Command) -> Result<RespValue, TransportError> {
        let reply = self.answer(command)?;
        if command.is("QUIT") {
            if let Some(events) = self.inner.events.lock().take() {
                let _ = events.send(LifecycleEvent::End);
            }
        }
        Ok(reply)
    }

    async fn pipeline(&self, commands: &[Command]) -> Result<Vec<RespValue>, TransportError> {
        commands.iter().map(|command| self.answer(command)).collect()
    }

    async fn close(&self, _flush: bool) -> Result<(), TransportError> {
        if let Some(events) = self.inner.events.lock().take() {
            let _ = events.send(LifecycleEvent::End);
        }
        Ok(())
    }
}

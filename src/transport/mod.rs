//! The seam between the command layer and the wire.
//!
//! A [`Connector`] starts a [`Transport`] and reports its lifecycle through
//! an event channel. The transport owns reply correlation; callers only
//! see one reply (or error) per submitted command.

mod tcp;

#[cfg(test)]
pub(crate) mod mock;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::command::Command;
use crate::error::TransportError;
use crate::resp::RespValue;

pub use tcp::{TcpConnector, TcpTransport};

/// Transport-level lifecycle signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Socket established.
    Connect,
    /// Server accepted the session (after AUTH/SELECT).
    Ready,
    Error(String),
    Warning(String),
    Reconnecting { delay: Duration, attempt: u32 },
    /// Connection is gone for good.
    End,
}

impl LifecycleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::Connect => "connect",
            LifecycleEvent::Ready => "ready",
            LifecycleEvent::Error(_) => "error",
            LifecycleEvent::Warning(_) => "warning",
            LifecycleEvent::Reconnecting { .. } => "reconnecting",
            LifecycleEvent::End => "end",
        }
    }
}

pub type EventSender = mpsc::UnboundedSender<LifecycleEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<LifecycleEvent>;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Submit one command and wait for its reply. Error replies from the
    /// server come back as `Ok(RespValue::Error(..))`.
    async fn invoke(&self, command: &Command) -> Result<RespValue, TransportError>;

    /// Submit `commands` back to back with nothing interleaved, returning
    /// one reply per command in order.
    async fn pipeline(&self, commands: &[Command]) -> Result<Vec<RespValue>, TransportError>;

    /// Close the connection. With `flush` set, pending commands are
    /// rejected instead of awaited.
    async fn close(&self, flush: bool) -> Result<(), TransportError>;
}

pub trait Connector: Send + Sync {
    /// Start a transport; lifecycle events are sent to `events`.
    fn connect(&self, events: EventSender) -> Arc<dyn Transport>;
}

//! Connection lifecycle.
//!
//! The manager owns the one transport handle of a proxy. Its state is only
//! ever changed by lifecycle events, which a single task applies in arrival
//! order through [`ConnectionState::on_event`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::Level;

use crate::error::{ProxyError, Result};
use crate::logging::LogSink;
use crate::transport::{Connector, EventReceiver, LifecycleEvent, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Uninitialized,
    Connecting,
    Ready,
    /// Reconnecting after having been ready; commands are queued by the
    /// transport.
    Degraded,
    Closed,
}

impl ConnectionState {
    /// Whether commands may be submitted in this state.
    pub fn accepts_commands(&self) -> bool {
        matches!(self, ConnectionState::Ready | ConnectionState::Degraded)
    }

    /// Transition table.
    pub fn on_event(self, event: &LifecycleEvent) -> ConnectionState {
        use ConnectionState::*;

        match (self, event) {
            (Closed, _) => Closed,
            (_, LifecycleEvent::End) => Closed,
            (Uninitialized | Connecting, LifecycleEvent::Connect) => Connecting,
            (_, LifecycleEvent::Ready) => Ready,
            // Never been ready: keep the gate shut while retrying.
            (Uninitialized | Connecting, LifecycleEvent::Reconnecting { .. }) => Connecting,
            (_, LifecycleEvent::Reconnecting { .. }) => Degraded,
            (state, _) => state,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Uninitialized => "uninitialized",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Ready => "ready",
            ConnectionState::Degraded => "degraded",
            ConnectionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Receives every lifecycle event after it has been applied.
pub trait ConnectionObserver: Send + Sync {
    fn on_event(&self, event: &LifecycleEvent, from: ConnectionState, to: ConnectionState);
}

struct Shared {
    state: watch::Sender<ConnectionState>,
    transport: RwLock<Option<Arc<dyn Transport>>>,
    observers: RwLock<Vec<Arc<dyn ConnectionObserver>>>,
    errors: AtomicU64,
    log: Arc<dyn LogSink>,
}

pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    shared: Arc<Shared>,
}

impl ConnectionManager {
    pub fn new(connector: Arc<dyn Connector>, log: Arc<dyn LogSink>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Uninitialized);
        Self {
            connector,
            shared: Arc::new(Shared {
                state,
                transport: RwLock::new(None),
                observers: RwLock::new(Vec::new()),
                errors: AtomicU64::new(0),
                log,
            }),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    /// Number of `error` events seen since construction.
    pub fn error_count(&self) -> u64 {
        self.shared.errors.load(Ordering::Relaxed)
    }

    pub fn observe(&self, observer: Arc<dyn ConnectionObserver>) {
        self.shared.observers.write().push(observer);
    }

    pub(crate) fn log(&self, level: Level, message: &str) {
        self.shared.log.log(level, message);
    }

    /// Create the transport and resolve once its socket is established.
    ///
    /// Calling this on a manager that is already started logs a warning and
    /// does nothing. A closed manager may be started again.
    pub async fn start(&self) -> Result<()> {
        let claimed = self.shared.state.send_if_modified(|state| match state {
            ConnectionState::Uninitialized | ConnectionState::Closed => {
                *state = ConnectionState::Connecting;
                true
            }
            _ => false,
        });
        if !claimed {
            self.log(Level::WARN, "start called on an already started connection; ignoring");
            return Ok(());
        }

        let (events, inbox) = mpsc::unbounded_channel();
        let (connected, on_connect) = oneshot::channel();
        let transport = self.connector.connect(events);
        *self.shared.transport.write() = Some(transport);
        tokio::spawn(apply_events(self.shared.clone(), inbox, connected));

        on_connect.await.map_err(|_| ProxyError::NotConnected)
    }

    /// Wait until the connection is ready, failing if it closes first.
    pub async fn wait_ready(&self) -> Result<()> {
        if self.state() == ConnectionState::Uninitialized {
            return Err(ProxyError::NotConnected);
        }
        let mut state = self.shared.state.subscribe();
        let reached = state
            .wait_for(|s| matches!(s, ConnectionState::Ready | ConnectionState::Closed))
            .await
            .map(|s| *s)
            .map_err(|_| ProxyError::NotConnected)?;
        match reached {
            ConnectionState::Ready => Ok(()),
            _ => Err(ProxyError::NotConnected),
        }
    }

    pub(crate) async fn wait_closed(&self) -> Result<()> {
        let mut state = self.shared.state.subscribe();
        state
            .wait_for(|s| *s == ConnectionState::Closed)
            .await
            .map_err(|_| ProxyError::NotConnected)?;
        Ok(())
    }

    /// Close the connection. With `flush` set, commands still awaiting a
    /// reply are rejected; otherwise they are answered first.
    pub async fn stop(&self, flush: bool) -> Result<()> {
        let transport = self.shared.transport.read().clone();
        let transport = match transport {
            Some(transport) => transport,
            None => {
                self.log(Level::WARN, "stop called without a live connection; ignoring");
                return Ok(());
            }
        };
        transport.close(flush).await?;
        self.wait_closed().await
    }

    /// The live transport, if commands may be submitted right now.
    pub(crate) fn transport(&self) -> Result<Arc<dyn Transport>> {
        if !self.state().accepts_commands() {
            return Err(ProxyError::NotConnected);
        }
        self.shared
            .transport
            .read()
            .clone()
            .ok_or(ProxyError::NotConnected)
    }
}

async fn apply_events(
    shared: Arc<Shared>,
    mut inbox: EventReceiver,
    connected: oneshot::Sender<()>,
) {
    let mut connected = Some(connected);

    while let Some(event) = inbox.recv().await {
        match &event {
            LifecycleEvent::Connect => {
                if let Some(connected) = connected.take() {
                    let _ = connected.send(());
                }
            }
            LifecycleEvent::Error(_) => {
                shared.errors.fetch_add(1, Ordering::Relaxed);
            }
            LifecycleEvent::End => {
                *shared.transport.write() = None;
            }
            _ => {}
        }

        let from = *shared.state.borrow();
        let to = from.on_event(&event);
        shared.state.send_replace(to);
        shared.report(&event, from, to);

        if event == LifecycleEvent::End {
            return;
        }
    }

    // Transport dropped its sender without announcing the end.
    *shared.transport.write() = None;
    let from = shared.state.send_replace(ConnectionState::Closed);
    shared.report(&LifecycleEvent::End, from, ConnectionState::Closed);
}

impl Shared {
    fn report(&self, event: &LifecycleEvent, from: ConnectionState, to: ConnectionState) {
        let (level, message) = match event {
            LifecycleEvent::Connect => (Level::INFO, "connection established".to_string()),
            LifecycleEvent::Ready => (Level::INFO, "connection ready".to_string()),
            LifecycleEvent::Error(msg) => (Level::ERROR, format!("connection error: {}", msg)),
            LifecycleEvent::Warning(msg) => (Level::WARN, format!("connection warning: {}", msg)),
            LifecycleEvent::Reconnecting { delay, attempt } => (
                Level::WARN,
                format!(
                    "reconnecting in {}ms (attempt {})",
                    delay.as_millis(),
                    attempt
                ),
            ),
            LifecycleEvent::End => (Level::INFO, "connection ended".to_string()),
        };
        self.log.log(level, &format!("{} [{} -> {}]", message, from, to));

        let observers = self.observers.read().clone();
        for observer in observers {
            observer.on_event(event, from, to);
        }
    }
}

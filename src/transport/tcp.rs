//! RESP2 over TCP.
//!
//! One driver task owns the socket. Submissions reach it through an
//! unbounded channel and are written in arrival order; replies are matched
//! to submissions first-in first-out. While the connection is down new
//! submissions wait in a backlog and are written once the reconnect (and
//! its AUTH/SELECT handshake) succeeds. Submissions that were already
//! written when the socket failed are rejected, since the server may or
//! may not have executed them.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};

use super::{Connector, EventSender, LifecycleEvent, Transport};
use crate::command::Command;
use crate::config::ProxyConfig;
use crate::error::TransportError;
use crate::resp::{RespReader, RespValue};

type Reply = Result<Vec<RespValue>, TransportError>;

struct Request {
    frames: Vec<u8>,
    expected: usize,
    quit: bool,
    respond: oneshot::Sender<Reply>,
}

enum Control {
    Submit(Request),
    Close {
        flush: bool,
        done: oneshot::Sender<()>,
    },
}

/// Opens [`TcpTransport`]s for one server configuration.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    config: ProxyConfig,
}

impl TcpConnector {
    pub fn new(config: ProxyConfig) -> Self {
        Self { config }
    }
}

impl Connector for TcpConnector {
    fn connect(&self, events: EventSender) -> Arc<dyn Transport> {
        let (control, inbox) = mpsc::unbounded_channel();
        tokio::spawn(drive(self.config.clone(), inbox, events));
        Arc::new(TcpTransport { control })
    }
}

/// Handle to a driver task; cheap to share.
pub struct TcpTransport {
    control: mpsc::UnboundedSender<Control>,
}

impl TcpTransport {
    async fn submit(&self, frames: Vec<u8>, expected: usize, quit: bool) -> Reply {
        let (respond, reply) = oneshot::channel();
        self.control
            .send(Control::Submit(Request {
                frames,
                expected,
                quit,
                respond,
            }))
            .map_err(|_| TransportError::Closed)?;
        reply.await.map_err(|_| TransportError::Closed)?
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn invoke(&self, command: &Command) -> Result<RespValue, TransportError> {
        let mut frames = Vec::new();
        command.encode_into(&mut frames);
        let mut replies = self.submit(frames, 1, command.is("QUIT")).await?;
        replies
            .pop()
            .ok_or_else(|| TransportError::Protocol("missing reply".to_string()))
    }

    async fn pipeline(&self, commands: &[Command]) -> Result<Vec<RespValue>, TransportError> {
        if commands.is_empty() {
            return Ok(Vec::new());
        }
        let mut frames = Vec::new();
        for command in commands {
            command.encode_into(&mut frames);
        }
        self.submit(frames, commands.len(), false).await
    }

    async fn close(&self, flush: bool) -> Result<(), TransportError> {
        let (done, closed) = oneshot::channel();
        if self.control.send(Control::Close { flush, done }).is_err() {
            // Driver already gone.
            return Ok(());
        }
        let _ = closed.await;
        Ok(())
    }
}

struct InFlight {
    expected: usize,
    replies: Vec<RespValue>,
    respond: oneshot::Sender<Reply>,
}

enum Exit {
    /// Close requested (or every handle dropped); do not reconnect.
    Closed(Option<oneshot::Sender<()>>),
    Lost(TransportError),
}

struct Session {
    reader: RespReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Session {
    async fn call(&mut self, command: &Command) -> Result<RespValue, TransportError> {
        let mut frames = Vec::new();
        command.encode_into(&mut frames);
        self.writer.write_all(&frames).await?;
        self.reader
            .read_value()
            .await?
            .ok_or_else(|| TransportError::Io("connection closed during handshake".to_string()))
    }
}

async fn drive(
    config: ProxyConfig,
    mut control: mpsc::UnboundedReceiver<Control>,
    events: EventSender,
) {
    let mut backlog = VecDeque::new();
    let mut attempt: u32 = 0;

    let done = loop {
        let opened = {
            let opening = open(&config, &events);
            tokio::pin!(opening);
            loop {
                tokio::select! {
                    result = &mut opening => break Ok(result),
                    message = control.recv() => match message {
                        Some(Control::Submit(request)) => backlog.push_back(request),
                        Some(Control::Close { done, .. }) => break Err(Some(done)),
                        None => break Err(None),
                    },
                }
            }
        };

        match opened {
            Ok(Ok(session)) => {
                attempt = 0;
                match serve(session, &mut control, &mut backlog).await {
                    Exit::Closed(done) => break done,
                    Exit::Lost(err) => {
                        let _ = events.send(LifecycleEvent::Error(err.to_string()));
                    }
                }
            }
            Ok(Err(err)) => {
                let _ = events.send(LifecycleEvent::Error(err.to_string()));
            }
            Err(done) => break done,
        }

        attempt += 1;
        if !config.retry.allows(attempt) {
            break None;
        }
        let delay = config.retry.delay_for(attempt);
        let _ = events.send(LifecycleEvent::Reconnecting { delay, attempt });
        if let Some(Exit::Closed(done)) = backoff(delay, &mut control, &mut backlog).await {
            break done;
        }
    };

    for request in backlog.drain(..) {
        let _ = request.respond.send(Err(TransportError::Closed));
    }
    let _ = events.send(LifecycleEvent::End);
    if let Some(done) = done {
        let _ = done.send(());
    }
}

async fn open(config: &ProxyConfig, events: &EventSender) -> Result<Session, TransportError> {
    let addr = config.addr();
    let stream = tokio::time::timeout(config.connect_timeout, TcpStream::connect(&addr))
        .await
        .map_err(|_| TransportError::Io(format!("connect to {} timed out", addr)))??;
    stream.set_nodelay(true)?;
    let _ = events.send(LifecycleEvent::Connect);

    let (read, writer) = stream.into_split();
    let mut session = Session {
        reader: RespReader::new(read),
        writer,
    };

    if let Some(password) = &config.password {
        match session.call(&Command::new("AUTH").arg(password)).await? {
            RespValue::Error(msg) if msg.contains("no password is set") => {
                let _ = events.send(LifecycleEvent::Warning(format!("AUTH ignored: {}", msg)));
            }
            RespValue::Error(msg) => return Err(TransportError::Server(msg)),
            _ => {}
        }
    }

    if config.database != 0 {
        let select = Command::new("SELECT").arg(config.database);
        if let RespValue::Error(msg) = session.call(&select).await? {
            return Err(TransportError::Server(msg));
        }
    }

    let _ = events.send(LifecycleEvent::Ready);
    Ok(session)
}

async fn serve(
    mut session: Session,
    control: &mut mpsc::UnboundedReceiver<Control>,
    backlog: &mut VecDeque<Request>,
) -> Exit {
    let mut in_flight: VecDeque<InFlight> = VecDeque::new();
    let mut closing: Option<oneshot::Sender<()>> = None;
    let mut quitting = false;

    while let Some(request) = backlog.pop_front() {
        if let Err(err) = write_request(&mut session, request, &mut in_flight, &mut quitting).await {
            fail_in_flight(&mut in_flight, &err);
            return Exit::Lost(err);
        }
    }

    loop {
        tokio::select! {
            message = control.recv(), if closing.is_none() => match message {
                Some(Control::Submit(request)) => {
                    if let Err(err) =
                        write_request(&mut session, request, &mut in_flight, &mut quitting).await
                    {
                        fail_in_flight(&mut in_flight, &err);
                        return Exit::Lost(err);
                    }
                }
                Some(Control::Close { flush, done }) => {
                    if flush || in_flight.is_empty() {
                        fail_in_flight(&mut in_flight, &TransportError::Closed);
                        let _ = session.writer.shutdown().await;
                        return Exit::Closed(Some(done));
                    }
                    closing = Some(done);
                }
                None => {
                    fail_in_flight(&mut in_flight, &TransportError::Closed);
                    return Exit::Closed(None);
                }
            },
            value = session.reader.read_value() => match value {
                Ok(Some(value)) => {
                    let complete = match in_flight.front_mut() {
                        Some(front) => {
                            front.replies.push(value);
                            front.replies.len() == front.expected
                        }
                        None => {
                            return Exit::Lost(TransportError::Protocol(
                                "reply without a pending command".to_string(),
                            ));
                        }
                    };
                    if complete {
                        if let Some(finished) = in_flight.pop_front() {
                            let _ = finished.respond.send(Ok(finished.replies));
                        }
                        if in_flight.is_empty() && closing.is_some() {
                            let _ = session.writer.shutdown().await;
                            return Exit::Closed(closing.take());
                        }
                    }
                }
                Ok(None) if quitting => {
                    fail_in_flight(&mut in_flight, &TransportError::Closed);
                    return Exit::Closed(closing.take());
                }
                Ok(None) => {
                    let err = TransportError::Io("connection closed by server".to_string());
                    fail_in_flight(&mut in_flight, &err);
                    return Exit::Lost(err);
                }
                Err(err) => {
                    fail_in_flight(&mut in_flight, &err);
                    return Exit::Lost(err);
                }
            },
        }
    }
}

async fn write_request(
    session: &mut Session,
    request: Request,
    in_flight: &mut VecDeque<InFlight>,
    quitting: &mut bool,
) -> Result<(), TransportError> {
    if let Err(err) = session.writer.write_all(&request.frames).await {
        let err = TransportError::from(err);
        let _ = request.respond.send(Err(err.clone()));
        return Err(err);
    }
    *quitting |= request.quit;
    in_flight.push_back(InFlight {
        expected: request.expected,
        replies: Vec::with_capacity(request.expected),
        respond: request.respond,
    });
    Ok(())
}

fn fail_in_flight(in_flight: &mut VecDeque<InFlight>, err: &TransportError) {
    for pending in in_flight.drain(..) {
        let _ = pending.respond.send(Err(err.clone()));
    }
}

/// Sleep out a reconnect delay, queueing submissions that arrive meanwhile.
async fn backoff(
    delay: Duration,
    control: &mut mpsc::UnboundedReceiver<Control>,
    backlog: &mut VecDeque<Request>,
) -> Option<Exit> {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            _ = &mut sleep => return None,
            message = control.recv() => match message {
                Some(Control::Submit(request)) => backlog.push_back(request),
                Some(Control::Close { done, .. }) => return Some(Exit::Closed(Some(done))),
                None => return Some(Exit::Closed(None)),
            },
        }
    }
}

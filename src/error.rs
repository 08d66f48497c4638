use thiserror::Error;

/// Failure reported by the transport for one submitted command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Error reply from the server, passed through verbatim.
    #[error("{0}")]
    Server(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("connection closed")]
    Closed,
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io(err.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProxyError {
    #[error("not connected")]
    NotConnected,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("invalid arguments for '{command}': {reason}")]
    Argument {
        command: &'static str,
        reason: String,
    },

    #[error("batch failed: {0}")]
    Batch(TransportError),

    #[error("unexpected reply to '{command}': {reply}")]
    UnexpectedReply { command: String, reply: String },
}

impl ProxyError {
    pub fn argument(command: &'static str, reason: impl Into<String>) -> Self {
        ProxyError::Argument {
            command,
            reason: reason.into(),
        }
    }

    pub fn unexpected(command: impl Into<String>, reply: impl std::fmt::Debug) -> Self {
        ProxyError::UnexpectedReply {
            command: command.into(),
            reply: format!("{:?}", reply),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;

//! Injectable log sink. Lifecycle transitions and failed invocations are
//! reported here; the default forwards to `tracing`.

use tracing::Level;

pub trait LogSink: Send + Sync {
    fn log(&self, level: Level, message: &str);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: Level, message: &str) {
        if level == Level::ERROR {
            tracing::error!(target: "kvproxy", "{}", message);
        } else if level == Level::WARN {
            tracing::warn!(target: "kvproxy", "{}", message);
        } else if level == Level::INFO {
            tracing::info!(target: "kvproxy", "{}", message);
        } else if level == Level::DEBUG {
            tracing::debug!(target: "kvproxy", "{}", message);
        } else {
            tracing::trace!(target: "kvproxy", "{}", message);
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn log(&self, _level: Level, _message: &str) {}
}

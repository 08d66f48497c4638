use std::fmt;
use std::time::Duration;

use crate::error::{ProxyError, Result};

/// Reconnect backoff used by the TCP transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    /// Give up on the first connection loss.
    pub fn never() -> Self {
        Self {
            max_attempts: Some(0),
            ..Self::default()
        }
    }

    /// Whether reconnect attempt number `attempt` (1-based) may run.
    pub fn allows(&self, attempt: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempt <= max)
    }

    /// Exponential backoff for attempt `attempt` (1-based), capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        let delay = self.initial_delay.saturating_mul(1u32 << shift);
        delay.min(self.max_delay)
    }
}

#[derive(Clone)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    /// Sent with AUTH after every (re)connect.
    pub password: Option<String>,
    /// Selected after every (re)connect when non-zero.
    pub database: u32,
    pub connect_timeout: Duration,
    pub retry: RetryPolicy,
}

impl fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("database", &self.database)
            .field("connect_timeout", &self.connect_timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            password: None,
            database: 0,
            connect_timeout: Duration::from_secs(5),
            retry: RetryPolicy::default(),
        }
    }
}

impl ProxyConfig {
    /// Parse `redis://[password@]host[:port][/db]`.
    pub fn from_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("redis://")
            .ok_or_else(|| ProxyError::argument("url", format!("unsupported scheme in '{}'", url)))?;

        let mut config = Self::default();

        let rest = match rest.rsplit_once('@') {
            Some((auth, host)) => {
                // `user:password@` form; only the password is used.
                let password = auth.rsplit_once(':').map_or(auth, |(_, p)| p);
                if !password.is_empty() {
                    config.password = Some(password.to_string());
                }
                host
            }
            None => rest,
        };

        let (host_port, database) = match rest.split_once('/') {
            Some((hp, db)) => (hp, Some(db)),
            None => (rest, None),
        };

        match host_port.rsplit_once(':') {
            Some((host, port)) => {
                if !host.is_empty() {
                    config.host = host.to_string();
                }
                config.port = port
                    .parse()
                    .map_err(|_| ProxyError::argument("url", format!("invalid port '{}'", port)))?;
            }
            None if !host_port.is_empty() => config.host = host_port.to_string(),
            None => {}
        }

        if let Some(db) = database.filter(|db| !db.is_empty()) {
            config.database = db
                .parse()
                .map_err(|_| ProxyError::argument("url", format!("invalid database '{}'", db)))?;
        }

        Ok(config)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

//! kvproxy - typed async client for Redis-compatible servers
//!
//! # Example
//!
//! ```no_run
//! use kvproxy::{Proxy, ProxyConfig};
//! use kvproxy::bitfield::{self, BitfieldType};
//!
//! # async fn demo() -> kvproxy::Result<()> {
//! let proxy = Proxy::new(ProxyConfig::default());
//! proxy.connect().await?;
//!
//! // Sorted sets take (member, score); scores come back as numbers
//! proxy.zsets().zadd("board", [("ann", 3.0), ("bob", 1.5)]).await?;
//! let ranked = proxy.zsets().zrange_with_scores("board", 0, -1).await?;
//! assert_eq!(ranked[0].member, "bob");
//!
//! // BITFIELD fragments are concatenated in order
//! let slots = proxy
//!     .bitmaps()
//!     .bitfield("flags", [bitfield::set(BitfieldType::I8, 0u64, 4), bitfield::get(BitfieldType::I8, 0u64)])
//!     .await?;
//! assert_eq!(slots, vec![Some(0), Some(4)]);
//!
//! // MULTI/EXEC
//! let replies = proxy.multi().incr("hits").get("hits").exec().await?;
//! assert_eq!(replies.len(), 2);
//!
//! proxy.stop(false).await?;
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod bitfield;
pub mod command;
pub mod commands;
pub mod config;
pub mod connection;
pub mod error;
pub mod invoker;
pub mod logging;
pub mod proxy;
mod reply;
pub mod resp;
pub mod transport;
pub mod types;

pub use batch::Batch;
pub use command::{Arg, Command};
pub use commands::{HashFields, ScoredMembers};
pub use config::{ProxyConfig, RetryPolicy};
pub use connection::{ConnectionManager, ConnectionObserver, ConnectionState};
pub use error::{ProxyError, Result, TransportError};
pub use invoker::Invoker;
pub use logging::{LogSink, NoopSink, TracingSink};
pub use proxy::Proxy;
pub use resp::RespValue;
pub use transport::{Connector, LifecycleEvent, TcpConnector, Transport};
pub use types::{BitOperation, Expiry, InsertPosition, SetCondition, SetFlag, SetOptions, Ttl, ZMember};

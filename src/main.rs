use clap::Parser;
use std::time::Duration;

use kvproxy::{Proxy, ProxyConfig, RespValue, RetryPolicy};

#[derive(Parser)]
#[command(name = "kvproxy")]
#[command(about = "Run one command against a Redis-compatible server")]
struct Args {
    /// Server URL
    #[arg(short, long, default_value = "redis://127.0.0.1:6379")]
    url: String,

    /// Connect timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    connect_timeout_ms: u64,

    /// Give up instead of reconnecting when the connection drops
    #[arg(long)]
    no_reconnect: bool,

    /// Command name followed by its arguments
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let mut config = ProxyConfig::from_url(&args.url)?;
    config.connect_timeout = Duration::from_millis(args.connect_timeout_ms);
    if args.no_reconnect {
        config.retry = RetryPolicy::never();
    }
    tracing::info!("Connecting to {}", config.addr());

    let proxy = Proxy::new(config);
    proxy.connect().await?;

    let (name, rest) = args
        .command
        .split_first()
        .ok_or_else(|| anyhow::anyhow!("missing command"))?;
    let result = proxy.call(name, rest).await;
    proxy.stop(false).await?;

    let reply = result?;
    let mut out = String::new();
    render(&reply, 0, &mut out);
    print!("{}", out);

    Ok(())
}

/// redis-cli style rendering.
fn render(value: &RespValue, depth: usize, out: &mut String) {
    match value {
        RespValue::SimpleString(s) => out.push_str(&format!("{}\n", s)),
        RespValue::Error(e) => out.push_str(&format!("(error) {}\n", e)),
        RespValue::Integer(n) => out.push_str(&format!("(integer) {}\n", n)),
        RespValue::BulkString(Some(data)) => {
            out.push_str(&format!("\"{}\"\n", String::from_utf8_lossy(data)))
        }
        RespValue::BulkString(None) | RespValue::Array(None) => out.push_str("(nil)\n"),
        RespValue::Array(Some(items)) if items.is_empty() => out.push_str("(empty array)\n"),
        RespValue::Array(Some(items)) => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(&" ".repeat(depth * 3));
                }
                out.push_str(&format!("{}) ", i + 1));
                render(item, depth + 1, out);
            }
        }
    }
}

//! In-process RESP server with just enough commands for the proxy tests.
//!
//! Every client gets its own task. `drop_clients` severs all live sockets
//! so reconnect paths can be exercised.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use kvproxy::resp::{RespReader, RespValue};
use kvproxy::{ProxyConfig, RetryPolicy};
use parking_lot::Mutex;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

enum Value {
    Str(Vec<u8>),
    Hash(Vec<(String, String)>),
    Set(Vec<String>),
    ZSet(Vec<(String, f64)>),
    List(VecDeque<String>),
}

#[derive(Default)]
struct Store {
    data: HashMap<String, Value>,
    expires: HashMap<String, Instant>,
    /// Every command received, as `NAME arg arg`.
    log: Vec<String>,
}

impl Store {
    fn purge(&mut self, key: &str) {
        if let Some(at) = self.expires.get(key) {
            if *at <= Instant::now() {
                self.expires.remove(key);
                self.data.remove(key);
            }
        }
    }

    fn remove(&mut self, key: &str) -> bool {
        self.purge(key);
        self.expires.remove(key);
        self.data.remove(key).is_some()
    }

    fn exists(&mut self, key: &str) -> bool {
        self.purge(key);
        self.data.contains_key(key)
    }
}

pub struct FakeServer {
    port: u16,
    store: Arc<Mutex<Store>>,
    kill: watch::Sender<u64>,
    accepted: Arc<Mutex<usize>>,
}

impl FakeServer {
    pub async fn start() -> FakeServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let store = Arc::new(Mutex::new(Store::default()));
        let (kill, _) = watch::channel(0u64);
        let accepted = Arc::new(Mutex::new(0));

        let server = FakeServer {
            port,
            store: store.clone(),
            kill: kill.clone(),
            accepted: accepted.clone(),
        };

        tokio::spawn(async move {
            loop {
                let (stream, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => return,
                };
                *accepted.lock() += 1;
                tokio::spawn(serve_client(stream, store.clone(), kill.subscribe()));
            }
        });

        server
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Config pointing at this server with a fast retry policy.
    pub fn config(&self) -> ProxyConfig {
        ProxyConfig {
            host: "127.0.0.1".to_string(),
            port: self.port,
            connect_timeout: Duration::from_secs(1),
            retry: RetryPolicy {
                initial_delay: Duration::from_millis(10),
                max_delay: Duration::from_millis(50),
                max_attempts: Some(20),
            },
            ..ProxyConfig::default()
        }
    }

    /// Close every client socket.
    pub fn drop_clients(&self) {
        self.kill.send_modify(|n| *n += 1);
    }

    pub fn accepted(&self) -> usize {
        *self.accepted.lock()
    }

    pub fn received(&self) -> Vec<String> {
        self.store.lock().log.clone()
    }
}

async fn serve_client(stream: TcpStream, store: Arc<Mutex<Store>>, mut kill: watch::Receiver<u64>) {
    let (read, mut write) = stream.into_split();
    let mut reader = RespReader::new(read);
    let mut queue: Option<Vec<Vec<String>>> = None;
    let mut aborted = false;

    loop {
        let frame = tokio::select! {
            _ = kill.changed() => return,
            frame = reader.read_value() => match frame {
                Ok(Some(frame)) => frame,
                _ => return,
            },
        };

        let args = match to_args(frame) {
            Some(args) if !args.is_empty() => args,
            _ => {
                let _ = write.write_all(&RespValue::error("protocol error").encode()).await;
                return;
            }
        };
        let name = args[0].to_ascii_uppercase();
        store.lock().log.push(args.join(" "));

        if name == "QUIT" {
            let _ = write.write_all(&RespValue::ok().encode()).await;
            return;
        }

        // Holds the connection for the full timeout when nothing is queued.
        if name == "BLPOP" && queue.is_none() {
            let popped = {
                let mut store = store.lock();
                pop_front(&mut store, &args[1])
            };
            let reply = match popped {
                Some(value) => RespValue::array(vec![bulk(&args[1]), bulk(&value)]),
                None => {
                    let timeout: f64 = args[args.len() - 1].parse().unwrap();
                    tokio::select! {
                        _ = kill.changed() => return,
                        _ = tokio::time::sleep(Duration::from_secs_f64(timeout)) => RespValue::Array(None),
                    }
                }
            };
            if write.write_all(&reply.encode()).await.is_err() {
                return;
            }
            continue;
        }

        let reply = match name.as_str() {
            "MULTI" => {
                queue = Some(Vec::new());
                aborted = false;
                RespValue::ok()
            }
            "EXEC" => match queue.take() {
                None => RespValue::error("EXEC without MULTI"),
                Some(_) if aborted => RespValue::Error(
                    "EXECABORT Transaction discarded because of previous errors.".to_string(),
                ),
                Some(commands) => {
                    let mut store = store.lock();
                    RespValue::array(commands.iter().map(|c| execute(&mut store, c)).collect())
                }
            },
            _ => match queue.as_mut() {
                Some(queued) => {
                    if is_known(&name) {
                        queued.push(args);
                        RespValue::SimpleString("QUEUED".to_string())
                    } else {
                        aborted = true;
                        RespValue::error(format!("unknown command '{}'", args[0]))
                    }
                }
                None => {
                    let mut store = store.lock();
                    execute(&mut store, &args)
                }
            },
        };

        if write.write_all(&reply.encode()).await.is_err() {
            return;
        }
    }
}

fn pop_front(store: &mut Store, key: &str) -> Option<String> {
    store.purge(key);
    match store.data.get_mut(key) {
        Some(Value::List(list)) => list.pop_front(),
        _ => None,
    }
}

fn to_args(frame: RespValue) -> Option<Vec<String>> {
    match frame {
        RespValue::Array(Some(items)) => items
            .into_iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => None,
    }
}

const KNOWN: &[&str] = &[
    "PING", "AUTH", "SELECT", "SET", "GET", "INCR", "DEL", "EXISTS", "EXPIRE", "TTL", "HSET",
    "HMSET", "HGETALL", "HKEYS", "HVALS", "SADD", "SRANDMEMBER", "ZADD", "ZRANGE", "ZREVRANGE",
    "RPUSH", "LRANGE", "BITFIELD",
];

fn is_known(name: &str) -> bool {
    KNOWN.contains(&name)
}

fn bulk(s: &str) -> RespValue {
    RespValue::from_string(s)
}

fn wrong_type() -> RespValue {
    RespValue::Error("WRONGTYPE Operation against a key holding the wrong kind of value".to_string())
}

fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{}", score as i64)
    } else {
        score.to_string()
    }
}

fn execute(store: &mut Store, args: &[String]) -> RespValue {
    let name = args[0].to_ascii_uppercase();
    let args = &args[1..];

    match name.as_str() {
        "PING" => match args.first() {
            Some(msg) => bulk(msg),
            None => RespValue::SimpleString("PONG".to_string()),
        },
        "AUTH" => RespValue::error("Client sent AUTH, but no password is set"),
        "SELECT" => RespValue::ok(),
        "SET" => {
            let key = &args[0];
            let mut ttl = None;
            let mut nx = false;
            let mut xx = false;
            let mut i = 2;
            while i < args.len() {
                match args[i].to_ascii_uppercase().as_str() {
                    "EX" => {
                        ttl = Some(Duration::from_secs(args[i + 1].parse().unwrap()));
                        i += 1;
                    }
                    "PX" => {
                        ttl = Some(Duration::from_millis(args[i + 1].parse().unwrap()));
                        i += 1;
                    }
                    "NX" => nx = true,
                    "XX" => xx = true,
                    _ => {}
                }
                i += 1;
            }
            let exists = store.exists(key);
            if (nx && exists) || (xx && !exists) {
                return RespValue::null();
            }
            store.remove(key);
            store.data.insert(key.clone(), Value::Str(args[1].clone().into_bytes()));
            if let Some(ttl) = ttl {
                store.expires.insert(key.clone(), Instant::now() + ttl);
            }
            RespValue::ok()
        }
        "GET" => {
            store.purge(&args[0]);
            match store.data.get(&args[0]) {
                Some(Value::Str(data)) => RespValue::BulkString(Some(data.clone())),
                Some(_) => wrong_type(),
                None => RespValue::null(),
            }
        }
        "INCR" => {
            store.purge(&args[0]);
            let current = match store.data.get(&args[0]) {
                Some(Value::Str(data)) => match String::from_utf8_lossy(data).parse::<i64>() {
                    Ok(n) => n,
                    Err(_) => return RespValue::error("value is not an integer or out of range"),
                },
                Some(_) => return wrong_type(),
                None => 0,
            };
            let next = current + 1;
            store
                .data
                .insert(args[0].clone(), Value::Str(next.to_string().into_bytes()));
            RespValue::Integer(next)
        }
        "DEL" => RespValue::Integer(args.iter().filter(|k| store.remove(k)).count() as i64),
        "EXISTS" => RespValue::Integer(args.iter().filter(|k| store.exists(k)).count() as i64),
        "EXPIRE" => {
            if !store.exists(&args[0]) {
                return RespValue::Integer(0);
            }
            let secs: u64 = args[1].parse().unwrap();
            store
                .expires
                .insert(args[0].clone(), Instant::now() + Duration::from_secs(secs));
            RespValue::Integer(1)
        }
        "TTL" => {
            if !store.exists(&args[0]) {
                return RespValue::Integer(-2);
            }
            match store.expires.get(&args[0]) {
                Some(at) => {
                    let left = at.saturating_duration_since(Instant::now());
                    RespValue::Integer(((left.as_millis() + 999) / 1000) as i64)
                }
                None => RespValue::Integer(-1),
            }
        }
        "HSET" | "HMSET" => {
            store.purge(&args[0]);
            let entry = store
                .data
                .entry(args[0].clone())
                .or_insert_with(|| Value::Hash(Vec::new()));
            let fields = match entry {
                Value::Hash(fields) => fields,
                _ => return wrong_type(),
            };
            let mut added = 0;
            for pair in args[1..].chunks(2) {
                match fields.iter_mut().find(|(f, _)| *f == pair[0]) {
                    Some(existing) => existing.1 = pair[1].clone(),
                    None => {
                        fields.push((pair[0].clone(), pair[1].clone()));
                        added += 1;
                    }
                }
            }
            if name == "HMSET" {
                RespValue::ok()
            } else {
                RespValue::Integer(added)
            }
        }
        "HGETALL" | "HKEYS" | "HVALS" => {
            store.purge(&args[0]);
            let fields = match store.data.get(&args[0]) {
                Some(Value::Hash(fields)) => fields,
                Some(_) => return wrong_type(),
                None => return RespValue::array(Vec::new()),
            };
            let items = fields
                .iter()
                .flat_map(|(f, v)| match name.as_str() {
                    "HKEYS" => vec![bulk(f)],
                    "HVALS" => vec![bulk(v)],
                    _ => vec![bulk(f), bulk(v)],
                })
                .collect();
            RespValue::array(items)
        }
        "SADD" => {
            store.purge(&args[0]);
            let entry = store
                .data
                .entry(args[0].clone())
                .or_insert_with(|| Value::Set(Vec::new()));
            let members = match entry {
                Value::Set(members) => members,
                _ => return wrong_type(),
            };
            let mut added = 0;
            for member in &args[1..] {
                if !members.contains(member) {
                    members.push(member.clone());
                    added += 1;
                }
            }
            RespValue::Integer(added)
        }
        "SRANDMEMBER" => {
            store.purge(&args[0]);
            let members = match store.data.get(&args[0]) {
                Some(Value::Set(members)) => members.clone(),
                Some(_) => return wrong_type(),
                None => Vec::new(),
            };
            let count: i64 = match args.get(1) {
                Some(count) => count.parse().unwrap(),
                None => {
                    return match members.first() {
                        Some(m) => bulk(m),
                        None => RespValue::null(),
                    }
                }
            };
            if members.is_empty() {
                return RespValue::array(Vec::new());
            }
            let samples: Vec<RespValue> = if count >= 0 {
                members.iter().take(count as usize).map(|m| bulk(m)).collect()
            } else {
                (0..count.unsigned_abs() as usize)
                    .map(|i| bulk(&members[i % members.len()]))
                    .collect()
            };
            RespValue::array(samples)
        }
        "ZADD" => {
            store.purge(&args[0]);
            let entry = store
                .data
                .entry(args[0].clone())
                .or_insert_with(|| Value::ZSet(Vec::new()));
            let members = match entry {
                Value::ZSet(members) => members,
                _ => return wrong_type(),
            };
            let mut added = 0;
            for pair in args[1..].chunks(2) {
                let score: f64 = match pair[0].parse() {
                    Ok(score) => score,
                    Err(_) => return RespValue::error("value is not a valid float"),
                };
                match members.iter_mut().find(|(m, _)| *m == pair[1]) {
                    Some(existing) => existing.1 = score,
                    None => {
                        members.push((pair[1].clone(), score));
                        added += 1;
                    }
                }
            }
            RespValue::Integer(added)
        }
        "ZRANGE" | "ZREVRANGE" => {
            store.purge(&args[0]);
            let mut members = match store.data.get(&args[0]) {
                Some(Value::ZSet(members)) => members.clone(),
                Some(_) => return wrong_type(),
                None => Vec::new(),
            };
            members.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
            if name == "ZREVRANGE" {
                members.reverse();
            }
            let with_scores = args
                .get(3)
                .map_or(false, |a| a.eq_ignore_ascii_case("WITHSCORES"));
            let (start, stop) = range(args[1].parse().unwrap(), args[2].parse().unwrap(), members.len());
            let mut items = Vec::new();
            for (member, score) in members.iter().skip(start).take(stop.saturating_sub(start)) {
                items.push(bulk(member));
                if with_scores {
                    items.push(bulk(&format_score(*score)));
                }
            }
            RespValue::array(items)
        }
        "RPUSH" => {
            store.purge(&args[0]);
            let entry = store
                .data
                .entry(args[0].clone())
                .or_insert_with(|| Value::List(VecDeque::new()));
            let list = match entry {
                Value::List(list) => list,
                _ => return wrong_type(),
            };
            list.extend(args[1..].iter().cloned());
            RespValue::Integer(list.len() as i64)
        }
        "LRANGE" => {
            store.purge(&args[0]);
            let list = match store.data.get(&args[0]) {
                Some(Value::List(list)) => list.clone(),
                Some(_) => return wrong_type(),
                None => VecDeque::new(),
            };
            let (start, stop) = range(args[1].parse().unwrap(), args[2].parse().unwrap(), list.len());
            RespValue::array(
                list.iter()
                    .skip(start)
                    .take(stop.saturating_sub(start))
                    .map(|v| bulk(v))
                    .collect(),
            )
        }
        "BITFIELD" => bitfield(store, &args[0], &args[1..]),
        _ => RespValue::error(format!("unknown command '{}'", name)),
    }
}

/// Inclusive, possibly negative indices to a half-open range.
fn range(start: i64, stop: i64, len: usize) -> (usize, usize) {
    let len = len as i64;
    let norm = |i: i64| if i < 0 { (len + i).max(0) } else { i };
    let start = norm(start).min(len);
    let stop = (norm(stop) + 1).min(len);
    (start as usize, stop.max(start) as usize)
}

/// Byte-aligned `i8` GET/SET only.
fn bitfield(store: &mut Store, key: &str, ops: &[String]) -> RespValue {
    store.purge(key);
    let entry = store
        .data
        .entry(key.to_string())
        .or_insert_with(|| Value::Str(Vec::new()));
    let data = match entry {
        Value::Str(data) => data,
        _ => return wrong_type(),
    };

    let mut replies = Vec::new();
    let mut i = 0;
    while i < ops.len() {
        let op = ops[i].to_ascii_uppercase();
        if ops.get(i + 1).map(String::as_str) != Some("i8") {
            return RespValue::error("fake server only supports i8");
        }
        let byte = ops[i + 2].parse::<usize>().unwrap() / 8;
        if data.len() <= byte {
            data.resize(byte + 1, 0);
        }
        let old = data[byte] as i8;
        match op.as_str() {
            "GET" => {
                replies.push(RespValue::Integer(old as i64));
                i += 3;
            }
            "SET" => {
                let value: i64 = ops[i + 3].parse().unwrap();
                data[byte] = value as i8 as u8;
                replies.push(RespValue::Integer(old as i64));
                i += 4;
            }
            _ => return RespValue::error("fake server only supports GET and SET"),
        }
    }
    RespValue::array(replies)
}

use crate::error::TransportError;

/// Largest array header accepted from the wire.
pub(super) const MAX_ARRAY_LEN: usize = 1_000_000;

/// Deepest array nesting accepted from the wire.
pub(super) const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(Option<Vec<u8>>),
    Array(Option<Vec<RespValue>>),
}

impl RespValue {
    pub fn ok() -> Self {
        RespValue::SimpleString("OK".to_string())
    }

    pub fn null() -> Self {
        RespValue::BulkString(None)
    }

    pub fn error(msg: impl Into<String>) -> Self {
        RespValue::Error(format!("ERR {}", msg.into()))
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        RespValue::BulkString(Some(s.into().into_bytes()))
    }

    pub fn array(items: Vec<RespValue>) -> Self {
        RespValue::Array(Some(items))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RespValue::BulkString(None) | RespValue::Array(None))
    }

    /// Text of a simple or bulk string reply.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RespValue::SimpleString(s) => Some(s),
            RespValue::BulkString(Some(data)) => std::str::from_utf8(data).ok(),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            RespValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode_into(&mut buf);
        buf
    }

    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        match self {
            RespValue::SimpleString(s) => {
                buf.push(b'+');
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(b"\r\n");
            }
            RespValue::Error(s) => {
                buf.push(b'-');
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(b"\r\n");
            }
            RespValue::Integer(n) => {
                buf.extend_from_slice(format!(":{}\r\n", n).as_bytes());
            }
            RespValue::BulkString(None) => buf.extend_from_slice(b"$-1\r\n"),
            RespValue::BulkString(Some(data)) => {
                buf.extend_from_slice(format!("${}\r\n", data.len()).as_bytes());
                buf.extend_from_slice(data);
                buf.extend_from_slice(b"\r\n");
            }
            RespValue::Array(None) => buf.extend_from_slice(b"*-1\r\n"),
            RespValue::Array(Some(items)) => {
                buf.extend_from_slice(format!("*{}\r\n", items.len()).as_bytes());
                for item in items {
                    item.encode_into(buf);
                }
            }
        }
    }

    /// Decodes one value from the front of `buf`.
    ///
    /// Returns `Ok(None)` when `buf` does not yet hold a complete value,
    /// otherwise the value and the number of bytes it occupied.
    pub fn try_decode(buf: &[u8]) -> Result<Option<(RespValue, usize)>, TransportError> {
        decode_at(buf, 0, 0)
    }
}

fn decode_at(
    buf: &[u8],
    pos: usize,
    depth: usize,
) -> Result<Option<(RespValue, usize)>, TransportError> {
    if pos >= buf.len() {
        return Ok(None);
    }
    let end = match find_crlf(buf, pos + 1) {
        Some(end) => end,
        None => return Ok(None),
    };
    let line = &buf[pos + 1..end];
    let next = end + 2;

    match buf[pos] {
        b'+' => Ok(Some((RespValue::SimpleString(line_text(line)?), next))),
        b'-' => Ok(Some((RespValue::Error(line_text(line)?), next))),
        b':' => Ok(Some((RespValue::Integer(parse_i64(line)?), next))),
        b'$' => {
            let len = parse_i64(line)?;
            if len == -1 {
                return Ok(Some((RespValue::BulkString(None), next)));
            }
            let len = usize::try_from(len)
                .map_err(|_| TransportError::Protocol(format!("invalid bulk length {}", len)))?;
            let data_end = next.saturating_add(len);
            if buf.len() < data_end.saturating_add(2) {
                return Ok(None);
            }
            if &buf[data_end..data_end + 2] != b"\r\n" {
                return Err(TransportError::Protocol(
                    "bulk string missing trailing CRLF".to_string(),
                ));
            }
            let data = buf[next..data_end].to_vec();
            Ok(Some((RespValue::BulkString(Some(data)), data_end + 2)))
        }
        b'*' => {
            let count = parse_i64(line)?;
            if count == -1 {
                return Ok(Some((RespValue::Array(None), next)));
            }
            let count = array_len(count)?;
            if depth >= MAX_DEPTH {
                return Err(nesting_error());
            }
            let mut items = Vec::with_capacity(count);
            let mut cursor = next;
            for _ in 0..count {
                match decode_at(buf, cursor, depth + 1)? {
                    Some((item, after)) => {
                        items.push(item);
                        cursor = after;
                    }
                    None => return Ok(None),
                }
            }
            Ok(Some((RespValue::Array(Some(items)), cursor)))
        }
        other => Err(TransportError::Protocol(format!(
            "unknown type byte 0x{:02x}",
            other
        ))),
    }
}

pub(super) fn array_len(count: i64) -> Result<usize, TransportError> {
    let count = usize::try_from(count)
        .map_err(|_| TransportError::Protocol(format!("invalid array length {}", count)))?;
    if count > MAX_ARRAY_LEN {
        return Err(TransportError::Protocol(format!(
            "array length {} exceeds {}",
            count, MAX_ARRAY_LEN
        )));
    }
    Ok(count)
}

pub(super) fn nesting_error() -> TransportError {
    TransportError::Protocol(format!("arrays nested deeper than {}", MAX_DEPTH))
}

pub(super) fn find_crlf(buf: &[u8], from: usize) -> Option<usize> {
    if from >= buf.len() {
        return None;
    }
    buf[from..]
        .windows(2)
        .position(|w| w == b"\r\n")
        .map(|idx| from + idx)
}

fn line_text(line: &[u8]) -> Result<String, TransportError> {
    String::from_utf8(line.to_vec())
        .map_err(|_| TransportError::Protocol("invalid UTF-8 in status line".to_string()))
}

pub(super) fn parse_i64(line: &[u8]) -> Result<i64, TransportError> {
    std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| {
            TransportError::Protocol(format!(
                "invalid integer '{}'",
                String::from_utf8_lossy(line)
            ))
        })
}

impl From<i64> for RespValue {
    fn from(n: i64) -> Self {
        RespValue::Integer(n)
    }
}

impl From<bool> for RespValue {
    fn from(b: bool) -> Self {
        RespValue::Integer(if b { 1 } else { 0 })
    }
}

impl From<String> for RespValue {
    fn from(s: String) -> Self {
        RespValue::from_string(s)
    }
}

impl From<&str> for RespValue {
    fn from(s: &str) -> Self {
        RespValue::from_string(s)
    }
}

impl From<Option<String>> for RespValue {
    fn from(opt: Option<String>) -> Self {
        match opt {
            Some(s) => RespValue::from_string(s),
            None => RespValue::null(),
        }
    }
}

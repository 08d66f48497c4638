use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::value::{array_len, find_crlf, nesting_error, parse_i64, MAX_DEPTH};
use super::RespValue;
use crate::error::TransportError;

/// Frame size above which the peer is considered broken.
const MAX_FRAME_SIZE: usize = 512 * 1024 * 1024;

/// Incremental reader of RESP replies.
///
/// `read_value` only awaits inside `read_buf`, so dropping it from a
/// `select!` never loses a partially read frame.
pub struct RespReader<R> {
    reader: R,
    buffer: BytesMut,
    scan: FrameScan,
}

impl<R: AsyncRead + Unpin> RespReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: BytesMut::with_capacity(8 * 1024),
            scan: FrameScan::default(),
        }
    }

    /// Read the next complete value. `Ok(None)` means the peer closed the
    /// stream on a frame boundary.
    pub async fn read_value(&mut self) -> Result<Option<RespValue>, TransportError> {
        loop {
            if let Some(len) = self.scan.advance(&self.buffer)? {
                self.scan = FrameScan::default();
                let frame = self.buffer.split_to(len);
                return match RespValue::try_decode(&frame)? {
                    Some((value, _)) => Ok(Some(value)),
                    None => Err(TransportError::Protocol("incomplete frame".to_string())),
                };
            }

            if self.buffer.len() > MAX_FRAME_SIZE {
                return Err(TransportError::Protocol(format!(
                    "frame exceeds {} bytes",
                    MAX_FRAME_SIZE
                )));
            }

            let n = self.reader.read_buf(&mut self.buffer).await?;
            if n == 0 {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Err(TransportError::Io(
                    "connection closed mid-frame".to_string(),
                ));
            }
        }
    }
}

/// Progress through the frame at the front of the buffer.
///
/// Elements already walked are never looked at again, so a large reply
/// arriving in many reads costs one pass. Values are only built once the
/// whole frame is present.
#[derive(Debug, Default)]
struct FrameScan {
    /// Offset of the first element not yet walked.
    pos: usize,
    /// Elements still owed by each open array, outermost first.
    open: Vec<usize>,
}

impl FrameScan {
    /// Walk as far as `buf` allows. Returns the frame length once complete.
    fn advance(&mut self, buf: &[u8]) -> Result<Option<usize>, TransportError> {
        while self.pos < buf.len() {
            let end = match find_crlf(buf, self.pos + 1) {
                Some(end) => end,
                None => return Ok(None),
            };
            let line = &buf[self.pos + 1..end];
            let next = end + 2;

            let after = match buf[self.pos] {
                b'+' | b'-' | b':' => next,
                b'$' => {
                    let len = parse_i64(line)?;
                    if len == -1 {
                        next
                    } else {
                        let len = usize::try_from(len)
                            .ok()
                            .filter(|len| *len <= MAX_FRAME_SIZE)
                            .ok_or_else(|| {
                                TransportError::Protocol(format!("invalid bulk length {}", len))
                            })?;
                        if buf.len() < next + len + 2 {
                            return Ok(None);
                        }
                        next + len + 2
                    }
                }
                b'*' => {
                    let count = parse_i64(line)?;
                    if count != -1 {
                        let count = array_len(count)?;
                        if self.open.len() >= MAX_DEPTH {
                            return Err(nesting_error());
                        }
                        if count > 0 {
                            self.open.push(count);
                            self.pos = next;
                            continue;
                        }
                    }
                    next
                }
                other => {
                    return Err(TransportError::Protocol(format!(
                        "unknown type byte 0x{:02x}",
                        other
                    )))
                }
            };

            self.pos = after;
            if self.element_done() {
                return Ok(Some(self.pos));
            }
        }
        Ok(None)
    }

    /// Account for one finished element; true when the frame is complete.
    fn element_done(&mut self) -> bool {
        while let Some(owed) = self.open.last_mut() {
            *owed -= 1;
            if *owed > 0 {
                return false;
            }
            self.open.pop();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_consecutive_values() {
        let data: &[u8] = b"+OK\r\n$3\r\nbar\r\n:5\r\n";
        let mut reader = RespReader::new(data);
        assert_eq!(reader.read_value().await.unwrap(), Some(RespValue::ok()));
        assert_eq!(
            reader.read_value().await.unwrap(),
            Some(RespValue::from("bar"))
        );
        assert_eq!(
            reader.read_value().await.unwrap(),
            Some(RespValue::Integer(5))
        );
        assert_eq!(reader.read_value().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_eof_mid_frame_is_an_error() {
        let data: &[u8] = b"$10\r\nshort";
        let mut reader = RespReader::new(data);
        assert!(reader.read_value().await.is_err());
    }

    #[tokio::test]
    async fn test_reads_across_split_writes() {
        let stream = tokio_test::io::Builder::new()
            .read(b"*2\r\n$1\r\na")
            .read(b"\r\n$1\r\nb\r\n")
            .build();
        let mut reader = RespReader::new(stream);
        let value = reader.read_value().await.unwrap().unwrap();
        assert_eq!(
            value,
            RespValue::array(vec![RespValue::from("a"), RespValue::from("b")])
        );
        assert_eq!(reader.read_value().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_large_array_in_small_reads() {
        let count = 20_000;
        let items: Vec<RespValue> = (0..count)
            .map(|i| RespValue::from(format!("member:{}", i)))
            .collect();
        let encoded = RespValue::array(items.clone()).encode();

        let mut builder = tokio_test::io::Builder::new();
        for chunk in encoded.chunks(1024) {
            builder.read(chunk);
        }
        let mut reader = RespReader::new(builder.build());

        let value = reader.read_value().await.unwrap().unwrap();
        assert_eq!(value, RespValue::array(items));
        assert_eq!(reader.read_value().await.unwrap(), None);
    }

    #[test]
    fn test_scan_resumes_where_it_stopped() {
        let mut scan = FrameScan::default();
        let full: &[u8] = b"*2\r\n$3\r\nfoo\r\n*1\r\n:7\r\n+OK\r\n";

        assert_eq!(scan.advance(&full[..12]).unwrap(), None);
        assert_eq!(scan.pos, 4);
        assert_eq!(scan.advance(&full[..20]).unwrap(), None);
        assert_eq!(scan.advance(full).unwrap(), Some(21));
    }

    #[test]
    fn test_scan_empty_and_null_arrays_are_complete() {
        assert_eq!(FrameScan::default().advance(b"*0\r\n").unwrap(), Some(4));
        assert_eq!(FrameScan::default().advance(b"*-1\r\n").unwrap(), Some(5));
        assert_eq!(
            FrameScan::default().advance(b"*2\r\n*0\r\n$-1\r\n").unwrap(),
            Some(13)
        );
    }

    #[test]
    fn test_scan_rejects_deep_nesting() {
        let deep = b"*1\r\n".repeat(MAX_DEPTH + 1);
        assert!(matches!(
            FrameScan::default().advance(&deep),
            Err(TransportError::Protocol(_))
        ));
    }
}

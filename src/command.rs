//! Commands as submitted to the transport: a name plus ordered primitive
//! arguments.

use std::fmt;

/// One positional argument on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Str(String),
    Bytes(Vec<u8>),
    Int(i64),
    Float(f64),
}

impl Arg {
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Arg::Str(s) => s.as_bytes().to_vec(),
            Arg::Bytes(b) => b.clone(),
            Arg::Int(n) => n.to_string().into_bytes(),
            Arg::Float(f) => format_float(*f).into_bytes(),
        }
    }

    /// Numeric value of the argument, parsing string forms.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Arg::Int(n) => Some(*n as f64),
            Arg::Float(f) => Some(*f),
            Arg::Str(s) => s.trim().parse().ok(),
            Arg::Bytes(b) => std::str::from_utf8(b).ok()?.trim().parse().ok(),
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Str(s) => f.write_str(s),
            Arg::Bytes(b) => f.write_str(&String::from_utf8_lossy(b)),
            Arg::Int(n) => write!(f, "{}", n),
            Arg::Float(v) => f.write_str(&format_float(*v)),
        }
    }
}

/// Infinite scores use the `+inf`/`-inf` spelling the server parses.
fn format_float(value: f64) -> String {
    if value == f64::INFINITY {
        "+inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        value.to_string()
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::Str(s.to_string())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg::Str(s)
    }
}

impl From<&String> for Arg {
    fn from(s: &String) -> Self {
        Arg::Str(s.clone())
    }
}

impl From<&[u8]> for Arg {
    fn from(b: &[u8]) -> Self {
        Arg::Bytes(b.to_vec())
    }
}

impl From<Vec<u8>> for Arg {
    fn from(b: Vec<u8>) -> Self {
        Arg::Bytes(b)
    }
}

impl From<i64> for Arg {
    fn from(n: i64) -> Self {
        Arg::Int(n)
    }
}

impl From<i32> for Arg {
    fn from(n: i32) -> Self {
        Arg::Int(n as i64)
    }
}

impl From<u32> for Arg {
    fn from(n: u32) -> Self {
        Arg::Int(n as i64)
    }
}

impl From<u64> for Arg {
    fn from(n: u64) -> Self {
        match i64::try_from(n) {
            Ok(n) => Arg::Int(n),
            Err(_) => Arg::Str(n.to_string()),
        }
    }
}

impl From<usize> for Arg {
    fn from(n: usize) -> Self {
        Arg::from(n as u64)
    }
}

impl From<f64> for Arg {
    fn from(f: f64) -> Self {
        Arg::Float(f)
    }
}

/// A command ready for submission. Built once, then only read.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    name: String,
    args: Vec<Arg>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<Arg>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arguments(&self) -> &[Arg] {
        &self.args
    }

    /// Whether this is `name`, ignoring ASCII case.
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Appends the RESP encoding (an array of bulk strings) to `buf`.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(format!("*{}\r\n", self.args.len() + 1).as_bytes());
        push_bulk(buf, self.name.as_bytes());
        for arg in &self.args {
            push_bulk(buf, &arg.to_bytes());
        }
    }
}

fn push_bulk(buf: &mut Vec<u8>, data: &[u8]) {
    buf.extend_from_slice(format!("${}\r\n", data.len()).as_bytes());
    buf.extend_from_slice(data);
    buf.extend_from_slice(b"\r\n");
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_command() {
        let mut buf = Vec::new();
        Command::new("GET").arg("key").encode_into(&mut buf);
        assert_eq!(buf, b"*2\r\n$3\r\nGET\r\n$3\r\nkey\r\n");
    }

    #[test]
    fn test_numeric_args_encode_as_decimal_text() {
        let cmd = Command::new("ZADD").arg("z").arg(1.5).arg("m").arg(-3i64);
        let wire: Vec<Vec<u8>> = cmd.arguments().iter().map(Arg::to_bytes).collect();
        assert_eq!(
            wire,
            vec![b"z".to_vec(), b"1.5".to_vec(), b"m".to_vec(), b"-3".to_vec()]
        );
    }

    #[test]
    fn test_whole_floats_have_no_fraction() {
        assert_eq!(Arg::from(30.0).to_bytes(), b"30");
        assert_eq!(Arg::from(f64::INFINITY).to_bytes(), b"+inf");
        assert_eq!(Arg::from(f64::NEG_INFINITY).to_bytes(), b"-inf");
    }

    #[test]
    fn test_display() {
        let cmd = Command::new("SET").args(["a", "b"]).arg(10i64);
        assert_eq!(cmd.to_string(), "SET a b 10");
    }

    #[test]
    fn test_as_f64() {
        assert_eq!(Arg::from("2.5").as_f64(), Some(2.5));
        assert_eq!(Arg::from(3i64).as_f64(), Some(3.0));
        assert_eq!(Arg::from("abc").as_f64(), None);
    }
}

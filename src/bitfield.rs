//! BITFIELD sub-command fragments.
//!
//! Pure token builders; the caller concatenates fragments and passes them
//! to [`crate::commands::bitmaps::bitfield`]. An `OVERFLOW` fragment has no
//! reply slot of its own and governs every following `INCRBY` until the
//! next `OVERFLOW`.

use std::fmt;

use crate::command::Arg;
use crate::error::{ProxyError, Result};

/// Integer encoding such as `i8` or `u16`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitfieldType {
    signed: bool,
    bits: u8,
}

impl BitfieldType {
    pub const I8: BitfieldType = BitfieldType { signed: true, bits: 8 };
    pub const I16: BitfieldType = BitfieldType { signed: true, bits: 16 };
    pub const I32: BitfieldType = BitfieldType { signed: true, bits: 32 };
    pub const I64: BitfieldType = BitfieldType { signed: true, bits: 64 };
    pub const U8: BitfieldType = BitfieldType { signed: false, bits: 8 };
    pub const U16: BitfieldType = BitfieldType { signed: false, bits: 16 };
    pub const U32: BitfieldType = BitfieldType { signed: false, bits: 32 };

    /// Signed integer of 1 to 64 bits.
    pub fn signed(bits: u8) -> Result<Self> {
        if !(1..=64).contains(&bits) {
            return Err(ProxyError::argument(
                "BITFIELD",
                format!("signed width must be 1..=64, got {}", bits),
            ));
        }
        Ok(Self { signed: true, bits })
    }

    /// Unsigned integer of 1 to 63 bits.
    pub fn unsigned(bits: u8) -> Result<Self> {
        if !(1..=63).contains(&bits) {
            return Err(ProxyError::argument(
                "BITFIELD",
                format!("unsigned width must be 1..=63, got {}", bits),
            ));
        }
        Ok(Self { signed: false, bits })
    }

    pub fn bits(&self) -> u8 {
        self.bits
    }
}

impl fmt::Display for BitfieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", if self.signed { 'i' } else { 'u' }, self.bits)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitfieldOffset {
    /// Absolute bit offset.
    Bits(u64),
    /// `#n`: offset in units of the type width.
    Multiplied(u64),
}

impl fmt::Display for BitfieldOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BitfieldOffset::Bits(n) => write!(f, "{}", n),
            BitfieldOffset::Multiplied(n) => write!(f, "#{}", n),
        }
    }
}

impl From<u64> for BitfieldOffset {
    fn from(n: u64) -> Self {
        BitfieldOffset::Bits(n)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    Wrap,
    Sat,
    /// Out-of-range increments are skipped and reply null.
    Fail,
}

impl Overflow {
    pub fn as_str(&self) -> &'static str {
        match self {
            Overflow::Wrap => "WRAP",
            Overflow::Sat => "SAT",
            Overflow::Fail => "FAIL",
        }
    }
}

/// Ordered tokens of one sub-command.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment(Vec<Arg>);

impl Fragment {
    pub fn tokens(&self) -> &[Arg] {
        &self.0
    }

    pub fn into_tokens(self) -> Vec<Arg> {
        self.0
    }

    /// Whether this fragment produces a reply slot.
    pub fn has_reply(&self) -> bool {
        !matches!(self.0.first(), Some(Arg::Str(s)) if s == "OVERFLOW")
    }
}

pub fn get(ty: BitfieldType, offset: impl Into<BitfieldOffset>) -> Fragment {
    Fragment(vec![
        Arg::from("GET"),
        Arg::from(ty.to_string()),
        Arg::from(offset.into().to_string()),
    ])
}

pub fn set(ty: BitfieldType, offset: impl Into<BitfieldOffset>, value: i64) -> Fragment {
    Fragment(vec![
        Arg::from("SET"),
        Arg::from(ty.to_string()),
        Arg::from(offset.into().to_string()),
        Arg::from(value),
    ])
}

pub fn incrby(ty: BitfieldType, offset: impl Into<BitfieldOffset>, increment: i64) -> Fragment {
    Fragment(vec![
        Arg::from("INCRBY"),
        Arg::from(ty.to_string()),
        Arg::from(offset.into().to_string()),
        Arg::from(increment),
    ])
}

pub fn overflow(policy: Overflow) -> Fragment {
    Fragment(vec![Arg::from("OVERFLOW"), Arg::from(policy.as_str())])
}

/// `OVERFLOW policy INCRBY ...` as a single fragment.
pub fn incrby_with_overflow(
    ty: BitfieldType,
    offset: impl Into<BitfieldOffset>,
    increment: i64,
    policy: Overflow,
) -> Fragment {
    let mut tokens = overflow(policy).into_tokens();
    tokens.extend(incrby(ty, offset, increment).into_tokens());
    Fragment(tokens)
}

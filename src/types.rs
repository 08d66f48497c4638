use std::time::Duration;

/// Expiry attached by SET.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// `EX seconds`
    Seconds(u64),
    /// `PX milliseconds`
    Milliseconds(u64),
}

/// Conditional-existence token of SET.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetCondition {
    /// `NX`: only set when the key is absent.
    Nx,
    /// `XX`: only set when the key exists.
    Xx,
    /// `KEEPTTL`: retain the key's current time to live.
    KeepTtl,
}

impl SetCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetCondition::Nx => "NX",
            SetCondition::Xx => "XX",
            SetCondition::KeepTtl => "KEEPTTL",
        }
    }
}

/// Write-policy flag appended after every other SET modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetFlag {
    Write,
    DenyOom,
}

impl SetFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetFlag::Write => "write",
            SetFlag::DenyOom => "denyoom",
        }
    }
}

/// Optional tail of SET. Emitted as: expiry, condition, flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetOptions {
    pub expiry: Option<Expiry>,
    pub condition: Option<SetCondition>,
    pub flag: Option<SetFlag>,
}

impl SetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ex(mut self, seconds: u64) -> Self {
        self.expiry = Some(Expiry::Seconds(seconds));
        self
    }

    pub fn px(mut self, millis: u64) -> Self {
        self.expiry = Some(Expiry::Milliseconds(millis));
        self
    }

    /// Expiry from a duration; whole seconds use `EX`, anything finer `PX`.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.expiry = Some(if ttl.subsec_nanos() == 0 {
            Expiry::Seconds(ttl.as_secs())
        } else {
            // Round up so a sub-millisecond remainder never shortens the ttl.
            let millis = (ttl.as_nanos() + 999_999) / 1_000_000;
            Expiry::Milliseconds(u64::try_from(millis).unwrap_or(u64::MAX))
        });
        self
    }

    pub fn nx(mut self) -> Self {
        self.condition = Some(SetCondition::Nx);
        self
    }

    pub fn xx(mut self) -> Self {
        self.condition = Some(SetCondition::Xx);
        self
    }

    pub fn keep_ttl(mut self) -> Self {
        self.condition = Some(SetCondition::KeepTtl);
        self
    }

    pub fn flag(mut self, flag: SetFlag) -> Self {
        self.flag = Some(flag);
        self
    }
}

/// Sorted-set member with its score.
#[derive(Debug, Clone, PartialEq)]
pub struct ZMember {
    pub member: String,
    pub score: f64,
}

impl ZMember {
    pub fn new(member: impl Into<String>, score: f64) -> Self {
        Self {
            member: member.into(),
            score,
        }
    }
}

/// Remaining time to live, mirroring the TTL/PTTL sentinels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Key is missing (-2).
    Missing,
    /// Key exists without an expiry (-1).
    NoExpiry,
    ExpiresIn(Duration),
}

/// Where LINSERT places the new element relative to the pivot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    Before,
    After,
}

impl InsertPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsertPosition::Before => "BEFORE",
            InsertPosition::After => "AFTER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOperation {
    And,
    Or,
    Xor,
    Not,
}

impl BitOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            BitOperation::And => "AND",
            BitOperation::Or => "OR",
            BitOperation::Xor => "XOR",
            BitOperation::Not => "NOT",
        }
    }
}

//! Reply normalizers: wire replies to typed results.
//!
//! Each function takes the command name (for error messages) and the raw
//! reply. Null stays distinct from empty everywhere: a null bulk string is
//! `None`, an empty one is `Some("")`.

use std::collections::HashMap;
use std::time::Duration;

use crate::error::{ProxyError, Result};
use crate::resp::RespValue;
use crate::types::{Ttl, ZMember};

fn text(command: &str, value: RespValue) -> Result<String> {
    match value {
        RespValue::SimpleString(s) => Ok(s),
        RespValue::BulkString(Some(data)) => {
            String::from_utf8(data).map_err(|err| ProxyError::unexpected(command, err.into_bytes()))
        }
        other => Err(ProxyError::unexpected(command, other)),
    }
}

fn array(command: &str, value: RespValue) -> Result<Vec<RespValue>> {
    match value {
        RespValue::Array(Some(items)) => Ok(items),
        other => Err(ProxyError::unexpected(command, other)),
    }
}

fn parse_float(command: &str, s: &str) -> Result<f64> {
    s.trim()
        .parse()
        .map_err(|_| ProxyError::unexpected(command, s))
}

/// Status reply such as `+OK`.
pub(crate) fn ok(command: &str, value: RespValue) -> Result<()> {
    match value {
        RespValue::SimpleString(_) => Ok(()),
        other => Err(ProxyError::unexpected(command, other)),
    }
}

pub(crate) fn string(command: &str, value: RespValue) -> Result<String> {
    text(command, value)
}

pub(crate) fn opt_string(command: &str, value: RespValue) -> Result<Option<String>> {
    if value.is_null() {
        return Ok(None);
    }
    text(command, value).map(Some)
}

pub(crate) fn integer(command: &str, value: RespValue) -> Result<i64> {
    match value {
        RespValue::Integer(n) => Ok(n),
        other => Err(ProxyError::unexpected(command, other)),
    }
}

pub(crate) fn opt_integer(command: &str, value: RespValue) -> Result<Option<i64>> {
    if value.is_null() {
        return Ok(None);
    }
    integer(command, value).map(Some)
}

/// `:1` / `:0` as a boolean.
pub(crate) fn boolean(command: &str, value: RespValue) -> Result<bool> {
    integer(command, value).map(|n| n != 0)
}

/// Numeric string reply (INCRBYFLOAT, ZSCORE, ZINCRBY) as `f64`.
pub(crate) fn float(command: &str, value: RespValue) -> Result<f64> {
    let s = text(command, value)?;
    parse_float(command, &s)
}

pub(crate) fn opt_float(command: &str, value: RespValue) -> Result<Option<f64>> {
    if value.is_null() {
        return Ok(None);
    }
    float(command, value).map(Some)
}

pub(crate) fn string_list(command: &str, value: RespValue) -> Result<Vec<String>> {
    array(command, value)?
        .into_iter()
        .map(|item| text(command, item))
        .collect()
}

/// Arrays that may hold nulls, e.g. MGET and HMGET.
pub(crate) fn opt_string_list(command: &str, value: RespValue) -> Result<Vec<Option<String>>> {
    array(command, value)?
        .into_iter()
        .map(|item| opt_string(command, item))
        .collect()
}

/// Flat `field, value, ...` array as a map.
pub(crate) fn field_map(command: &str, value: RespValue) -> Result<HashMap<String, String>> {
    let items = array(command, value)?;
    if items.len() % 2 != 0 {
        return Err(ProxyError::unexpected(
            command,
            format!("odd number of elements ({})", items.len()),
        ));
    }
    let mut map = HashMap::with_capacity(items.len() / 2);
    let mut items = items.into_iter();
    while let (Some(field), Some(value)) = (items.next(), items.next()) {
        map.insert(text(command, field)?, text(command, value)?);
    }
    Ok(map)
}

/// Flat `member, score, ...` array (WITHSCORES). Only the odd-indexed
/// elements are coerced to numbers.
pub(crate) fn scored_members(command: &str, value: RespValue) -> Result<Vec<ZMember>> {
    let items = array(command, value)?;
    if items.len() % 2 != 0 {
        return Err(ProxyError::unexpected(
            command,
            format!("odd number of elements ({})", items.len()),
        ));
    }
    let mut members = Vec::with_capacity(items.len() / 2);
    let mut items = items.into_iter();
    while let (Some(member), Some(score)) = (items.next(), items.next()) {
        members.push(ZMember::new(text(command, member)?, float(command, score)?));
    }
    Ok(members)
}

/// BLPOP/BRPOP: null on timeout, otherwise `[key, element]`.
pub(crate) fn blocking_pop(command: &str, value: RespValue) -> Result<Option<(String, String)>> {
    if value.is_null() {
        return Ok(None);
    }
    let items = array(command, value)?;
    if items.len() != 2 {
        return Err(ProxyError::unexpected(command, items));
    }
    let mut items = items.into_iter();
    match (items.next(), items.next()) {
        (Some(key), Some(element)) => Ok(Some((text(command, key)?, text(command, element)?))),
        _ => Err(ProxyError::unexpected(command, "short reply")),
    }
}

/// One slot per GET/SET/INCRBY fragment; null where OVERFLOW FAIL hit.
pub(crate) fn bitfield(command: &str, value: RespValue) -> Result<Vec<Option<i64>>> {
    array(command, value)?
        .into_iter()
        .map(|item| opt_integer(command, item))
        .collect()
}

/// TTL (seconds) or PTTL (milliseconds) with their -2/-1 sentinels.
pub(crate) fn ttl(command: &str, value: RespValue, millis: bool) -> Result<Ttl> {
    match integer(command, value)? {
        -2 => Ok(Ttl::Missing),
        -1 => Ok(Ttl::NoExpiry),
        n if n >= 0 => Ok(Ttl::ExpiresIn(if millis {
            Duration::from_millis(n as u64)
        } else {
            Duration::from_secs(n as u64)
        })),
        n => Err(ProxyError::unexpected(command, n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bulk(s: &str) -> RespValue {
        RespValue::from_string(s)
    }

    #[test]
    fn test_null_is_not_empty() {
        assert_eq!(opt_string("GET", RespValue::null()).unwrap(), None);
        assert_eq!(opt_string("GET", bulk("")).unwrap(), Some(String::new()));
    }

    #[test]
    fn test_float_coercion() {
        assert_eq!(float("INCRBYFLOAT", bulk("10.5")).unwrap(), 10.5);
        assert_eq!(float("ZSCORE", bulk("inf")).unwrap(), f64::INFINITY);
        assert_eq!(float("ZSCORE", bulk("-inf")).unwrap(), f64::NEG_INFINITY);
        assert!(float("ZSCORE", bulk("abc")).is_err());
    }

    #[test]
    fn test_zero_score_is_not_absent() {
        assert_eq!(opt_float("ZSCORE", bulk("0")).unwrap(), Some(0.0));
        assert_eq!(opt_float("ZSCORE", RespValue::null()).unwrap(), None);
    }

    #[test]
    fn test_field_map() {
        let reply = RespValue::array(vec![bulk("a"), bulk("1"), bulk("b"), bulk("2")]);
        let map = field_map("HGETALL", reply).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["a"], "1");
        assert_eq!(map["b"], "2");

        assert!(field_map("HGETALL", RespValue::array(vec![bulk("a")])).is_err());
        assert!(field_map("HGETALL", RespValue::array(vec![])).unwrap().is_empty());
    }

    #[test]
    fn test_scored_members_coerce_only_scores() {
        // A numeric-looking member stays text.
        let reply = RespValue::array(vec![bulk("10"), bulk("1.5"), bulk("b"), bulk("2")]);
        let members = scored_members("ZRANGE", reply).unwrap();
        assert_eq!(members, vec![ZMember::new("10", 1.5), ZMember::new("b", 2.0)]);
    }

    #[test]
    fn test_blocking_pop() {
        assert_eq!(blocking_pop("BLPOP", RespValue::Array(None)).unwrap(), None);
        let reply = RespValue::array(vec![bulk("queue"), bulk("job")]);
        assert_eq!(
            blocking_pop("BLPOP", reply).unwrap(),
            Some(("queue".to_string(), "job".to_string()))
        );
    }

    #[test]
    fn test_bitfield_fail_slot_is_none() {
        let reply = RespValue::array(vec![RespValue::Integer(4), RespValue::null()]);
        assert_eq!(bitfield("BITFIELD", reply).unwrap(), vec![Some(4), None]);
    }

    #[test]
    fn test_ttl_sentinels() {
        assert_eq!(ttl("TTL", RespValue::Integer(-2), false).unwrap(), Ttl::Missing);
        assert_eq!(ttl("TTL", RespValue::Integer(-1), false).unwrap(), Ttl::NoExpiry);
        assert_eq!(
            ttl("TTL", RespValue::Integer(9), false).unwrap(),
            Ttl::ExpiresIn(Duration::from_secs(9))
        );
        assert_eq!(
            ttl("PTTL", RespValue::Integer(1500), true).unwrap(),
            Ttl::ExpiresIn(Duration::from_millis(1500))
        );
    }

    #[test]
    fn test_unexpected_shape() {
        let err = integer("INCR", bulk("1")).unwrap_err();
        assert!(matches!(err, ProxyError::UnexpectedReply { .. }));
    }
}

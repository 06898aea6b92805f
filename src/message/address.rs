//! Address parsing across heterogeneous source shapes.
//!
//! Sources disagree on how they spell a participant: a bare string
//! (`"Name <addr>"` or just the address), an object with `address`/`email`
//! and `name`, or nested `text`/`value` wrappers around either. The parser
//! recurses through the wrappers and terminates by stringifying whatever
//! is left — it never fails, it only degrades.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::message::model::Address;

static NAME_ADDR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(.*?)\s*<([^<>\s]+)>\s*$").unwrap());

/// Parse a `"Name <addr>"` or bare-address string.
pub fn parse_address_str(s: &str) -> Address {
    if let Some(caps) = NAME_ADDR_RE.captures(s) {
        let name = caps[1].trim_matches(['"', '\'']).trim();
        let email = caps[2].to_string();
        if name.is_empty() {
            return Address::new(email);
        }
        return Address::named(email, name);
    }
    Address::new(s.trim())
}

/// Parse one address from an arbitrarily-shaped source value.
///
/// Returns `None` for null/missing input; every other shape produces a
/// best-effort `Address`.
pub fn parse_address(value: &Value) -> Option<Address> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(parse_address_str(s)),
        Value::Array(items) => items.iter().find_map(parse_address),
        Value::Object(map) => {
            // Structured shape: address/email + optional name.
            let email = map
                .get("address")
                .or_else(|| map.get("email"))
                .and_then(Value::as_str);
            if let Some(email) = email {
                let name = map
                    .get("name")
                    .and_then(Value::as_str)
                    .filter(|n| !n.trim().is_empty());
                return Some(match name {
                    Some(n) => Address::named(email, n),
                    None => Address::new(email),
                });
            }
            // Nested wrappers ({"text": ...}, {"value": [...]}).
            if let Some(inner) = map.get("text").or_else(|| map.get("value")) {
                return parse_address(inner);
            }
            // No known shape left: stringify.
            Some(parse_address_str(&value.to_string()))
        }
        other => Some(parse_address_str(&other.to_string())),
    }
}

/// Parse a list of addresses from a value that may be a single shape, an
/// array of shapes, or a comma-separated string.
pub fn parse_address_list(value: &Value) -> Vec<Address> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().filter_map(parse_address).collect(),
        Value::String(s) if s.contains(',') && !s.contains('<') => s
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(parse_address_str)
            .collect(),
        other => parse_address(other).into_iter().collect(),
    }
}

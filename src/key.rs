//! Element keys.
//!
//! Every element of a collection is a `(Key, Value)` pair. Keys are either
//! integers (positions, or explicit integer identifiers) or strings. A string
//! that is the canonical spelling of an integer (`"7"`, `"-3"`, but not
//! `"07"` or `"+3"`) is normalised to [`Key::Int`], so `"7"` and `7` address
//! the same slot.
//!
//! Keys are small, hashable and cheap to clone, so they are used directly as
//! [`IndexMap`](indexmap::IndexMap) keys by [`Items`](crate::Items).

use serde_json::Value;
use std::fmt::{Display, Formatter, Result as FormatResult};

/// Key of a collection element.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// Integer key (sequential position or explicit integer identifier).
    Int(i64),
    /// Arbitrary string identifier.
    Str(String),
}

impl Key {
    /// Derive a key from an element value.
    ///
    /// - integers are used as-is, floats are truncated
    /// - booleans become `0`/`1`
    /// - `null` becomes the empty string
    /// - strings are normalised (canonical integers become [`Key::Int`])
    /// - arrays and objects use their compact JSON text
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Self::Str(String::new()),
            Value::Bool(b) => Self::Int(i64::from(*b)),
            Value::Number(n) => n.as_i64().map_or_else(
                || {
                    #[allow(clippy::cast_possible_truncation)]
                    let truncated = n.as_f64().unwrap_or_default().trunc() as i64;
                    Self::Int(truncated)
                },
                Self::Int,
            ),
            Value::String(s) => Self::from(s.as_str()),
            other => Self::Str(other.to_string()),
        }
    }

    /// The key as an element value (`Int` → number, `Str` → string).
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Int(i) => Value::from(*i),
            Self::Str(s) => Value::String(s.clone()),
        }
    }

    /// Integer payload, if this is an integer key.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Str(_) => None,
        }
    }

    #[must_use]
    pub const fn is_int(&self) -> bool {
        matches!(self, Self::Int(_))
    }
}

/// `true` if `s` is the canonical decimal spelling of an `i64`.
fn canonical_int(s: &str) -> Option<i64> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    if s == "-0" {
        return None;
    }
    s.parse().ok()
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        canonical_int(s).map_or_else(|| Self::Str(s.to_string()), Self::Int)
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        canonical_int(&s).map_or(Self::Str(s), Self::Int)
    }
}

impl From<&String> for Key {
    fn from(s: &String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Key {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<usize> for Key {
    fn from(i: usize) -> Self {
        Self::Int(i64::try_from(i).unwrap_or(i64::MAX))
    }
}

impl From<&Key> for Key {
    fn from(k: &Key) -> Self {
        k.clone()
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

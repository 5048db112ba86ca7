//! Element values and the comparison rules every operator shares.
//!
//! Elements carry dynamic [`serde_json::Value`]s (built with `preserve_order`,
//! so objects keep insertion order). Nested collections (chunks, groups,
//! windows, zip tuples) are values too: a sequentially keyed [`Items`] is a
//! JSON array, anything else a JSON object with stringified keys. Reading a
//! value back as [`Items`] reverses that, re-normalising numeric object keys.
//!
//! Comparison follows loose scripting-language rules rather than JSON
//! equality: numeric strings compare as numbers, `null` and booleans compare
//! by truthiness, and arrays compare by size and then element-wise.

use crate::key::Key;
use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde_json::{Map, Number, Value};
use std::cmp::Ordering;

/// The ordered key-value container backing every materialized sequence.
pub type Items = IndexMap<Key, Value>;

/// One element of a sequence.
pub type Pair = (Key, Value);

/* ===================== Truthiness & numbers ===================== */

/// Truthiness: `null`, `false`, `0`, `0.0`, `""`, `"0"` and empty
/// arrays/objects are false; everything else is true.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Parse a numeric string (optional surrounding whitespace, sign, decimals,
/// exponent). `inf`/`nan` spellings are not numeric.
#[must_use]
pub fn numeric_str(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty()
        || !t
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
    {
        return None;
    }
    t.parse::<f64>().ok()
}

/// Numeric view of a value for arithmetic (`sum`, `avg`, `median`).
///
/// Booleans count as `0`/`1`, numeric strings are parsed, `null` and
/// everything else is not a number.
#[must_use]
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => numeric_str(s),
        _ => None,
    }
}

/// Build a JSON number from an `f64`, collapsing integral values to integers.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn number_value(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < 9.0e15 {
        return Value::from(f as i64);
    }
    Number::from_f64(f).map_or(Value::Null, Value::Number)
}

/// String rendering used by `implode`, `join` and the string-based set
/// operations (`diff`, `intersect`).
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn to_display(value: &Value) -> String {
    match value {
        Value::Null | Value::Bool(false) => String::new(),
        Value::Bool(true) => "1".to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (None, Some(u), _) => u.to_string(),
            (None, None, Some(f)) => {
                if f.fract() == 0.0 && f.abs() < 1.0e15 {
                    (f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => "Array".to_string(),
    }
}

/* ===================== Equality & ordering ===================== */

/// Strict equality: same JSON type and same content (`1 !== 1.0`).
#[must_use]
pub fn strict_eq(a: &Value, b: &Value) -> bool {
    a == b
}

/// Loose equality (`==`).
#[must_use]
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, Value::String(s)) | (Value::String(s), Value::Null) => s.is_empty(),
        (Value::Null | Value::Bool(_), _) | (_, Value::Null | Value::Bool(_)) => {
            is_truthy(a) == is_truthy(b)
        }
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            numeric_str(s).map_or_else(
                || to_display(&Value::Number(n.clone())) == *s,
                |f| n.as_f64() == Some(f),
            )
        }
        (Value::String(x), Value::String(y)) => match (numeric_str(x), numeric_str(y)) {
            (Some(fx), Some(fy)) => fx == fy,
            _ => x == y,
        },
        (Value::Array(_) | Value::Object(_), Value::Array(_) | Value::Object(_)) => {
            let (left, right) = (value_to_items(a.clone()), value_to_items(b.clone()));
            left.len() == right.len()
                && left
                    .iter()
                    .all(|(k, v)| right.get(k).is_some_and(|w| loose_eq(v, w)))
        }
        _ => false,
    }
}

fn numbers_equal(x: &Number, y: &Number) -> bool {
    match (x.as_i64(), y.as_i64()) {
        (Some(i), Some(j)) => i == j,
        _ => x.as_f64() == y.as_f64(),
    }
}

fn compare_numbers(x: f64, y: f64) -> Ordering {
    OrderedFloat(x).cmp(&OrderedFloat(y))
}

/// Total ordering over values (`<=>`).
///
/// - numbers, and numeric strings against numbers, compare numerically
/// - two strings compare numerically when both are numeric, bytewise otherwise
/// - `null` against a string compares as the empty string
/// - `null`/booleans against anything else compare by truthiness
/// - arrays/objects are larger than scalars and compare by size, then
///   element-wise
#[must_use]
pub fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, Value::String(s)) => "".cmp(s.as_str()),
        (Value::String(s), Value::Null) => s.as_str().cmp(""),
        (Value::Null | Value::Bool(_), _) | (_, Value::Null | Value::Bool(_)) => {
            is_truthy(a).cmp(&is_truthy(b))
        }
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(i), Some(j)) => i.cmp(&j),
            _ => compare_numbers(x.as_f64().unwrap_or_default(), y.as_f64().unwrap_or_default()),
        },
        (Value::Number(n), Value::String(s)) => numeric_str(s).map_or_else(
            || to_display(a).as_str().cmp(s.as_str()),
            |f| compare_numbers(n.as_f64().unwrap_or_default(), f),
        ),
        (Value::String(s), Value::Number(n)) => numeric_str(s).map_or_else(
            || s.as_str().cmp(to_display(b).as_str()),
            |f| compare_numbers(f, n.as_f64().unwrap_or_default()),
        ),
        (Value::String(x), Value::String(y)) => match (numeric_str(x), numeric_str(y)) {
            (Some(fx), Some(fy)) => compare_numbers(fx, fy),
            _ => x.cmp(y),
        },
        (Value::Array(_) | Value::Object(_), Value::Array(_) | Value::Object(_)) => {
            let (left, right) = (value_to_items(a.clone()), value_to_items(b.clone()));
            left.len().cmp(&right.len()).then_with(|| {
                left.iter()
                    .zip(right.values())
                    .map(|((_, v), w)| compare(v, w))
                    .find(|o| o.is_ne())
                    .unwrap_or(Ordering::Equal)
            })
        }
        (Value::Array(_) | Value::Object(_), _) => Ordering::Greater,
        (_, Value::Array(_) | Value::Object(_)) => Ordering::Less,
    }
}

/// Ordering over keys, using the value ordering of their scalar forms.
#[must_use]
pub fn compare_keys(a: &Key, b: &Key) -> Ordering {
    match (a, b) {
        (Key::Int(x), Key::Int(y)) => x.cmp(y),
        _ => compare(&a.to_value(), &b.to_value()),
    }
}

/// Equality used by `in_array`-style membership checks.
#[must_use]
pub fn values_equal(a: &Value, b: &Value, strict: bool) -> bool {
    if strict { strict_eq(a, b) } else { loose_eq(a, b) }
}

/* ===================== Nested values ===================== */

/// `true` for values that behave as nested collections (arrays and objects).
#[must_use]
pub const fn is_collection_value(value: &Value) -> bool {
    matches!(value, Value::Array(_) | Value::Object(_))
}

/// `true` when the keys are exactly `0, 1, 2, ...` in order.
#[must_use]
pub fn is_list(items: &Items) -> bool {
    items
        .keys()
        .enumerate()
        .all(|(i, k)| k.as_int().and_then(|k| usize::try_from(k).ok()) == Some(i))
}

/// Render items as a value: a list becomes an array, anything else an object.
#[must_use]
pub fn items_to_value(items: Items) -> Value {
    if is_list(&items) {
        Value::Array(items.into_values().collect())
    } else {
        Value::Object(
            items
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect::<Map<String, Value>>(),
        )
    }
}

/// Read a value as items: arrays are indexed from 0, object keys are
/// normalised, `null` is empty and any other scalar is wrapped as `[scalar]`.
#[must_use]
pub fn value_to_items(value: Value) -> Items {
    match value {
        Value::Null => Items::new(),
        Value::Array(a) => a.into_iter().enumerate().map(|(i, v)| (Key::from(i), v)).collect(),
        Value::Object(o) => o.into_iter().map(|(k, v)| (Key::from(k), v)).collect(),
        scalar => std::iter::once((Key::Int(0), scalar)).collect(),
    }
}

/// Next free integer key: one past the largest integer key, or `0`.
#[must_use]
pub fn next_index(items: &Items) -> i64 {
    items
        .keys()
        .filter_map(Key::as_int)
        .max()
        .map_or(0, |max| max.saturating_add(1))
}

/// Append a value under the next free integer key.
pub fn push_value(items: &mut Items, value: Value) {
    let key = Key::Int(next_index(items));
    items.insert(key, value);
}

/// Re-key a sequence of values from `0`.
#[must_use]
pub fn list_items(values: impl IntoIterator<Item = Value>) -> Items {
    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| (Key::from(i), v))
        .collect()
}

/// Collect pairs, renumbering integer keys from `0` in order. String keys are
/// kept; a repeated string key overwrites in place.
#[must_use]
pub fn renumber(pairs: impl IntoIterator<Item = Pair>) -> Items {
    let mut out = Items::new();
    let mut next = 0_i64;
    for (k, v) in pairs {
        if k.is_int() {
            out.insert(Key::Int(next), v);
            next += 1;
        } else {
            out.insert(k, v);
        }
    }
    out
}

/* ===================== Dotted lookup ===================== */

fn child<'a>(target: &'a Value, segment: &str) -> Option<&'a Value> {
    match target {
        Value::Object(o) => o.get(segment),
        Value::Array(a) => segment.parse::<usize>().ok().and_then(|i| a.get(i)),
        _ => None,
    }
}

fn children(target: &Value) -> Option<Vec<&Value>> {
    match target {
        Value::Object(o) => Some(o.values().collect()),
        Value::Array(a) => Some(a.iter().collect()),
        _ => None,
    }
}

fn lookup(target: &Value, segments: &[&str]) -> Option<Value> {
    let Some((segment, rest)) = segments.split_first() else {
        return Some(target.clone());
    };
    match *segment {
        "*" => {
            let found: Vec<Value> = children(target)?
                .into_iter()
                .map(|item| lookup(item, rest).unwrap_or(Value::Null))
                .collect();
            if rest.contains(&"*") {
                let collapsed = found
                    .into_iter()
                    .filter(is_collection_value)
                    .flat_map(|v| value_to_items(v).into_values())
                    .collect();
                Some(Value::Array(collapsed))
            } else {
                Some(Value::Array(found))
            }
        }
        "{first}" => lookup(children(target)?.first()?, rest),
        "{last}" => lookup(children(target)?.last()?, rest),
        _ => lookup(child(target, segment)?, rest),
    }
}

/// Safe nested lookup by dotted path (`"a.b.0.c"`).
///
/// Supports `*` (every child), `{first}` and `{last}` segments. Missing
/// segments resolve to `None`; this never fails on partial paths.
#[must_use]
pub fn data_get_opt(target: &Value, path: &str) -> Option<Value> {
    if path.is_empty() {
        return Some(target.clone());
    }
    let segments: Vec<&str> = path.split('.').collect();
    lookup(target, &segments)
}

/// [`data_get_opt`] with `null` for missing paths.
#[must_use]
pub fn data_get(target: &Value, path: &str) -> Value {
    data_get_opt(target, path).unwrap_or(Value::Null)
}

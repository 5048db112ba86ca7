//! Positional slicing, padding and dot-notation reshaping.

use crate::cursor::Chunk;
use crate::key::Key;
use crate::values::{Items, is_collection_value, push_value, renumber, value_to_items};
use serde_json::{Map, Value};

fn clamp_index(index: i64, len: usize) -> usize {
    let len_i = i64::try_from(len).unwrap_or(i64::MAX);
    let resolved = if index < 0 { (len_i + index).max(0) } else { index.min(len_i) };
    usize::try_from(resolved).unwrap_or_default()
}

/// Resolve `(offset, length)` against `len` into a `start..end` range.
///
/// A negative `offset` counts from the end. A negative `length` stops that
/// many elements before the end; `None` runs to the end.
#[must_use]
pub fn slice_bounds(len: usize, offset: i64, length: Option<i64>) -> (usize, usize) {
    let start = clamp_index(offset, len);
    let end = match length {
        None => len,
        Some(l) if l < 0 => clamp_index(l, len),
        Some(l) => start.saturating_add(usize::try_from(l).unwrap_or_default()).min(len),
    };
    (start, end.max(start))
}

/// Keys-preserving positional slice; see [`slice_bounds`].
#[must_use]
pub fn slice(items: &Items, offset: i64, length: Option<i64>) -> Items {
    let (start, end) = slice_bounds(items.len(), offset, length);
    items
        .iter()
        .skip(start)
        .take(end - start)
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// First `limit` elements, or the last `|limit|` when negative.
#[must_use]
pub fn take(items: &Items, limit: i64) -> Items {
    if limit < 0 {
        slice(items, limit, None)
    } else {
        slice(items, 0, Some(limit))
    }
}

/// Pad to `|size|` elements with `value`: appended for a positive size,
/// prepended for a negative one.
///
/// Prepending renumbers integer keys from `0`; appending continues after the
/// largest integer key.
#[must_use]
pub fn pad(items: &Items, size: i64, value: &Value) -> Items {
    let target = usize::try_from(size.unsigned_abs()).unwrap_or(usize::MAX);
    if target <= items.len() {
        return items.clone();
    }
    let missing = target - items.len();
    if size > 0 {
        let mut out = items.clone();
        for _ in 0..missing {
            push_value(&mut out, value.clone());
        }
        return out;
    }

    let fillers = std::iter::repeat_n((Key::Int(0), value.clone()), missing);
    renumber(fillers.chain(items.iter().map(|(k, v)| (k.clone(), v.clone()))))
}

/// `chunk(ceil(len / groups))`, keys preserved inside each chunk.
#[must_use]
pub fn split_in(items: &Items, groups: usize) -> Items {
    if groups == 0 || items.is_empty() {
        return Items::new();
    }
    let size = items.len().div_ceil(groups);
    Chunk::new(Box::new(items.clone().into_iter()), size).collect()
}

/* ===================== dot notation ===================== */

fn dot_into(out: &mut Items, prefix: &str, items: Items) {
    for (k, v) in items {
        let path = format!("{prefix}{k}");
        let nested = match &v {
            Value::Array(a) => !a.is_empty(),
            Value::Object(o) => !o.is_empty(),
            _ => false,
        };
        if nested {
            dot_into(out, &format!("{path}."), value_to_items(v));
        } else {
            out.insert(Key::from(path), v);
        }
    }
}

/// Flatten nested collections into one level with `"a.b.c"` keys.
#[must_use]
pub fn dot(items: &Items) -> Items {
    let mut out = Items::new();
    dot_into(&mut out, "", items.clone());
    out
}

fn set_path(target: &mut Map<String, Value>, segments: &[&str], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };
    if rest.is_empty() {
        target.insert((*head).to_string(), value);
        return;
    }
    let slot = target
        .entry((*head).to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !matches!(slot, Value::Object(_)) {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(child) = slot {
        set_path(child, rest, value);
    }
}

/// Objects keyed exactly `"0".."n-1"` become arrays, recursively.
fn restore_lists(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sequential = map.keys().enumerate().all(|(i, k)| *k == i.to_string());
            let children = map.into_iter().map(|(k, v)| (k, restore_lists(v)));
            if sequential {
                Value::Array(children.map(|(_, v)| v).collect())
            } else {
                Value::Object(children.collect())
            }
        }
        Value::Array(a) => Value::Array(a.into_iter().map(restore_lists).collect()),
        other => other,
    }
}

/// Expand `"a.b.c"` keys back into nested collections.
#[must_use]
pub fn undot(items: &Items) -> Items {
    let mut root = Map::new();
    for (k, v) in items {
        let path = k.to_string();
        let segments: Vec<&str> = path.split('.').collect();
        set_path(&mut root, &segments, v.clone());
    }
    root.into_iter()
        .map(|(k, v)| {
            let v = if is_collection_value(&v) { restore_lists(v) } else { v };
            (Key::from(k), v)
        })
        .collect()
}

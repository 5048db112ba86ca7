//! Set algebra, merging and duplicate detection.
//!
//! Plain `diff`/`intersect` compare values by their string rendering, so `1`
//! and `"1"` are the same member. The `_using` variants take a comparator
//! instead, where `Ordering::Equal` means "same member".

use crate::key::Key;
use crate::selector::Retriever;
use crate::values::{
    Items, is_collection_value, items_to_value, list_items, renumber, to_display,
    value_to_items, values_equal,
};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{HashSet, VecDeque};

fn rendered(items: &Items) -> HashSet<String> {
    items.values().map(to_display).collect()
}

fn filter_items<F>(items: &Items, keep: F) -> Items
where
    F: Fn(&Key, &Value) -> bool,
{
    items
        .iter()
        .filter(|(k, v)| keep(k, v))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/* ===================== diff ===================== */

/// Elements whose value is not present in `other`.
#[must_use]
pub fn diff(items: &Items, other: &Items) -> Items {
    let seen = rendered(other);
    filter_items(items, |_, v| !seen.contains(&to_display(v)))
}

pub fn diff_using<F>(items: &Items, other: &Items, cmp: F) -> Items
where
    F: Fn(&Value, &Value) -> Ordering,
{
    filter_items(items, |_, v| !other.values().any(|o| cmp(v, o).is_eq()))
}

/// Elements whose key/value pair is not present in `other`.
#[must_use]
pub fn diff_assoc(items: &Items, other: &Items) -> Items {
    filter_items(items, |k, v| {
        other.get(k).is_none_or(|o| to_display(o) != to_display(v))
    })
}

/// [`diff_assoc`] with keys compared by `key_cmp`.
pub fn diff_assoc_using<F>(items: &Items, other: &Items, key_cmp: F) -> Items
where
    F: Fn(&Key, &Key) -> Ordering,
{
    filter_items(items, |k, v| {
        !other
            .iter()
            .any(|(ok, ov)| key_cmp(k, ok).is_eq() && to_display(ov) == to_display(v))
    })
}

#[must_use]
pub fn diff_keys(items: &Items, other: &Items) -> Items {
    filter_items(items, |k, _| !other.contains_key(k))
}

pub fn diff_keys_using<F>(items: &Items, other: &Items, key_cmp: F) -> Items
where
    F: Fn(&Key, &Key) -> Ordering,
{
    filter_items(items, |k, _| !other.keys().any(|ok| key_cmp(k, ok).is_eq()))
}

/* ===================== intersect ===================== */

#[must_use]
pub fn intersect(items: &Items, other: &Items) -> Items {
    let seen = rendered(other);
    filter_items(items, |_, v| seen.contains(&to_display(v)))
}

pub fn intersect_using<F>(items: &Items, other: &Items, cmp: F) -> Items
where
    F: Fn(&Value, &Value) -> Ordering,
{
    filter_items(items, |_, v| other.values().any(|o| cmp(v, o).is_eq()))
}

#[must_use]
pub fn intersect_assoc(items: &Items, other: &Items) -> Items {
    filter_items(items, |k, v| {
        other.get(k).is_some_and(|o| to_display(o) == to_display(v))
    })
}

#[must_use]
pub fn intersect_by_keys(items: &Items, other: &Items) -> Items {
    filter_items(items, |k, _| other.contains_key(k))
}

/* ===================== merge / union / replace ===================== */

/// Integer keys are renumbered from `0` across both inputs; a string key
/// present in both takes `other`'s value at its original position.
#[must_use]
pub fn merge(items: &Items, other: &Items) -> Items {
    renumber(items.iter().chain(other).map(|(k, v)| (k.clone(), v.clone())))
}

fn as_merge_items(value: Value) -> Items {
    if is_collection_value(&value) {
        value_to_items(value)
    } else {
        list_items([value])
    }
}

/// Like [`merge`], but colliding string keys are merged into a nested list
/// (recursively when both sides are collections).
#[must_use]
pub fn merge_recursive(items: &Items, other: &Items) -> Items {
    let mut out = Items::with_capacity(items.len() + other.len());
    let mut next = 0_i64;
    for (k, v) in items.iter().chain(other) {
        if k.is_int() {
            out.insert(Key::Int(next), v.clone());
            next += 1;
            continue;
        }
        let merged = match out.get(k) {
            Some(existing) => {
                let left = as_merge_items(existing.clone());
                let right = as_merge_items(v.clone());
                items_to_value(merge_recursive(&left, &right))
            }
            None => v.clone(),
        };
        out.insert(k.clone(), merged);
    }
    out
}

/// Keys of `other` that are missing from `items` are appended; existing keys
/// win.
#[must_use]
pub fn union(items: &Items, other: &Items) -> Items {
    let mut out = items.clone();
    for (k, v) in other {
        out.entry(k.clone()).or_insert_with(|| v.clone());
    }
    out
}

/// Overwrite by key, descending into values that are collections on both
/// sides.
#[must_use]
pub fn replace_recursive(items: &Items, other: &Items) -> Items {
    let mut out = items.clone();
    for (k, v) in other {
        let replaced = match out.get(k) {
            Some(existing) if is_collection_value(existing) && is_collection_value(v) => {
                let left = value_to_items(existing.clone());
                let right = value_to_items(v.clone());
                items_to_value(replace_recursive(&left, &right))
            }
            _ => v.clone(),
        };
        out.insert(k.clone(), replaced);
    }
    out
}

/// Cartesian product of the values of every input, as lists.
#[must_use]
pub fn cross_join(items: &Items, others: &[Items]) -> Items {
    let mut rows: Vec<Vec<Value>> = vec![Vec::new()];
    for input in std::iter::once(items).chain(others) {
        rows = rows
            .into_iter()
            .flat_map(|row| {
                input.values().map(move |v| {
                    let mut next = row.clone();
                    next.push(v.clone());
                    next
                })
            })
            .collect();
    }
    list_items(rows.into_iter().map(Value::Array))
}

/* ===================== duplicates ===================== */

/// Retrieved values of every element that repeats an earlier one.
///
/// The first occurrence of each distinct value is consumed from a queue of
/// uniques in order; any element that does not match the queue head is a
/// duplicate, once per occurrence.
#[must_use]
pub fn duplicates(items: &Items, retrieve: &Retriever, strict: bool) -> Items {
    let retrieved: Vec<(Key, Value)> = items
        .iter()
        .map(|(k, v)| (k.clone(), retrieve(v, k)))
        .collect();

    let mut uniques: VecDeque<Value> = VecDeque::new();
    for (_, value) in &retrieved {
        if !uniques.iter().any(|u| values_equal(u, value, strict)) {
            uniques.push_back(value.clone());
        }
    }

    let mut out = Items::new();
    for (key, value) in retrieved {
        if uniques.front().is_some_and(|head| values_equal(&value, head, strict)) {
            uniques.pop_front();
        } else {
            out.insert(key, value);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::Selector;
    use serde_json::json;

    fn pairs(items: &Items) -> Vec<(Key, Value)> {
        items.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    #[test]
    fn diff_compares_string_renderings() {
        let a = list_items([json!(1), json!("2"), json!(3)]);
        let b = list_items([json!("1"), json!(2)]);
        assert_eq!(pairs(&diff(&a, &b)), vec![(Key::Int(2), json!(3))]);
        assert_eq!(intersect(&a, &b).len(), 2);
    }

    #[test]
    fn merge_renumbers_ints_and_overwrites_strings() {
        let a: Items = [(Key::from("id"), json!(1)), (Key::Int(5), json!("x"))].into_iter().collect();
        let b: Items = [(Key::from("id"), json!(2)), (Key::Int(9), json!("y"))].into_iter().collect();
        assert_eq!(
            pairs(&merge(&a, &b)),
            vec![
                (Key::from("id"), json!(2)),
                (Key::Int(0), json!("x")),
                (Key::Int(1), json!("y")),
            ]
        );
    }

    #[test]
    fn merge_recursive_collects_colliding_strings() {
        let a: Items = [(Key::from("tag"), json!("a"))].into_iter().collect();
        let b: Items = [(Key::from("tag"), json!("b"))].into_iter().collect();
        assert_eq!(merge_recursive(&a, &b)[&Key::from("tag")], json!(["a", "b"]));
    }

    #[test]
    fn duplicates_flag_each_repeat() {
        let items = list_items([json!("a"), json!("b"), json!("a"), json!("a"), json!(1), json!("1")]);
        let dupes = duplicates(&items, &Selector::Identity.resolve(), false);
        assert_eq!(
            pairs(&dupes),
            vec![(Key::Int(2), json!("a")), (Key::Int(3), json!("a")), (Key::Int(5), json!("1"))]
        );
        let strict = duplicates(&items, &Selector::Identity.resolve(), true);
        assert_eq!(strict.len(), 2);
    }

    #[test]
    fn cross_join_builds_every_combination() {
        let a = list_items([json!(1), json!(2)]);
        let b = list_items([json!("a"), json!("b")]);
        let joined = cross_join(&a, &[b]);
        assert_eq!(joined.len(), 4);
        assert_eq!(joined[&Key::Int(1)], json!([1, "b"]));
    }
}

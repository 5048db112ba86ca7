//! Stable, key-preserving sorts.

use crate::key::Key;
use crate::selector::SortCriterion;
use crate::values::{Items, Pair, compare};
use serde_json::Value;
use std::cmp::Ordering;

fn sorted_pairs<F>(items: &Items, mut cmp: F) -> Items
where
    F: FnMut(&Pair, &Pair) -> Ordering,
{
    let mut pairs: Vec<Pair> = items.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    pairs.sort_by(|a, b| cmp(a, b));
    pairs.into_iter().collect()
}

/// Sort by value with `cmp`, keeping keys.
pub fn sort_values<F>(items: &Items, cmp: F) -> Items
where
    F: Fn(&Value, &Value) -> Ordering,
{
    sorted_pairs(items, |a, b| cmp(&a.1, &b.1))
}

/// Natural ascending (or descending) value order.
#[must_use]
pub fn sort_natural(items: &Items, descending: bool) -> Items {
    if descending {
        sort_values(items, |a, b| compare(b, a))
    } else {
        sort_values(items, compare)
    }
}

/// Multi-key sort.
///
/// Criteria are tried in order and the next one is consulted only when the
/// previous comparison is exactly equal. Each criterion carries its own
/// direction. Ties left after the last criterion keep their input order.
#[must_use]
pub fn sort_by_criteria(items: &Items, criteria: &[SortCriterion]) -> Items {
    let comparers: Vec<_> = criteria.iter().map(SortCriterion::comparer).collect();
    sorted_pairs(items, |a, b| {
        comparers
            .iter()
            .map(|cmp| cmp(a, b))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    })
}

/// Sort by key with `cmp`.
pub fn sort_keys<F>(items: &Items, cmp: F) -> Items
where
    F: Fn(&Key, &Key) -> Ordering,
{
    sorted_pairs(items, |a, b| cmp(&a.0, &b.0))
}

#[must_use]
pub fn reverse(items: &Items) -> Items {
    items.iter().rev().map(|(k, v)| (k.clone(), v.clone())).collect()
}

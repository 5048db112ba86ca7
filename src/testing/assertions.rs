//! Assertions over collection outputs.
//!
//! Every helper takes an [`Enumerable`] and pulls it once, so the same
//! assertion works for eager collections and lazy pipelines.

use crate::enumerable::Enumerable;
use crate::key::Key;
use crate::values::Pair;
use serde_json::Value;

/// Assert that the collection's values equal `expected`, in order. Keys are
/// ignored.
///
/// # Panics
///
/// Panics on the first differing position, or if the lengths differ.
///
/// # Example
///
/// ```
/// use lazybeam::testing::assert_values_equal;
/// use lazybeam::{Collection, Enumerable};
/// use serde_json::json;
///
/// let doubled = Collection::make(vec![1, 2, 3]).map(|v, _| json!(v.as_i64().unwrap_or(0) * 2));
/// assert_values_equal(&doubled, &[json!(2), json!(4), json!(6)]);
/// ```
#[track_caller]
pub fn assert_values_equal<E: Enumerable>(collection: &E, expected: &[Value]) {
    let actual = collection.to_list();
    assert_eq!(
        actual.len(),
        expected.len(),
        "Collection length mismatch:\n  Expected length: {}\n  Actual length: {}\n  Expected: {expected:?}\n  Actual: {actual:?}",
        expected.len(),
        actual.len()
    );
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert_eq!(
            a, e,
            "Collection mismatch at position {i}:\n  Expected: {e}\n  Actual: {a}\n  Full actual: {actual:?}"
        );
    }
}

/// Assert exact keys and values, in order.
///
/// # Panics
///
/// Panics if any pair differs or the lengths differ.
#[track_caller]
pub fn assert_items_equal<E, K>(collection: &E, expected: Vec<(K, Value)>)
where
    E: Enumerable,
    K: Into<Key>,
{
    let actual = collection.to_pairs();
    let expected: Vec<Pair> = expected.into_iter().map(|(k, v)| (k.into(), v)).collect();
    assert_eq!(
        actual, expected,
        "Collection pairs mismatch:\n  Expected: {expected:?}\n  Actual: {actual:?}"
    );
}

/// Assert that every element satisfies `predicate`.
///
/// # Panics
///
/// Names the first element that fails.
#[track_caller]
pub fn assert_all<E: Enumerable>(collection: &E, predicate: impl Fn(&Value, &Key) -> bool) {
    for (key, value) in collection.iter() {
        assert!(
            predicate(&value, &key),
            "Predicate failed for element {key}:\n  Value: {value}"
        );
    }
}

/// Assert that at least one element satisfies `predicate`.
///
/// # Panics
///
/// Panics if none do.
#[track_caller]
pub fn assert_any<E: Enumerable>(collection: &E, predicate: impl Fn(&Value, &Key) -> bool) {
    assert!(
        collection.iter().any(|(k, v)| predicate(&v, &k)),
        "No elements satisfied the predicate:\n  Collection: {:?}",
        collection.to_pairs()
    );
}

/// Assert that no element satisfies `predicate`.
///
/// # Panics
///
/// Names the first element that matches.
#[track_caller]
pub fn assert_none<E: Enumerable>(collection: &E, predicate: impl Fn(&Value, &Key) -> bool) {
    for (key, value) in collection.iter() {
        assert!(
            !predicate(&value, &key),
            "Predicate unexpectedly succeeded for element {key}:\n  Value: {value}"
        );
    }
}

/// # Panics
///
/// Panics if the element count differs from `expected_size`.
#[track_caller]
pub fn assert_collection_size<E: Enumerable>(collection: &E, expected_size: usize) {
    let actual = collection.count();
    assert_eq!(
        actual, expected_size,
        "Collection size mismatch:\n  Expected: {expected_size}\n  Actual: {actual}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Collection, LazyCollection};
    use serde_json::json;

    #[test]
    fn assertions_accept_both_kinds() {
        let eager = Collection::make(vec![1, 2, 3]);
        let lazy = LazyCollection::range(1, 3);
        assert_values_equal(&eager, &[json!(1), json!(2), json!(3)]);
        assert_values_equal(&lazy, &[json!(1), json!(2), json!(3)]);
        assert_items_equal(&eager.skip(1), vec![(1, json!(2)), (2, json!(3))]);
        assert_all(&lazy, |v, _| v.as_i64().is_some_and(|n| n > 0));
        assert_any(&eager, |v, _| *v == json!(2));
        assert_none(&lazy, |v, _| v.is_string());
        assert_collection_size(&lazy, 3);
    }

    #[test]
    #[should_panic(expected = "Collection size mismatch")]
    fn size_mismatch_panics() {
        assert_collection_size(&Collection::make(vec![1]), 2);
    }
}

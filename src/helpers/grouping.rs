//! Grouping and partitioning into nested collections.

use crate::key::Key;
use crate::selector::Retriever;
use crate::values::{Items, Pair, is_collection_value, items_to_value, list_items, push_value, renumber, value_to_items};
use indexmap::IndexMap;
use serde_json::Value;

/// Group elements by the retrieved value of the first retriever, then group
/// every group by the next one, and so on.
///
/// A retrieved collection puts the element in one group per member. Group
/// keys are derived with [`Key::from_value`], so `true`/`false` become
/// `1`/`0`. Inside each group the original keys survive only when
/// `preserve_keys` is set.
#[must_use]
pub fn group_by(items: &Items, retrievers: &[Retriever], preserve_keys: bool) -> Items {
    let Some((first, rest)) = retrievers.split_first() else {
        return items.clone();
    };

    let mut groups: IndexMap<Key, Items> = IndexMap::new();
    for (key, value) in items {
        let retrieved = first(value, key);
        let group_keys: Vec<Key> = if is_collection_value(&retrieved) {
            value_to_items(retrieved).values().map(Key::from_value).collect()
        } else {
            vec![Key::from_value(&retrieved)]
        };
        for group_key in group_keys {
            let group = groups.entry(group_key).or_default();
            if preserve_keys {
                group.insert(key.clone(), value.clone());
            } else {
                push_value(group, value.clone());
            }
        }
    }

    groups
        .into_iter()
        .map(|(k, group)| {
            let nested = if rest.is_empty() { group } else { group_by(&group, rest, preserve_keys) };
            (k, items_to_value(nested))
        })
        .collect()
}

/// Collect every pair produced by `f` into a dictionary of lists.
pub fn map_to_dictionary<F, I>(items: &Items, f: F) -> Items
where
    F: Fn(&Value, &Key) -> I,
    I: IntoIterator<Item = Pair>,
{
    let mut dictionary: IndexMap<Key, Vec<Value>> = IndexMap::new();
    for (key, value) in items {
        for (k, v) in f(value, key) {
            dictionary.entry(k).or_default().push(v);
        }
    }
    dictionary
        .into_iter()
        .map(|(k, values)| (k, Value::Array(values)))
        .collect()
}

/// Split into at most `groups` near-equal groups.
///
/// Front groups absorb the remainder, so sizes differ by at most one. Empty
/// groups are not emitted. Integer keys inside each group are renumbered;
/// string keys are kept.
#[must_use]
pub fn split(items: &Items, groups: usize) -> Items {
    if groups == 0 || items.is_empty() {
        return Items::new();
    }
    let base = items.len() / groups;
    let remainder = items.len() % groups;
    let mut pairs = items.iter().map(|(k, v)| (k.clone(), v.clone()));
    let mut out = Vec::with_capacity(groups);
    for i in 0..groups {
        let size = base + usize::from(i < remainder);
        if size == 0 {
            continue;
        }
        out.push(items_to_value(renumber(pairs.by_ref().take(size))));
    }
    list_items(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::Selector;
    use serde_json::json;

    #[test]
    fn group_by_uses_bool_keys_as_ints() {
        let items = list_items([json!({"ok": true}), json!({"ok": false}), json!({"ok": true})]);
        let grouped = group_by(&items, &[Selector::from("ok").resolve()], false);
        let keys: Vec<Key> = grouped.keys().cloned().collect();
        assert_eq!(keys, vec![Key::Int(1), Key::Int(0)]);
        assert_eq!(grouped[&Key::Int(1)].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn group_by_fans_out_on_collection_keys() {
        let items = list_items([json!({"tags": ["a", "b"]}), json!({"tags": ["b"]})]);
        let grouped = group_by(&items, &[Selector::from("tags").resolve()], true);
        assert_eq!(grouped[&Key::from("a")], json!([{"tags": ["a", "b"]}]));
        assert_eq!(grouped[&Key::from("b")], json!([{"tags": ["a", "b"]}, {"tags": ["b"]}]));
    }

    #[test]
    fn split_front_loads_remainder() {
        let items = list_items((1..=5).map(Value::from));
        assert_eq!(
            items_to_value(split(&items, 3)),
            json!([[1, 2], [3, 4], [5]])
        );
        assert_eq!(split(&list_items([json!(1)]), 3).len(), 1);
    }

    #[test]
    fn split_keeps_string_keys() {
        let items = value_to_items(json!({"a": 1, "b": 2, "7": 3}));
        assert_eq!(
            items_to_value(split(&items, 2)),
            json!([{"a": 1, "b": 2}, [3]])
        );
    }
}

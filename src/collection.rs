//! Eager, materialized collections.
//!
//! A [`Collection`] owns its items behind an `Rc`, so cloning is cheap and
//! [`Collection::lazy`] views the same storage without copying. Operators
//! return new collections; only the named mutators below change a collection
//! in place, copying the storage first if it is shared.

use crate::cursor::{self, Cursor, MaterializedCursor};
use crate::enumerable::Enumerable;
use crate::helpers::shape;
use crate::key::Key;
use crate::lazy::LazyCollection;
use crate::source::{Input, Source};
use crate::values::{Items, Pair, is_list, list_items, push_value, renumber};
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value;
use std::fmt::{Debug, Formatter, Result as FormatResult};
use std::rc::Rc;

/// An ordered key-value collection held in memory.
#[derive(Clone, Default)]
pub struct Collection {
    items: Rc<Items>,
}

impl Collection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from anything [`Input`] accepts. A started cursor is drained.
    pub fn make(input: impl Into<Input>) -> Self {
        Self::from_items(input.into().into_items())
    }

    /// Borrow the underlying items.
    #[must_use]
    pub fn items(&self) -> &Items {
        &self.items
    }

    pub(crate) fn shared(&self) -> Rc<Items> {
        Rc::clone(&self.items)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// A lazy view over the same storage.
    #[must_use]
    pub fn lazy(&self) -> LazyCollection {
        LazyCollection::new(Source::Materialized(self.shared()))
    }

    fn items_mut(&mut self) -> &mut Items {
        Rc::make_mut(&mut self.items)
    }

    /* ===================== Mutators ===================== */

    /// Append under the next integer key.
    pub fn push(&mut self, value: impl Into<Value>) -> &mut Self {
        push_value(self.items_mut(), value.into());
        self
    }

    /// Alias of [`push`](Self::push).
    pub fn add(&mut self, value: impl Into<Value>) -> &mut Self {
        self.push(value)
    }

    /// Set `key`, keeping its position if it already exists.
    pub fn put(&mut self, key: impl Into<Key>, value: impl Into<Value>) -> &mut Self {
        self.items_mut().insert(key.into(), value.into());
        self
    }

    /// Insert at the front; integer keys are renumbered from `0`.
    pub fn prepend(&mut self, value: impl Into<Value>) -> &mut Self {
        let existing = std::mem::take(self.items_mut());
        *self.items_mut() = renumber(std::iter::once((Key::Int(0), value.into())).chain(existing));
        self
    }

    /// Insert `key` at the front, replacing any existing entry for it.
    pub fn prepend_keyed(&mut self, key: impl Into<Key>, value: impl Into<Value>) -> &mut Self {
        let key = key.into();
        let mut existing = std::mem::take(self.items_mut());
        existing.shift_remove(&key);
        let mut items = Items::with_capacity(existing.len() + 1);
        items.insert(key, value.into());
        items.extend(existing);
        *self.items_mut() = items;
        self
    }

    /// Remove every listed key.
    pub fn forget<I>(&mut self, keys: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Key>,
    {
        let items = self.items_mut();
        for key in keys {
            items.shift_remove(&key.into());
        }
        self
    }

    /// Remove `key` and return its value.
    pub fn pull(&mut self, key: impl Into<Key>) -> Option<Value> {
        self.items_mut().shift_remove(&key.into())
    }

    /// Remove and return the last value.
    pub fn pop(&mut self) -> Option<Value> {
        self.items_mut().pop().map(|(_, v)| v)
    }

    /// Remove the last `count` values, returned last-first.
    pub fn pop_many(&mut self, count: usize) -> Self {
        let items = self.items_mut();
        let popped: Vec<Value> = std::iter::from_fn(|| items.pop().map(|(_, v)| v))
            .take(count)
            .collect();
        Self::from_items(list_items(popped))
    }

    /// Remove and return the first value; integer keys are renumbered.
    pub fn shift(&mut self) -> Option<Value> {
        self.shift_many(1).items.values().next().cloned()
    }

    /// Remove the first `count` values; integer keys are renumbered.
    pub fn shift_many(&mut self, count: usize) -> Self {
        if count == 0 || self.items.is_empty() {
            return Self::new();
        }
        let mut rest = std::mem::take(self.items_mut()).into_iter();
        let shifted: Vec<Value> = rest.by_ref().take(count).map(|(_, v)| v).collect();
        *self.items_mut() = renumber(rest);
        Self::from_items(list_items(shifted))
    }

    /// Map every value in place.
    pub fn transform<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Value, &Key) -> Value,
    {
        for (k, v) in self.items_mut().iter_mut() {
            *v = f(v, k);
        }
        self
    }

    /// Value at `key`, inserting `default()` first if it is missing.
    pub fn get_or_put<F>(&mut self, key: impl Into<Key>, default: F) -> Value
    where
        F: FnOnce() -> Value,
    {
        self.items_mut().entry(key.into()).or_insert_with(default).clone()
    }

    /// Remove a positional range, insert `replacement` in its place and return
    /// the removed values.
    ///
    /// Offsets follow [`slice`](Enumerable::slice). Integer keys of the result
    /// are renumbered.
    pub fn splice(&mut self, offset: i64, length: Option<i64>, replacement: Vec<Value>) -> Self {
        let (start, end) = shape::slice_bounds(self.items.len(), offset, length);
        let mut rest = std::mem::take(self.items_mut()).into_iter();
        let head: Vec<Pair> = rest.by_ref().take(start).collect();
        let removed: Vec<Pair> = rest.by_ref().take(end - start).collect();
        let inserted = replacement.into_iter().map(|v| (Key::Int(0), v));
        *self.items_mut() = renumber(head.into_iter().chain(inserted).chain(rest));
        Self::from_items(renumber(removed))
    }
}

impl Enumerable for Collection {
    fn from_items(items: Items) -> Self {
        Self { items: Rc::new(items) }
    }

    fn range(from: i64, to: i64) -> Self {
        Self::from_items(cursor::range(from, to).collect())
    }

    fn iter(&self) -> Cursor {
        Box::new(MaterializedCursor::new(self.shared()))
    }

    fn stream<F>(&self, op: F) -> Self
    where
        F: Fn(Cursor) -> Cursor + 'static,
    {
        Self::from_items(op(self.iter()).collect())
    }

    fn passthru<F>(&self, _op: &'static str, f: F) -> Self
    where
        F: Fn(&Items) -> Items + 'static,
    {
        Self::from_items(f(&self.items))
    }

    fn all(&self) -> Items {
        (*self.items).clone()
    }

    fn count(&self) -> usize {
        self.items.len()
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn last(&self) -> Option<Value> {
        self.items.last().map(|(_, v)| v.clone())
    }

    fn get(&self, key: impl Into<Key>) -> Option<Value> {
        self.items.get(&key.into()).cloned()
    }

    fn take(&self, limit: i64) -> Self {
        Self::from_items(shape::take(&self.items, limit))
    }

    fn slice(&self, offset: i64, length: Option<i64>) -> Self {
        Self::from_items(shape::slice(&self.items, offset, length))
    }

    fn pad(&self, size: i64, value: Value) -> Self {
        Self::from_items(shape::pad(&self.items, size, &value))
    }
}

impl Debug for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        f.debug_map().entries(self.items.iter()).finish()
    }
}

/// Order-sensitive: equal keys and values in the same order.
impl PartialEq for Collection {
    fn eq(&self, other: &Self) -> bool {
        self.items.len() == other.items.len() && self.items.iter().eq(other.items.iter())
    }
}

impl From<Items> for Collection {
    fn from(items: Items) -> Self {
        Self::from_items(items)
    }
}

impl FromIterator<Pair> for Collection {
    fn from_iter<I: IntoIterator<Item = Pair>>(iter: I) -> Self {
        Self::from_items(iter.into_iter().collect())
    }
}

impl FromIterator<Value> for Collection {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::from_items(list_items(iter))
    }
}

impl Extend<Pair> for Collection {
    fn extend<I: IntoIterator<Item = Pair>>(&mut self, iter: I) {
        self.items_mut().extend(iter);
    }
}

impl IntoIterator for Collection {
    type Item = Pair;
    type IntoIter = indexmap::map::IntoIter<Key, Value>;

    fn into_iter(self) -> Self::IntoIter {
        Rc::unwrap_or_clone(self.items).into_iter()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = (&'a Key, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, Key, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Lists serialize as sequences, everything else as maps with string keys.
impl Serialize for Collection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if is_list(&self.items) {
            let mut seq = serializer.serialize_seq(Some(self.items.len()))?;
            for value in self.items.values() {
                seq.serialize_element(value)?;
            }
            seq.end()
        } else {
            let mut map = serializer.serialize_map(Some(self.items.len()))?;
            for (key, value) in self.items.iter() {
                map.serialize_entry(&key.to_string(), value)?;
            }
            map.end()
        }
    }
}

impl<'de> Deserialize<'de> for Collection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::wrap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn numbers() -> Collection {
        Collection::make(vec![1, 2, 3])
    }

    #[test]
    fn mutators_copy_shared_storage() {
        let original = numbers();
        let view = original.lazy();
        let mut changed = original.clone();
        changed.push(4).put("name", "x");
        assert_eq!(original.len(), 3);
        assert_eq!(view.count(), 3);
        assert_eq!(changed.len(), 5);
        assert_eq!(changed.get("name"), Some(json!("x")));
    }

    #[test]
    fn shift_and_prepend_renumber_int_keys() {
        let mut c = numbers();
        assert_eq!(c.shift(), Some(json!(1)));
        assert_eq!(c.keys().to_list(), vec![json!(0), json!(1)]);
        c.prepend(0);
        assert_eq!(c.to_value(), json!([0, 2, 3]));
        c.prepend_keyed("id", 9);
        assert_eq!(c.first(), Some(json!(9)));
    }

    #[test]
    fn pop_many_returns_last_first() {
        let mut c = numbers();
        assert_eq!(c.pop_many(2).to_value(), json!([3, 2]));
        assert_eq!(c.to_value(), json!([1]));
        assert_eq!(c.pop(), Some(json!(1)));
        assert_eq!(c.pop(), None);
    }

    #[test]
    fn splice_replaces_a_range() {
        let mut c = Collection::make(vec![1, 2, 3, 4, 5]);
        let removed = c.splice(1, Some(2), vec![json!("a")]);
        assert_eq!(removed.to_value(), json!([2, 3]));
        assert_eq!(c.to_value(), json!([1, "a", 4, 5]));
    }

    #[test]
    fn get_or_put_inserts_once() {
        let mut c = Collection::new();
        assert_eq!(c.get_or_put("k", || json!(1)), json!(1));
        assert_eq!(c.get_or_put("k", || json!(2)), json!(1));
    }

    #[test]
    fn serializes_lists_and_maps() {
        assert_eq!(serde_json::to_string(&numbers()).unwrap(), "[1,2,3]");
        let keyed = Collection::make(json!({"b": 1, "a": 2}));
        assert_eq!(serde_json::to_string(&keyed).unwrap(), r#"{"b":1,"a":2}"#);
        let back: Collection = serde_json::from_str(r#"{"b":1,"a":2}"#).unwrap();
        assert_eq!(back, keyed);
    }
}

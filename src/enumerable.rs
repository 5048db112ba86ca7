//! The shared operator algebra.
//!
//! [`Enumerable`] is implemented by both the eager [`Collection`] and the
//! lazy [`LazyCollection`](crate::LazyCollection). Each type supplies four
//! primitives:
//!
//! - [`from_items`](Enumerable::from_items): build a same-kind value from
//!   materialized items
//! - [`iter`](Enumerable::iter): a fresh cursor over the elements
//! - [`stream`](Enumerable::stream): attach a cursor-to-cursor stage
//! - [`passthru`](Enumerable::passthru): run an algorithm that needs the
//!   whole container
//!
//! Every other operator is a provided method written against those
//! primitives. For the eager type `stream` and `passthru` run immediately;
//! for the lazy type they build a new deferred stage that does nothing until
//! pulled.
//!
//! Closures receive `(value, key)`. Operators that extract something from
//! each element take a [`Selector`]; operators that test elements take a
//! [`Condition`] or a plain predicate.

use crate::collection::Collection;
use crate::cursor::{
    self, Chunk, ChunkWhile, Combine, Cursor, Only, Pad, Sliding, Unique, Zip, boxed,
    flatten_value, index_values, reindex,
};
use crate::error::{CollectionError, Result};
use crate::helpers::{grouping, sampling, sets, shape, sorting, statistical};
use crate::key::Key;
use crate::selector::{
    Condition, Direction, Operator, Predicate, Selector, SortCriterion, operator_for_where,
    truthy_selector,
};
use crate::source::Source;
use crate::values::{
    Items, Pair, compare, compare_keys, is_truthy, items_to_value, to_display, value_to_items,
    values_equal,
};
use indexmap::IndexMap;
use serde_json::Value;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::ops::ControlFlow;
use std::rc::Rc;

/// Operators shared by eager and lazy collections.
pub trait Enumerable: Clone + Sized {
    /* ===================== Primitives ===================== */

    /// Same-kind collection over materialized items.
    fn from_items(items: Items) -> Self;

    /// Integers from `from` to `to` inclusive, descending when `from > to`.
    fn range(from: i64, to: i64) -> Self;

    /// Fresh cursor over the elements.
    fn iter(&self) -> Cursor;

    /// Attach a streaming stage.
    ///
    /// `op` receives a fresh upstream cursor and returns the stage's cursor.
    /// Lazy collections call it once per pass.
    fn stream<F>(&self, op: F) -> Self
    where
        F: Fn(Cursor) -> Cursor + 'static;

    /// Run a whole-container algorithm.
    ///
    /// Lazy collections materialize upstream on first pull of the returned
    /// stage (not when it is built) and stream the result.
    fn passthru<F>(&self, op: &'static str, f: F) -> Self
    where
        F: Fn(&Items) -> Items + 'static;

    /* ===================== Construction ===================== */

    #[must_use]
    fn empty() -> Self {
        Self::from_items(Items::new())
    }

    /// `null` is empty, a collection value its elements, a scalar `[scalar]`.
    #[must_use]
    fn wrap(value: Value) -> Self {
        Self::from_items(value_to_items(value))
    }

    /// `f(1)..=f(n)`, keyed from `0`.
    fn times<F>(n: usize, f: F) -> Self
    where
        F: Fn(i64) -> Value + 'static,
    {
        if n == 0 {
            return Self::empty();
        }
        let upper = i64::try_from(n).unwrap_or(i64::MAX);
        Self::range(1, upper).map(move |v, _| f(v.as_i64().unwrap_or_default()))
    }

    /* ===================== Terminal ===================== */

    /// Force every element into concrete items.
    #[must_use]
    fn all(&self) -> Items {
        self.iter().collect()
    }

    #[must_use]
    fn count(&self) -> usize {
        self.iter().count()
    }

    /// Eager copy of the elements.
    #[must_use]
    fn collect(&self) -> Collection {
        Collection::from_items(self.all())
    }

    /// Elements as pairs, in order.
    #[must_use]
    fn to_pairs(&self) -> Vec<Pair> {
        self.iter().collect()
    }

    /// Element values, in order.
    #[must_use]
    fn to_list(&self) -> Vec<Value> {
        self.iter().map(|(_, v)| v).collect()
    }

    /// The elements as one value: a list is an array, anything else an object.
    #[must_use]
    fn to_value(&self) -> Value {
        items_to_value(self.all())
    }

    /// # Errors
    /// Propagates `serde_json` serialization failures.
    fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_value())?)
    }

    /// # Errors
    /// Propagates `serde_json` serialization failures.
    fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_value())?)
    }

    #[must_use]
    fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    #[must_use]
    fn is_not_empty(&self) -> bool {
        !self.is_empty()
    }

    #[must_use]
    fn contains_one_item(&self) -> bool {
        self.iter().take(2).count() == 1
    }

    /// First element, or `None` when empty. A `null` element is
    /// `Some(Value::Null)`.
    #[must_use]
    fn first(&self) -> Option<Value> {
        self.iter().next().map(|(_, v)| v)
    }

    fn first_by<F>(&self, pred: F) -> Option<Value>
    where
        F: Fn(&Value, &Key) -> bool,
    {
        self.iter().find(|(k, v)| pred(v, k)).map(|(_, v)| v)
    }

    fn first_where(&self, key: impl Into<Selector>, op: impl Into<Operator>, value: impl Into<Value>) -> Option<Value> {
        let pred = operator_for_where(&key.into(), op.into(), value.into());
        self.first_by(|v, k| pred(v, k))
    }

    /// # Errors
    /// [`CollectionError::ItemNotFound`] when empty.
    fn first_or_fail(&self) -> Result<Value> {
        self.first().ok_or(CollectionError::ItemNotFound)
    }

    /// # Errors
    /// [`CollectionError::ItemNotFound`] when nothing matches.
    fn first_or_fail_by<F>(&self, pred: F) -> Result<Value>
    where
        F: Fn(&Value, &Key) -> bool,
    {
        self.first_by(pred).ok_or(CollectionError::ItemNotFound)
    }

    /// The only element.
    ///
    /// # Errors
    /// [`CollectionError::ItemNotFound`] when empty,
    /// [`CollectionError::MultipleItemsFound`] when there is more than one.
    fn sole(&self) -> Result<Value> {
        self.sole_by(|_, _| true)
    }

    /// The only element matching `pred`. Stops pulling at the second match.
    ///
    /// # Errors
    /// As [`sole`](Enumerable::sole).
    fn sole_by<F>(&self, pred: F) -> Result<Value>
    where
        F: Fn(&Value, &Key) -> bool,
    {
        let mut matches = self.iter().filter(|(k, v)| pred(v, k)).map(|(_, v)| v).take(2);
        let first = matches.next().ok_or(CollectionError::ItemNotFound)?;
        match matches.next() {
            Some(_) => Err(CollectionError::MultipleItemsFound(2)),
            None => Ok(first),
        }
    }

    #[must_use]
    fn last(&self) -> Option<Value> {
        self.iter().last().map(|(_, v)| v)
    }

    fn last_by<F>(&self, pred: F) -> Option<Value>
    where
        F: Fn(&Value, &Key) -> bool,
    {
        self.iter().filter(|(k, v)| pred(v, k)).last().map(|(_, v)| v)
    }

    fn get(&self, key: impl Into<Key>) -> Option<Value> {
        let key = key.into();
        self.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// `key` read from the first element where it is truthy.
    fn value(&self, key: impl Into<Selector>) -> Option<Value> {
        let retrieve = key.into().resolve();
        self.iter().find_map(|(k, v)| {
            let found = retrieve(&v, &k);
            is_truthy(&found).then_some(found)
        })
    }

    /// `true` when every key is present.
    fn has<I>(&self, keys: I) -> bool
    where
        I: IntoIterator,
        I::Item: Into<Key>,
    {
        let mut missing: HashSet<Key> = keys.into_iter().map(Into::into).collect();
        if missing.is_empty() {
            return true;
        }
        for (k, _) in self.iter() {
            missing.remove(&k);
            if missing.is_empty() {
                return true;
            }
        }
        false
    }

    /// `true` when at least one key is present.
    fn has_any<I>(&self, keys: I) -> bool
    where
        I: IntoIterator,
        I::Item: Into<Key>,
    {
        let wanted: HashSet<Key> = keys.into_iter().map(Into::into).collect();
        !wanted.is_empty() && self.iter().any(|(k, _)| wanted.contains(&k))
    }

    /// Key of the first element matching `cond` (loose equality for values).
    fn search(&self, cond: impl Into<Condition>) -> Option<Key> {
        let pred = cond.into().resolve(false);
        self.iter().find(|(k, v)| pred(v, k)).map(|(k, _)| k)
    }

    fn search_strict(&self, value: impl Into<Value>) -> Option<Key> {
        let pred = Condition::Equals(value.into()).resolve(true);
        self.iter().find(|(k, v)| pred(v, k)).map(|(k, _)| k)
    }

    fn contains(&self, cond: impl Into<Condition>) -> bool {
        self.search(cond).is_some()
    }

    fn contains_strict(&self, value: impl Into<Value>) -> bool {
        self.search_strict(value).is_some()
    }

    fn contains_where(&self, key: impl Into<Selector>, op: impl Into<Operator>, value: impl Into<Value>) -> bool {
        self.first_where(key, op, value).is_some()
    }

    fn doesnt_contain(&self, cond: impl Into<Condition>) -> bool {
        !self.contains(cond)
    }

    fn every<F>(&self, pred: F) -> bool
    where
        F: Fn(&Value, &Key) -> bool,
    {
        self.iter().all(|(k, v)| pred(&v, &k))
    }

    fn every_where(&self, key: impl Into<Selector>, op: impl Into<Operator>, value: impl Into<Value>) -> bool {
        let pred = operator_for_where(&key.into(), op.into(), value.into());
        self.every(|v, k| pred(v, k))
    }

    fn reduce<F>(&self, mut f: F, initial: Value) -> Value
    where
        F: FnMut(Value, &Value, &Key) -> Value,
    {
        self.iter().fold(initial, |carry, (k, v)| f(carry, &v, &k))
    }

    /// Reduce with several accumulators at once.
    fn reduce_spread<F>(&self, mut f: F, initial: Vec<Value>) -> Vec<Value>
    where
        F: FnMut(Vec<Value>, &Value, &Key) -> Vec<Value>,
    {
        self.iter().fold(initial, |carry, (k, v)| f(carry, &v, &k))
    }

    /// Call `f` for each element until it returns `Break`.
    fn each<F>(&self, mut f: F) -> &Self
    where
        F: FnMut(&Value, &Key) -> ControlFlow<()>,
    {
        for (k, v) in self.iter() {
            if f(&v, &k).is_break() {
                break;
            }
        }
        self
    }

    /// [`each`](Enumerable::each) over nested collections, spread into a slice.
    fn each_spread<F>(&self, mut f: F) -> &Self
    where
        F: FnMut(&[Value], &Key) -> ControlFlow<()>,
    {
        self.each(|v, k| {
            let args: Vec<Value> = value_to_items(v.clone()).into_values().collect();
            f(&args, k)
        })
    }

    /* ----- aggregates ----- */

    fn sum(&self) -> Value {
        self.sum_by(Selector::Identity)
    }

    fn sum_by(&self, key: impl Into<Selector>) -> Value {
        statistical::sum(self.retrieved(key.into()))
    }

    fn min(&self) -> Option<Value> {
        self.min_by(Selector::Identity)
    }

    fn min_by(&self, key: impl Into<Selector>) -> Option<Value> {
        statistical::min(self.retrieved(key.into()))
    }

    fn max(&self) -> Option<Value> {
        self.max_by(Selector::Identity)
    }

    fn max_by(&self, key: impl Into<Selector>) -> Option<Value> {
        statistical::max(self.retrieved(key.into()))
    }

    fn avg(&self) -> Option<f64> {
        self.avg_by(Selector::Identity)
    }

    fn avg_by(&self, key: impl Into<Selector>) -> Option<f64> {
        statistical::avg(self.retrieved(key.into()))
    }

    fn median(&self) -> Option<f64> {
        self.median_by(Selector::Identity)
    }

    fn median_by(&self, key: impl Into<Selector>) -> Option<f64> {
        statistical::median(self.retrieved(key.into()))
    }

    /// The most frequent values (all ties, ascending).
    fn mode(&self) -> Option<Vec<Value>> {
        self.mode_by(Selector::Identity)
    }

    fn mode_by(&self, key: impl Into<Selector>) -> Option<Vec<Value>> {
        statistical::mode(self.retrieved(key.into()))
    }

    /// Percentage of elements matching `pred`, or `None` when empty.
    fn percentage<F>(&self, pred: F, precision: u32) -> Option<f64>
    where
        F: Fn(&Value, &Key) -> bool,
    {
        let (matched, total) = self
            .iter()
            .fold((0, 0), |(m, t), (k, v)| (m + usize::from(pred(&v, &k)), t + 1));
        statistical::percentage(matched, total, precision)
    }

    /// Retrieved values, one per element.
    #[doc(hidden)]
    fn retrieved(&self, key: Selector) -> Vec<Value> {
        let retrieve = key.resolve();
        self.iter().map(|(k, v)| retrieve(&v, &k)).collect()
    }

    /* ----- rendering ----- */

    fn implode(&self, glue: &str) -> String {
        self.iter().map(|(_, v)| to_display(&v)).collect::<Vec<_>>().join(glue)
    }

    fn implode_by(&self, key: impl Into<Selector>, glue: &str) -> String {
        self.retrieved(key.into()).iter().map(to_display).collect::<Vec<_>>().join(glue)
    }

    /// Join with `glue`, using `final_glue` before the last element.
    fn join(&self, glue: &str, final_glue: &str) -> String {
        let mut rendered: Vec<String> = self.iter().map(|(_, v)| to_display(&v)).collect();
        if final_glue.is_empty() || rendered.len() < 2 {
            return rendered.join(glue);
        }
        let last = rendered.pop().unwrap_or_default();
        format!("{}{final_glue}{last}", rendered.join(glue))
    }

    /* ----- composition ----- */

    /// Split into `(matching, rest)`, both keeping keys.
    fn partition<F>(&self, pred: F) -> (Self, Self)
    where
        F: Fn(&Value, &Key) -> bool + 'static,
    {
        let pred: Predicate = Rc::new(pred);
        let negated = Rc::clone(&pred);
        (self.filter(move |v, k| pred(v, k)), self.filter(move |v, k| !negated(v, k)))
    }

    fn pipe<T, F>(self, f: F) -> T
    where
        F: FnOnce(Self) -> T,
    {
        f(self)
    }

    /// Pass the collection through each function in turn.
    fn pipe_through(self, pipes: Vec<Box<dyn Fn(Self) -> Self>>) -> Self {
        pipes.into_iter().fold(self, |carry, pipe| pipe(carry))
    }

    #[must_use]
    fn tap<F>(&self, f: F) -> Self
    where
        F: FnOnce(&Self),
    {
        f(self);
        self.clone()
    }

    #[must_use]
    fn when<F>(&self, condition: bool, f: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        if condition { f(self.clone()) } else { self.clone() }
    }

    #[must_use]
    fn when_else<F, D>(&self, condition: bool, f: F, default: D) -> Self
    where
        F: FnOnce(Self) -> Self,
        D: FnOnce(Self) -> Self,
    {
        if condition { f(self.clone()) } else { default(self.clone()) }
    }

    #[must_use]
    fn unless<F>(&self, condition: bool, f: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        self.when(!condition, f)
    }

    #[must_use]
    fn when_empty<F>(&self, f: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        self.when(self.is_empty(), f)
    }

    #[must_use]
    fn when_not_empty<F>(&self, f: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        self.when(self.is_not_empty(), f)
    }

    #[must_use]
    fn unless_empty<F>(&self, f: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        self.when_not_empty(f)
    }

    #[must_use]
    fn unless_not_empty<F>(&self, f: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        self.when_empty(f)
    }

    /// Log the elements at `debug` level.
    #[must_use]
    fn dump(&self) -> Self {
        tracing::debug!(items = ?self.to_pairs(), "dump");
        self.clone()
    }

    /* ===================== Streaming ===================== */

    #[must_use]
    fn map<F>(&self, f: F) -> Self
    where
        F: Fn(&Value, &Key) -> Value + 'static,
    {
        let f = Rc::new(f);
        self.stream(move |upstream| {
            let f = Rc::clone(&f);
            boxed(upstream.map(move |(k, v)| {
                let mapped = f(&v, &k);
                (k, mapped)
            }))
        })
    }

    /// Replace every element with the pairs `f` returns.
    #[must_use]
    fn map_with_keys<F, I>(&self, f: F) -> Self
    where
        F: Fn(&Value, &Key) -> I + 'static,
        I: IntoIterator<Item = Pair> + 'static,
    {
        let f = Rc::new(f);
        self.stream(move |upstream| {
            let f = Rc::clone(&f);
            boxed(upstream.flat_map(move |(k, v)| f(&v, &k)))
        })
    }

    /// Map nested collections, spread into a slice.
    #[must_use]
    fn map_spread<F>(&self, f: F) -> Self
    where
        F: Fn(&[Value], &Key) -> Value + 'static,
    {
        self.map(move |v, k| {
            let args: Vec<Value> = value_to_items(v.clone()).into_values().collect();
            f(&args, k)
        })
    }

    /// `map` then `collapse`.
    #[must_use]
    fn flat_map<F>(&self, f: F) -> Self
    where
        F: Fn(&Value, &Key) -> Value + 'static,
    {
        self.map(f).collapse()
    }

    #[must_use]
    fn filter<F>(&self, pred: F) -> Self
    where
        F: Fn(&Value, &Key) -> bool + 'static,
    {
        let pred = Rc::new(pred);
        self.stream(move |upstream| {
            let pred = Rc::clone(&pred);
            boxed(upstream.filter(move |(k, v)| pred(v, k)))
        })
    }

    /// Keep truthy elements.
    #[must_use]
    fn filter_truthy(&self) -> Self {
        self.filter(|v, _| is_truthy(v))
    }

    /// Drop elements matching `cond` (loose equality for values).
    #[must_use]
    fn reject(&self, cond: impl Into<Condition>) -> Self {
        let keep = cond.into().negated(false);
        self.filter(move |v, k| keep(v, k))
    }

    /// `key == value` (loose).
    #[must_use]
    fn where_eq(&self, key: impl Into<Selector>, value: impl Into<Value>) -> Self {
        self.where_op(key, Operator::Eq, value)
    }

    #[must_use]
    fn where_op(&self, key: impl Into<Selector>, op: impl Into<Operator>, value: impl Into<Value>) -> Self {
        let pred = operator_for_where(&key.into(), op.into(), value.into());
        self.filter(move |v, k| pred(v, k))
    }

    #[must_use]
    fn where_strict(&self, key: impl Into<Selector>, value: impl Into<Value>) -> Self {
        self.where_op(key, Operator::StrictEq, value)
    }

    /// Keep elements where `key` is truthy.
    #[must_use]
    fn where_truthy(&self, key: impl Into<Selector>) -> Self {
        let pred = truthy_selector(&key.into());
        self.filter(move |v, k| pred(v, k))
    }

    #[must_use]
    fn where_null(&self, key: impl Into<Selector>) -> Self {
        self.where_op(key, Operator::StrictEq, Value::Null)
    }

    #[must_use]
    fn where_not_null(&self, key: impl Into<Selector>) -> Self {
        self.where_op(key, Operator::StrictNotEq, Value::Null)
    }

    #[must_use]
    fn where_in<I>(&self, key: impl Into<Selector>, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.where_membership(key.into(), values.into_iter().map(Into::into).collect(), false, true)
    }

    #[must_use]
    fn where_in_strict<I>(&self, key: impl Into<Selector>, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.where_membership(key.into(), values.into_iter().map(Into::into).collect(), true, true)
    }

    #[must_use]
    fn where_not_in<I>(&self, key: impl Into<Selector>, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.where_membership(key.into(), values.into_iter().map(Into::into).collect(), false, false)
    }

    #[must_use]
    fn where_not_in_strict<I>(&self, key: impl Into<Selector>, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.where_membership(key.into(), values.into_iter().map(Into::into).collect(), true, false)
    }

    #[doc(hidden)]
    #[must_use]
    fn where_membership(&self, key: Selector, values: Vec<Value>, strict: bool, inside: bool) -> Self {
        let retrieve = key.resolve();
        self.filter(move |v, k| {
            let found = retrieve(v, k);
            values.iter().any(|candidate| values_equal(&found, candidate, strict)) == inside
        })
    }

    /// `min <= key <= max`.
    #[must_use]
    fn where_between(&self, key: impl Into<Selector>, min: impl Into<Value>, max: impl Into<Value>) -> Self {
        let key = key.into();
        self.where_op(key.clone(), Operator::Gte, min).where_op(key, Operator::Lte, max)
    }

    #[must_use]
    fn where_not_between(&self, key: impl Into<Selector>, min: impl Into<Value>, max: impl Into<Value>) -> Self {
        let retrieve = key.into().resolve();
        let (min, max) = (min.into(), max.into());
        self.filter(move |v, k| {
            let found = retrieve(v, k);
            compare(&found, &min).is_lt() || compare(&found, &max).is_gt()
        })
    }

    /// Keys as values, re-indexed.
    #[must_use]
    fn keys(&self) -> Self {
        self.stream(|upstream| index_values(upstream.map(|(k, _)| k.to_value())))
    }

    /// Values, re-indexed from `0`.
    #[must_use]
    fn values(&self) -> Self {
        self.stream(reindex)
    }

    /// Swap keys and values.
    #[must_use]
    fn flip(&self) -> Self {
        self.stream(|upstream| boxed(upstream.map(|(k, v)| (Key::from_value(&v), k.to_value()))))
    }

    /// Re-key by the selected value. Later duplicates overwrite earlier ones
    /// once materialized.
    #[must_use]
    fn key_by(&self, key: impl Into<Selector>) -> Self {
        let retrieve = key.into().resolve();
        self.stream(move |upstream| {
            let retrieve = Rc::clone(&retrieve);
            boxed(upstream.map(move |(k, v)| (Key::from_value(&retrieve(&v, &k)), v)))
        })
    }

    /// Selected values, re-indexed.
    #[must_use]
    fn pluck(&self, value: impl Into<Selector>) -> Self {
        let retrieve = value.into().resolve();
        self.stream(move |upstream| {
            let retrieve = Rc::clone(&retrieve);
            index_values(upstream.map(move |(k, v)| retrieve(&v, &k)))
        })
    }

    /// Selected values keyed by another selected value.
    #[must_use]
    fn pluck_keyed(&self, value: impl Into<Selector>, key: impl Into<Selector>) -> Self {
        let value = value.into().resolve();
        let key = key.into().resolve();
        self.stream(move |upstream| {
            let (value, key) = (Rc::clone(&value), Rc::clone(&key));
            boxed(upstream.map(move |(k, v)| (Key::from_value(&key(&v, &k)), value(&v, &k))))
        })
    }

    /// Values of nested collections, one level, re-indexed.
    #[must_use]
    fn collapse(&self) -> Self {
        self.stream(cursor::collapse)
    }

    /// Inline nested collections up to `depth` levels (`None` or `Some(0)`
    /// for no limit), re-indexed.
    #[must_use]
    fn flatten(&self, depth: Option<usize>) -> Self {
        let depth = depth.filter(|d| *d > 0).unwrap_or(usize::MAX);
        self.stream(move |upstream| {
            index_values(upstream.flat_map(move |(_, v)| {
                let mut out = Vec::new();
                flatten_value(v, depth, &mut out);
                out
            }))
        })
    }

    #[must_use]
    fn unique(&self) -> Self {
        self.unique_by(Selector::Identity, false)
    }

    #[must_use]
    fn unique_strict(&self) -> Self {
        self.unique_by(Selector::Identity, true)
    }

    /// First element for each distinct selected value.
    #[must_use]
    fn unique_by(&self, key: impl Into<Selector>, strict: bool) -> Self {
        let retrieve = key.into().resolve();
        self.stream(move |upstream| boxed(Unique::new(upstream, Rc::clone(&retrieve), strict)))
    }

    /// Occurrences of each selected value.
    #[must_use]
    fn count_by(&self, key: impl Into<Selector>) -> Self {
        let retrieve = key.into().resolve();
        self.stream(move |upstream| {
            let mut counts: IndexMap<Key, i64> = IndexMap::new();
            for (k, v) in upstream {
                *counts.entry(Key::from_value(&retrieve(&v, &k))).or_default() += 1;
            }
            boxed(counts.into_iter().map(|(k, n)| (k, Value::from(n))))
        })
    }

    #[must_use]
    fn skip(&self, count: usize) -> Self {
        self.stream(move |upstream| boxed(upstream.skip(count)))
    }

    #[must_use]
    fn skip_while(&self, cond: impl Into<Condition>) -> Self {
        let pred = cond.into().resolve(false);
        self.stream(move |upstream| cursor::skip_while(upstream, Rc::clone(&pred)))
    }

    #[must_use]
    fn skip_until(&self, cond: impl Into<Condition>) -> Self {
        let pred = cond.into().negated(false);
        self.stream(move |upstream| cursor::skip_while(upstream, Rc::clone(&pred)))
    }

    #[must_use]
    fn take_while(&self, cond: impl Into<Condition>) -> Self {
        let pred = cond.into().resolve(false);
        self.stream(move |upstream| cursor::take_while(upstream, Rc::clone(&pred)))
    }

    #[must_use]
    fn take_until(&self, cond: impl Into<Condition>) -> Self {
        let pred = cond.into().negated(false);
        self.stream(move |upstream| cursor::take_while(upstream, Rc::clone(&pred)))
    }

    /// First `limit` elements; a negative limit takes the last `|limit|`,
    /// which needs the whole sequence.
    #[must_use]
    fn take(&self, limit: i64) -> Self {
        match usize::try_from(limit) {
            Ok(n) => self.stream(move |upstream| boxed(upstream.take(n))),
            Err(_) => self.passthru("take", move |items| shape::take(items, limit)),
        }
    }

    /// Keys-preserving slice. Negative arguments count from the end.
    #[must_use]
    fn slice(&self, offset: i64, length: Option<i64>) -> Self {
        let streamable = offset >= 0 && length.is_none_or(|l| l >= 0);
        if !streamable {
            return self.passthru("slice", move |items| shape::slice(items, offset, length));
        }
        let skip = usize::try_from(offset).unwrap_or_default();
        let take = length.map_or(usize::MAX, |l| usize::try_from(l).unwrap_or_default());
        self.stream(move |upstream| boxed(upstream.skip(skip).take(take)))
    }

    /// Every `step`-th element starting at `offset`, re-indexed.
    #[must_use]
    fn nth(&self, step: usize, offset: usize) -> Self {
        if step == 0 {
            return self.stream(|_| boxed(std::iter::empty()));
        }
        self.stream(move |upstream| {
            index_values(
                upstream
                    .skip(offset)
                    .step_by(step)
                    .map(|(_, v)| v),
            )
        })
    }

    /// Page `page` (1-based) of `per_page` elements.
    #[must_use]
    fn for_page(&self, page: usize, per_page: usize) -> Self {
        let offset = page.saturating_sub(1).saturating_mul(per_page);
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        self.slice(offset, Some(i64::try_from(per_page).unwrap_or(i64::MAX)))
    }

    /// Groups of `size` elements; the last may be short. `0` yields nothing.
    #[must_use]
    fn chunk(&self, size: usize) -> Self {
        self.stream(move |upstream| boxed(Chunk::new(upstream, size)))
    }

    /// Start a new chunk whenever `pred(value, key, chunk_so_far)` is false.
    #[must_use]
    fn chunk_while<F>(&self, pred: F) -> Self
    where
        F: Fn(&Value, &Key, &Collection) -> bool + 'static,
    {
        let pred = Rc::new(pred);
        self.stream(move |upstream| {
            let pred = Rc::clone(&pred);
            boxed(ChunkWhile::new(upstream, move |v: &Value, k: &Key, c: &Collection| pred(v, k, c)))
        })
    }

    /// Windows of `size` elements, one every `step` elements.
    #[must_use]
    fn sliding(&self, size: usize, step: usize) -> Self {
        self.stream(move |upstream| boxed(Sliding::new(upstream, size, step)))
    }

    /// `chunk(ceil(count / groups))`.
    #[must_use]
    fn split_in(&self, groups: usize) -> Self {
        self.passthru("split_in", move |items| shape::split_in(items, groups))
    }

    /// Element-wise lists across `self` and `others`, stopping at the shortest.
    #[must_use]
    fn zip<I>(&self, others: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Source>,
    {
        let others: Vec<Source> = others.into_iter().map(Into::into).collect();
        self.stream(move |upstream| {
            let cursors = std::iter::once(upstream).chain(others.iter().map(Source::cursor)).collect();
            boxed(Zip::new(cursors))
        })
    }

    /// Use this collection's values as keys for `values`.
    ///
    /// A length mismatch logs a warning and stops at the shorter side.
    #[must_use]
    fn combine(&self, values: impl Into<Source>) -> Self {
        let values = values.into();
        self.stream(move |upstream| boxed(Combine::new(upstream, values.cursor())))
    }

    /// Append the values of `source`, keyed after the largest integer key.
    #[must_use]
    fn concat(&self, source: impl Into<Source>) -> Self {
        let source = source.into();
        self.stream(move |upstream| cursor::concat(upstream, source.cursor()))
    }

    /// Elements with the given keys. Stops pulling once all are found.
    #[must_use]
    fn only<I>(&self, keys: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Key>,
    {
        let wanted: HashSet<Key> = keys.into_iter().map(Into::into).collect();
        self.stream(move |upstream| boxed(Only::new(upstream, wanted.clone())))
    }

    #[must_use]
    fn except<I>(&self, keys: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Key>,
    {
        let unwanted: HashSet<Key> = keys.into_iter().map(Into::into).collect();
        self.filter(move |_, k| !unwanted.contains(k))
    }

    /// Overwrite values by key; keys missing from `self` are appended.
    #[must_use]
    fn replace(&self, source: impl Into<Source>) -> Self {
        let source = source.into();
        self.stream(move |upstream| {
            let overrides = Rc::new(RefCell::new(source.to_items()));
            let leftovers = Rc::clone(&overrides);
            boxed(
                upstream
                    .map(move |(k, v)| {
                        let replaced = overrides.borrow_mut().shift_remove(&k);
                        (k, replaced.unwrap_or(v))
                    })
                    .chain(std::iter::once(()).flat_map(move |()| std::mem::take(&mut *leftovers.borrow_mut()))),
            )
        })
    }

    /// Pad to `|size|` elements with `value`; negative sizes pad at the front.
    #[must_use]
    fn pad(&self, size: i64, value: Value) -> Self {
        match usize::try_from(size) {
            Ok(n) => self.stream(move |upstream| boxed(Pad::new(upstream, n, value.clone()))),
            Err(_) => self.passthru("pad", move |items| shape::pad(items, size, &value)),
        }
    }

    /* ===================== Whole-container ===================== */

    #[must_use]
    fn sort(&self) -> Self {
        self.passthru("sort", |items| sorting::sort_natural(items, false))
    }

    #[must_use]
    fn sort_desc(&self) -> Self {
        self.passthru("sort_desc", |items| sorting::sort_natural(items, true))
    }

    #[must_use]
    fn sort_with<F>(&self, cmp: F) -> Self
    where
        F: Fn(&Value, &Value) -> Ordering + 'static,
    {
        self.passthru("sort_with", move |items| sorting::sort_values(items, &cmp))
    }

    #[must_use]
    fn sort_by(&self, key: impl Into<Selector>) -> Self {
        self.sort_by_many(vec![SortCriterion::By(key.into(), Direction::Asc)])
    }

    #[must_use]
    fn sort_by_desc(&self, key: impl Into<Selector>) -> Self {
        self.sort_by_many(vec![SortCriterion::By(key.into(), Direction::Desc)])
    }

    /// Stable multi-key sort; later criteria only break ties.
    #[must_use]
    fn sort_by_many(&self, criteria: Vec<SortCriterion>) -> Self {
        self.passthru("sort_by", move |items| sorting::sort_by_criteria(items, &criteria))
    }

    #[must_use]
    fn sort_keys(&self) -> Self {
        self.passthru("sort_keys", |items| sorting::sort_keys(items, compare_keys))
    }

    #[must_use]
    fn sort_keys_desc(&self) -> Self {
        self.passthru("sort_keys_desc", |items| sorting::sort_keys(items, |a, b| compare_keys(b, a)))
    }

    #[must_use]
    fn sort_keys_using<F>(&self, cmp: F) -> Self
    where
        F: Fn(&Key, &Key) -> Ordering + 'static,
    {
        self.passthru("sort_keys_using", move |items| sorting::sort_keys(items, &cmp))
    }

    #[must_use]
    fn reverse(&self) -> Self {
        self.passthru("reverse", sorting::reverse)
    }

    /// Random permutation, re-indexed.
    #[must_use]
    fn shuffle(&self, seed: Option<u64>) -> Self {
        self.passthru("shuffle", move |items| sampling::shuffle(items, seed))
    }

    #[must_use]
    fn diff(&self, other: impl Into<Source>) -> Self {
        let other = other.into();
        self.passthru("diff", move |items| sets::diff(items, &other.to_items()))
    }

    #[must_use]
    fn diff_using<F>(&self, other: impl Into<Source>, cmp: F) -> Self
    where
        F: Fn(&Value, &Value) -> Ordering + 'static,
    {
        let other = other.into();
        self.passthru("diff_using", move |items| sets::diff_using(items, &other.to_items(), &cmp))
    }

    #[must_use]
    fn diff_assoc(&self, other: impl Into<Source>) -> Self {
        let other = other.into();
        self.passthru("diff_assoc", move |items| sets::diff_assoc(items, &other.to_items()))
    }

    #[must_use]
    fn diff_assoc_using<F>(&self, other: impl Into<Source>, key_cmp: F) -> Self
    where
        F: Fn(&Key, &Key) -> Ordering + 'static,
    {
        let other = other.into();
        self.passthru("diff_assoc_using", move |items| {
            sets::diff_assoc_using(items, &other.to_items(), &key_cmp)
        })
    }

    #[must_use]
    fn diff_keys(&self, other: impl Into<Source>) -> Self {
        let other = other.into();
        self.passthru("diff_keys", move |items| sets::diff_keys(items, &other.to_items()))
    }

    #[must_use]
    fn diff_keys_using<F>(&self, other: impl Into<Source>, key_cmp: F) -> Self
    where
        F: Fn(&Key, &Key) -> Ordering + 'static,
    {
        let other = other.into();
        self.passthru("diff_keys_using", move |items| {
            sets::diff_keys_using(items, &other.to_items(), &key_cmp)
        })
    }

    #[must_use]
    fn intersect(&self, other: impl Into<Source>) -> Self {
        let other = other.into();
        self.passthru("intersect", move |items| sets::intersect(items, &other.to_items()))
    }

    #[must_use]
    fn intersect_using<F>(&self, other: impl Into<Source>, cmp: F) -> Self
    where
        F: Fn(&Value, &Value) -> Ordering + 'static,
    {
        let other = other.into();
        self.passthru("intersect_using", move |items| {
            sets::intersect_using(items, &other.to_items(), &cmp)
        })
    }

    #[must_use]
    fn intersect_assoc(&self, other: impl Into<Source>) -> Self {
        let other = other.into();
        self.passthru("intersect_assoc", move |items| sets::intersect_assoc(items, &other.to_items()))
    }

    #[must_use]
    fn intersect_by_keys(&self, other: impl Into<Source>) -> Self {
        let other = other.into();
        self.passthru("intersect_by_keys", move |items| {
            sets::intersect_by_keys(items, &other.to_items())
        })
    }

    /// Values that repeat an earlier value (loose equality), keyed by the
    /// repeating element's key.
    #[must_use]
    fn duplicates(&self) -> Self {
        self.duplicates_by(Selector::Identity, false)
    }

    #[must_use]
    fn duplicates_strict(&self) -> Self {
        self.duplicates_by(Selector::Identity, true)
    }

    #[must_use]
    fn duplicates_by(&self, key: impl Into<Selector>, strict: bool) -> Self {
        let retrieve = key.into().resolve();
        self.passthru("duplicates", move |items| sets::duplicates(items, &retrieve, strict))
    }

    /// Group into nested lists keyed by the selected value.
    #[must_use]
    fn group_by(&self, key: impl Into<Selector>, preserve_keys: bool) -> Self {
        self.group_by_many(vec![key.into()], preserve_keys)
    }

    /// Nested grouping, one level per selector.
    #[must_use]
    fn group_by_many(&self, keys: Vec<Selector>, preserve_keys: bool) -> Self {
        let retrievers: Vec<_> = keys.iter().map(Selector::resolve).collect();
        self.passthru("group_by", move |items| grouping::group_by(items, &retrievers, preserve_keys))
    }

    /// Collect the pairs `f` returns into lists per key.
    #[must_use]
    fn map_to_dictionary<F, I>(&self, f: F) -> Self
    where
        F: Fn(&Value, &Key) -> I + 'static,
        I: IntoIterator<Item = Pair>,
    {
        self.passthru("map_to_dictionary", move |items| grouping::map_to_dictionary(items, &f))
    }

    #[must_use]
    fn map_to_groups<F, I>(&self, f: F) -> Self
    where
        F: Fn(&Value, &Key) -> I + 'static,
        I: IntoIterator<Item = Pair>,
    {
        self.passthru("map_to_groups", move |items| grouping::map_to_dictionary(items, &f))
    }

    #[must_use]
    fn merge(&self, other: impl Into<Source>) -> Self {
        let other = other.into();
        self.passthru("merge", move |items| sets::merge(items, &other.to_items()))
    }

    #[must_use]
    fn merge_recursive(&self, other: impl Into<Source>) -> Self {
        let other = other.into();
        self.passthru("merge_recursive", move |items| sets::merge_recursive(items, &other.to_items()))
    }

    #[must_use]
    fn union(&self, other: impl Into<Source>) -> Self {
        let other = other.into();
        self.passthru("union", move |items| sets::union(items, &other.to_items()))
    }

    #[must_use]
    fn replace_recursive(&self, other: impl Into<Source>) -> Self {
        let other = other.into();
        self.passthru("replace_recursive", move |items| {
            sets::replace_recursive(items, &other.to_items())
        })
    }

    /// Cartesian product with `others`, as lists.
    #[must_use]
    fn cross_join<I>(&self, others: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Source>,
    {
        let others: Vec<Source> = others.into_iter().map(Into::into).collect();
        self.passthru("cross_join", move |items| {
            let others: Vec<Items> = others.iter().map(Source::to_items).collect();
            sets::cross_join(items, &others)
        })
    }

    /// At most `groups` near-equal groups, re-indexed.
    #[must_use]
    fn split(&self, groups: usize) -> Self {
        self.passthru("split", move |items| grouping::split(items, groups))
    }

    /// Flatten nested collections into `"a.b.c"` keys.
    #[must_use]
    fn dot(&self) -> Self {
        self.passthru("dot", shape::dot)
    }

    /// Expand `"a.b.c"` keys into nested collections.
    #[must_use]
    fn undot(&self) -> Self {
        self.passthru("undot", shape::undot)
    }

    /* ===================== Random ===================== */

    /// One element chosen uniformly.
    ///
    /// # Errors
    /// [`CollectionError::InvalidArgument`] when empty.
    fn random(&self, seed: Option<u64>) -> Result<Value> {
        let picked = sampling::random(&self.all(), 1, false, seed)?;
        picked.into_values().next().ok_or(CollectionError::ItemNotFound)
    }

    /// `count` distinct elements chosen uniformly, in their original order.
    /// Evaluated immediately.
    ///
    /// # Errors
    /// [`CollectionError::InvalidArgument`] when `count` exceeds the size.
    fn random_many(&self, count: usize, preserve_keys: bool, seed: Option<u64>) -> Result<Self> {
        let picked = sampling::random(&self.all(), count, preserve_keys, seed)?;
        Ok(Self::from_items(picked))
    }
}

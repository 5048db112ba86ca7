//! Cursors: single-pass, pull-based enumerators over `(Key, Value)` pairs.
//!
//! A [`Cursor`] is a boxed [`Iterator`]; one cursor is consumed at most once.
//! A new pass asks the [`Source`](crate::Source) for a fresh cursor.
//!
//! Operators without a one-line `std` adapter are written here as explicit
//! state machines so both collection kinds can share them: the eager
//! [`Collection`] drains them once into new [`Items`], the lazy pipeline wraps
//! them in a deferred stage and re-creates them on every pass.

use crate::collection::Collection;
use crate::enumerable::Enumerable;
use crate::key::Key;
use crate::selector::{Predicate, Retriever};
use crate::values::{Items, Pair, is_collection_value, items_to_value, value_to_items, values_equal};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

/// Boxed pull-based enumerator.
pub type Cursor = Box<dyn Iterator<Item = Pair>>;

/// Replayable cursor factory: every call yields an independent, fresh cursor.
pub type Factory = Rc<dyn Fn() -> Cursor>;

/// Wall-clock reader used by [`TakeUntilTimeout`].
pub type Clock = Rc<dyn Fn() -> DateTime<Utc>>;

/* ===================== Sources ===================== */

/// Cursor over shared materialized items.
pub struct MaterializedCursor {
    items: Rc<Items>,
    position: usize,
}

impl MaterializedCursor {
    #[must_use]
    pub const fn new(items: Rc<Items>) -> Self {
        Self { items, position: 0 }
    }
}

impl Iterator for MaterializedCursor {
    type Item = Pair;

    fn next(&mut self) -> Option<Pair> {
        let (k, v) = self.items.get_index(self.position)?;
        self.position += 1;
        Some((k.clone(), v.clone()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.items.len().saturating_sub(self.position);
        (left, Some(left))
    }
}

/// A cursor that does not call its factory until the first pull.
///
/// Creating a cursor therefore never runs upstream work: a stage built on a
/// deferred source stays inert until a consumer asks for an element.
pub struct Suspended {
    factory: Option<Factory>,
    cursor: Option<Cursor>,
}

impl Suspended {
    #[must_use]
    pub const fn new(factory: Factory) -> Self {
        Self { factory: Some(factory), cursor: None }
    }
}

impl Iterator for Suspended {
    type Item = Pair;

    fn next(&mut self) -> Option<Pair> {
        if self.cursor.is_none() {
            let factory = self.factory.take()?;
            self.cursor = Some(factory());
        }
        self.cursor.as_mut()?.next()
    }
}

/// Box an iterator of pairs as a [`Cursor`].
pub fn boxed<I>(iter: I) -> Cursor
where
    I: Iterator<Item = Pair> + 'static,
{
    Box::new(iter)
}

/// Integers `from..=to`, descending when `from > to`, keyed from `0`.
#[must_use]
pub fn range(from: i64, to: i64) -> Cursor {
    if from <= to {
        index_values((from..=to).map(Value::from))
    } else {
        index_values((to..=from).rev().map(Value::from))
    }
}

/* ===================== Re-keying ===================== */

/// Re-key a cursor sequentially from `0`, keeping values.
#[must_use]
pub fn reindex(cursor: Cursor) -> Cursor {
    Box::new(
        cursor
            .enumerate()
            .map(|(i, (_, v))| (Key::from(i), v)),
    )
}

/// Key a stream of values sequentially from `0`.
pub fn index_values<I>(values: I) -> Cursor
where
    I: Iterator<Item = Value> + 'static,
{
    Box::new(values.enumerate().map(|(i, v)| (Key::from(i), v)))
}

/// `head` as-is, then the values of `tail` keyed after the largest integer
/// key `head` produced.
#[must_use]
pub fn concat(head: Cursor, tail: Cursor) -> Cursor {
    let next = Rc::new(Cell::new(0_i64));
    let seen = Rc::clone(&next);
    boxed(
        head.inspect(move |(k, _)| {
            if let Key::Int(i) = k {
                seen.set(seen.get().max(i.saturating_add(1)));
            }
        })
        .chain(tail.map(move |(_, v)| {
            let key = next.get();
            next.set(key.saturating_add(1));
            (Key::Int(key), v)
        })),
    )
}

/// Values of every nested collection, in order; scalars are dropped.
#[must_use]
pub fn collapse(cursor: Cursor) -> Cursor {
    index_values(
        cursor
            .map(|(_, v)| v)
            .filter(is_collection_value)
            .flat_map(|v| value_to_items(v).into_values()),
    )
}

/// Inline nested collections up to `depth` levels (`usize::MAX` for no limit).
pub fn flatten_value(value: Value, depth: usize, out: &mut Vec<Value>) {
    if !is_collection_value(&value) {
        out.push(value);
        return;
    }
    for child in value_to_items(value).into_values() {
        if depth == 1 || !is_collection_value(&child) {
            out.push(child);
        } else {
            flatten_value(child, depth - 1, out);
        }
    }
}

/* ===================== Memoization ===================== */

struct Memo {
    upstream: Cursor,
    cache: Vec<Pair>,
    exhausted: bool,
}

/// One consumer's position in a remembered sequence.
///
/// All replays of the same memo share one upstream cursor and one
/// position-indexed cache. Index `i` is read from the cache once it exists,
/// so the upstream cursor is advanced at most once per element no matter how
/// many consumers there are or how they interleave.
pub struct Replay {
    memo: Rc<RefCell<Memo>>,
    index: usize,
}

impl Iterator for Replay {
    type Item = Pair;

    fn next(&mut self) -> Option<Pair> {
        let mut memo = self.memo.borrow_mut();
        if let Some(pair) = memo.cache.get(self.index) {
            self.index += 1;
            return Some(pair.clone());
        }
        if memo.exhausted {
            return None;
        }
        if let Some(pair) = memo.upstream.next() {
            memo.cache.push(pair.clone());
            tracing::trace!(index = self.index, key = %pair.0, "remember cached element");
            self.index += 1;
            Some(pair)
        } else {
            memo.exhausted = true;
            None
        }
    }
}

/// Build a factory whose cursors replay `upstream` through a shared cache.
#[must_use]
pub fn remember(upstream: Cursor) -> Factory {
    let memo = Rc::new(RefCell::new(Memo {
        upstream,
        cache: Vec::new(),
        exhausted: false,
    }));
    Rc::new(move || {
        Box::new(Replay {
            memo: Rc::clone(&memo),
            index: 0,
        }) as Cursor
    })
}

/* ===================== Windowing ===================== */

/// Consecutive groups of `size` elements (keys preserved inside each group).
pub struct Chunk {
    upstream: Cursor,
    size: usize,
    index: usize,
}

impl Chunk {
    #[must_use]
    pub fn new(upstream: Cursor, size: usize) -> Self {
        Self { upstream, size, index: 0 }
    }
}

impl Iterator for Chunk {
    type Item = Pair;

    fn next(&mut self) -> Option<Pair> {
        if self.size == 0 {
            return None;
        }
        let mut chunk = Items::new();
        while chunk.len() < self.size {
            let Some((k, v)) = self.upstream.next() else {
                break;
            };
            chunk.insert(k, v);
        }
        if chunk.is_empty() {
            return None;
        }
        let key = Key::from(self.index);
        self.index += 1;
        Some((key, items_to_value(chunk)))
    }
}

/// Overlapping windows of `size` elements, one every `step` elements.
///
/// When `step > size` the elements between two windows are drained from the
/// upstream cursor and never emitted.
pub struct Sliding {
    upstream: Cursor,
    size: usize,
    step: usize,
    window: Items,
    index: usize,
}

impl Sliding {
    #[must_use]
    pub fn new(upstream: Cursor, size: usize, step: usize) -> Self {
        Self {
            upstream,
            size,
            step,
            window: Items::new(),
            index: 0,
        }
    }
}

impl Iterator for Sliding {
    type Item = Pair;

    fn next(&mut self) -> Option<Pair> {
        if self.size == 0 || self.step == 0 {
            return None;
        }
        loop {
            let (k, v) = self.upstream.next()?;
            self.window.insert(k, v);
            if self.window.len() < self.size {
                continue;
            }
            let emitted = items_to_value(self.window.clone());
            let drop = self.step.min(self.window.len());
            self.window.drain(..drop);
            for _ in self.size..self.step {
                if self.upstream.next().is_none() {
                    break;
                }
            }
            let key = Key::from(self.index);
            self.index += 1;
            return Some((key, emitted));
        }
    }
}

/// Chunks that continue while `pred(next_value, next_key, chunk_so_far)` holds.
pub struct ChunkWhile<P> {
    upstream: Cursor,
    pred: P,
    chunk: Collection,
    index: usize,
}

impl<P> ChunkWhile<P>
where
    P: Fn(&Value, &Key, &Collection) -> bool,
{
    pub fn new(upstream: Cursor, pred: P) -> Self {
        Self {
            upstream,
            pred,
            chunk: Collection::default(),
            index: 0,
        }
    }

    fn emit(&mut self) -> Pair {
        let chunk = std::mem::take(&mut self.chunk);
        let key = Key::from(self.index);
        self.index += 1;
        (key, chunk.to_value())
    }
}

impl<P> Iterator for ChunkWhile<P>
where
    P: Fn(&Value, &Key, &Collection) -> bool,
{
    type Item = Pair;

    fn next(&mut self) -> Option<Pair> {
        loop {
            let Some((k, v)) = self.upstream.next() else {
                return if self.chunk.is_empty() { None } else { Some(self.emit()) };
            };
            if self.chunk.is_empty() || (self.pred)(&v, &k, &self.chunk) {
                self.chunk.put(k, v);
                continue;
            }
            let out = self.emit();
            self.chunk.put(k, v);
            return Some(out);
        }
    }
}

/* ===================== Multi-cursor ===================== */

/// Element-wise tuples across several cursors; stops at the shortest.
pub struct Zip {
    cursors: Vec<Cursor>,
    index: usize,
    done: bool,
}

impl Zip {
    #[must_use]
    pub const fn new(cursors: Vec<Cursor>) -> Self {
        Self { cursors, index: 0, done: false }
    }
}

impl Iterator for Zip {
    type Item = Pair;

    fn next(&mut self) -> Option<Pair> {
        if self.done || self.cursors.is_empty() {
            return None;
        }
        let mut tuple = Vec::with_capacity(self.cursors.len());
        for cursor in &mut self.cursors {
            if let Some((_, v)) = cursor.next() {
                tuple.push(v);
            } else {
                self.done = true;
                return None;
            }
        }
        let key = Key::from(self.index);
        self.index += 1;
        Some((key, Value::Array(tuple)))
    }
}

/// Pair the values of `keys` (as keys) with the values of `values`.
///
/// A length mismatch is not an error: a warning is logged and the result
/// stops at the shorter side.
pub struct Combine {
    keys: Cursor,
    values: Cursor,
    done: bool,
}

impl Combine {
    #[must_use]
    pub const fn new(keys: Cursor, values: Cursor) -> Self {
        Self { keys, values, done: false }
    }
}

impl Iterator for Combine {
    type Item = Pair;

    fn next(&mut self) -> Option<Pair> {
        if self.done {
            return None;
        }
        let Some((_, key)) = self.keys.next() else {
            self.done = true;
            if self.values.next().is_some() {
                tracing::warn!("combine: both inputs should have an equal number of elements; extra values dropped");
            }
            return None;
        };
        if let Some((_, value)) = self.values.next() {
            Some((Key::from_value(&key), value))
        } else {
            self.done = true;
            tracing::warn!("combine: both inputs should have an equal number of elements; extra keys dropped");
            None
        }
    }
}

/* ===================== Filtering ===================== */

/// First occurrence of every distinct retrieved value.
///
/// The seen-set grows for the life of the cursor.
pub struct Unique {
    upstream: Cursor,
    retrieve: Retriever,
    strict: bool,
    seen: Vec<Value>,
}

impl Unique {
    #[must_use]
    pub const fn new(upstream: Cursor, retrieve: Retriever, strict: bool) -> Self {
        Self {
            upstream,
            retrieve,
            strict,
            seen: Vec::new(),
        }
    }
}

impl Iterator for Unique {
    type Item = Pair;

    fn next(&mut self) -> Option<Pair> {
        loop {
            let (k, v) = self.upstream.next()?;
            let id = (self.retrieve)(&v, &k);
            if self.seen.iter().any(|s| values_equal(s, &id, self.strict)) {
                continue;
            }
            self.seen.push(id);
            return Some((k, v));
        }
    }
}

/// Elements whose key is in `wanted`; stops pulling once every key was seen.
pub struct Only {
    upstream: Cursor,
    wanted: HashSet<Key>,
}

impl Only {
    #[must_use]
    pub const fn new(upstream: Cursor, wanted: HashSet<Key>) -> Self {
        Self { upstream, wanted }
    }
}

impl Iterator for Only {
    type Item = Pair;

    fn next(&mut self) -> Option<Pair> {
        while !self.wanted.is_empty() {
            let (k, v) = self.upstream.next()?;
            if self.wanted.remove(&k) {
                return Some((k, v));
            }
        }
        None
    }
}

/// Stream while the clock reads before `deadline`.
///
/// The clock is checked before the first pull and again each time the
/// consumer resumes after an emitted element.
pub struct TakeUntilTimeout {
    upstream: Cursor,
    deadline: DateTime<Utc>,
    clock: Clock,
    expired: bool,
}

impl TakeUntilTimeout {
    #[must_use]
    pub fn new(upstream: Cursor, deadline: DateTime<Utc>, clock: Clock) -> Self {
        Self {
            upstream,
            deadline,
            clock,
            expired: false,
        }
    }
}

impl Iterator for TakeUntilTimeout {
    type Item = Pair;

    fn next(&mut self) -> Option<Pair> {
        if self.expired || (self.clock)() >= self.deadline {
            self.expired = true;
            return None;
        }
        self.upstream.next()
    }
}

/// Append `filler` until at least `size` elements were produced.
pub struct Pad {
    upstream: Option<Cursor>,
    size: usize,
    filler: Value,
    produced: usize,
    next_key: i64,
}

impl Pad {
    #[must_use]
    pub const fn new(upstream: Cursor, size: usize, filler: Value) -> Self {
        Self {
            upstream: Some(upstream),
            size,
            filler,
            produced: 0,
            next_key: 0,
        }
    }
}

impl Iterator for Pad {
    type Item = Pair;

    fn next(&mut self) -> Option<Pair> {
        if let Some(upstream) = self.upstream.as_mut() {
            if let Some((k, v)) = upstream.next() {
                if let Key::Int(i) = k {
                    self.next_key = self.next_key.max(i.saturating_add(1));
                }
                self.produced += 1;
                return Some((k, v));
            }
            self.upstream = None;
        }
        if self.produced >= self.size {
            return None;
        }
        self.produced += 1;
        let key = Key::Int(self.next_key);
        self.next_key += 1;
        Some((key, self.filler.clone()))
    }
}

/// Box a predicate-driven `take_while` stage.
#[must_use]
pub fn take_while(cursor: Cursor, pred: Predicate) -> Cursor {
    Box::new(cursor.take_while(move |(k, v)| pred(v, k)))
}

/// Box a predicate-driven `skip_while` stage.
#[must_use]
pub fn skip_while(cursor: Cursor, pred: Predicate) -> Cursor {
    Box::new(cursor.skip_while(move |(k, v)| pred(v, k)))
}

//! Lazy pipelines.
//!
//! A [`LazyCollection`] holds one [`Source`]. Every operator wraps the
//! current pipeline in a new deferred stage; nothing is pulled until the
//! pipeline is consumed, and every consumption is a fresh pass from the
//! source.

use crate::cursor::{self, Clock, Cursor, TakeUntilTimeout, boxed};
use crate::enumerable::Enumerable;
use crate::error::Result;
use crate::key::Key;
use crate::source::{Input, Source};
use crate::values::{Items, Pair};
use chrono::{DateTime, Utc};
use serde::ser::{Serialize, Serializer};
use serde_json::Value;
use std::fmt::{Debug, Formatter, Result as FormatResult};
use std::rc::Rc;

/// A deferred, replayable pipeline over a [`Source`].
#[derive(Clone, Default)]
pub struct LazyCollection {
    source: Source,
}

impl LazyCollection {
    pub fn new(source: impl Into<Source>) -> Self {
        Self { source: source.into() }
    }

    /// Build from anything [`Input`] accepts.
    ///
    /// # Errors
    /// [`CollectionError::InvalidSource`](crate::CollectionError::InvalidSource)
    /// for a started cursor, which cannot be replayed.
    pub fn make(input: impl Into<Input>) -> Result<Self> {
        Ok(Self::new(input.into().into_source()?))
    }

    /// Deferred pipeline over a factory of pairs. `factory` runs once per pass,
    /// on the first pull.
    pub fn from_fn<F, I>(factory: F) -> Self
    where
        F: Fn() -> I + 'static,
        I: IntoIterator<Item = Pair>,
        I::IntoIter: 'static,
    {
        Self::deferred(move || boxed(factory().into_iter()))
    }

    /// Like [`from_fn`](Self::from_fn) for plain values, keyed from `0`.
    pub fn from_values_fn<F, I>(factory: F) -> Self
    where
        F: Fn() -> I + 'static,
        I: IntoIterator<Item = Value>,
        I::IntoIter: 'static,
    {
        Self::deferred(move || cursor::index_values(factory().into_iter()))
    }

    #[must_use]
    pub const fn source(&self) -> &Source {
        &self.source
    }

    fn deferred<F>(factory: F) -> Self
    where
        F: Fn() -> Cursor + 'static,
    {
        Self::new(Source::deferred(factory))
    }

    /// Cache elements as they are pulled so that every later pass, and every
    /// concurrent consumer, replays them without touching upstream again.
    #[must_use]
    pub fn remember(&self) -> Self {
        tracing::debug!(source = ?self.source, "remember: sharing one upstream cursor");
        Self::new(Source::Deferred(cursor::remember(self.iter())))
    }

    /// Call `f` for each element as it streams past.
    #[must_use]
    pub fn tap_each<F>(&self, f: F) -> Self
    where
        F: Fn(&Value, &Key) + 'static,
    {
        let f = Rc::new(f);
        self.stream(move |upstream| {
            let f = Rc::clone(&f);
            boxed(upstream.inspect(move |(k, v)| f(v, k)))
        })
    }

    /// Stream until the wall clock reaches `deadline`.
    #[must_use]
    pub fn take_until_timeout(&self, deadline: DateTime<Utc>) -> Self {
        self.take_until_timeout_with(deadline, Utc::now)
    }

    /// [`take_until_timeout`](Self::take_until_timeout) against a custom clock.
    #[must_use]
    pub fn take_until_timeout_with<C>(&self, deadline: DateTime<Utc>, clock: C) -> Self
    where
        C: Fn() -> DateTime<Utc> + 'static,
    {
        let clock: Clock = Rc::new(clock);
        self.stream(move |upstream| boxed(TakeUntilTimeout::new(upstream, deadline, Rc::clone(&clock))))
    }

    /// Materialize now and wrap the result in a new pipeline.
    #[must_use]
    pub fn eager(&self) -> Self {
        Self::new(Source::from(self.all()))
    }
}

impl Enumerable for LazyCollection {
    fn from_items(items: Items) -> Self {
        Self::new(Source::from(items))
    }

    fn range(from: i64, to: i64) -> Self {
        Self::deferred(move || cursor::range(from, to))
    }

    fn iter(&self) -> Cursor {
        self.source.cursor()
    }

    fn stream<F>(&self, op: F) -> Self
    where
        F: Fn(Cursor) -> Cursor + 'static,
    {
        let upstream = self.clone();
        Self::deferred(move || op(upstream.iter()))
    }

    fn passthru<F>(&self, op: &'static str, f: F) -> Self
    where
        F: Fn(&Items) -> Items + 'static,
    {
        let upstream = self.clone();
        Self::deferred(move || {
            let items = upstream.all();
            tracing::debug!(op, len = items.len(), "materialized upstream");
            boxed(f(&items).into_iter())
        })
    }

    fn all(&self) -> Items {
        self.source.to_items()
    }

    fn count(&self) -> usize {
        self.source
            .materialized()
            .map_or_else(|| self.iter().count(), |items| items.len())
    }
}

impl Debug for LazyCollection {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        f.debug_struct("LazyCollection").field("source", &self.source).finish()
    }
}

impl IntoIterator for &LazyCollection {
    type Item = Pair;
    type IntoIter = Cursor;

    fn into_iter(self) -> Cursor {
        self.iter()
    }
}

/// Serializes one full pass, the same way [`Collection`](crate::Collection) does.
impl Serialize for LazyCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.collect().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    #[test]
    fn stages_do_nothing_until_pulled() {
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let pipeline = LazyCollection::from_values_fn(move || {
            seen.set(seen.get() + 1);
            vec![json!(3), json!(1), json!(2)]
        })
        .map(|v, _| v.clone())
        .sort()
        .filter(|_, _| true);
        assert_eq!(calls.get(), 0);
        assert_eq!(pipeline.to_list(), vec![json!(1), json!(2), json!(3)]);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn count_uses_stored_length() {
        let lazy = LazyCollection::from_items(Items::from_iter([(Key::Int(0), json!(1))]));
        assert_eq!(lazy.count(), 1);
        assert_eq!(LazyCollection::range(1, 4).count(), 4);
    }

    #[test]
    fn eager_detaches_from_the_factory() {
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let eager = LazyCollection::from_values_fn(move || {
            seen.set(seen.get() + 1);
            vec![json!(1)]
        })
        .eager();
        assert_eq!(calls.get(), 1);
        let _ = eager.to_list();
        let _ = eager.to_list();
        assert_eq!(calls.get(), 1);
    }
}

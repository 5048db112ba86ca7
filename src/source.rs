//! Sequence sources.
//!
//! A [`Source`] is what a collection enumerates: stored items, a replayable
//! factory, or another lazy pipeline. Sources are immutable once built and
//! produce a fresh [`Cursor`] on every request.
//!
//! [`Input`] is the wider construction union accepted by `make`: it also
//! admits a started [`Cursor`], which an eager collection can simply drain
//! but a lazy pipeline must reject because it cannot be replayed.

use crate::collection::Collection;
use crate::cursor::{Cursor, Factory, MaterializedCursor, Suspended};
use crate::error::{CollectionError, Result};
use crate::key::Key;
use crate::lazy::LazyCollection;
use crate::values::{Items, Pair, list_items, value_to_items};
use serde_json::Value;
use std::fmt::{Debug, Formatter, Result as FormatResult};
use std::rc::Rc;

/// Where a collection's elements come from.
#[derive(Clone)]
pub enum Source {
    /// Stored items, re-iterable indefinitely with identical content.
    Materialized(Rc<Items>),
    /// A factory called once per pass, each call yielding a fresh cursor.
    Deferred(Factory),
    /// Another pipeline's own source.
    Nested(Box<LazyCollection>),
}

impl Source {
    /// Deferred source from a cursor factory.
    pub fn deferred<F>(factory: F) -> Self
    where
        F: Fn() -> Cursor + 'static,
    {
        Self::Deferred(Rc::new(factory))
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::Materialized(Rc::new(Items::new()))
    }

    /// Fresh cursor over the source.
    ///
    /// A deferred factory is not invoked until the cursor's first pull.
    #[must_use]
    pub fn cursor(&self) -> Cursor {
        match self {
            Self::Materialized(items) => Box::new(MaterializedCursor::new(Rc::clone(items))),
            Self::Deferred(factory) => Box::new(Suspended::new(Rc::clone(factory))),
            Self::Nested(inner) => inner.source().cursor(),
        }
    }

    /// Stored items, if the source (or the pipeline it nests) is materialized.
    #[must_use]
    pub fn materialized(&self) -> Option<&Rc<Items>> {
        match self {
            Self::Materialized(items) => Some(items),
            Self::Deferred(_) => None,
            Self::Nested(inner) => inner.source().materialized(),
        }
    }

    /// Force the source into concrete items.
    #[must_use]
    pub fn to_items(&self) -> Items {
        self.materialized()
            .map_or_else(|| self.cursor().collect(), |items| (**items).clone())
    }
}

impl Default for Source {
    fn default() -> Self {
        Self::empty()
    }
}

impl Debug for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        match self {
            Self::Materialized(items) => f.debug_tuple("Materialized").field(&items.len()).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
            Self::Nested(_) => f.write_str("Nested(..)"),
        }
    }
}

impl From<Items> for Source {
    fn from(items: Items) -> Self {
        Self::Materialized(Rc::new(items))
    }
}

impl From<Rc<Items>> for Source {
    fn from(items: Rc<Items>) -> Self {
        Self::Materialized(items)
    }
}

/// `null` is empty, arrays and objects are their elements, any other scalar
/// becomes a one-element list.
impl From<Value> for Source {
    fn from(value: Value) -> Self {
        Self::from(value_to_items(value))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Source {
    fn from(values: Vec<T>) -> Self {
        Self::from(list_items(values.into_iter().map(Into::into)))
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Source {
    fn from(values: [T; N]) -> Self {
        Self::from(list_items(values.into_iter().map(Into::into)))
    }
}

impl From<()> for Source {
    fn from((): ()) -> Self {
        Self::empty()
    }
}

impl From<Collection> for Source {
    fn from(collection: Collection) -> Self {
        Self::Materialized(collection.shared())
    }
}

impl From<&Collection> for Source {
    fn from(collection: &Collection) -> Self {
        Self::Materialized(collection.shared())
    }
}

impl From<LazyCollection> for Source {
    fn from(lazy: LazyCollection) -> Self {
        Self::Nested(Box::new(lazy))
    }
}

impl From<&LazyCollection> for Source {
    fn from(lazy: &LazyCollection) -> Self {
        Self::Nested(Box::new(lazy.clone()))
    }
}

/* ===================== Input ===================== */

/// Everything `make` accepts.
pub enum Input {
    /// A replayable source.
    Source(Source),
    /// An already-started, single-pass cursor.
    Cursor(Cursor),
}

impl Input {
    /// Wrap a started iterator of pairs.
    pub fn cursor<I>(iter: I) -> Self
    where
        I: Iterator<Item = Pair> + 'static,
    {
        Self::Cursor(Box::new(iter))
    }

    /// Wrap a started iterator of values, keyed from `0`.
    pub fn values<I>(iter: I) -> Self
    where
        I: Iterator<Item = Value> + 'static,
    {
        Self::Cursor(Box::new(iter.enumerate().map(|(i, v)| (Key::from(i), v))))
    }

    /// Replayable source, or [`CollectionError::InvalidSource`] for a cursor.
    pub fn into_source(self) -> Result<Source> {
        match self {
            Self::Source(source) => Ok(source),
            Self::Cursor(_) => Err(CollectionError::InvalidSource),
        }
    }

    /// Concrete items; a cursor is drained once.
    #[must_use]
    pub fn into_items(self) -> Items {
        match self {
            Self::Source(source) => source.to_items(),
            Self::Cursor(cursor) => cursor.collect(),
        }
    }
}

impl From<Source> for Input {
    fn from(source: Source) -> Self {
        Self::Source(source)
    }
}

impl From<Cursor> for Input {
    fn from(cursor: Cursor) -> Self {
        Self::Cursor(cursor)
    }
}

macro_rules! input_from_source {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Input {
                fn from(value: $t) -> Self {
                    Self::Source(Source::from(value))
                }
            }
        )*
    };
}

input_from_source!(
    Items,
    Rc<Items>,
    Value,
    (),
    Collection,
    &Collection,
    LazyCollection,
    &LazyCollection,
);

impl<T: Into<Value>> From<Vec<T>> for Input {
    fn from(values: Vec<T>) -> Self {
        Self::Source(Source::from(values))
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Input {
    fn from(values: [T; N]) -> Self {
        Self::Source(Source::from(values))
    }
}

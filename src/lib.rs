//! # Lazybeam
//!
//! Ordered key-value **collection pipelines** for Rust, in two flavours that
//! share one operator algebra:
//!
//! - [`Collection`]: eager and materialized. Every operator runs immediately
//!   and returns a new collection.
//! - [`LazyCollection`]: a chain of deferred stages over a [`Source`].
//!   Nothing runs until the pipeline is consumed, and infinite sources are
//!   fine as long as something like [`take`](Enumerable::take) bounds the
//!   pull.
//!
//! Elements are `(Key, Value)` pairs. Keys are integers or strings
//! ([`Key`]); values are dynamic [`serde_json::Value`]s, and nested
//! collections (chunks, groups, windows) are themselves values.
//!
//! ## Quick Start
//!
//! ```
//! use lazybeam::*;
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! // Eager: runs as you go
//! let people = collect(json!([
//!     {"name": "Ada", "team": "core"},
//!     {"name": "Grace", "team": "tools"},
//!     {"name": "Linus", "team": "core"},
//! ]));
//! let core = people.where_eq("team", "core").pluck("name");
//! assert_eq!(core.to_value(), json!(["Ada", "Linus"]));
//!
//! // Lazy: only three elements of an unbounded range are ever produced
//! let squares = LazyCollection::range(1, i64::MAX)
//!     .map(|v, _| json!(v.as_i64().unwrap_or(0).pow(2)))
//!     .take(3);
//! assert_eq!(squares.to_value(), json!([1, 4, 9]));
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Sources
//!
//! A [`Source`] is stored items, a replayable factory, or another pipeline.
//! Each pass asks it for a fresh [`Cursor`]. A started iterator cannot be
//! replayed, so [`LazyCollection::make`] rejects it with
//! [`CollectionError::InvalidSource`]; [`Collection::make`] simply drains it.
//!
//! ### Streaming and passthrough
//!
//! Most operators (`map`, `filter`, `chunk`, `sliding`, `zip`, ...) are
//! streaming stages. Operators that need the whole sequence (`sort_by`,
//! `diff`, `group_by`, ...) materialize upstream on the first pull of their
//! stage, run the eager algorithm and stream the result.
//!
//! ### Memoization
//!
//! [`LazyCollection::remember`] shares one upstream cursor between every pass
//! and caches what it has produced, so side-effecting sources run at most
//! once per element.
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events (a `warn` for mismatched `combine`
//! lengths, `debug` when a passthrough stage materializes). Install any
//! subscriber to see them.

pub mod collection;
pub mod cursor;
pub mod enumerable;
pub mod error;
pub mod helpers;
pub mod key;
pub mod lazy;
pub mod selector;
pub mod source;
pub mod testing;
pub mod values;

pub use collection::Collection;
pub use cursor::Cursor;
pub use enumerable::Enumerable;
pub use error::{CollectionError, Result};
pub use key::Key;
pub use lazy::LazyCollection;
pub use selector::{Condition, Direction, Operator, Selector, SortCriterion};
pub use serde_json::Value;
pub use source::{Input, Source};
pub use values::{Items, Pair};

/// Eager collection from anything [`Input`] accepts.
pub fn collect(input: impl Into<Input>) -> Collection {
    Collection::make(input)
}

/// Lazy pipeline from anything [`Input`] accepts.
///
/// # Errors
/// [`CollectionError::InvalidSource`] for a started cursor.
pub fn lazy(input: impl Into<Input>) -> Result<LazyCollection> {
    LazyCollection::make(input)
}

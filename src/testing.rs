//! Testing utilities for collection pipelines.
//!
//! - **Assertions** compare a collection's output with expected values and
//!   work for both [`Collection`](crate::Collection) and
//!   [`LazyCollection`](crate::LazyCollection).
//! - **Fixtures** provide sample datasets and counting sources that record
//!   how many elements a pipeline actually pulled.
//!
//! # Quick Start
//!
//! ```
//! use lazybeam::Enumerable;
//! use lazybeam::testing::*;
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let (numbers, pulls) = counting_range(1, None);
//! let evens = numbers.filter(|v, _| v.as_i64().is_some_and(|n| n % 2 == 0)).take(2);
//! assert_values_equal(&evens, &[json!(2), json!(4)]);
//! assert_eq!(pulls.get(), 4);
//!
//! let products = fixture_collection(&sample_products())?;
//! assert_collection_size(&products.where_eq("category", "lighting"), 2);
//! # Ok(())
//! # }
//! ```

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;

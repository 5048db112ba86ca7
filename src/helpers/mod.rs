//! Eager algorithms over materialized [`Items`](crate::Items).
//!
//! Every function here takes the full container and returns a new one. The
//! eager [`Collection`](crate::Collection) calls them directly; the lazy
//! pipeline reaches them through its passthrough stage, which materializes
//! upstream on first pull and streams the result.

pub(crate) mod grouping;
pub(crate) mod sampling;
pub(crate) mod sets;
pub(crate) mod shape;
pub(crate) mod sorting;
pub(crate) mod statistical;

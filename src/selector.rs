//! Value Retriever Protocol.
//!
//! Keyed operators (`sort_by`, `group_by`, `key_by`, `pluck`, `unique_by`,
//! `count_by`, `min_by`, `max_by`, `avg_by`, `median_by`, `mode_by`, ...)
//! accept a [`Selector`], which is resolved once, when the operator is built,
//! into a single [`Retriever`] closure `(value, key) -> value`.
//!
//! Condition-taking operators (`skip_while`, `take_until`, `search`,
//! `contains`, `reject`, ...) accept a [`Condition`]: either a predicate or a
//! bare value compared for (loose or strict) equality.
//!
//! ```
//! use lazybeam::{Key, Selector};
//! use serde_json::json;
//!
//! let name = Selector::from("user.name").resolve();
//! let row = json!({"user": {"name": "ada"}});
//! assert_eq!(name(&row, &Key::Int(0)), json!("ada"));
//! assert_eq!(name(&json!({"user": null}), &Key::Int(1)), json!(null));
//! ```

use crate::key::Key;
use crate::values::{compare, data_get, data_get_opt, is_truthy, loose_eq, strict_eq, values_equal};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt::{Debug, Formatter, Result as FormatResult};
use std::rc::Rc;

/// Uniform "extract a value from an element" function.
pub type Retriever = Rc<dyn Fn(&Value, &Key) -> Value>;

/// Element predicate `(value, key) -> bool`.
pub type Predicate = Rc<dyn Fn(&Value, &Key) -> bool>;

/// Two-value comparator.
pub type Comparator = Rc<dyn Fn(&Value, &Value) -> Ordering>;

/* ===================== Selector ===================== */

/// What to extract from each element.
#[derive(Clone, Default)]
pub enum Selector {
    /// The element itself.
    #[default]
    Identity,
    /// Dotted key path into the element (`"a.b.c"`, `"tags.*"`).
    Path(String),
    /// Dotted key path with a fallback for missing segments.
    PathOr(String, Value),
    /// Arbitrary transform of `(value, key)`.
    Transform(Retriever),
    /// The same value for every element.
    Constant(Value),
}

impl Selector {
    #[must_use]
    pub fn path(path: impl Into<String>) -> Self {
        Self::Path(path.into())
    }

    /// Path lookup that yields `default` instead of `null` when any segment
    /// is missing. A present `null` is returned as is.
    #[must_use]
    pub fn path_or(path: impl Into<String>, default: impl Into<Value>) -> Self {
        Self::PathOr(path.into(), default.into())
    }

    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&Value, &Key) -> Value + 'static,
    {
        Self::Transform(Rc::new(f))
    }

    #[must_use]
    pub const fn constant(value: Value) -> Self {
        Self::Constant(value)
    }

    /// Resolve into a single retriever closure.
    #[must_use]
    pub fn resolve(&self) -> Retriever {
        match self {
            Self::Identity => Rc::new(|v: &Value, _: &Key| v.clone()),
            Self::Path(path) => {
                let path = path.clone();
                Rc::new(move |v: &Value, _: &Key| data_get(v, &path))
            }
            Self::PathOr(path, default) => {
                let (path, default) = (path.clone(), default.clone());
                Rc::new(move |v: &Value, _: &Key| {
                    data_get_opt(v, &path).unwrap_or_else(|| default.clone())
                })
            }
            Self::Transform(f) => Rc::clone(f),
            Self::Constant(c) => {
                let c = c.clone();
                Rc::new(move |_: &Value, _: &Key| c.clone())
            }
        }
    }

    /// `true` for [`Selector::Identity`].
    #[must_use]
    pub const fn is_identity(&self) -> bool {
        matches!(self, Self::Identity)
    }
}

impl From<&str> for Selector {
    fn from(path: &str) -> Self {
        Self::Path(path.to_string())
    }
}

impl From<String> for Selector {
    fn from(path: String) -> Self {
        Self::Path(path)
    }
}

impl From<Option<&str>> for Selector {
    fn from(path: Option<&str>) -> Self {
        path.map_or(Self::Identity, Self::from)
    }
}

impl Debug for Selector {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        match self {
            Self::Identity => f.write_str("Identity"),
            Self::Path(p) => f.debug_tuple("Path").field(p).finish(),
            Self::PathOr(p, d) => f.debug_tuple("PathOr").field(p).field(d).finish(),
            Self::Transform(_) => f.write_str("Transform(..)"),
            Self::Constant(c) => f.debug_tuple("Constant").field(c).finish(),
        }
    }
}

/* ===================== Condition ===================== */

/// A predicate, or a bare value meaning "equal to this value".
#[derive(Clone)]
pub enum Condition {
    Equals(Value),
    Test(Predicate),
}

impl Condition {
    pub fn test<F>(f: F) -> Self
    where
        F: Fn(&Value, &Key) -> bool + 'static,
    {
        Self::Test(Rc::new(f))
    }

    /// Resolve into a predicate; bare values use strict or loose equality.
    #[must_use]
    pub fn resolve(&self, strict: bool) -> Predicate {
        match self {
            Self::Test(f) => Rc::clone(f),
            Self::Equals(expected) => {
                let expected = expected.clone();
                Rc::new(move |v: &Value, _: &Key| values_equal(v, &expected, strict))
            }
        }
    }

    /// Resolved predicate with its result inverted.
    #[must_use]
    pub fn negated(&self, strict: bool) -> Predicate {
        let inner = self.resolve(strict);
        Rc::new(move |v: &Value, k: &Key| !inner(v, k))
    }
}

impl From<Value> for Condition {
    fn from(v: Value) -> Self {
        Self::Equals(v)
    }
}

impl From<&str> for Condition {
    fn from(v: &str) -> Self {
        Self::Equals(Value::from(v))
    }
}

impl From<String> for Condition {
    fn from(v: String) -> Self {
        Self::Equals(Value::from(v))
    }
}

impl From<i64> for Condition {
    fn from(v: i64) -> Self {
        Self::Equals(Value::from(v))
    }
}

impl From<i32> for Condition {
    fn from(v: i32) -> Self {
        Self::Equals(Value::from(v))
    }
}

impl From<f64> for Condition {
    fn from(v: f64) -> Self {
        Self::Equals(Value::from(v))
    }
}

impl From<bool> for Condition {
    fn from(v: bool) -> Self {
        Self::Equals(Value::from(v))
    }
}

impl Debug for Condition {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        match self {
            Self::Equals(v) => f.debug_tuple("Equals").field(v).finish(),
            Self::Test(_) => f.write_str("Test(..)"),
        }
    }
}

/* ===================== Operators ===================== */

/// Comparison operator for the `where_*` family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Eq,
    NotEq,
    Lt,
    Gt,
    Lte,
    Gte,
    StrictEq,
    StrictNotEq,
    /// `<=>`: true when the two sides differ in order.
    Spaceship,
}

impl Operator {
    /// Parse an operator symbol. Unrecognised symbols mean loose equality.
    #[must_use]
    pub fn parse(symbol: &str) -> Self {
        match symbol.trim() {
            "!=" | "<>" => Self::NotEq,
            "<" => Self::Lt,
            ">" => Self::Gt,
            "<=" => Self::Lte,
            ">=" => Self::Gte,
            "===" => Self::StrictEq,
            "!==" => Self::StrictNotEq,
            "<=>" => Self::Spaceship,
            _ => Self::Eq,
        }
    }

    /// Apply the operator to `retrieved OP expected`.
    #[must_use]
    pub fn test(self, retrieved: &Value, expected: &Value) -> bool {
        match self {
            Self::Eq => loose_eq(retrieved, expected),
            Self::NotEq => !loose_eq(retrieved, expected),
            Self::Lt => compare(retrieved, expected).is_lt(),
            Self::Gt => compare(retrieved, expected).is_gt(),
            Self::Lte => compare(retrieved, expected).is_le(),
            Self::Gte => compare(retrieved, expected).is_ge(),
            Self::StrictEq => strict_eq(retrieved, expected),
            Self::StrictNotEq => !strict_eq(retrieved, expected),
            Self::Spaceship => compare(retrieved, expected).is_ne(),
        }
    }
}

impl From<&str> for Operator {
    fn from(symbol: &str) -> Self {
        Self::parse(symbol)
    }
}

/// Build the predicate behind `where_op(key, op, value)`.
#[must_use]
pub fn operator_for_where(key: &Selector, op: Operator, expected: Value) -> Predicate {
    let retrieve = key.resolve();
    Rc::new(move |v: &Value, k: &Key| op.test(&retrieve(v, k), &expected))
}

/// Predicate that is true when the selected value is truthy.
#[must_use]
pub fn truthy_selector(key: &Selector) -> Predicate {
    let retrieve = key.resolve();
    Rc::new(move |v: &Value, k: &Key| is_truthy(&retrieve(v, k)))
}

/* ===================== Sorting criteria ===================== */

/// Sort direction for one criterion of a multi-key sort.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// One criterion of `sort_by_many`: either a selector with a direction or a
/// full two-element comparator.
#[derive(Clone)]
pub enum SortCriterion {
    By(Selector, Direction),
    Using(Comparator),
}

impl SortCriterion {
    pub fn using<F>(f: F) -> Self
    where
        F: Fn(&Value, &Value) -> Ordering + 'static,
    {
        Self::Using(Rc::new(f))
    }

    /// Resolve into a comparator over `(key, value)` elements.
    #[must_use]
    pub fn comparer(&self) -> Rc<dyn Fn(&(Key, Value), &(Key, Value)) -> Ordering> {
        match self {
            Self::Using(f) => {
                let f = Rc::clone(f);
                Rc::new(move |a: &(Key, Value), b: &(Key, Value)| f(&a.1, &b.1))
            }
            Self::By(selector, direction) => {
                let retrieve = selector.resolve();
                let direction = *direction;
                Rc::new(move |a: &(Key, Value), b: &(Key, Value)| {
                    let (x, y) = (retrieve(&a.1, &a.0), retrieve(&b.1, &b.0));
                    match direction {
                        Direction::Asc => compare(&x, &y),
                        Direction::Desc => compare(&y, &x),
                    }
                })
            }
        }
    }
}

impl From<&str> for SortCriterion {
    fn from(path: &str) -> Self {
        Self::By(Selector::from(path), Direction::Asc)
    }
}

impl From<(&str, Direction)> for SortCriterion {
    fn from((path, direction): (&str, Direction)) -> Self {
        Self::By(Selector::from(path), direction)
    }
}

impl From<(Selector, Direction)> for SortCriterion {
    fn from((selector, direction): (Selector, Direction)) -> Self {
        Self::By(selector, direction)
    }
}

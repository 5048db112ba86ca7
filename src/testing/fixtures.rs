//! Ready-made sources and datasets.

use crate::collection::Collection;
use crate::lazy::LazyCollection;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::Cell;
use std::rc::Rc;

/// Shared pull counter handed out by the counting fixtures.
pub type Counter = Rc<Cell<usize>>;

/// `from..=to` as a deferred pipeline that bumps the returned counter once
/// for every element actually pulled.
///
/// `to == None` is unbounded.
///
/// # Example
///
/// ```
/// use lazybeam::Enumerable;
/// use lazybeam::testing::counting_range;
///
/// let (numbers, pulls) = counting_range(1, None);
/// assert_eq!(numbers.take(3).count(), 3);
/// assert_eq!(pulls.get(), 3);
/// ```
#[must_use]
pub fn counting_range(from: i64, to: Option<i64>) -> (LazyCollection, Counter) {
    let counter: Counter = Rc::new(Cell::new(0));
    let seen = Rc::clone(&counter);
    let lazy = LazyCollection::from_values_fn(move || {
        let seen = Rc::clone(&seen);
        (from..=to.unwrap_or(i64::MAX)).map(move |n| {
            seen.set(seen.get() + 1);
            Value::from(n)
        })
    });
    (lazy, counter)
}

/// `values` as a deferred pipeline that counts pulled elements.
#[must_use]
pub fn counting_source(values: Vec<Value>) -> (LazyCollection, Counter) {
    let counter: Counter = Rc::new(Cell::new(0));
    let seen = Rc::clone(&counter);
    let lazy = LazyCollection::from_values_fn(move || {
        let seen = Rc::clone(&seen);
        values.clone().into_iter().inspect(move |_| seen.set(seen.get() + 1))
    });
    (lazy, counter)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub category: String,
    pub price: f64,
    pub stock: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u32,
    pub name: String,
    pub role: String,
    pub active: bool,
    pub manager_id: Option<u32>,
}

fn product(name: &str, category: &str, price: f64, stock: u32) -> Product {
    Product {
        name: name.to_string(),
        category: category.to_string(),
        price,
        stock,
    }
}

fn user(id: u32, name: &str, role: &str, active: bool, manager_id: Option<u32>) -> User {
    User {
        id,
        name: name.to_string(),
        role: role.to_string(),
        active,
        manager_id,
    }
}

/// Six products across three categories, two of them out of stock.
#[must_use]
pub fn sample_products() -> Vec<Product> {
    vec![
        product("Desk", "furniture", 200.0, 3),
        product("Chair", "furniture", 100.0, 0),
        product("Lamp", "lighting", 35.5, 12),
        product("Bulb", "lighting", 4.25, 140),
        product("Monitor", "electronics", 180.0, 0),
        product("Keyboard", "electronics", 49.99, 25),
    ]
}

/// Five users; `manager_id` is `None` for the two without a manager.
#[must_use]
pub fn sample_users() -> Vec<User> {
    vec![
        user(1, "Ada", "admin", true, None),
        user(2, "Grace", "developer", true, Some(1)),
        user(3, "Linus", "developer", false, Some(1)),
        user(4, "Barbara", "designer", true, Some(2)),
        user(5, "Ken", "developer", true, None),
    ]
}

/// Serialize any fixture rows into a list collection.
///
/// # Errors
/// Propagates `serde_json` serialization failures.
pub fn fixture_collection<T: Serialize>(rows: &[T]) -> anyhow::Result<Collection> {
    let values = rows.iter().map(serde_json::to_value).collect::<Result<Vec<_>, _>>()?;
    Ok(Collection::make(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enumerable::Enumerable;

    #[test]
    fn counting_source_counts_each_pass() {
        let (lazy, pulls) = counting_source(vec![Value::from(1), Value::from(2)]);
        assert_eq!(pulls.get(), 0);
        assert_eq!(lazy.count(), 2);
        assert_eq!(lazy.count(), 2);
        assert_eq!(pulls.get(), 4);
    }

    #[test]
    fn fixtures_become_collections() -> anyhow::Result<()> {
        let products = fixture_collection(&sample_products())?;
        assert_eq!(products.count(), 6);
        let users = fixture_collection(&sample_users())?;
        assert_eq!(users.where_null("manager_id").count(), 2);
        Ok(())
    }
}

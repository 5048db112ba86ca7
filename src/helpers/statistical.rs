//! Aggregates over retrieved values.
//!
//! Inputs are the already-retrieved values (one per element). `null`s are
//! ignored by `min`, `max`, `avg` and `median`.

use crate::key::Key;
use crate::values::{as_number, compare, compare_keys, number_value};
use indexmap::IndexMap;
use serde_json::Value;
use std::cmp::Ordering;

/// Numeric sum; non-numeric values count as `0`.
#[allow(clippy::cast_precision_loss)]
pub fn sum<I>(values: I) -> Value
where
    I: IntoIterator<Item = Value>,
{
    let mut int_total: i64 = 0;
    let mut float_total = 0.0_f64;
    let mut integral = true;
    for value in values {
        match value.as_i64() {
            Some(i) if integral => match int_total.checked_add(i) {
                Some(total) => int_total = total,
                None => {
                    integral = false;
                    float_total = int_total as f64 + i as f64;
                }
            },
            _ => {
                if integral {
                    float_total = int_total as f64;
                    integral = false;
                }
                float_total += as_number(&value).unwrap_or_default();
            }
        }
    }
    if integral { Value::from(int_total) } else { number_value(float_total) }
}

fn extreme<I>(values: I, keep: Ordering) -> Option<Value>
where
    I: IntoIterator<Item = Value>,
{
    values
        .into_iter()
        .filter(|v| !v.is_null())
        .reduce(|best, v| if compare(&v, &best) == keep { v } else { best })
}

pub fn min<I>(values: I) -> Option<Value>
where
    I: IntoIterator<Item = Value>,
{
    extreme(values, Ordering::Less)
}

pub fn max<I>(values: I) -> Option<Value>
where
    I: IntoIterator<Item = Value>,
{
    extreme(values, Ordering::Greater)
}

/// Arithmetic mean of the non-null values.
#[allow(clippy::cast_precision_loss)]
pub fn avg<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Value>,
{
    let present: Vec<Value> = values.into_iter().filter(|v| !v.is_null()).collect();
    if present.is_empty() {
        return None;
    }
    let count = present.len();
    let total = as_number(&sum(present)).unwrap_or_default();
    Some(total / count as f64)
}

/// Middle value after sorting; the mean of the two middle values for an
/// even count.
pub fn median<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Value>,
{
    let mut present: Vec<Value> = values.into_iter().filter(|v| !v.is_null()).collect();
    if present.is_empty() {
        return None;
    }
    present.sort_by(compare);
    let middle = present.len() / 2;
    let at = |i: usize| as_number(&present[i]).unwrap_or_default();
    if present.len() % 2 == 1 {
        Some(at(middle))
    } else {
        Some((at(middle - 1) + at(middle)) / 2.0)
    }
}

/// Every value tied for the highest frequency, ascending.
pub fn mode<I>(values: I) -> Option<Vec<Value>>
where
    I: IntoIterator<Item = Value>,
{
    let mut counts: IndexMap<Key, usize> = IndexMap::new();
    for value in values {
        *counts.entry(Key::from_value(&value)).or_default() += 1;
    }
    let highest = counts.values().copied().max()?;
    let mut tied: Vec<Key> = counts
        .into_iter()
        .filter(|(_, n)| *n == highest)
        .map(|(k, _)| k)
        .collect();
    tied.sort_by(compare_keys);
    Some(tied.iter().map(Key::to_value).collect())
}

/// Share of `matched` in `total`, as a percentage rounded to `precision`
/// decimal places.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percentage(matched: usize, total: usize, precision: u32) -> Option<f64> {
    if total == 0 {
        return None;
    }
    let ratio = matched as f64 / total as f64 * 100.0;
    let scale = 10_f64.powi(i32::try_from(precision).unwrap_or(i32::MAX));
    Some((ratio * scale).round() / scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn nums(values: &[i64]) -> Vec<Value> {
        values.iter().copied().map(Value::from).collect()
    }

    #[test]
    fn median_averages_the_middle_pair() {
        assert_eq!(median(nums(&[4, 1, 3, 2])), Some(2.5));
        assert_eq!(median(nums(&[5, 1, 3])), Some(3.0));
        assert_eq!(median(Vec::new()), None);
    }

    #[test]
    fn mode_returns_all_ties_sorted() {
        assert_eq!(mode(nums(&[2, 2, 1, 1, 3])), Some(vec![json!(1), json!(2)]));
        assert_eq!(mode(Vec::new()), None);
    }

    #[test]
    fn sum_stays_integral_until_a_float_appears() {
        assert_eq!(sum(nums(&[1, 2, 3])), json!(6));
        assert_eq!(sum(vec![json!(1), json!(0.5), json!("2")]), json!(3.5));
    }

    #[test]
    fn extremes_skip_nulls() {
        assert_eq!(min(vec![json!(null), json!(3), json!(1)]), Some(json!(1)));
        assert_eq!(max(vec![json!(null)]), None);
        assert_eq!(percentage(1, 3, 2), Some(33.33));
    }
}

use lazybeam::values::value_to_items;
use lazybeam::*;
use serde_json::json;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Values of every nested group, ignoring the keys kept inside each group.
fn groups<E: Enumerable>(collection: &E) -> Vec<Vec<Value>> {
    collection
        .to_list()
        .into_iter()
        .map(|group| value_to_items(group).into_values().collect())
        .collect()
}

fn numbers(n: i64) -> Collection {
    Collection::range(1, n)
}

#[test]
fn sliding_overlapping_windows() {
    let eager = numbers(5).sliding(3, 1);
    let lazy = LazyCollection::range(1, 5).sliding(3, 1);
    let expected = vec![
        vec![json!(1), json!(2), json!(3)],
        vec![json!(2), json!(3), json!(4)],
        vec![json!(3), json!(4), json!(5)],
    ];
    assert_eq!(groups(&eager), expected);
    assert_eq!(groups(&lazy), expected);
}

#[test]
fn sliding_drains_between_wide_steps() {
    let windows = LazyCollection::range(1, 6).sliding(2, 3);
    assert_eq!(groups(&windows), vec![vec![json!(1), json!(2)], vec![json!(4), json!(5)]]);
}

#[test]
fn sliding_keeps_original_keys_inside_windows() {
    let windows = numbers(3).sliding(2, 1);
    assert_eq!(windows.to_value(), json!([[1, 2], {"1": 2, "2": 3}]));
}

#[test]
fn sliding_with_zero_size_or_step_is_empty() {
    assert!(numbers(4).sliding(0, 1).is_empty());
    assert!(numbers(4).sliding(2, 0).is_empty());
}

#[test]
fn chunk_sizes_and_zero() {
    let sizes: Vec<usize> = groups(&numbers(5).chunk(2)).iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![2, 2, 1]);
    assert!(numbers(5).chunk(0).is_empty());
    assert!(LazyCollection::range(1, 5).chunk(0).is_empty());
}

#[test]
fn chunk_while_sees_the_chunk_so_far() {
    let runs = Collection::make(vec![1, 2, 4, 5, 6, 9]).lazy().chunk_while(|v, _, chunk| {
        let previous = chunk.last().and_then(|p| p.as_i64()).unwrap_or(i64::MIN);
        v.as_i64() == previous.checked_add(1)
    });
    assert_eq!(
        groups(&runs),
        vec![
            vec![json!(1), json!(2)],
            vec![json!(4), json!(5), json!(6)],
            vec![json!(9)],
        ]
    );
}

#[test]
fn split_balances_and_split_in_chunks() {
    assert_eq!(numbers(5).split(3).to_value(), json!([[1, 2], [3, 4], [5]]));
    assert_eq!(numbers(2).split(4).to_value(), json!([[1], [2]]));

    let split_in = LazyCollection::range(1, 5).split_in(3);
    assert_eq!(split_in.to_value(), json!([[1, 2], {"2": 3, "3": 4}, {"4": 5}]));
}

#[test]
fn split_keeps_string_keys_inside_groups() {
    let settings = Collection::make(json!({"host": "db", "port": 5432, "0": "primary"}));
    assert_eq!(
        settings.lazy().split(2).to_value(),
        json!([{"host": "db", "port": 5432}, ["primary"]])
    );
}

#[test]
fn zip_stops_at_the_shortest_input() {
    let zipped = numbers(3).zip([vec![4, 5]]);
    assert_eq!(zipped.to_value(), json!([[1, 4], [2, 5]]));

    let lazy = LazyCollection::range(1, i64::MAX).zip([Collection::make(vec!["a", "b"])]);
    assert_eq!(lazy.to_value(), json!([[1, "a"], [2, "b"]]));
}

#[test]
fn combine_truncates_and_warns_on_mismatch() {
    init_tracing();
    let keys = Collection::make(vec!["a", "b", "c"]);
    let combined = keys.combine(vec![1, 2]);
    assert_eq!(
        combined.to_pairs(),
        vec![(Key::from("a"), json!(1)), (Key::from("b"), json!(2))]
    );

    let lazy = keys.lazy().combine(vec![1, 2, 3, 4]);
    assert_eq!(lazy.count(), 3);
}

#[test]
fn nth_and_for_page() {
    let letters = Collection::make(vec!["a", "b", "c", "d", "e", "f"]);
    assert_eq!(letters.nth(2, 0).to_value(), json!(["a", "c", "e"]));
    assert_eq!(letters.nth(4, 1).to_value(), json!(["b", "f"]));
    assert!(letters.nth(0, 0).is_empty());
    assert_eq!(letters.for_page(2, 4).to_list(), vec![json!("e"), json!("f")]);
}

#[test]
fn negative_take_slice_and_pad_route_through_materialization() {
    let last_two = LazyCollection::range(1, 10).take(-2);
    assert_eq!(last_two.to_pairs(), vec![(Key::Int(8), json!(9)), (Key::Int(9), json!(10))]);

    assert_eq!(numbers(6).slice(2, Some(3)).to_list(), vec![json!(3), json!(4), json!(5)]);
    assert_eq!(LazyCollection::range(1, 6).slice(-3, Some(-1)).to_list(), vec![json!(4), json!(5)]);

    let two = Collection::make(vec![1, 2]);
    assert_eq!(two.pad(5, json!(0)).to_value(), json!([1, 2, 0, 0, 0]));
    assert_eq!(two.lazy().pad(-4, json!(0)).to_value(), json!([0, 0, 1, 2]));
    assert_eq!(two.pad(1, json!(0)).to_value(), json!([1, 2]));
}

#[test]
fn skip_and_take_predicates() {
    let values = numbers(6);
    assert_eq!(values.skip_while(Condition::test(|v, _| v.as_i64() < Some(3))).to_list().len(), 4);
    assert_eq!(values.skip_until(4).to_list(), vec![json!(4), json!(5), json!(6)]);
    assert_eq!(values.take_until(3).to_value(), json!([1, 2]));
    assert_eq!(values.take_while(Condition::test(|v, _| v.as_i64() != Some(2))).count(), 1);
}

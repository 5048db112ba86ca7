use lazybeam::*;
use serde_json::json;

#[test]
fn push_put_and_forget() {
    let mut settings = Collection::new();
    settings.push("first").put("mode", "dark").add("second");
    assert_eq!(
        settings.to_pairs(),
        vec![
            (Key::Int(0), json!("first")),
            (Key::from("mode"), json!("dark")),
            (Key::Int(1), json!("second")),
        ]
    );
    settings.forget([Key::Int(0), Key::from("mode")]);
    assert_eq!(settings.to_value(), json!({"1": "second"}));
    assert_eq!(settings.pull(1), Some(json!("second")));
    assert!(settings.is_empty());
}

#[test]
fn shift_pop_and_prepend() {
    let mut queue = Collection::make(vec![1, 2, 3, 4]);
    assert_eq!(queue.shift_many(2).to_value(), json!([1, 2]));
    assert_eq!(queue.to_value(), json!([3, 4]));
    queue.prepend(2);
    assert_eq!(queue.to_value(), json!([2, 3, 4]));
    assert_eq!(queue.pop(), Some(json!(4)));
    assert_eq!(queue.shift(), Some(json!(2)));
    assert_eq!(queue.to_value(), json!([3]));
    assert_eq!(Collection::new().shift(), None);
}

#[test]
fn transform_and_get_or_put() {
    let mut prices = Collection::make(json!({"tea": 2, "cake": 4}));
    prices.transform(|v, _| json!(v.as_i64().unwrap_or(0) * 100));
    assert_eq!(prices.get("cake"), Some(json!(400)));
    assert_eq!(prices.get_or_put("coffee", || json!(300)), json!(300));
    assert_eq!(prices.count(), 3);
}

#[test]
fn splice_with_negative_offset() {
    let mut letters = Collection::make(vec!["a", "b", "c", "d"]);
    let removed = letters.splice(-2, None, vec![json!("x"), json!("y"), json!("z")]);
    assert_eq!(removed.to_value(), json!(["c", "d"]));
    assert_eq!(letters.to_value(), json!(["a", "b", "x", "y", "z"]));
}

#[test]
fn lazy_views_are_unaffected_by_later_mutation() {
    let mut source = Collection::make(vec![1, 2]);
    let view = source.lazy().map(|v, _| v.clone());
    source.push(3);
    assert_eq!(view.count(), 2);
    assert_eq!(source.count(), 3);
}

#[test]
fn json_round_trip() -> anyhow::Result<()> {
    let keyed = Collection::make(json!({"b": 1, "a": [1, 2]}));
    assert_eq!(keyed.to_json()?, r#"{"b":1,"a":[1,2]}"#);
    let back: Collection = serde_json::from_str(&keyed.to_json()?)?;
    assert_eq!(back, keyed);

    let lazy = LazyCollection::range(1, 3);
    assert_eq!(serde_json::to_string(&lazy)?, "[1,2,3]");
    assert!(lazy.to_json_pretty()?.contains('\n'));
    Ok(())
}

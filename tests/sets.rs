use lazybeam::*;
use serde_json::json;

#[test]
fn diff_and_intersect_keep_keys() {
    let values = Collection::range(1, 5);
    assert_eq!(
        values.diff(vec![2, 4, 6]).to_pairs(),
        vec![(Key::Int(0), json!(1)), (Key::Int(2), json!(3)), (Key::Int(4), json!(5))]
    );
    assert_eq!(
        values.lazy().intersect(vec!["2", "4"]).to_pairs(),
        vec![(Key::Int(1), json!(2)), (Key::Int(3), json!(4))]
    );
}

#[test]
fn keyed_set_operations() {
    let left = Collection::make(json!({"a": 1, "b": 2, "c": 3}));
    let right = json!({"a": 1, "b": 20});
    assert_eq!(left.diff_keys(right.clone()).to_pairs(), vec![(Key::from("c"), json!(3))]);
    assert_eq!(
        left.diff_assoc(right.clone()).keys().to_list(),
        vec![json!("b"), json!("c")]
    );
    assert_eq!(left.intersect_assoc(right.clone()).to_value(), json!({"a": 1}));
    assert_eq!(left.intersect_by_keys(right).keys().to_list(), vec![json!("a"), json!("b")]);
}

#[test]
fn comparator_variants() {
    let words = Collection::make(vec!["Apple", "banana", "Cherry"]);
    let lower = |a: &Value, b: &Value| {
        let lower = |v: &Value| v.as_str().unwrap_or_default().to_lowercase();
        lower(a).cmp(&lower(b))
    };
    assert_eq!(words.diff_using(vec!["apple"], lower).to_list(), vec![json!("banana"), json!("Cherry")]);
    assert_eq!(words.intersect_using(vec!["CHERRY"], lower).to_list(), vec![json!("Cherry")]);
}

#[test]
fn merge_union_and_replace() {
    let base = Collection::make(json!({"id": 1, "name": "Ada"}));
    assert_eq!(
        base.merge(json!({"name": "Grace", "team": "core"})).to_value(),
        json!({"id": 1, "name": "Grace", "team": "core"})
    );
    assert_eq!(
        base.union(json!({"name": "Grace", "team": "core"})).to_value(),
        json!({"id": 1, "name": "Ada", "team": "core"})
    );
    assert_eq!(Collection::make(vec![1, 2]).merge(vec![3]).to_value(), json!([1, 2, 3]));

    let letters = Collection::make(vec!["a", "b", "c"]);
    assert_eq!(letters.replace(json!({"1": "B", "3": "d"})).to_value(), json!(["a", "B", "c", "d"]));
    assert_eq!(
        letters.lazy().replace(json!({"1": "B", "3": "d"})).to_value(),
        json!(["a", "B", "c", "d"])
    );
}

#[test]
fn recursive_merge_and_replace() {
    let config = Collection::make(json!({"db": {"host": "a", "port": 1}, "tags": ["x"]}));
    let replaced = config.replace_recursive(json!({"db": {"port": 2}}));
    assert_eq!(replaced.get("db"), Some(json!({"host": "a", "port": 2})));

    let merged = Collection::make(json!({"tag": "a"})).merge_recursive(json!({"tag": "b"}));
    assert_eq!(merged.get("tag"), Some(json!(["a", "b"])));
}

#[test]
fn duplicates_and_unique() {
    let letters = Collection::make(vec!["a", "b", "a", "c", "b"]);
    assert_eq!(
        letters.duplicates().to_pairs(),
        vec![(Key::Int(2), json!("a")), (Key::Int(4), json!("b"))]
    );

    let mixed = Collection::make(json!([1, "1", 2, 1]));
    assert_eq!(mixed.unique().to_pairs(), vec![(Key::Int(0), json!(1)), (Key::Int(2), json!(2))]);
    assert_eq!(mixed.lazy().unique_strict().count(), 3);
    assert_eq!(mixed.duplicates_strict().to_pairs(), vec![(Key::Int(3), json!(1))]);

    let people = Collection::make(json!([
        {"name": "Ada", "team": "core"},
        {"name": "Grace", "team": "tools"},
        {"name": "Linus", "team": "core"},
    ]));
    assert_eq!(people.unique_by("team", false).pluck("name").to_value(), json!(["Ada", "Grace"]));
    assert_eq!(people.duplicates_by("team", false).to_value(), json!({"2": "core"}));
}

#[test]
fn cross_join_builds_every_combination() {
    let joined = Collection::make(vec![1, 2]).cross_join([vec!["a", "b"]]);
    assert_eq!(joined.to_value(), json!([[1, "a"], [1, "b"], [2, "a"], [2, "b"]]));
}

#[test]
fn concat_only_and_except() {
    let values = Collection::make(json!({"a": 1, "b": 2, "c": 3}));
    assert_eq!(values.only(["a", "c"]).to_value(), json!({"a": 1, "c": 3}));
    assert_eq!(values.except(["a"]).keys().to_list(), vec![json!("b"), json!("c")]);
    assert_eq!(
        values.concat(vec![4]).to_pairs().last().cloned(),
        Some((Key::Int(0), json!(4)))
    );
    assert_eq!(Collection::make(vec![1, 2]).lazy().concat(vec![3]).to_value(), json!([1, 2, 3]));
}

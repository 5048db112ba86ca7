use lazybeam::testing::*;
use lazybeam::*;
use serde_json::json;

fn users() -> anyhow::Result<Collection> {
    fixture_collection(&sample_users())
}

#[test]
fn group_by_path() -> anyhow::Result<()> {
    let grouped = users()?.lazy().group_by("role", false);
    assert_eq!(
        grouped.keys().to_list(),
        vec![json!("admin"), json!("developer"), json!("designer")]
    );
    let developers = grouped.get("developer").and_then(|v| v.as_array().map(Vec::len));
    assert_eq!(developers, Some(3));
    Ok(())
}

#[test]
fn group_by_preserving_keys_and_nested() -> anyhow::Result<()> {
    let users = users()?;
    let grouped = users.group_by(Selector::func(|v, _| v["active"].clone()), true);
    assert_eq!(grouped.keys().to_list(), vec![json!(1), json!(0)]);
    assert_eq!(grouped.get(0), Some(json!({"2": users.get(2).unwrap_or_default()})));

    let nested = users.group_by_many(vec!["role".into(), "active".into()], false);
    let developers = Collection::wrap(nested.get("developer").unwrap_or_default());
    assert_eq!(developers.keys().to_list(), vec![json!(1), json!(0)]);
    Ok(())
}

#[test]
fn key_by_pluck_and_count_by() -> anyhow::Result<()> {
    let users = users()?;
    assert_eq!(users.key_by("id").keys().to_list(), (1..=5).map(|n| json!(n)).collect::<Vec<_>>());
    assert_eq!(
        users.pluck("name").take(2).to_value(),
        json!(["Ada", "Grace"])
    );
    assert_eq!(users.pluck_keyed("name", "id").get(4), Some(json!("Barbara")));
    assert_eq!(
        users.count_by("role").to_pairs(),
        vec![
            (Key::from("admin"), json!(1)),
            (Key::from("developer"), json!(3)),
            (Key::from("designer"), json!(1)),
        ]
    );
    Ok(())
}

#[test]
fn map_to_dictionary_collects_lists() -> anyhow::Result<()> {
    let by_role = users()?.map_to_dictionary(|v, _| {
        [(Key::from_value(&v["role"]), v["name"].clone())]
    });
    assert_eq!(by_role.get("developer"), Some(json!(["Grace", "Linus", "Ken"])));
    Ok(())
}

#[test]
fn partition_keeps_keys() {
    let (even, odd) = Collection::range(1, 5).partition(|v, _| v.as_i64().is_some_and(|n| n % 2 == 0));
    assert_eq!(even.to_pairs(), vec![(Key::Int(1), json!(2)), (Key::Int(3), json!(4))]);
    assert_eq!(odd.count(), 3);
}

#[test]
fn flatten_collapse_and_flat_map() {
    let nested = Collection::make(json!([1, [2, [3, [4]]]]));
    assert_eq!(nested.flatten(Some(1)).to_value(), json!([1, 2, [3, [4]]]));
    assert_eq!(nested.lazy().flatten(None).to_value(), json!([1, 2, 3, 4]));

    let lists = Collection::make(json!([[1, 2], [3], "skip"]));
    assert_eq!(lists.collapse().to_value(), json!([1, 2, 3]));

    let words = Collection::make(vec!["a b", "c"]);
    let split = words.flat_map(|v, _| json!(v.as_str().unwrap_or_default().split(' ').collect::<Vec<_>>()));
    assert_eq!(split.to_value(), json!(["a", "b", "c"]));
}

#[test]
fn map_with_keys_and_flip() {
    let users = Collection::make(json!([{"id": 7, "name": "Ada"}, {"id": 9, "name": "Ken"}]));
    let by_id = users.map_with_keys(|v, _| [(Key::from_value(&v["id"]), v["name"].clone())]);
    assert_eq!(by_id.to_pairs(), vec![(Key::Int(7), json!("Ada")), (Key::Int(9), json!("Ken"))]);
    assert_eq!(by_id.flip().get("Ada"), Some(json!(7)));
}

#[test]
fn dot_and_undot() {
    let nested = Collection::make(json!({"user": {"name": "Ada", "langs": ["en", "fr"]}}));
    let flat = nested.dot();
    assert_eq!(flat.get("user.name"), Some(json!("Ada")));
    assert_eq!(flat.get("user.langs.1"), Some(json!("fr")));
    assert_eq!(flat.lazy().undot().get("user"), nested.get("user"));
}

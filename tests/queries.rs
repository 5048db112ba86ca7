use lazybeam::testing::*;
use lazybeam::*;
use serde_json::json;

fn products() -> anyhow::Result<Collection> {
    fixture_collection(&sample_products())
}

fn names<E: Enumerable>(collection: &E) -> Vec<Value> {
    collection.pluck("name").to_list()
}

#[test]
fn where_operators() -> anyhow::Result<()> {
    let products = products()?;
    assert_eq!(names(&products.where_op("price", ">", 100)), vec![json!("Desk"), json!("Monitor")]);
    assert_eq!(names(&products.lazy().where_op("price", "<=", 35.5)), vec![json!("Lamp"), json!("Bulb")]);
    assert_eq!(products.where_op("category", "!=", "furniture").count(), 4);
    assert_eq!(products.where_eq("stock", "0").count(), 2);
    assert_eq!(products.where_strict("stock", 0).count(), 2);
    assert_eq!(products.where_strict("stock", "0").count(), 0);
    Ok(())
}

#[test]
fn where_membership_and_ranges() -> anyhow::Result<()> {
    let products = products()?;
    assert_eq!(products.where_in("category", ["lighting", "furniture"]).count(), 4);
    assert_eq!(products.lazy().where_not_in("category", ["lighting"]).count(), 4);
    assert_eq!(products.where_in_strict("stock", [json!("0")]).count(), 0);
    assert_eq!(products.where_not_in_strict("stock", [json!("0")]).count(), 6);
    assert_eq!(
        names(&products.where_between("price", 35, 100)),
        vec![json!("Chair"), json!("Lamp"), json!("Keyboard")]
    );
    assert_eq!(products.where_not_between("price", 35, 100).count(), 3);
    Ok(())
}

#[test]
fn truthiness_and_null_filters() -> anyhow::Result<()> {
    let users = fixture_collection(&sample_users())?;
    assert_eq!(users.where_null("manager_id").count(), 2);
    assert_eq!(users.where_not_null("manager_id").count(), 3);
    assert_eq!(users.where_truthy("active").count(), 4);

    let mixed = Collection::make(json!([0, 1, "", "a", null, [], [0]]));
    assert_eq!(mixed.filter_truthy().to_list(), vec![json!(1), json!("a"), json!([0])]);
    assert_eq!(mixed.reject(0).count(), 5);
    Ok(())
}

#[test]
fn first_last_and_sole() -> anyhow::Result<()> {
    let products = products()?;
    assert_eq!(
        products.first_where("price", "<", 10).map(|p| p["name"].clone()),
        Some(json!("Bulb"))
    );
    assert_eq!(
        products.last_by(|v, _| v["stock"] == json!(0)).map(|p| p["name"].clone()),
        Some(json!("Monitor"))
    );
    assert_eq!(products.sole_by(|v, _| v["name"] == "Lamp")?["price"], json!(35.5));
    assert!(matches!(
        products.sole_by(|v, _| v["category"] == "lighting"),
        Err(CollectionError::MultipleItemsFound(2))
    ));
    assert!(matches!(Collection::new().first_or_fail(), Err(CollectionError::ItemNotFound)));
    assert!(matches!(LazyCollection::range(1, 3).first_or_fail_by(|v, _| *v == json!(9)), Err(CollectionError::ItemNotFound)));
    Ok(())
}

#[test]
fn null_elements_are_not_absent() {
    let values = Collection::make(json!([null, 1]));
    assert_eq!(values.first(), Some(Value::Null));
    assert_eq!(Collection::make(json!([1, null])).lazy().last(), Some(Value::Null));
    assert_eq!(Collection::new().first(), None);
    assert_eq!(values.sole_by(|v, _| v.is_null()).ok(), Some(Value::Null));
}

#[test]
fn keys_search_and_value() {
    let settings = Collection::make(json!({"debug": false, "name": "app", "port": "8080"}));
    assert!(settings.has(["debug", "name"]));
    assert!(!settings.has(["debug", "missing"]));
    assert!(settings.has(Vec::<&str>::new()));
    assert!(settings.has_any(["missing", "port"]));
    assert!(!settings.has_any(Vec::<&str>::new()));

    assert_eq!(settings.search(8080), Some(Key::from("port")));
    assert_eq!(settings.search_strict(8080), None);
    assert_eq!(settings.get("name"), Some(json!("app")));

    let users = Collection::make(json!([{"email": null}, {"email": "a@b.c"}]));
    assert_eq!(users.value("email"), Some(json!("a@b.c")));
}

#[test]
fn path_selectors_with_defaults() {
    let orders = Collection::make(json!([
        {"id": 1, "price": {"net": 40}},
        {"id": 2},
        {"id": 3, "price": {"net": 15}},
    ]));
    assert_eq!(orders.pluck("price.net").to_value(), json!([40, null, 15]));
    assert_eq!(
        orders.lazy().pluck(Selector::path_or("price.net", 0)).to_value(),
        json!([40, 0, 15])
    );
    assert_eq!(orders.sum_by(Selector::path_or("price.net", 0)), json!(55));
    assert_eq!(
        orders.sort_by(Selector::path_or("price.net", 100)).pluck("id").to_list(),
        vec![json!(3), json!(1), json!(2)]
    );
}

#[test]
fn conditional_composition() {
    let values = Collection::range(1, 3);
    let doubled = values.when(true, |c| c.map(|v, _| json!(v.as_i64().unwrap_or(0) * 2)));
    assert_eq!(doubled.to_value(), json!([2, 4, 6]));
    assert_eq!(values.unless(true, |_| Collection::new()).count(), 3);
    assert_eq!(Collection::new().when_empty(|_| Collection::make(vec![0])).to_value(), json!([0]));
    assert_eq!(values.when_not_empty(|c| c.take(1)).count(), 1);
    assert_eq!(values.unless_empty(|c| c.take(2)).count(), 2);
    assert_eq!(values.when_else(false, |c| c.take(1), |c| c.skip(1)).to_value(), json!({"1": 2, "2": 3}));

    let piped: Vec<Box<dyn Fn(Collection) -> Collection>> =
        vec![Box::new(|c: Collection| c.reverse()), Box::new(|c: Collection| c.values())];
    assert_eq!(values.clone().pipe_through(piped).to_value(), json!([3, 2, 1]));
    assert_eq!(values.pipe(|c| c.count()), 3);
}

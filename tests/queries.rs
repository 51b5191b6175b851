mod support;

use commerce_mock_store::{
    Context, GetOptions, QueryParams, Resource, ResourceStore, StoreError, UpdateAction,
};
use serde_json::{json, Map, Value};
use support::{ctx, engine, ticket};

fn ids(results: &[Resource]) -> Vec<String> {
    results.iter().map(|r| r.id().to_string()).collect()
}

#[test]
fn where_returns_matching_subset_in_insertion_order() {
    let engine = engine();
    let tickets = engine.repository(ticket::TYPE_ID).unwrap();

    let mut open = Vec::new();
    for i in 0..6 {
        let status = if i % 2 == 0 { "Open" } else { "Closed" };
        let created = tickets
            .create(&ctx(), &json!({ "status": status, "title": format!("t{}", i) }))
            .unwrap();
        if status == "Open" {
            open.push(created.id().to_string());
        }
    }

    let page = tickets
        .query(&ctx(), &QueryParams::new().filter(r#"status = "Open""#))
        .unwrap();
    assert_eq!(ids(&page.results), open);
    assert_eq!(page.total, 3);
    assert_eq!(page.count, 3);
}

#[test]
fn dotted_paths_match_nested_form() {
    let engine = engine();
    let tickets = engine.repository(ticket::TYPE_ID).unwrap();
    for city in ["Berlin", "Paris", "Berlin"] {
        tickets
            .create(
                &ctx(),
                &json!({ "status": "Open", "details": { "location": { "city": city } } }),
            )
            .unwrap();
    }

    let dotted = tickets
        .query(&ctx(), &QueryParams::new().filter(r#"details.location.city = "Berlin""#))
        .unwrap();
    let nested = tickets
        .query(
            &ctx(),
            &QueryParams::new().filter(r#"details(location(city = "Berlin"))"#),
        )
        .unwrap();
    assert_eq!(dotted.total, 2);
    assert_eq!(ids(&dotted.results), ids(&nested.results));
}

#[test]
fn status_change_moves_record_out_of_query() {
    let engine = engine();
    let mut fields = Map::new();
    fields.insert("status".into(), json!("Open"));
    let stored = engine
        .store()
        .add(
            support::PROJECT,
            Resource::new(ticket::TYPE_ID, "o1", None, fields, chrono::Utc::now()),
        )
        .unwrap();

    let tickets = engine.repository(ticket::TYPE_ID).unwrap();
    let updated = tickets
        .process_update_actions(
            &ctx(),
            &stored,
            1,
            &[UpdateAction::new("changeStatus").with("status", "Complete")],
        )
        .unwrap();
    assert_eq!(updated.version(), 2);
    assert_eq!(updated.get_str("status"), Some("Complete"));

    let page = tickets
        .query(&ctx(), &QueryParams::new().filter(r#"status = "Open""#))
        .unwrap();
    assert!(page.results.is_empty());
}

#[test]
fn variables_and_multiple_clauses() {
    let engine = engine();
    let tickets = engine.repository(ticket::TYPE_ID).unwrap();
    tickets
        .create(&ctx(), &json!({ "status": "Open", "title": "a", "tags": ["x", "y"] }))
        .unwrap();
    let wanted = tickets
        .create(&ctx(), &json!({ "status": "Open", "title": "b", "tags": ["z"] }))
        .unwrap();
    tickets
        .create(&ctx(), &json!({ "status": "Closed", "title": "b", "tags": ["z"] }))
        .unwrap();

    let page = tickets
        .query(
            &ctx(),
            &QueryParams::new()
                .filter("status = :status")
                .filter("tags contains any (:tag)")
                .var("status", "Open")
                .var("tag", "z"),
        )
        .unwrap();
    assert_eq!(ids(&page.results), vec![wanted.id().to_string()]);
}

#[test]
fn paging_and_sorting() {
    let engine = engine();
    let tickets = engine.repository(ticket::TYPE_ID).unwrap();
    for title in ["c", "a", "e", "b", "d"] {
        tickets
            .create(&ctx(), &json!({ "status": "Open", "title": title }))
            .unwrap();
    }

    let page = tickets
        .query(
            &ctx(),
            &QueryParams::new().sort("title desc").offset(1).limit(2),
        )
        .unwrap();
    let titles: Vec<&str> = page.results.iter().filter_map(|r| r.get_str("title")).collect();
    assert_eq!(titles, vec!["d", "c"]);
    assert_eq!(page.total, 5);
    assert_eq!(page.count, 2);
    assert_eq!(page.offset, 1);
    assert_eq!(page.limit, 2);

    let beyond = tickets
        .query(&ctx(), &QueryParams::new().offset(10))
        .unwrap();
    assert!(beyond.results.is_empty());
    assert_eq!(beyond.total, 5);
}

#[test]
fn out_of_range_paging_is_rejected() {
    let engine = engine();
    let tickets = engine.repository(ticket::TYPE_ID).unwrap();
    let max = engine.config().max_limit;
    assert!(matches!(
        tickets.query(&ctx(), &QueryParams::new().limit(max + 1)),
        Err(StoreError::InvalidInput(_))
    ));
    assert!(matches!(
        tickets.query(&ctx(), &QueryParams::new().limit(0)),
        Err(StoreError::InvalidInput(_))
    ));
}

#[test]
fn malformed_predicate_is_an_invalid_query() {
    let engine = engine();
    let tickets = engine.repository(ticket::TYPE_ID).unwrap();
    let err = tickets
        .query(&ctx(), &QueryParams::new().filter(r#"status = "Open" and"#))
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidQuery(_)));
}

#[test]
fn projects_are_isolated() {
    let engine = engine();
    let tickets = engine.repository(ticket::TYPE_ID).unwrap();
    tickets.create(&ctx(), &json!({ "status": "Open" })).unwrap();

    let other = Context::new("other-project");
    let page = tickets.query(&other, &QueryParams::new()).unwrap();
    assert_eq!(page.total, 0);
}

#[test]
fn expand_fills_referenced_cart() {
    let engine = engine();
    let cart = engine
        .repository("cart")
        .unwrap()
        .create(&ctx(), &json!({ "key": "cart-1", "currency": "EUR", "lineItems": [{ "sku": "A" }] }))
        .unwrap();
    let orders = engine.repository("order").unwrap();
    let order = orders
        .create(&ctx(), &json!({ "cart": { "typeId": "cart", "key": "cart-1" } }))
        .unwrap();

    let plain = orders.get(&ctx(), order.id(), &GetOptions::default()).unwrap().unwrap();
    assert_eq!(plain.get("cart"), Some(&json!({ "typeId": "cart", "id": cart.id() })));

    let expanded = orders
        .get(&ctx(), order.id(), &GetOptions::expand("cart"))
        .unwrap()
        .unwrap();
    assert_eq!(
        expanded.get("cart").and_then(|c| c.get("obj")).and_then(|o| o.get("key")),
        Some(&Value::from("cart-1"))
    );

    let page = orders
        .query(&ctx(), &QueryParams::new().filter(r#"cart(id = :id)"#).var("id", cart.id()).expand("cart"))
        .unwrap();
    assert_eq!(page.total, 1);
    assert!(page.results[0].get("cart").unwrap().get("obj").is_some());
}

#[test]
fn dangling_expansion_is_left_alone_and_warned_once() {
    let engine = engine();
    let cart = engine
        .repository("cart")
        .unwrap()
        .create(&ctx(), &json!({ "currency": "EUR" }))
        .unwrap();
    let orders = engine.repository("order").unwrap();
    let order = orders
        .create(&ctx(), &json!({ "cart": { "typeId": "cart", "id": cart.id() } }))
        .unwrap();
    engine.store().delete(support::PROJECT, "cart", cart.id()).unwrap();

    for _ in 0..2 {
        let fetched = orders
            .get(&ctx(), order.id(), &GetOptions::expand("cart"))
            .unwrap()
            .unwrap();
        assert!(fetched.get("cart").unwrap().get("obj").is_none());
    }
    assert_eq!(engine.warnings().len(), 1);
}

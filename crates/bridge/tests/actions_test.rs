#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Action integration tests.
//!
//! Tests for request parsing, locale resolution and response mapping.

use serde_json::json;
use storefront_bridge::catalog::QuerySettings;
use storefront_bridge::{ActionRequest, ProductActions};
use storefront_test_utils::{
    FakeBackend, assert, test_category, test_inventory, test_product, test_request, test_schema,
};

fn actions(fake: FakeBackend) -> (std::sync::Arc<FakeBackend>, ProductActions) {
    let (fake, backends) = fake.into_backends();
    (fake, ProductActions::new(backends, QuerySettings::default(), "USD"))
}

// -------------------------------------------------------------------------
// Locale
// -------------------------------------------------------------------------

#[tokio::test]
async fn missing_locale_fails_before_backend_calls() {
    let (fake, actions) = actions(FakeBackend::new());
    let request = ActionRequest::default().with_query("query", json!("shoe"));

    for response in [
        actions.query(&request).await,
        actions.get_product(&request).await,
        actions.query_categories(&request).await,
        actions.searchable_attributes(&request).await,
    ] {
        assert_eq!(response.status_code, 400);
        assert::has_key(&assert::body(&response.body), "error");
    }
    assert_eq!(fake.call_count(), 0);
}

#[tokio::test]
async fn locale_from_query_parameter() {
    let (fake, actions) = actions(FakeBackend::new());
    let request = ActionRequest::default().with_query("locale", json!("de_DE@EUR"));

    let response = actions.query(&request).await;

    assert_eq!(response.status_code, 200);
    let args = &fake.searches()[0];
    assert_eq!(args.price_currency, "EUR");
    assert_eq!(args.price_country, "DE");
}

#[tokio::test]
async fn bare_language_locale_is_accepted() {
    let (fake, actions) = actions(FakeBackend::new());
    let request = ActionRequest::default().with_header("frontastic-locale", "en");

    let response = actions.query(&request).await;

    assert_eq!(response.status_code, 200);
    let args = &fake.searches()[0];
    assert_eq!(args.price_country, "US");
    assert_eq!(args.price_currency, "USD");
}

#[tokio::test]
async fn currency_header_applies() {
    let (fake, actions) = actions(FakeBackend::new());
    let request = test_request("en_US").with_header("Frontastic-Currency", "CAD");

    actions.query(&request).await;

    assert_eq!(fake.searches()[0].price_currency, "CAD");
}

// -------------------------------------------------------------------------
// Product actions
// -------------------------------------------------------------------------

#[tokio::test]
async fn query_returns_result_json() {
    let (fake, actions) = actions(FakeBackend::new()
        .with_products(vec![
            test_product("p1", "Trail Shoe").build(),
            test_product("p2", "Road Shoe").build(),
        ])
        .with_page(0, 5));
    let request = test_request("en_US")
        .with_query("query", json!("shoe"))
        .with_query("limit", json!("2"))
        .with_query("facets", json!({"variants.attributes.color": {"terms": ["red"]}}));

    let response = actions.query(&request).await;

    assert_eq!(response.status_code, 200);
    let body = assert::body(&response.body);
    assert_eq!(body["total"], 5);
    assert_eq!(body["count"], 2);
    assert_eq!(body["nextCursor"], "offset:2");
    assert::lacks_key(&body, "previousCursor");
    assert_eq!(body["query"]["query"], "shoe");
    assert_eq!(body["query"]["limit"], 2);
    assert_eq!(body["items"][0]["name"], "Trail Shoe");
    assert::has_key(&body, "facets");

    // No definition for the requested facet: not sent as a filter.
    assert_eq!(fake.searches()[0].filter, None);
}

#[tokio::test]
async fn query_with_category_slug() {
    let (fake, actions) = actions(FakeBackend::new()
        .with_categories(vec![test_category("c9", "boots").build()]));
    let request = test_request("en_US").with_query("categorySlug", json!("boots"));

    let response = actions.query(&request).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(
        fake.searches()[0].filter_query.as_deref().unwrap(),
        [r#"categories.id: subtree("c9")"#]
    );
}

#[tokio::test]
async fn get_product_by_sku() {
    let (fake, actions) = actions(FakeBackend::new()
        .with_products(vec![test_product("p1", "Runner").with_sku("RUN-1").build()]));
    let request = test_request("en_US").with_query("sku", json!("RUN-1"));

    let response = actions.get_product(&request).await;

    assert_eq!(response.status_code, 200);
    let body = assert::body(&response.body);
    assert_eq!(body["productId"], "p1");
    assert_eq!(body["_url"], "/runner/p/RUN-1");
    assert_eq!(
        fake.searches()[0].filter_query.as_deref().unwrap(),
        [r#"variants.sku:"RUN-1""#]
    );
}

#[tokio::test]
async fn get_product_not_found() {
    let (_, actions) = actions(FakeBackend::new());
    let request = test_request("en_US").with_query("id", json!("nope"));

    let response = actions.get_product(&request).await;

    assert_eq!(response.status_code, 404);
}

#[tokio::test]
async fn get_product_requires_id_or_sku() {
    let (fake, actions) = actions(FakeBackend::new());

    let response = actions.get_product(&test_request("en_US")).await;

    assert_eq!(response.status_code, 400);
    assert_eq!(fake.call_count(), 0);
}

#[tokio::test]
async fn get_inventory_by_sku() {
    let (_, actions) = actions(FakeBackend::new().with_inventory(vec![test_inventory("RUN-1", 4)]));
    let request = test_request("en_US").with_query("sku", json!("RUN-1"));

    let response = actions.get_inventory(&request).await;

    assert_eq!(response.status_code, 200);
    let body = assert::body(&response.body);
    assert_eq!(body["sku"], "RUN-1");
    assert_eq!(body["availableQuantity"], 4);
    assert_eq!(body["restockableInDays"], serde_json::Value::Null);
}

#[tokio::test]
async fn get_inventory_statuses() {
    let (fake, actions) = actions(FakeBackend::new());

    let missing_sku = actions.get_inventory(&test_request("en_US")).await;
    assert_eq!(missing_sku.status_code, 400);
    assert_eq!(fake.call_count(), 0);

    let request = test_request("en_US").with_query("sku", json!("NOPE"));
    let not_found = actions.get_inventory(&request).await;
    assert_eq!(not_found.status_code, 404);
}

#[tokio::test]
async fn backend_failure_is_server_error() {
    let (_, actions) = actions(FakeBackend::new().failing_search());

    let response = actions.query(&test_request("en_US")).await;

    assert_eq!(response.status_code, 500);
    let body = assert::body(&response.body);
    assert_eq!(body["error"], "query failed");
    assert::not_contains(&response.body, "unavailable");
}

// -------------------------------------------------------------------------
// Category and attribute actions
// -------------------------------------------------------------------------

#[tokio::test]
async fn categories_as_tree() {
    let (_, actions) = actions(FakeBackend::new().with_categories(vec![
        test_category("1", "root").build(),
        test_category("2", "child").with_parent("1").build(),
    ]));
    let request = test_request("en_US").with_query("format", json!("tree"));

    let response = actions.query_categories(&request).await;

    assert_eq!(response.status_code, 200);
    let body = assert::body(&response.body);
    assert_eq!(body["count"], 1);
    assert_eq!(body["items"][0]["subCategories"][0]["categoryId"], "2");
    assert_eq!(body["query"]["format"], "tree");
}

#[tokio::test]
async fn unknown_category_format_lists_flat() {
    let (_, actions) = actions(FakeBackend::new().with_categories(vec![
        test_category("1", "root").build(),
        test_category("2", "child").with_parent("1").build(),
    ]));
    let request = test_request("en_US").with_query("format", json!("graph"));

    let response = actions.query_categories(&request).await;

    assert_eq!(response.status_code, 200);
    let body = assert::body(&response.body);
    assert_eq!(body["count"], 2);
    assert_eq!(body["query"]["format"], "flat");
    assert::lacks_key(&body["items"][0], "subCategories");
}

#[tokio::test]
async fn searchable_attributes_action() {
    let (_, actions) = actions(FakeBackend::new()
        .with_schemas(vec![test_schema("size", "number", true)]));

    let response = actions.searchable_attributes(&test_request("en_US")).await;

    assert_eq!(response.status_code, 200);
    let body = assert::body(&response.body);
    assert_eq!(body[0]["field"], "variants.attributes.size");
    assert_eq!(body[0]["type"], "number");
    assert_eq!(body[1]["field"], "categoryId");
}

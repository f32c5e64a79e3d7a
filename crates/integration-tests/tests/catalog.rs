//! Catalog API end to end.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use reqwest::{StatusCode, header};
use serde_json::Value;

use heritage_integration_tests::{TestStorefront, product};

async fn seeded() -> TestStorefront {
    let sf = TestStorefront::start().await;
    sf.shop
        .add_product(product(1, "hebron-vase", "Hebron Glass Vase", "Glass", "palestinian"));
    sf.shop
        .add_product(product(2, "sadu-rug", "Sadu Rug", "Textiles", "saudi"));
    sf
}

async fn get_json(sf: &TestStorefront, path: &str) -> (StatusCode, Value) {
    let response = sf.client().get(sf.url(path)).send().await.unwrap();
    let status = response.status();
    (status, response.json().await.unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_listing_without_filters() {
    let sf = seeded().await;

    let (status, products) = get_json(&sf, "api/products").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(products.as_array().unwrap().len(), 2);
    assert_eq!(products[0]["handle"], "hebron-vase");
    assert_eq!(products[0]["minPrice"]["amount"], "10.0");

    let query = &sf.shop.product_queries()[0];
    assert_eq!(query["first"], 24);
    assert!(query["query"].is_null());
    assert_eq!(query["sortKey"], "CREATED_AT");
    assert_eq!(query["reverse"], true);
}

#[tokio::test]
async fn test_filters_become_a_search_query() {
    let sf = seeded().await;

    let (status, _) = get_json(
        &sf,
        "api/products?q=vase&heritage=palestinian,bogus&category=glass&min=5&max=50.00&sort=price-asc&first=500",
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let query = &sf.shop.product_queries()[0];
    assert_eq!(
        query["query"],
        r#"title:"vase" AND (tag:"heritage:palestinian") AND (product_type:"Glass") AND price:>=5 AND price:<=50"#
    );
    assert_eq!(query["sortKey"], "PRICE");
    assert_eq!(query["reverse"], false);
    assert_eq!(query["first"], 100);
}

#[tokio::test]
async fn test_repeated_listing_is_served_from_cache() {
    let sf = seeded().await;

    get_json(&sf, "api/products?sort=title-asc").await;
    get_json(&sf, "api/products?sort=title-asc").await;
    assert_eq!(sf.shop.calls("GetProducts"), 1);

    get_json(&sf, "api/products?sort=title-desc").await;
    assert_eq!(sf.shop.calls("GetProducts"), 2);
}

#[tokio::test]
async fn test_listing_degrades_to_empty() {
    let sf = seeded().await;
    sf.shop.fail("GetProducts");

    let (status, products) = get_json(&sf, "api/products").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(products, Value::Array(Vec::new()));
}

#[tokio::test]
async fn test_product_detail() {
    let sf = seeded().await;

    let response = sf
        .client()
        .get(sf.url("api/products/sadu-rug"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CACHE_CONTROL],
        "public, max-age=60"
    );
    let product: Value = response.json().await.unwrap();
    assert_eq!(product["title"], "Sadu Rug");
    assert_eq!(product["vendor"], "Heritage Makers");
    assert_eq!(product["variants"][0]["id"], "gid://shopify/ProductVariant/2");
    // No gallery: the featured image stands in.
    assert_eq!(product["images"][0]["url"], "https://cdn.example/sadu-rug.jpg");
}

#[tokio::test]
async fn test_missing_product_is_not_found() {
    let sf = seeded().await;

    let (status, body) = get_json(&sf, "api/products/no-such-thing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Product not found");

    sf.shop.fail("GetProductByHandle");
    let (status, _) = get_json(&sf, "api/products/hebron-vase").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_readiness_tracks_upstream() {
    let sf = seeded().await;

    let (status, _) = get_json(&sf, "health/ready").await;
    assert_eq!(status, StatusCode::OK);

    let sf = TestStorefront::start().await;
    sf.shop.fail("GetProducts");
    let response = sf.client().get(sf.url("health/ready")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

//! Integration tests for admin product management.
//!
//! The panel writes through the commerce API with the admin token; the
//! storefront then reads the same API.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use rigbay_integration_tests::{TEST_SECRET, spawn_admin, spawn_storefront};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn bearer() -> String {
    format!("Bearer {TEST_SECRET}")
}

async fn mount_lookups(api: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 3, "name": "Graphics Cards"}
        ])))
        .mount(api)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/brands"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 5, "name": "NVIDIA"}
        ])))
        .mount(api)
        .await;
}

fn created_product() -> serde_json::Value {
    json!({"product": {
        "id": 41, "name": "GeForce RTX 4070 Super",
        "description": "12GB GDDR6X",
        "category": {"id": 3, "name": "Graphics Cards"},
        "brand": {"id": 5, "name": "NVIDIA"},
        "variants": [{"id": 400, "sku": "GPU-4070S", "price": 189500, "stock": 6}]
    }})
}

#[tokio::test]
async fn test_admin_health_and_headers() {
    let api = MockServer::start().await;
    let admin = spawn_admin(&api.uri()).await.unwrap();

    let resp = admin.client.get(admin.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("x-frame-options").unwrap(), "DENY");
    assert_eq!(
        resp.headers().get("cache-control").unwrap(),
        "no-store, max-age=0"
    );
}

#[tokio::test]
async fn test_created_product_appears_on_storefront() {
    let api = MockServer::start().await;
    mount_lookups(&api).await;
    Mock::given(method("POST"))
        .and(path("/api/products"))
        .and(header("authorization", bearer().as_str()))
        .and(body_partial_json(json!({
            "name": "GeForce RTX 4070 Super",
            "categoryId": 3,
            "brandId": 5,
            "variants": [{"sku": "GPU-4070S", "stock": 6}]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(created_product()))
        .expect(1)
        .mount(&api)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/products/fast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [created_product()["product"].clone()]
        })))
        .mount(&api)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/products/41"))
        .respond_with(ResponseTemplate::new(200).set_body_json(created_product()))
        .mount(&api)
        .await;

    let admin = spawn_admin(&api.uri()).await.unwrap();

    let resp = admin.client.get(admin.url("/products/new")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = resp.text().await.unwrap();
    assert!(html.contains("Graphics Cards"));
    assert!(html.contains("NVIDIA"));

    let resp = admin
        .client
        .post(admin.url("/products"))
        .form(&[
            ("name", "GeForce RTX 4070 Super"),
            ("description", "12GB GDDR6X"),
            ("category_id", "3"),
            ("brand_id", "5"),
            ("sku", "GPU-4070S"),
            ("price", "189500"),
            ("stock", "6"),
            ("images", ""),
        ])
        .send()
        .await
        .unwrap();
    // Redirected to the listing, which shows the flash.
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.url().path(), "/products");
    let html = resp.text().await.unwrap();
    assert!(html.contains("GeForce RTX 4070 Super"));

    let store = spawn_storefront(&api.uri()).await.unwrap();
    let resp = store.client.get(store.url("/products/41")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = resp.text().await.unwrap();
    assert!(html.contains("GeForce RTX 4070 Super"));
    assert!(html.contains("Rs. 189,500.00"));
}

#[tokio::test]
async fn test_invalid_product_is_not_sent() {
    let api = MockServer::start().await;
    mount_lookups(&api).await;
    Mock::given(method("POST"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&api)
        .await;
    let admin = spawn_admin(&api.uri()).await.unwrap();

    let resp = admin
        .client
        .post(admin.url("/products"))
        .form(&[("name", ""), ("price", "-5"), ("stock", "two")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = resp.text().await.unwrap();
    assert!(html.contains("Name is required"));
    assert!(html.contains("Price cannot be negative"));
    assert!(html.contains("Stock must be a whole number"));
}

#[tokio::test]
async fn test_delete_product() {
    let api = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/products/41"))
        .and(header("authorization", bearer().as_str()))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&api)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/products/fast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&api)
        .await;
    let admin = spawn_admin(&api.uri()).await.unwrap();

    let resp = admin
        .client
        .post(admin.url("/products/41/delete"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.url().path(), "/products");
}

#[tokio::test]
async fn test_rejected_admin_token_is_a_gateway_error() {
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products/41"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&api)
        .await;
    let admin = spawn_admin(&api.uri()).await.unwrap();

    let resp = admin
        .client
        .get(admin.url("/products/41/edit"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
}

//! Integration tests for the PC Builder.
//!
//! Picks are kept in the visitor's session across requests; the JSON API is
//! stateless. Neither touches the commerce API.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use rigbay_integration_tests::spawn_storefront;
use serde_json::{Value, json};
use wiremock::MockServer;

#[tokio::test]
async fn test_picks_survive_across_requests() {
    let api = MockServer::start().await;
    let store = spawn_storefront(&api.uri()).await.unwrap();

    for (category, id) in [
        ("cpu", "cpu-r7-7800x3d"),
        ("motherboard", "mb-b650-tomahawk"),
        ("ram", "ram-ddr5-32-6000"),
    ] {
        let resp = store
            .client
            .post(store.url("/pc-builder/select"))
            .form(&[("category", category), ("component_id", id)])
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.url().path(), "/pc-builder");
    }

    let html = store
        .client
        .get(store.url("/pc-builder"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("Remove MAG B650 Tomahawk WiFi"));
    assert!(html.contains("Remove Vengeance 32GB DDR5-6000"));
    // Three of seven required slots.
    assert!(html.contains("data-progress=\"43\""));

    // Another visitor, with no session cookie, starts empty.
    let html = reqwest::get(store.url("/pc-builder"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(!html.contains("Remove MAG B650 Tomahawk WiFi"));
    assert!(html.contains("data-progress=\"0\""));
}

#[tokio::test]
async fn test_clear_empties_the_build() {
    let api = MockServer::start().await;
    let store = spawn_storefront(&api.uri()).await.unwrap();

    store
        .client
        .post(store.url("/pc-builder/select"))
        .form(&[("category", "gpu"), ("component_id", "gpu-rtx-4080s")])
        .send()
        .await
        .unwrap();
    let resp = store
        .client
        .post(store.url("/pc-builder/clear"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let html = store
        .client
        .get(store.url("/pc-builder"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(!html.contains("Remove GeForce RTX 4080 Super TUF"));
    assert!(html.contains("data-progress=\"0\""));
}

#[tokio::test]
async fn test_summary_api_scores_a_full_build() {
    let api = MockServer::start().await;
    let store = spawn_storefront(&api.uri()).await.unwrap();

    let resp = store
        .client
        .post(store.url("/api/pc-builder/summary"))
        .json(&json!({"selection": {
            "cpu": "cpu-r7-7800x3d",
            "motherboard": "mb-b650-tomahawk",
            "ram": "ram-ddr5-32-6000",
            "gpu": "gpu-rx-7800xt",
            "storage": "ssd-990-pro-1tb",
            "psu": "psu-focus-750",
            "case": "case-4000d"
        }}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["isComplete"], true);
    assert_eq!(body["isCompatible"], true);
    assert_eq!(body["progressPct"], 100.0);
    assert_eq!(body["powerDraw"], 416);
    assert_eq!(body["recommendedPsuWatts"], 500);
    assert!(body["warnings"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_summary_api_flags_psu_and_memory_issues() {
    let api = MockServer::start().await;
    let store = spawn_storefront(&api.uri()).await.unwrap();

    let resp = store
        .client
        .post(store.url("/api/pc-builder/summary"))
        .json(&json!({"selection": {
            "cpu": "cpu-i7-14700k",
            "motherboard": "mb-b760m-ddr4",
            "ram": "ram-ddr5-32-6000",
            "gpu": "gpu-rtx-4080s",
            "psu": "psu-cx550"
        }}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    let codes: Vec<&str> = body["warnings"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|w| w["code"].as_str())
        .collect();
    assert!(codes.contains(&"insufficient-psu"));
    assert!(codes.contains(&"memory-type-mismatch"));
    assert!(!codes.contains(&"socket-mismatch"));
    assert_eq!(body["isCompatible"], false);
}

#[tokio::test]
async fn test_components_api_rejects_unknown_category() {
    let api = MockServer::start().await;
    let store = spawn_storefront(&api.uri()).await.unwrap();

    let resp = store
        .client
        .get(store.url("/api/pc-builder/components?category=monitor"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

//! Tests against a running server (in-memory or Postgres backend)

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

async fn stats(client: &Client) -> Value {
    client
        .get(format!("{}/visitors/stats", BASE_URL))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_track_returning_visitor() {
    let client = Client::new();
    // Unique per run so the first visit is always new
    let ip = format!("192.0.2.{}", std::process::id() % 250);
    let before = stats(&client).await;

    let track = || {
        client
            .post(format!("{}/visitors/track", BASE_URL))
            .header("X-Forwarded-For", ip.as_str())
            .json(&json!({ "userAgent": "live-test" }))
            .send()
    };

    let first: Value = track().await.expect("Failed to send request").json().await.unwrap();
    let second: Value = track().await.expect("Failed to send request").json().await.unwrap();

    assert_eq!(second["isNewVisitor"], false);
    assert_eq!(
        second["totalVisitors"].as_i64().unwrap(),
        first["totalVisitors"].as_i64().unwrap() + 1
    );
    assert_eq!(second["uniqueVisitors"], first["uniqueVisitors"]);
    assert!(
        second["totalVisitors"].as_i64().unwrap() >= before["totalVisitors"].as_i64().unwrap() + 2
    );
}

#[tokio::test]
#[ignore]
async fn test_track_rejects_bad_email() {
    let client = Client::new();

    let response = client
        .post(format!("{}/visitors/track", BASE_URL))
        .header("X-Forwarded-For", "192.0.2.1")
        .json(&json!({ "email": "nope" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_visitor_list() {
    let client = Client::new();

    let response = client
        .get(format!("{}/visitors", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

use crate::common::{API_KEY, client, create_test_config, spawn_gateway};
use serde_json::{Value, json};
use std::sync::Arc;

fn standup() -> Value {
    json!({
        "group_id": "g1",
        "topic": "Standup",
        "start_time": "09:00",
        "duration": 15,
        "join_url": "https://x/y"
    })
}

#[tokio::test]
async fn test_publish_then_view() {
    let (port, _) = spawn_gateway(create_test_config()).await;
    let client = client();

    let resp = client
        .post(format!("http://127.0.0.1:{port}/?api_key={API_KEY}"))
        .json(&standup())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let receipt: Value = resp.json().await.unwrap();
    let token = receipt["token"].as_str().unwrap().to_string();
    assert_eq!(token.len(), 9);
    assert!(token.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));

    let resp = client
        .get(format!("http://127.0.0.1:{port}/?group_id=g1&token={token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers().get("cache-control").unwrap(),
        "s-maxage=60"
    );
    let html = resp.text().await.unwrap();
    assert!(html.contains("Standup"));
    assert!(html.contains("09:00"));
    assert!(html.contains("15"));
    assert!(html.contains("https://x/y"));
}

#[tokio::test]
async fn test_publish_wrong_key() {
    let (port, _) = spawn_gateway(create_test_config()).await;

    let resp = client()
        .post(format!("http://127.0.0.1:{port}/?api_key=wrong"))
        .json(&standup())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    assert_eq!(resp.text().await.unwrap(), "Unauthorized");
}

#[tokio::test]
async fn test_publish_missing_group_id() {
    let (port, _) = spawn_gateway(create_test_config()).await;

    let resp = client()
        .put(format!("http://127.0.0.1:{port}/?api_key={API_KEY}"))
        .json(&json!({"topic": "Standup"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(
        resp.text().await.unwrap(),
        "group_id is missing in the request body"
    );
}

#[tokio::test]
async fn test_publish_body_size_limit() {
    let mut config = (*create_test_config()).clone();
    config.max_body_size = 100;
    let (port, _) = spawn_gateway(Arc::new(config)).await;

    let mut body = standup();
    body["topic"] = json!("x".repeat(200));
    let resp = client()
        .post(format!("http://127.0.0.1:{port}/?api_key={API_KEY}"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 413);
}

#[tokio::test]
async fn test_unknown_session_falls_back() {
    let (port, _) = spawn_gateway(create_test_config()).await;

    let resp = client()
        .get(format!("http://127.0.0.1:{port}/?group_id=ghost&token=none"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.text().await.unwrap().contains("Welcome to TestApp"));
}

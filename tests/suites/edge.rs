use crate::common::{client, create_test_config, spawn_gateway};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

#[tokio::test]
async fn test_landing_page() {
    let (port, _) = spawn_gateway(create_test_config()).await;

    let resp = client()
        .get(format!("http://127.0.0.1:{port}/"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.headers().get("cache-control").is_none());
    assert!(
        resp.headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/html")
    );
}

#[tokio::test]
async fn test_security_headers() {
    let (port, _) = spawn_gateway(create_test_config()).await;

    let resp = client()
        .get(format!("http://127.0.0.1:{port}/"))
        .send()
        .await
        .unwrap();
    let headers = resp.headers();
    assert!(headers.get("strict-transport-security").is_some());
    assert!(headers.get("content-security-policy").is_some());
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert!(headers.get("server").is_none());
}

#[tokio::test]
async fn test_health_check() {
    let mut config = (*create_test_config()).clone();
    config.rate_limit_per_minute = 0;
    let (port, _) = spawn_gateway(Arc::new(config)).await;

    let resp = client()
        .get(format!("http://127.0.0.1:{port}/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_rate_limit_per_client_header() {
    let mut config = (*create_test_config()).clone();
    config.rate_limit_per_minute = 2;
    config.client_ip_header = Some("cf-connecting-ip".to_string());
    let (port, _) = spawn_gateway(Arc::new(config)).await;
    let client = client();

    let mut statuses = Vec::new();
    for _ in 0..5 {
        let resp = client
            .get(format!("http://127.0.0.1:{port}/"))
            .header("cf-connecting-ip", "198.51.100.9")
            .send()
            .await
            .unwrap();
        statuses.push(resp.status().as_u16());
    }
    assert_eq!(statuses[0], 200);
    assert!(statuses.contains(&429));

    let other = client
        .get(format!("http://127.0.0.1:{port}/"))
        .header("cf-connecting-ip", "198.51.100.10")
        .send()
        .await
        .unwrap();
    assert_eq!(other.status(), 200);
}

#[tokio::test]
async fn test_untrusted_header_does_not_split_buckets() {
    let mut config = (*create_test_config()).clone();
    config.rate_limit_per_minute = 2;
    let (port, _) = spawn_gateway(Arc::new(config)).await;
    let client = client();

    let mut statuses = Vec::new();
    for i in 0..5 {
        let resp = client
            .get(format!("http://127.0.0.1:{port}/"))
            .header("cf-connecting-ip", format!("203.0.113.{i}"))
            .send()
            .await
            .unwrap();
        statuses.push(resp.status().as_u16());
    }
    assert_eq!(statuses[0], 200);
    assert!(statuses.contains(&429));
}

#[tokio::test]
async fn test_rate_check_precedes_body_read() {
    let mut config = (*create_test_config()).clone();
    config.rate_limit_per_minute = 0;
    let (port, _) = spawn_gateway(Arc::new(config)).await;

    // Announce a large body and never send it; only a rate check made
    // before reading the body can answer.
    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    stream
        .write_all(
            b"POST /?api_key=secret HTTP/1.1\r\nHost: sessions.test\r\n\
              Content-Type: application/json\r\nContent-Length: 1000000\r\n\r\n{",
        )
        .await
        .unwrap();

    let mut buf = vec![0u8; 1024];
    let read = tokio::time::timeout(Duration::from_secs(5), stream.read(&mut buf))
        .await
        .expect("gateway waited for the body")
        .unwrap();
    let head = String::from_utf8_lossy(&buf[..read]);
    assert!(head.starts_with("HTTP/1.1 429"), "unexpected response: {head}");
}

#[tokio::test]
async fn test_rate_limited_body() {
    let mut config = (*create_test_config()).clone();
    config.rate_limit_per_minute = 0;
    let (port, _) = spawn_gateway(Arc::new(config)).await;

    let resp = client()
        .get(format!("http://127.0.0.1:{port}/"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 429);
    assert_eq!(resp.text().await.unwrap(), "Rate limit exceeded");
}

use meetgate::config::{Config, RateLimitFailureMode};
use meetgate::core::edge::{EdgeService, SessionRouter};
use meetgate::store::{KvStore, MemoryStore};
use pingora::proxy::http_proxy_service;
use pingora::server::Server;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

pub const API_KEY: &str = "secret";

pub fn create_test_config() -> Arc<Config> {
    Arc::new(Config {
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        api_key: API_KEY.to_string(),
        rate_limit_per_minute: 100,
        rate_limit_failure_mode: RateLimitFailureMode::Open,
        analytics_id: None,
        redis_url: None,
        session_key_prefix: "meeting".to_string(),
        client_ip_header: None,
        max_body_size: 1024,
        cache_max_entries: 100,
        app_name: "TestApp".to_string(),
        log_format: "pretty".to_string(),
    })
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

pub async fn spawn_gateway(config: Arc<Config>) -> (u16, std::thread::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let mut conf_clone = (*config).clone();
    conf_clone.listen_addr = format!("127.0.0.1:{port}").parse().unwrap();
    let config = Arc::new(conf_clone);

    let handle = std::thread::spawn(move || {
        let kv: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let router = Arc::new(SessionRouter::with_store(config.clone(), kv));
        let service = EdgeService::new(config.clone(), router);

        let server_conf = Arc::new(pingora::server::configuration::ServerConf::default());
        let mut service = http_proxy_service(&server_conf, service);
        service.add_tcp(&config.listen_addr.to_string());

        let mut server = Server::new(None).unwrap();
        server.bootstrap();
        server.add_service(service);
        server.run_forever();
    });

    tokio::time::sleep(Duration::from_secs(3)).await;
    (port, handle)
}

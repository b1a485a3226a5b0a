//! `meetgate` - Edge handler for short-lived meeting session records.
//!
//! Copyright (C) 2026 Maverick
//! SPDX-License-Identifier: AGPL-3.0-only
//!
//! Initializes the application runtime, loads configuration, sets up logging,
//! selects the key-value backend and launches the HTTP service.

use meetgate::{
    Config, EdgeService, KvStore, MemoryStore, RedisStore, SessionRouter, preload_templates,
};

use pingora::proxy::http_proxy_service;
use pingora::server::Server;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    dotenvy::dotenv().ok();

    let (non_blocking, _guard) = tracing_appender::non_blocking(std::io::stdout());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(non_blocking);

    if log_format.eq_ignore_ascii_case("pretty") {
        subscriber.init();
    } else {
        subscriber.json().init();
    }

    let config = Config::from_env();
    preload_templates();
    let store_kind = if config.redis_url.is_some() { "redis" } else { "memory" };
    info!(
        listen_addr = %config.listen_addr,
        rate_limit_per_minute = config.rate_limit_per_minute,
        rate_limit_failure_mode = ?config.rate_limit_failure_mode,
        store = store_kind,
        log_format = %config.log_format,
        "Server initialized"
    );

    // Redis connections are driven by this runtime; it must outlive the server.
    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    let kv: Arc<dyn KvStore> = match config.redis_url.as_deref() {
        Some(url) => match rt.block_on(RedisStore::connect(url)) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                error!(error = %e, "Failed to connect to Redis");
                std::process::exit(1);
            }
        },
        None => Arc::new(MemoryStore::new()),
    };

    let mut server = Server::new(None).expect("Failed to create Pingora server");
    server.bootstrap();

    let router = Arc::new(SessionRouter::with_store(config.clone(), kv));
    let service = EdgeService::new(config.clone(), router);

    let mut edge_service = http_proxy_service(&server.configuration, service);
    edge_service.add_tcp(&config.listen_addr.to_string());
    server.add_service(edge_service);

    server.run_forever();
}

//! Configuration settings.
//!
//! Defines the main `Config` struct and environment variable loading logic.

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

/// Behaviour of the rate limiter when the counter store cannot be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitFailureMode {
    /// Let the request through.
    Open,
    /// Reject the request with 429.
    Closed,
}

impl RateLimitFailureMode {
    fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "CLOSED" => Self::Closed,
            _ => Self::Open,
        }
    }
}

fn get_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} must be set in environment"))
}

fn get_env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn get_env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}

fn get_env_u32_or(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn get_env_usize_or(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Application configuration loaded from environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP service listens on.
    pub listen_addr: SocketAddr,
    /// Secret that write requests must present as the `api_key` query parameter.
    pub api_key: String,
    /// Requests allowed per client address per one-minute bucket.
    pub rate_limit_per_minute: u32,
    /// What the rate limiter does when its store fails.
    pub rate_limit_failure_mode: RateLimitFailureMode,
    /// Tag manager container id injected into rendered pages.
    pub analytics_id: Option<String>,
    /// Redis connection URL. The in-process store is used when unset.
    pub redis_url: Option<String>,
    /// Namespace prefix for session record keys.
    pub session_key_prefix: String,
    /// Header carrying the original client address, trusted only when set.
    ///
    /// Leave unset unless every request arrives through a proxy that
    /// overwrites this header; otherwise clients can choose their own key.
    pub client_ip_header: Option<String>,
    /// Maximum accepted request body in bytes.
    pub max_body_size: usize,
    /// Upper bound on entries held by the local edge cache.
    pub cache_max_entries: usize,
    /// Application name for page footer and title.
    pub app_name: String,
    /// Logging format: "json" or "pretty".
    pub log_format: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Panics
    ///
    /// Panics if `API_KEY` is missing or empty, or if `LISTEN_ADDR` is not a
    /// valid socket address.
    #[must_use]
    pub fn from_env() -> Arc<Self> {
        let listen_addr = get_env_or("LISTEN_ADDR", "0.0.0.0:8080")
            .parse()
            .expect("LISTEN_ADDR must be a valid socket address");
        let api_key = get_env("API_KEY");
        assert!(!api_key.is_empty(), "API_KEY must not be empty");

        Arc::new(Self {
            listen_addr,
            api_key,
            rate_limit_per_minute: get_env_u32_or("RATE_LIMIT_PER_MINUTE", 100),
            rate_limit_failure_mode: RateLimitFailureMode::from_str(&get_env_or(
                "RATE_LIMIT_FAILURE_MODE",
                "open",
            )),
            analytics_id: get_env_opt("ANALYTICS_ID"),
            redis_url: get_env_opt("REDIS_URL"),
            session_key_prefix: get_env_or("SESSION_KEY_PREFIX", "meeting"),
            client_ip_header: get_env_opt("CLIENT_IP_HEADER"),
            max_body_size: get_env_usize_or("MAX_BODY_SIZE", 64 * 1024),
            cache_max_entries: get_env_usize_or("CACHE_MAX_ENTRIES", 10_000),
            app_name: get_env_or("APP_NAME", "Meeting Information"),
            log_format: get_env_or("LOG_FORMAT", "json"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_failure_mode_parsing() {
        assert_eq!(
            RateLimitFailureMode::from_str("closed"),
            RateLimitFailureMode::Closed
        );
        assert_eq!(
            RateLimitFailureMode::from_str("CLOSED"),
            RateLimitFailureMode::Closed
        );
        assert_eq!(
            RateLimitFailureMode::from_str("open"),
            RateLimitFailureMode::Open
        );
        assert_eq!(
            RateLimitFailureMode::from_str("bogus"),
            RateLimitFailureMode::Open
        );
    }

    #[test]
    fn test_helpers_defaults() {
        let _guard = ENV_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        unsafe {
            env::remove_var("MEETGATE_TEST_MISSING");
        }
        assert_eq!(get_env_or("MEETGATE_TEST_MISSING", "default"), "default");
        assert_eq!(get_env_u32_or("MEETGATE_TEST_MISSING", 50), 50);
        assert_eq!(get_env_usize_or("MEETGATE_TEST_MISSING", 1), 1);
        assert!(get_env_opt("MEETGATE_TEST_MISSING").is_none());
    }

    #[test]
    fn test_env_opt_ignores_blank() {
        let _guard = ENV_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        unsafe {
            env::set_var("MEETGATE_TEST_BLANK", "   ");
        }
        assert!(get_env_opt("MEETGATE_TEST_BLANK").is_none());
        unsafe {
            env::remove_var("MEETGATE_TEST_BLANK");
        }
    }

    #[test]
    #[should_panic(expected = "MEETGATE_TEST_REQ must be set")]
    fn test_get_env_panic() {
        let _guard = ENV_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        unsafe {
            env::remove_var("MEETGATE_TEST_REQ");
        }
        get_env("MEETGATE_TEST_REQ");
    }

    #[test]
    fn test_config_from_env_defaults() {
        let _guard = ENV_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        unsafe {
            env::set_var("API_KEY", "secret");
            env::set_var("LISTEN_ADDR", "127.0.0.1:9090");
            env::remove_var("RATE_LIMIT_PER_MINUTE");
            env::remove_var("RATE_LIMIT_FAILURE_MODE");
            env::remove_var("SESSION_KEY_PREFIX");
            env::remove_var("REDIS_URL");
            env::remove_var("ANALYTICS_ID");
        }

        let config = Config::from_env();
        assert_eq!(config.listen_addr.port(), 9090);
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.rate_limit_per_minute, 100);
        assert_eq!(
            config.rate_limit_failure_mode,
            RateLimitFailureMode::Open
        );
        assert_eq!(config.session_key_prefix, "meeting");
        assert!(config.redis_url.is_none());
        assert!(config.analytics_id.is_none());
    }

    #[test]
    fn test_config_from_env_overrides() {
        let _guard = ENV_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        unsafe {
            env::set_var("API_KEY", "k");
            env::set_var("LISTEN_ADDR", "127.0.0.1:9091");
            env::set_var("RATE_LIMIT_PER_MINUTE", "5");
            env::set_var("RATE_LIMIT_FAILURE_MODE", "closed");
            env::set_var("ANALYTICS_ID", "GTM-TEST");
        }

        let config = Config::from_env();

        unsafe {
            env::remove_var("RATE_LIMIT_PER_MINUTE");
            env::remove_var("RATE_LIMIT_FAILURE_MODE");
            env::remove_var("ANALYTICS_ID");
        }

        assert_eq!(config.rate_limit_per_minute, 5);
        assert_eq!(
            config.rate_limit_failure_mode,
            RateLimitFailureMode::Closed
        );
        assert_eq!(config.analytics_id.as_deref(), Some("GTM-TEST"));
    }
}

//! Request dispatch.
//!
//! Every request is admitted by the rate limiter first, then goes to exactly
//! one of three paths: publish (write verb), view (`group_id` and `token`
//! query parameters), or the landing page. Each path ends in a single
//! response; nothing is retried here.

use crate::config::{Config, GateError, Result};
use crate::core::cache::{CACHE_TTL_SECS, EdgeCache, LocalEdgeCache, RequestIdentity};
use crate::core::edge::{EdgeRequest, EdgeResponse};
use crate::core::middleware::RateLimiter;
use crate::security::{RandomTokenGenerator, TokenGenerator};
use crate::store::{KvStore, MISSING_GROUP_ID, SessionRecord, SessionStore};
use crate::web::ui::{HtmlRenderer, Renderer};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const PUBLISH_MESSAGE: &str = "Session info updated successfully";

#[derive(Debug, PartialEq, Eq)]
enum Route<'a> {
    Publish,
    View { group_id: &'a str, token: &'a str },
    Landing,
}

impl<'a> Route<'a> {
    fn classify(request: &'a EdgeRequest) -> Self {
        if request.is_write() {
            return Self::Publish;
        }
        let group_id = request.query_param("group_id").filter(|v| !v.is_empty());
        let token = request.query_param("token").filter(|v| !v.is_empty());
        match (group_id, token) {
            (Some(group_id), Some(token)) => Self::View { group_id, token },
            _ => Self::Landing,
        }
    }
}

#[derive(Debug, Serialize)]
struct PublishReceipt<'a> {
    message: &'a str,
    token: &'a str,
}

/// Dispatches requests to the publish, view and landing paths.
pub struct SessionRouter {
    config: Arc<Config>,
    rate_limiter: RateLimiter,
    sessions: SessionStore,
    cache: Arc<dyn EdgeCache>,
    tokens: Arc<dyn TokenGenerator>,
    renderer: Arc<dyn Renderer>,
}

impl SessionRouter {
    /// Creates a new `SessionRouter` from explicit collaborators.
    #[must_use]
    pub fn new(
        config: Arc<Config>,
        rate_limiter: RateLimiter,
        sessions: SessionStore,
        cache: Arc<dyn EdgeCache>,
        tokens: Arc<dyn TokenGenerator>,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        Self {
            config,
            rate_limiter,
            sessions,
            cache,
            tokens,
            renderer,
        }
    }

    /// Wires the production collaborators around a shared `KvStore`.
    #[must_use]
    pub fn with_store(config: Arc<Config>, kv: Arc<dyn KvStore>) -> Self {
        let rate_limiter = RateLimiter::new(
            kv.clone(),
            config.rate_limit_per_minute,
            config.rate_limit_failure_mode,
        );
        let sessions = SessionStore::new(kv, config.session_key_prefix.clone());
        let cache = Arc::new(LocalEdgeCache::new(config.cache_max_entries));
        let renderer = Arc::new(HtmlRenderer::from_config(&config));

        Self::new(
            config,
            rate_limiter,
            sessions,
            cache,
            Arc::new(RandomTokenGenerator),
            renderer,
        )
    }

    /// Handles one request end to end.
    ///
    /// Must run inside a tokio runtime: view responses are cached from a
    /// spawned task.
    pub async fn handle(&self, request: &EdgeRequest) -> EdgeResponse {
        if let Some(rejection) = self.admit(&request.client_addr).await {
            return rejection;
        }
        self.dispatch(request).await
    }

    /// Charges one request to `client_addr`, returning the 429 response once
    /// the client is over its limit.
    ///
    /// Needs only the client address, so callers run it before reading a body.
    pub async fn admit(&self, client_addr: &str) -> Option<EdgeResponse> {
        if self.rate_limiter.allow(client_addr).await {
            return None;
        }
        warn!(client = %client_addr, action = "RATE_LIMIT", "Client rate limit exceeded");
        Some(EdgeResponse::from_error(&GateError::RateLimited {
            client: client_addr.to_string(),
        }))
    }

    /// Routes an admitted request to its path without charging the limiter.
    pub async fn dispatch(&self, request: &EdgeRequest) -> EdgeResponse {
        let outcome = match Route::classify(request) {
            Route::Publish => self.publish(request).await,
            Route::View { group_id, token } => self.view(request, group_id, token).await,
            Route::Landing => Ok(EdgeResponse::html(200, self.renderer.render_landing())),
        };

        outcome.unwrap_or_else(|e| {
            if e.status() >= 500 {
                warn!(error = %e, http_method = %request.method, "Request failed");
            } else {
                debug!(error = %e, http_method = %request.method, "Request rejected");
            }
            EdgeResponse::from_error(&e)
        })
    }

    async fn publish(&self, request: &EdgeRequest) -> Result<EdgeResponse> {
        if request.query_param("api_key") != Some(self.config.api_key.as_str()) {
            return Err(GateError::Unauthorized);
        }
        if request.body.len() > self.config.max_body_size {
            return Err(GateError::PayloadTooLarge {
                limit: self.config.max_body_size,
            });
        }

        let mut record = SessionRecord::from_json(&request.body)?;
        let group_id = record
            .group_id()
            .ok_or_else(|| GateError::Validation(MISSING_GROUP_ID.to_string()))?;

        let token = self.tokens.generate();
        record.set_token(&token);
        let key = self.sessions.key_for(&group_id, &token);
        self.sessions.put(&key, &record).await?;

        info!(group_id = %group_id, key = %key, "Session published");
        EdgeResponse::json(
            200,
            &PublishReceipt {
                message: PUBLISH_MESSAGE,
                token: &token,
            },
        )
    }

    async fn view(
        &self,
        request: &EdgeRequest,
        group_id: &str,
        token: &str,
    ) -> Result<EdgeResponse> {
        let identity = RequestIdentity::of(request);
        match self.cache.lookup(&identity).await {
            Ok(Some(cached)) => {
                debug!(identity = %identity.as_str(), "Edge cache hit");
                return Ok(cached);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Edge cache lookup failed, reading store"),
        }

        let key = self.sessions.key_for(group_id, token);
        let html = match self.sessions.get(&key).await? {
            Some(record) => self.renderer.render_session(&record),
            None => {
                info!(key = %key, "No session found for key");
                self.renderer.render_landing()
            }
        };
        let response = EdgeResponse::html(200, html)
            .with_header("Cache-Control", format!("s-maxage={CACHE_TTL_SECS}"));

        self.populate_cache(identity, response.clone());
        Ok(response)
    }

    fn populate_cache(&self, identity: RequestIdentity, response: EdgeResponse) {
        let cache = Arc::clone(&self.cache);
        tokio::spawn(async move {
            if let Err(e) = cache
                .store(identity, response, Duration::from_secs(CACHE_TTL_SECS))
                .await
            {
                warn!(error = %e, "Edge cache population failed");
            }
        });
    }
}

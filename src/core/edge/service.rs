//! Pingora service adapter.
//!
//! Every request is answered in `request_filter`; there is no upstream.

use crate::config::Config;
use crate::core::edge::headers::inject_security_headers;
use crate::core::edge::{EdgeRequest, EdgeResponse, SessionRouter, serve_response};
use async_trait::async_trait;
use bytes::BytesMut;
use pingora::http::ResponseHeader;
use pingora::proxy::{ProxyHttp, Session};
use pingora::upstreams::peer::HttpPeer;
use pingora::{Error, ErrorType, Result};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Picks the client address from a trusted forwarding header value, then the
/// socket peer, then the empty string.
fn resolve_client_addr(forwarded: Option<&str>, peer: Option<IpAddr>) -> String {
    if let Some(addr) = forwarded.map(str::trim).filter(|v| !v.is_empty()) {
        return addr.to_string();
    }
    peer.map(|ip| ip.to_string()).unwrap_or_default()
}

/// Context for a single request.
#[derive(Default)]
pub struct RequestCtx {
    pub client_addr: String,
    pub status: Option<u16>,
}

/// Main service implementing `ProxyHttp`.
pub struct EdgeService {
    config: Arc<Config>,
    router: Arc<SessionRouter>,
}

impl EdgeService {
    #[must_use]
    pub fn new(config: Arc<Config>, router: Arc<SessionRouter>) -> Self {
        Self { config, router }
    }

    fn is_loopback(session: &Session) -> bool {
        session.client_addr().is_some_and(|addr| {
            if let pingora::protocols::l4::socket::SocketAddr::Inet(inet) = addr {
                inet.ip().is_loopback()
            } else {
                false
            }
        })
    }

    /// Client address used as the rate-limit key.
    ///
    /// The forwarding header is consulted only when one is configured.
    fn extract_client_addr(&self, session: &Session) -> String {
        let forwarded = self.config.client_ip_header.as_deref().and_then(|name| {
            session
                .req_header()
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
        });
        let peer = match session.client_addr() {
            Some(pingora::protocols::l4::socket::SocketAddr::Inet(inet)) => Some(inet.ip()),
            _ => None,
        };
        resolve_client_addr(forwarded, peer)
    }

    fn request_url(session: &Session) -> String {
        let header = session.req_header();
        let host = header
            .headers
            .get("Host")
            .and_then(|v| v.to_str().ok())
            .or_else(|| header.uri.host())
            .unwrap_or_default();
        let path = header
            .uri
            .path_and_query()
            .map_or("/", |pq| pq.as_str());
        format!("{host}{path}")
    }

    /// Reads the request body, stopping once it exceeds the configured limit.
    ///
    /// An oversized body is returned as read so far; the router rejects it.
    async fn read_body(&self, session: &mut Session) -> Result<BytesMut> {
        let mut body = BytesMut::new();
        while let Some(chunk) = session.read_request_body().await? {
            body.extend_from_slice(&chunk);
            if body.len() > self.config.max_body_size {
                warn!(limit = self.config.max_body_size, "Request body over limit");
                break;
            }
        }
        Ok(body)
    }

    async fn serve_health(session: &mut Session) -> Result<bool> {
        let mut header = ResponseHeader::build(200, None)?;
        header.insert_header("Content-Type", "text/plain")?;
        header.insert_header("Content-Length", "2")?;
        header.insert_header("Cache-Control", "no-store")?;
        inject_security_headers(&mut header)?;
        session
            .write_response_header(Box::new(header), false)
            .await?;
        session
            .write_response_body(Some(bytes::Bytes::from_static(b"OK")), true)
            .await?;
        Ok(true)
    }
}

#[async_trait]
impl ProxyHttp for EdgeService {
    type CTX = RequestCtx;

    fn new_ctx(&self) -> Self::CTX {
        RequestCtx::default()
    }

    async fn request_filter(&self, session: &mut Session, ctx: &mut Self::CTX) -> Result<bool> {
        if session.req_header().uri.path() == "/health" && Self::is_loopback(session) {
            ctx.status = Some(200);
            return Self::serve_health(session).await;
        }

        ctx.client_addr = self.extract_client_addr(session);
        let method = session.req_header().method.clone();
        let url = Self::request_url(session);

        if let Some(rejection) = self.router.admit(&ctx.client_addr).await {
            ctx.status = Some(rejection.status);
            return serve_response(session, &rejection).await;
        }

        let mut request = EdgeRequest::new(method, url, ctx.client_addr.clone());
        if request.is_write() {
            request = request.with_body(self.read_body(session).await?.freeze());
        }

        let response: EdgeResponse = self.router.dispatch(&request).await;
        ctx.status = Some(response.status);
        serve_response(session, &response).await
    }

    async fn upstream_peer(
        &self,
        _session: &mut Session,
        _ctx: &mut Self::CTX,
    ) -> Result<Box<HttpPeer>> {
        Err(Error::explain(
            ErrorType::InternalError,
            "all responses are served at the edge",
        ))
    }

    async fn logging(&self, session: &mut Session, e: Option<&Error>, ctx: &mut Self::CTX) {
        let header = session.req_header();
        if let Some(err) = e {
            warn!(
                http_method = %header.method,
                http_path = %header.uri.path(),
                client = %ctx.client_addr,
                error = %err,
                "Request errored"
            );
            return;
        }
        debug!(
            http_method = %header.method,
            http_path = %header.uri.path(),
            client = %ctx.client_addr,
            status = ?ctx.status,
            "Request completed"
        );
    }
}

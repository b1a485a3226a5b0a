//! Inbound request model.
//!
//! A framework-neutral view of an HTTP request: method, host-qualified URL,
//! decoded query parameters, client address and the buffered body.

use bytes::Bytes;
use percent_encoding::percent_decode_str;
use pingora::http::Method;

#[derive(Debug, Clone)]
pub struct EdgeRequest {
    pub method: Method,
    /// Host plus path and query, e.g. `sessions.example.com/?group_id=g1&token=abc`.
    pub url: String,
    pub client_addr: String,
    pub body: Bytes,
    query: Vec<(String, String)>,
}

impl EdgeRequest {
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>, client_addr: impl Into<String>) -> Self {
        let url = url.into();
        let query = url
            .split_once('?')
            .map(|(_, q)| parse_query(q))
            .unwrap_or_default();
        Self {
            method,
            url,
            client_addr: client_addr.into(),
            body: Bytes::new(),
            query,
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// First value of query parameter `name`, percent-decoded.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Whether the method publishes a session.
    #[must_use]
    pub fn is_write(&self) -> bool {
        self.method == Method::POST || self.method == Method::PUT
    }
}

/// Parses an `application/x-www-form-urlencoded` query string.
///
/// `+` decodes to a space; a pair without `=` yields an empty value.
#[must_use]
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(k), decode_component(v))
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    percent_decode_str(&raw.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}

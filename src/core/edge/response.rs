//! HTTP response model and writer.
//!
//! `EdgeResponse` is what the router produces and the edge cache stores;
//! `serve_response` writes one to a pingora session.

use crate::config::{GateError, Result};
use crate::core::edge::headers::inject_security_headers;
use bytes::Bytes;
use pingora::http::ResponseHeader;
use pingora::proxy::Session;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl EdgeResponse {
    fn new(status: u16, content_type: &str, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), content_type.to_string())],
            body: body.into(),
        }
    }

    #[must_use]
    pub fn html(status: u16, html: String) -> Self {
        Self::new(status, "text/html; charset=utf-8", html)
    }

    #[must_use]
    pub fn text(status: u16, text: impl Into<String>) -> Self {
        Self::new(status, "text/plain; charset=utf-8", text.into())
    }

    /// Serializes `value` as the JSON body.
    ///
    /// # Errors
    ///
    /// Returns `GateError::Serialization` if `value` cannot be serialized.
    pub fn json<T: Serialize>(status: u16, value: &T) -> Result<Self> {
        let body = serde_json::to_vec(value)?;
        Ok(Self::new(status, "application/json", body))
    }

    /// Plain-text response carrying the error's status and public message.
    #[must_use]
    pub fn from_error(err: &GateError) -> Self {
        Self::text(err.status(), err.public_message())
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    /// First value of header `name`, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Writes `response` to the client with security headers applied.
///
/// # Errors
///
/// Returns an error if headers cannot be built or the response cannot be written.
pub async fn serve_response(
    session: &mut Session,
    response: &EdgeResponse,
) -> pingora::Result<bool> {
    let mut header = ResponseHeader::build(response.status, None)?;
    for (name, value) in &response.headers {
        header.insert_header(name.clone(), value.as_str())?;
    }
    header.insert_header("Content-Length", response.body.len().to_string())?;

    inject_security_headers(&mut header)?;

    session
        .write_response_header(Box::new(header), false)
        .await?;
    session
        .write_response_body(Some(response.body.clone()), true)
        .await?;
    Ok(true)
}

//! Network seam used by the action protocol.
//!
//! Implementations follow redirects themselves and report the final URL,
//! so a submit answered with a redirect can become a navigation.

use crate::errors::TransportError;
use async_trait::async_trait;
use http::StatusCode;
use url::Url;

#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, request: http::Request<String>) -> Result<FetchResponse, TransportError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    pub status: StatusCode,

    /// Final URL after any redirects
    pub url: Url,

    pub redirected: bool,

    pub body: String,
}

impl FetchResponse {
    pub fn ok(url: Url, body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            url,
            redirected: false,
            body: body.into(),
        }
    }

    pub fn json(url: Url, body: &serde_json::Value) -> Self {
        Self::ok(url, body.to_string())
    }

    pub fn status(url: Url, status: StatusCode) -> Self {
        Self {
            status,
            url,
            redirected: false,
            body: String::new(),
        }
    }

    /// Response that arrived at `url` after following a redirect
    pub fn redirected_to(url: Url, body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            url,
            redirected: true,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn parse_body(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Plain GET with no body
pub fn get(url: &Url) -> Result<http::Request<String>, http::Error> {
    http::Request::builder()
        .method(http::Method::GET)
        .uri(url.as_str())
        .body(String::new())
}

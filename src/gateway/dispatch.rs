//! Dispatch seam between the routing table and the identity server

use async_trait::async_trait;

use crate::http::headers::Headers;
use crate::http::request::{Method, Request};
use crate::http::response::Response;

/// A request rewritten to its internal target.
///
/// Method, headers and body are carried over from the inbound request
/// unchanged; only the request target differs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardRequest {
    pub method: Method,
    /// Internal path plus the original query string
    pub target: String,
    /// The public path the client called
    pub original_path: String,
    pub version: String,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl ForwardRequest {
    pub fn from_inbound(request: &Request, target: String) -> Self {
        Self {
            method: request.method,
            target,
            original_path: request.path().to_string(),
            version: request.version.clone(),
            headers: request.headers.clone(),
            body: request.body.clone(),
        }
    }
}

/// Executes a forward against the internal target.
///
/// Implementations must be safe to call concurrently and must not retry.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, request: ForwardRequest) -> anyhow::Result<Response>;
}

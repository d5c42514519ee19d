//! Forwarding gateway
//!
//! Maps the short public paths onto the identity server's endpoints and
//! dispatches the original request there. The client never sees a redirect:
//! it receives the identity server's response as the answer to its own call.

pub mod dispatch;
pub mod routes;
pub mod upstream;

use std::sync::Arc;

use crate::error::{GatewayError, Result};
use crate::http::request::Request;
use crate::http::response::{Response, ResponseBuilder, StatusCode};

pub use dispatch::{Dispatcher, ForwardRequest};
pub use routes::{ForwardRule, RoutingTable, TargetBase};
pub use upstream::UpstreamDispatcher;

/// Routing table plus the dispatcher that executes forwards.
///
/// Holds no mutable state, so one instance serves every connection.
pub struct Gateway {
    table: RoutingTable,
    dispatcher: Arc<dyn Dispatcher>,
}

impl Gateway {
    pub fn new(table: RoutingTable, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self { table, dispatcher }
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    /// Handles one inbound request, turning every error into a response.
    pub async fn handle(&self, request: &Request) -> Response {
        let rule = match self.table.resolve(request.method, request.path()) {
            Ok(rule) => rule,
            Err(GatewayError::MethodNotAllowed { method, path }) => {
                tracing::debug!(method = %method, path = %path, "Method not allowed");
                return Response::method_not_allowed();
            }
            Err(e) => {
                tracing::debug!(method = %request.method, path = %request.path(), error = %e, "No forward route");
                return Response::not_found();
            }
        };

        match self.forward(rule, request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(
                    method = %request.method,
                    path = %request.path(),
                    error = ?e,
                    "Forward failed"
                );
                error_response(&e)
            }
        }
    }

    /// Dispatches `request` to the internal target of `rule`.
    ///
    /// The target is the rule's base plus suffix, with the inbound query
    /// string re-attached. Failures are not retried.
    pub async fn forward(&self, rule: &ForwardRule, request: &Request) -> Result<Response> {
        let target = self.table.target_uri(rule, request.query())?;
        let forward = ForwardRequest::from_inbound(request, target);

        tracing::debug!(
            method = %forward.method,
            path = %forward.original_path,
            target = %forward.target,
            "Forwarding request"
        );

        self.dispatcher
            .dispatch(forward)
            .await
            .map_err(|source| GatewayError::ForwardFailure {
                method: request.method,
                path: request.path().to_string(),
                source,
            })
    }
}

/// Server error returned to the client for a failed forward.
///
/// Timeouts map to 504, other dispatch failures to 502, and anything else
/// (an unconfigured target) to 500.
pub fn error_response(error: &GatewayError) -> Response {
    let (status, body): (StatusCode, &[u8]) = match error {
        GatewayError::ForwardFailure { source, .. }
            if source
                .chain()
                .any(|e| e.is::<tokio::time::error::Elapsed>()) =>
        {
            (
                StatusCode::GatewayTimeout,
                &b"504 Gateway Timeout\r\n\r\nThe identity server did not respond in time."[..],
            )
        }
        GatewayError::ForwardFailure { .. } => (
            StatusCode::BadGateway,
            &b"502 Bad Gateway\r\n\r\nFailed to forward request to the identity server."[..],
        ),
        GatewayError::RouteNotFound { .. } => return Response::not_found(),
        GatewayError::MethodNotAllowed { .. } => return Response::method_not_allowed(),
        _ => return Response::internal_error(),
    };

    ResponseBuilder::new(status)
        .header("Content-Type", "text/plain")
        .body(body.to_vec())
        .build()
}

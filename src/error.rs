//! Error taxonomy for the gateway and the warm-up prober

use thiserror::Error;

use crate::http::request::Method;

pub type Result<T> = std::result::Result<T, GatewayError>;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Missing or malformed setting. The affected feature degrades instead of
    /// stopping the process.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Dispatch to the internal target failed. Never retried.
    #[error("error forwarding request {method} {path}")]
    ForwardFailure {
        method: Method,
        path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("no forward route for {path}")]
    RouteNotFound { path: String },

    #[error("{method} not allowed on {path}")]
    MethodNotAllowed { method: Method, path: String },

    /// Token exchange with the identity server failed.
    #[error(transparent)]
    Warmup(#[from] WarmupFailure),
}

/// Why a warm-up run ended in `Failed`.
#[derive(Debug, Error)]
pub enum WarmupFailure {
    #[error("token endpoint returned HTTP status {0}")]
    TokenStatus(u16),

    #[error("token request failed: {0}")]
    TokenTransport(#[source] reqwest::Error),

    #[error("token response carried no access_token: {0}")]
    MalformedToken(String),

    #[error("warm-up endpoint returned HTTP status {0}")]
    ProbeStatus(u16),

    #[error("warm-up request failed: {0}")]
    ProbeTransport(#[source] reqwest::Error),
}

impl WarmupFailure {
    /// HTTP status that caused the failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            WarmupFailure::TokenStatus(s) | WarmupFailure::ProbeStatus(s) => Some(*s),
            WarmupFailure::TokenTransport(e) | WarmupFailure::ProbeTransport(e) => {
                e.status().map(|s| s.as_u16())
            }
            WarmupFailure::MalformedToken(_) => None,
        }
    }
}

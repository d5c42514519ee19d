//! idp-gateway - customization layer in front of an identity server
//!
//! Forwards a small set of short public paths to the identity server's OIDC
//! endpoints and runs a one-shot warm-up probe once the listener is ready.

pub mod config;
pub mod error;
pub mod gateway;
pub mod host;
pub mod http;
pub mod server;
pub mod warmup;

//! HTTP/1.1 server side of the gateway.
//!
//! Just enough HTTP to accept requests on the short public paths and write
//! back whatever the identity server answered.
//!
//! - **`connection`**: per-client request/response state machine
//! - **`headers`**: ordered header lines with case-insensitive lookup
//! - **`parser`**: parses inbound requests from byte buffers
//! - **`request`**: request representation and header helpers
//! - **`response`**: response representation with builder pattern
//! - **`writer`**: serializes and writes responses to the client
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for incoming request data
//!        └──────┬──────┘
//!               │ Request received
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← Route and forward
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send response to client
//!        └──────┬───────────┘
//!               │ Response sent
//!               ├─ Keep-Alive → Reading (same connection)
//!               └─ Close → Closed
//! ```
//!
//! A malformed request is answered with 400 and the connection is closed.

pub mod headers;
pub mod request;
pub mod response;
pub mod parser;
pub mod connection;
pub mod writer;

//! Startup warm-up prober
//!
//! Runs at most once per process, after the listener is ready, purely to
//! force lazy initialization inside the identity server.

pub mod prober;
pub mod settings;

pub use prober::{on_ready, BearerToken, Prober, WarmupState};
pub use settings::{SkipReason, WarmupSettings, DISABLED_SENTINEL};

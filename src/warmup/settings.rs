//! Validation of the warm-up properties

use std::fmt;
use std::time::Duration;

use crate::config::WarmupConfig;

/// Placeholder value that switches the warm-up off (compared ignoring case).
pub const DISABLED_SENTINEL: &str = "REMOVED";

/// Warm-up settings that passed validation. Immutable once built.
#[derive(Clone)]
pub struct WarmupSettings {
    pub client_id: String,
    pub client_secret: String,
    pub token_path: String,
    pub warmup_path: String,
    pub delay: Duration,
    pub method: reqwest::Method,
}

impl fmt::Debug for WarmupSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WarmupSettings")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("token_path", &self.token_path)
            .field("warmup_path", &self.warmup_path)
            .field("delay", &self.delay)
            .field("method", &self.method)
            .finish()
    }
}

/// Why the warm-up is skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Missing(&'static str),
    Disabled(&'static str),
    InvalidMethod(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Missing(name) => write!(f, "property {} is not set", name),
            SkipReason::Disabled(name) => write!(f, "property {} is set to {}", name, DISABLED_SENTINEL),
            SkipReason::InvalidMethod(m) => write!(f, "invalid warm-up method {:?}", m),
        }
    }
}

impl WarmupSettings {
    /// Accepts the config only when every required property is non-blank and
    /// none of them holds the disabling sentinel.
    pub fn from_config(cfg: &WarmupConfig) -> Result<Self, SkipReason> {
        let required = [
            ("client_id", &cfg.client_id),
            ("client_secret", &cfg.client_secret),
            ("token_path", &cfg.token_path),
            ("warmup_path", &cfg.warmup_path),
        ];

        for (name, value) in required {
            let value = value.trim();
            if value.is_empty() {
                return Err(SkipReason::Missing(name));
            }
            if value.eq_ignore_ascii_case(DISABLED_SENTINEL) {
                return Err(SkipReason::Disabled(name));
            }
        }

        let method_name = match cfg.method.trim() {
            "" => "GET".to_string(),
            m => m.to_ascii_uppercase(),
        };
        let method = reqwest::Method::from_bytes(method_name.as_bytes())
            .map_err(|_| SkipReason::InvalidMethod(cfg.method.clone()))?;

        Ok(Self {
            client_id: cfg.client_id.trim().to_string(),
            client_secret: cfg.client_secret.trim().to_string(),
            token_path: cfg.token_path.trim().to_string(),
            warmup_path: cfg.warmup_path.trim().to_string(),
            delay: Duration::from_millis(cfg.delay_ms),
            method,
        })
    }
}

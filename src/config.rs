//! Gateway configuration
//!
//! Loaded once at startup from a YAML file and a couple of environment
//! overrides, then shared read-only (behind an `Arc`) with every component.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// Environment variable holding the path of the YAML configuration file.
pub const CONFIG_PATH_ENV: &str = "GATEWAY_CONFIG";

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "gateway.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub forward: ForwardConfig,
    pub warmup: WarmupConfig,
    pub admin_user: AdminUserConfig,
    pub password_hash: PasswordHashConfig,
    pub themes: ThemeConfig,
}

/// Listener and identity server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the gateway listens on (e.g., "127.0.0.1:8080")
    pub listen_addr: String,

    /// Base URL of the identity server that forwards are dispatched to
    pub upstream_url: String,

    /// Root context path of the gateway itself
    pub root_context_path: String,

    /// Context path the identity server is mounted under (e.g., "/auth")
    pub context_path: String,

    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            upstream_url: "http://127.0.0.1:8081".to_string(),
            root_context_path: String::new(),
            context_path: "/auth".to_string(),
            connect_timeout_secs: 5,
            request_timeout_secs: 30,
        }
    }
}

/// Internal targets for the short public paths.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ForwardConfig {
    /// Target of `GET /login`
    pub account_service: String,

    /// Base of every `/oidc/*` target
    pub token_service: String,
}

/// Settings for the post-startup warm-up probe.
///
/// `delay_ms` is in milliseconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WarmupConfig {
    pub client_id: String,
    pub client_secret: String,
    pub token_path: String,
    pub warmup_path: String,
    pub delay_ms: u64,
    pub method: String,
}

impl Default for WarmupConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            token_path: String::new(),
            warmup_path: String::new(),
            delay_ms: 0,
            method: "GET".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdminUserConfig {
    pub username: String,
    pub password: String,
}

/// Cost factor for the alternate password hash provider.
///
/// Kept as a signed integer so out-of-range values survive deserialization
/// and can be reported instead of rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PasswordHashConfig {
    pub log_rounds: Option<i64>,
}

/// Theme names per UI area. Blank entries defer to the realm.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub welcome: String,
    pub login: String,
    pub account: String,
    pub email: String,
    pub admin: String,
    pub default: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            welcome: String::new(),
            login: String::new(),
            account: String::new(),
            email: String::new(),
            admin: String::new(),
            default: "keycloak".to_string(),
        }
    }
}

impl Config {
    /// Loads the configuration from `GATEWAY_CONFIG` (or `gateway.yaml`),
    /// then applies environment overrides.
    ///
    /// A missing file is not an error: defaults are used instead.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut cfg = if path.exists() {
            Self::from_file(&path)?
        } else {
            tracing::info!(path = %path.display(), "No configuration file found, using defaults");
            Self::default()
        };

        cfg.apply_env_overrides();
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        tracing::info!(path = %path.display(), "Loading configuration");
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml_str(&raw).with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    pub fn from_yaml_str(raw: &str) -> anyhow::Result<Self> {
        // An empty document deserializes to unit, not to an empty mapping.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("LISTEN") {
            self.server.listen_addr = addr;
        }
        if let Ok(upstream) = std::env::var("GATEWAY_UPSTREAM") {
            self.server.upstream_url = upstream;
        }
    }
}

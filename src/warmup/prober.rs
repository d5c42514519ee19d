//! One-shot warm-up probe against the freshly started identity server
//!
//! Exchanges client credentials for a bearer token and calls one protected
//! endpoint with it. The outcome is only logged; nothing waits for it.

use std::fmt;
use std::time::{Duration, Instant};

use reqwest::header::ACCEPT;
use serde::Deserialize;
use tokio::task::JoinHandle;

use crate::config::WarmupConfig;
use crate::error::WarmupFailure;
use crate::warmup::settings::{SkipReason, WarmupSettings};

/// Life cycle of a warm-up run. `Skipped`, `Failed` and `Completed` are
/// terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarmupState {
    Idle,
    Skipped(SkipReason),
    Running,
    TokenAcquired,
    Failed,
    Completed,
}

impl WarmupState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WarmupState::Skipped(_) | WarmupState::Failed | WarmupState::Completed
        )
    }
}

/// Access token from the token endpoint. Used for a single run only.
pub struct BearerToken(String);

impl BearerToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

pub struct Prober {
    settings: WarmupSettings,
    base_url: String,
    client: reqwest::Client,
}

impl Prober {
    /// `base_url` is the scheme and authority of the identity server,
    /// e.g. "http://localhost:8080".
    pub fn new(settings: WarmupSettings, base_url: impl Into<String>) -> Self {
        Self {
            settings,
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Waits for the configured delay, then runs the probe to a terminal state.
    pub async fn run(&self) -> WarmupState {
        if !self.settings.delay.is_zero() {
            tokio::time::sleep(self.settings.delay).await;
        }

        tracing::info!(
            delay_secs = %format_secs(self.settings.delay),
            "Warm-up request triggered after startup"
        );

        self.run_now().await
    }

    /// Runs the probe immediately: `Running` → `TokenAcquired` → `Completed`,
    /// or `Failed` at the first unsuccessful call.
    pub async fn run_now(&self) -> WarmupState {
        let mut state = WarmupState::Running;
        let started = Instant::now();

        let (token, token_status) = match self.fetch_token().await {
            Ok(grant) => grant,
            Err(e) => {
                tracing::error!(
                    elapsed_secs = %format_secs(started.elapsed()),
                    status = ?e.status(),
                    error = %e,
                    "Could not obtain token for warm-up"
                );
                return transition(state, WarmupState::Failed);
            }
        };

        tracing::info!(
            elapsed_secs = %format_secs(started.elapsed()),
            status = token_status,
            "Token for warm-up request retrieved"
        );
        state = transition(state, WarmupState::TokenAcquired);

        match self.probe(&token).await {
            Ok(status) => {
                tracing::info!(
                    elapsed_secs = %format_secs(started.elapsed()),
                    status,
                    "Warm-up completed"
                );
                transition(state, WarmupState::Completed)
            }
            Err(e) => {
                tracing::error!(
                    elapsed_secs = %format_secs(started.elapsed()),
                    status = ?e.status(),
                    error = %e,
                    "Warm-up request failed, the service is probably not warmed up"
                );
                transition(state, WarmupState::Failed)
            }
        }
    }

    /// Client-credentials grant against the token endpoint.
    ///
    /// Returns the token together with the HTTP status the endpoint answered.
    pub async fn fetch_token(&self) -> Result<(BearerToken, u16), WarmupFailure> {
        let response = self
            .client
            .post(self.url(&self.settings.token_path))
            .form(&[
                ("client_id", self.settings.client_id.as_str()),
                ("client_secret", self.settings.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await
            .map_err(WarmupFailure::TokenTransport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(WarmupFailure::TokenStatus(status.as_u16()));
        }

        let body = response.text().await.map_err(WarmupFailure::TokenTransport)?;
        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| WarmupFailure::MalformedToken(e.to_string()))?;

        if parsed.access_token.is_empty() {
            return Err(WarmupFailure::MalformedToken("empty access_token".into()));
        }

        Ok((BearerToken(parsed.access_token), status.as_u16()))
    }

    /// Authenticated call to the warm-up endpoint; returns its status.
    pub async fn probe(&self, token: &BearerToken) -> Result<u16, WarmupFailure> {
        let response = self
            .client
            .request(self.settings.method.clone(), self.url(&self.settings.warmup_path))
            .bearer_auth(token.as_str())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(WarmupFailure::ProbeTransport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(WarmupFailure::ProbeStatus(status.as_u16()));
        }

        Ok(status.as_u16())
    }
}

/// Readiness hook. Validates the warm-up properties and, when they are
/// usable, spawns the prober onto the runtime without waiting for it.
///
/// Returns `Skipped` or `Running` together with the task handle, which the
/// caller is free to drop.
pub fn on_ready(config: &WarmupConfig, base_url: &str) -> (WarmupState, Option<JoinHandle<WarmupState>>) {
    let state = WarmupState::Idle;

    let settings = match WarmupSettings::from_config(config) {
        Ok(settings) => settings,
        Err(reason) => {
            tracing::info!(reason = %reason, "Skipping warm-up because not all necessary properties have been set");
            return (transition(state, WarmupState::Skipped(reason)), None);
        }
    };

    let prober = Prober::new(settings, base_url);
    let handle = tokio::spawn(async move { prober.run().await });

    (transition(state, WarmupState::Running), Some(handle))
}

fn transition(from: WarmupState, to: WarmupState) -> WarmupState {
    tracing::debug!(from = ?from, to = ?to, "Warm-up state change");
    to
}

fn format_secs(duration: Duration) -> String {
    format!("{:.3}", duration.as_secs_f64())
}

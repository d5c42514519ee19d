//! Cost factor for the BCrypt password hash provider
//!
//! The hashing itself happens inside the identity server; this only decides
//! which log-rounds value it is handed.

use crate::config::PasswordHashConfig;
use crate::error::GatewayError;

pub const PROVIDER_ID: &str = "BCrypt";

pub const DEFAULT_LOG_ROUNDS: u32 = 13;
pub const MIN_LOG_ROUNDS: u32 = 4;
pub const MAX_LOG_ROUNDS: u32 = 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashProviderSettings {
    pub provider_id: &'static str,
    pub log_rounds: u32,
}

impl Default for HashProviderSettings {
    fn default() -> Self {
        Self {
            provider_id: PROVIDER_ID,
            log_rounds: DEFAULT_LOG_ROUNDS,
        }
    }
}

impl HashProviderSettings {
    /// Uses the configured log rounds when they fall in
    /// `MIN_LOG_ROUNDS..=MAX_LOG_ROUNDS`; anything else is reported and
    /// replaced by the default.
    pub fn from_config(cfg: &PasswordHashConfig) -> Self {
        match cfg.log_rounds.map(validate_log_rounds) {
            None => Self::default(),
            Some(Ok(log_rounds)) => Self {
                log_rounds,
                ..Self::default()
            },
            Some(Err(e)) => {
                tracing::error!(error = %e, default = DEFAULT_LOG_ROUNDS, "Ignoring password hash cost factor");
                Self::default()
            }
        }
    }
}

pub fn validate_log_rounds(value: i64) -> Result<u32, GatewayError> {
    u32::try_from(value)
        .ok()
        .filter(|v| (MIN_LOG_ROUNDS..=MAX_LOG_ROUNDS).contains(v))
        .ok_or_else(|| {
            GatewayError::Configuration(format!(
                "log rounds {} outside {}..={}",
                value, MIN_LOG_ROUNDS, MAX_LOG_ROUNDS
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_uses_default() {
        let settings = HashProviderSettings::from_config(&PasswordHashConfig { log_rounds: None });
        assert_eq!(settings.log_rounds, DEFAULT_LOG_ROUNDS);
        assert_eq!(settings.provider_id, "BCrypt");
    }

    #[test]
    fn bounds_are_inclusive() {
        assert_eq!(validate_log_rounds(4).unwrap(), 4);
        assert_eq!(validate_log_rounds(31).unwrap(), 31);
        assert!(validate_log_rounds(3).is_err());
        assert!(validate_log_rounds(32).is_err());
        assert!(validate_log_rounds(-1).is_err());
    }

    #[test]
    fn out_of_range_falls_back() {
        let settings = HashProviderSettings::from_config(&PasswordHashConfig { log_rounds: Some(40) });
        assert_eq!(settings.log_rounds, DEFAULT_LOG_ROUNDS);

        let settings = HashProviderSettings::from_config(&PasswordHashConfig { log_rounds: Some(10) });
        assert_eq!(settings.log_rounds, 10);
    }
}

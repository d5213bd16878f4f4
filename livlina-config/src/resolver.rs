//! Reverse geocoding configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct ResolverConfig {
    /// When off, coordinates always fall back to manual address entry.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Base URL of the Nominatim-compatible service.
    #[validate(url)]
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Upper bound on one lookup (milliseconds).
    #[validate(range(min = 100, max = 30_000))]
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// User-Agent sent with lookups; public instances require one.
    #[validate(custom(function = validation::validate_not_blank))]
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_true() -> bool {
    true
}
fn default_endpoint() -> String {
    "https://nominatim.openstreetmap.org".into()
}
fn default_timeout_ms() -> u64 {
    5000
}
fn default_user_agent() -> String {
    concat!("livlina/", env!("CARGO_PKG_VERSION")).into()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            endpoint: default_endpoint(),
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl ResolverConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_bounds() {
        let mut config = ResolverConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(5));
        config.timeout_ms = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn endpoint_must_be_url() {
        let config = ResolverConfig {
            endpoint: "nominatim".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}

//! # Livlina Configuration System
//!
//! Hierarchical configuration for the emergency intake service.
//!
//! ## Features
//! - **Unified Configuration**: One document covering channel, resolver,
//!   intake limits and telemetry
//! - **Validation**: Every section is checked with `validator` after loading
//! - **Environment Awareness**: Per-environment overrides and `LIVLINA_*`
//!   variables, plus the legacy `TELEGRAM_BOT_TOKEN` / `ADMIN_CHAT_ID` names

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod channel;
mod error;
mod intake;
mod resolver;
mod telemetry;
mod validation;

pub use channel::{ChannelConfig, Credentials};
pub use error::ConfigError;
pub use intake::{EtaWindow, IntakeConfig};
pub use resolver::ResolverConfig;
pub use telemetry::TelemetryConfig;

pub const BASE_CONFIG_FILE: &str = "config/livlina.yaml";

/// Top‑level configuration container for all Livlina components.
#[derive(Debug, Serialize, Deserialize, Validate, Default, Clone)]
pub struct LivlinaConfig {
    /// Notification channel to the monitoring party.
    #[validate(nested)]
    #[serde(default)]
    pub channel: ChannelConfig,

    /// Reverse geocoding.
    #[validate(nested)]
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Intake limits and response status.
    #[validate(nested)]
    #[serde(default)]
    pub intake: IntakeConfig,

    /// Logging and metrics.
    #[validate(nested)]
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl LivlinaConfig {
    /// Load configuration from default files and environment.
    ///
    /// Hierarchy:
    /// 1. Default Values
    /// 2. `config/livlina.yaml` - Base settings. If missing, defaults are used.
    /// 3. `config/<environment>.yaml` - Environment‑specific overrides
    ///    (`LIVLINA_ENV`, default `production`).
    /// 4. `LIVLINA_*` environment variables, `__` separating sections.
    /// 5. `TELEGRAM_BOT_TOKEN` / `ADMIN_CHAT_ID`.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(LivlinaConfig::default()));

        if Path::new(BASE_CONFIG_FILE).exists() {
            figment = figment.merge(Yaml::file(BASE_CONFIG_FILE));
        }

        let env = std::env::var("LIVLINA_ENV").unwrap_or_else(|_| "production".into());
        let env_file = format!("config/{}.yaml", env);
        if Path::new(&env_file).exists() {
            figment = figment.merge(Yaml::file(env_file));
        }

        Self::finish(figment)
    }

    /// Load configuration from a specific path (plus environment overrides).
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(path)));
        }

        let figment = Figment::from(Serialized::defaults(LivlinaConfig::default()))
            .merge(Yaml::file(path));
        Self::finish(figment)
    }

    fn finish(figment: Figment) -> Result<Self, ConfigError> {
        figment
            .merge(Env::prefixed("LIVLINA_").split("__"))
            .merge(legacy_env())
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }

    /// Effective configuration as YAML with secrets masked.
    pub fn to_redacted_yaml(&self) -> Result<String, ConfigError> {
        let redacted = Self {
            channel: self.channel.redacted(),
            ..self.clone()
        };
        Ok(serde_yaml::to_string(&redacted)?)
    }
}

/// Variable names used by earlier deployments.
fn legacy_env() -> Env {
    Env::raw()
        .only(&["TELEGRAM_BOT_TOKEN", "ADMIN_CHAT_ID"])
        .map(|key| {
            if key.as_str().eq_ignore_ascii_case("TELEGRAM_BOT_TOKEN") {
                "channel.bot_token".into()
            } else {
                "channel.recipient".into()
            }
        })
}

//! Notification channel configuration.
//!
//! Identifies the monitoring recipient and how to reach it. The token and
//! recipient are optional at load time so that `check-config` and dry runs
//! work without secrets; [`ChannelConfig::credentials`] enforces them when a
//! real channel is built.

use serde::{Deserialize, Deserializer, Serialize};
use validator::{self, Validate};

use crate::validation;
use crate::ConfigError;

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct ChannelConfig {
    /// Base URL of the bot API.
    #[validate(url)]
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Bot token (`<id>:<secret>`).
    #[validate(custom(function = validation::validate_bot_token))]
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Chat id or `@handle` of the monitoring party.
    #[validate(custom(function = validation::validate_recipient))]
    #[serde(default, deserialize_with = "chat_id_or_handle")]
    pub recipient: Option<String>,

    /// Per-request timeout (seconds).
    #[validate(range(min = 1, max = 120))]
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Send a map pin after the alert when coordinates are known.
    #[serde(default = "default_true")]
    pub share_location: bool,

    /// Caption attached to every photo.
    #[validate(length(min = 1, max = 1024))]
    #[serde(default = "default_caption")]
    pub attachment_caption: String,

    /// Message formatting mode understood by the API.
    #[validate(custom(function = validation::validate_not_blank))]
    #[serde(default = "default_parse_mode")]
    pub parse_mode: String,
}

/// Numeric chat ids reach us as integers from environment variables and
/// unquoted YAML; they are kept in their textual form.
fn chat_id_or_handle<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ChatId {
        Text(String),
        Signed(i64),
        Unsigned(u64),
    }

    Ok(Option::<ChatId>::deserialize(deserializer)?.map(|id| match id {
        ChatId::Text(text) => text,
        ChatId::Signed(n) => n.to_string(),
        ChatId::Unsigned(n) => n.to_string(),
    }))
}

fn default_api_base() -> String {
    "https://api.telegram.org".into()
}
fn default_request_timeout() -> u64 {
    15
}
fn default_true() -> bool {
    true
}
fn default_caption() -> String {
    "Emergency situation photo".into()
}
fn default_parse_mode() -> String {
    "HTML".into()
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            bot_token: None,
            recipient: None,
            request_timeout_secs: default_request_timeout(),
            share_location: default_true(),
            attachment_caption: default_caption(),
            parse_mode: default_parse_mode(),
        }
    }
}

/// Secrets needed to talk to a live channel.
#[derive(Debug, Clone, Copy)]
pub struct Credentials<'a> {
    pub bot_token: &'a str,
    pub recipient: &'a str,
}

impl ChannelConfig {
    pub fn credentials(&self) -> Result<Credentials<'_>, ConfigError> {
        let bot_token = self
            .bot_token
            .as_deref()
            .ok_or(ConfigError::MissingField("channel.bot_token"))?;
        let recipient = self
            .recipient
            .as_deref()
            .ok_or(ConfigError::MissingField("channel.recipient"))?;
        Ok(Credentials {
            bot_token,
            recipient,
        })
    }

    /// Copy with the token masked, for display.
    pub fn redacted(&self) -> Self {
        Self {
            bot_token: self.bot_token.as_ref().map(|_| "<redacted>".to_string()),
            ..self.clone()
        }
    }
}

//! Custom validation functions for configuration.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

use crate::intake::EtaWindow;

lazy_static! {
    // Numeric chat id (groups are negative) or a public @handle.
    static ref RECIPIENT: Regex =
        Regex::new(r"^(-?[0-9]+|@[A-Za-z][A-Za-z0-9_]{4,31})$").expect("valid recipient regex");
    static ref BOT_TOKEN: Regex =
        Regex::new(r"^[0-9]+:[A-Za-z0-9_-]+$").expect("valid token regex");
}

/// Validate a notification recipient identifier.
pub fn validate_recipient(recipient: &str) -> Result<(), ValidationError> {
    if RECIPIENT.is_match(recipient) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_recipient"))
    }
}

/// Validate the shape of a bot token (`<id>:<secret>`).
pub fn validate_bot_token(token: &str) -> Result<(), ValidationError> {
    if BOT_TOKEN.is_match(token) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_bot_token"))
    }
}

/// Validate a non-blank string.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("must_not_be_blank"))
    } else {
        Ok(())
    }
}

/// Validate that the ETA window is ordered.
pub fn validate_eta_window(eta: &EtaWindow) -> Result<(), ValidationError> {
    if eta.min_minutes >= 1 && eta.min_minutes <= eta.max_minutes {
        Ok(())
    } else {
        Err(ValidationError::new("eta_min_exceeds_max"))
    }
}

//! Intake limits and response-status settings.

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct IntakeConfig {
    /// Maximum photos per report.
    #[validate(range(min = 1, max = 20))]
    #[serde(default = "default_max_attachments")]
    pub max_attachments: usize,

    /// Maximum size of a single photo (bytes).
    #[validate(range(min = 1024, max = 52_428_800))]
    #[serde(default = "default_max_attachment_bytes")]
    pub max_attachment_bytes: usize,

    /// Window the synthetic arrival estimate is drawn from.
    #[validate(custom(function = validation::validate_eta_window))]
    #[serde(default)]
    pub eta: EtaWindow,

    /// Number shown to reporters whose condition worsens.
    #[validate(custom(function = validation::validate_not_blank))]
    #[serde(default = "default_emergency_number")]
    pub emergency_number: String,

    /// Idle time after which a session may be purged (seconds).
    #[validate(range(min = 60, max = 86_400))]
    #[serde(default = "default_session_idle")]
    pub session_idle_secs: u64,
}

/// Inclusive ETA range in minutes.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct EtaWindow {
    pub min_minutes: u32,
    pub max_minutes: u32,
}

impl Default for EtaWindow {
    fn default() -> Self {
        Self {
            min_minutes: 5,
            max_minutes: 15,
        }
    }
}

fn default_max_attachments() -> usize {
    10
}
fn default_max_attachment_bytes() -> usize {
    10 * 1024 * 1024
}
fn default_emergency_number() -> String {
    "911".into()
}
fn default_session_idle() -> u64 {
    3600
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            max_attachments: default_max_attachments(),
            max_attachment_bytes: default_max_attachment_bytes(),
            eta: EtaWindow::default(),
            emergency_number: default_emergency_number(),
            session_idle_secs: default_session_idle(),
        }
    }
}

use thiserror::Error;

use crate::intake::{Action, Step};

/// Errors returned by intake transitions. Neither variant leaves a trace on
/// the session: the record and step are exactly as they were before the call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntakeError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Cannot {action} while {step}")]
    InvalidTransition { step: Step, action: Action },
}

impl IntakeError {
    /// Message suitable for showing to the reporter.
    pub fn user_message(&self) -> String {
        match self {
            IntakeError::Validation(reason) => format!("Please check your input: {reason}"),
            IntakeError::InvalidTransition { .. } => {
                "That action is not available right now, please retry.".to_string()
            }
        }
    }
}

use livlina_config::ConfigError;
use livlina_core::channel::ChannelError;
use livlina_core::resolver::ResolverError;
use livlina_core::IntakeError;
use thiserror::Error;

use crate::session::SessionId;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error("Unknown session: {0}")]
    UnknownSession(SessionId),

    #[error("Attachment rejected: {0}")]
    Attachment(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Channel setup failed: {0}")]
    Channel(#[from] ChannelError),

    #[error("Resolver setup failed: {0}")]
    Resolver(#[from] ResolverError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl ServiceError {
    /// Message suitable for showing to the reporter.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::Intake(e) => e.user_message(),
            ServiceError::UnknownSession(_) => {
                "Your session has expired, please start a new request.".to_string()
            }
            ServiceError::Attachment(reason) => format!("Photo not accepted: {reason}"),
            other => format!("Service unavailable: {other}"),
        }
    }
}

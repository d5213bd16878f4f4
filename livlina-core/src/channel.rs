//! ## livlina-core::channel
//! **Notification channel boundary**
//!
//! The dispatcher talks to the monitoring party only through
//! [`NotificationChannel`]. Transports (bot APIs, push gateways, a log sink)
//! live outside the core and fold every failure into [`ChannelError`].

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::report::Coordinates;

/// Failure of a single channel call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Channel answered HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Channel request timed out")]
    Timeout,

    #[error("Channel rejected the request: {0}")]
    Rejected(String),

    #[error("Operation not supported by this channel")]
    Unsupported,
}

/// Acknowledgement of a delivered message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ack {
    /// Transport-assigned message id, when the transport reports one.
    pub message_id: Option<i64>,
}

/// A transport able to reach the preconfigured monitoring recipient.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Sends a text message.
    async fn send_text(&self, recipient: &str, message: &str) -> Result<Ack, ChannelError>;

    /// Sends one binary attachment with a caption.
    async fn send_attachment(
        &self,
        recipient: &str,
        bytes: Bytes,
        caption: &str,
    ) -> Result<Ack, ChannelError>;

    /// Sends a map pin. Transports without the capability keep the default.
    async fn send_location(
        &self,
        _recipient: &str,
        _coordinates: Coordinates,
    ) -> Result<Ack, ChannelError> {
        Err(ChannelError::Unsupported)
    }
}

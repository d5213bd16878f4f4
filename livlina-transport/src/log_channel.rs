//! Dry-run channel: alerts go to the log instead of a network.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::info;

use livlina_core::channel::{Ack, ChannelError, NotificationChannel};
use livlina_core::report::Coordinates;

#[derive(Debug, Default)]
pub struct LogChannel {
    next_id: AtomicI64,
}

impl LogChannel {
    pub fn new() -> Self {
        Self::default()
    }

    fn ack(&self) -> Ack {
        Ack {
            message_id: Some(self.next_id.fetch_add(1, Ordering::Relaxed) + 1),
        }
    }
}

#[async_trait]
impl NotificationChannel for LogChannel {
    async fn send_text(&self, recipient: &str, message: &str) -> Result<Ack, ChannelError> {
        info!(recipient, "[dry-run] alert:\n{message}");
        Ok(self.ack())
    }

    async fn send_attachment(
        &self,
        recipient: &str,
        bytes: Bytes,
        caption: &str,
    ) -> Result<Ack, ChannelError> {
        info!(recipient, bytes = bytes.len(), caption, "[dry-run] attachment");
        Ok(self.ack())
    }

    async fn send_location(
        &self,
        recipient: &str,
        coordinates: Coordinates,
    ) -> Result<Ack, ChannelError> {
        info!(recipient, %coordinates, "[dry-run] location pin");
        Ok(self.ack())
    }
}

//! In-memory channel and resolver doubles for tests.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use crate::channel::{Ack, ChannelError, NotificationChannel};
use crate::report::Coordinates;
use crate::resolver::{AddressResolver, ResolverError};

/// A call that the channel accepted.
#[derive(Debug, Clone, PartialEq)]
pub enum SentItem {
    Text {
        recipient: String,
        message: String,
    },
    Attachment {
        recipient: String,
        caption: String,
        len: usize,
    },
    Location {
        recipient: String,
        coordinates: Coordinates,
    },
}

/// Channel that records accepted calls and fails on demand.
#[derive(Debug, Default)]
pub struct RecordingChannel {
    fail_text: bool,
    fail_location: bool,
    location_support: bool,
    failing_attachments: HashSet<usize>,
    text_calls: Mutex<usize>,
    attachment_calls: Mutex<usize>,
    sent: Mutex<Vec<SentItem>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_text(mut self) -> Self {
        self.fail_text = true;
        self
    }

    /// Fails the attachment calls at the given zero-based positions.
    pub fn failing_attachments(mut self, positions: &[usize]) -> Self {
        self.failing_attachments = positions.iter().copied().collect();
        self
    }

    pub fn with_location_support(mut self) -> Self {
        self.location_support = true;
        self
    }

    pub fn failing_location(mut self) -> Self {
        self.location_support = true;
        self.fail_location = true;
        self
    }

    pub fn text_calls(&self) -> usize {
        *self.text_calls.lock()
    }

    pub fn attachment_calls(&self) -> usize {
        *self.attachment_calls.lock()
    }

    pub fn sent(&self) -> Vec<SentItem> {
        self.sent.lock().clone()
    }

    /// Text of every delivered alert.
    pub fn messages(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter_map(|item| match item {
                SentItem::Text { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    async fn send_text(&self, recipient: &str, message: &str) -> Result<Ack, ChannelError> {
        *self.text_calls.lock() += 1;
        if self.fail_text {
            return Err(ChannelError::Status {
                status: 502,
                body: "bad gateway".into(),
            });
        }
        let mut sent = self.sent.lock();
        sent.push(SentItem::Text {
            recipient: recipient.to_string(),
            message: message.to_string(),
        });
        Ok(Ack {
            message_id: Some(sent.len() as i64),
        })
    }

    async fn send_attachment(
        &self,
        recipient: &str,
        bytes: Bytes,
        caption: &str,
    ) -> Result<Ack, ChannelError> {
        let position = {
            let mut calls = self.attachment_calls.lock();
            *calls += 1;
            *calls - 1
        };
        if self.failing_attachments.contains(&position) {
            return Err(ChannelError::Timeout);
        }
        self.sent.lock().push(SentItem::Attachment {
            recipient: recipient.to_string(),
            caption: caption.to_string(),
            len: bytes.len(),
        });
        Ok(Ack::default())
    }

    async fn send_location(
        &self,
        recipient: &str,
        coordinates: Coordinates,
    ) -> Result<Ack, ChannelError> {
        if !self.location_support {
            return Err(ChannelError::Unsupported);
        }
        if self.fail_location {
            return Err(ChannelError::Transport("connection reset".into()));
        }
        self.sent.lock().push(SentItem::Location {
            recipient: recipient.to_string(),
            coordinates,
        });
        Ok(Ack::default())
    }
}

/// Resolver returning a fixed answer, optionally after a delay.
#[derive(Debug, Clone)]
pub struct StubResolver {
    answer: Result<String, ResolverError>,
    delay: Option<Duration>,
}

impl StubResolver {
    pub fn answering(address: impl Into<String>) -> Self {
        Self {
            answer: Ok(address.into()),
            delay: None,
        }
    }

    pub fn failing(error: ResolverError) -> Self {
        Self {
            answer: Err(error),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl AddressResolver for StubResolver {
    async fn reverse_geocode(&self, _coordinates: Coordinates) -> Result<String, ResolverError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.answer.clone()
    }
}

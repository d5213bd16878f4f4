//! ## livlina-core::dispatch
//! **Alert dispatcher**
//!
//! Turns a confirmed [`EmergencyReport`] into one text alert followed by
//! optional supplementary sends (location pin, photos).
//!
//! ### Delivery policy:
//! - The text alert is fail-fast: if it does not go through, nothing else
//!   is sent and the outcome is `Failed`.
//! - Supplementary sends are best-effort: each is attempted in order, and
//!   failures are counted without touching the outcome.
//!
//! The dispatcher does no deduplication of its own; the intake machine
//! guarantees it is invoked at most once per record.

use std::fmt::Write;
use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use crate::channel::{ChannelError, NotificationChannel};
use crate::report::{Attachment, DispatchOutcome, EmergencyReport};

pub const DEFAULT_ATTACHMENT_CAPTION: &str = "Emergency situation photo";

/// Aggregate result of one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub outcome: DispatchOutcome,
    pub attachments_attempted: usize,
    pub attachments_failed: usize,
    /// `Some(true)` if a location pin was delivered, `Some(false)` if it
    /// failed, `None` if none was attempted or the channel lacks support.
    pub location_shared: Option<bool>,
}

impl DispatchReport {
    fn failed() -> Self {
        Self {
            outcome: DispatchOutcome::Failed,
            attachments_attempted: 0,
            attachments_failed: 0,
            location_shared: None,
        }
    }
}

/// Dispatcher settings taken from the hosting configuration.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub recipient: String,
    pub attachment_caption: String,
    pub share_location: bool,
}

impl DispatchSettings {
    pub fn new(recipient: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            attachment_caption: DEFAULT_ATTACHMENT_CAPTION.to_string(),
            share_location: true,
        }
    }
}

pub struct AlertDispatcher {
    channel: Arc<dyn NotificationChannel>,
    settings: DispatchSettings,
}

impl AlertDispatcher {
    pub fn new(channel: Arc<dyn NotificationChannel>, settings: DispatchSettings) -> Self {
        Self { channel, settings }
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    #[instrument(skip_all, fields(kind = ?report.kind(), attachments = attachments.len()))]
    pub async fn dispatch(
        &self,
        report: &EmergencyReport,
        attachments: &[Attachment],
    ) -> DispatchReport {
        let recipient = self.settings.recipient.as_str();
        let message = compose_alert(report);

        if let Err(e) = self.channel.send_text(recipient, &message).await {
            error!("Emergency alert could not be delivered: {e}");
            return DispatchReport::failed();
        }
        info!("Emergency alert delivered");

        let location_shared = match report.coordinates() {
            Some(coordinates) if self.settings.share_location => {
                match self.channel.send_location(recipient, coordinates).await {
                    Ok(_) => Some(true),
                    Err(ChannelError::Unsupported) => {
                        debug!("Channel does not support location pins");
                        None
                    }
                    Err(e) => {
                        warn!("Location pin failed: {e}");
                        Some(false)
                    }
                }
            }
            _ => None,
        };

        let mut attachments_failed = 0;
        for (index, attachment) in attachments.iter().enumerate() {
            let result = self
                .channel
                .send_attachment(
                    recipient,
                    attachment.data.clone(),
                    &self.settings.attachment_caption,
                )
                .await;
            if let Err(e) = result {
                attachments_failed += 1;
                warn!(index, file = %attachment.file_name, "Attachment failed: {e}");
            }
        }

        if attachments_failed > 0 {
            warn!(
                attachments_failed,
                "Alert delivered with {attachments_failed}/{} attachments missing",
                attachments.len()
            );
        }

        DispatchReport {
            outcome: DispatchOutcome::Sent,
            attachments_attempted: attachments.len(),
            attachments_failed,
            location_shared,
        }
    }
}

/// Renders the alert text. Only populated location fields are included;
/// reporter-supplied text is escaped for HTML parse mode.
pub fn compose_alert(report: &EmergencyReport) -> String {
    let kind = report
        .kind()
        .map(|k| k.label())
        .unwrap_or("Unspecified");
    let time = report
        .created_at()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "not recorded".to_string());

    let mut message = String::from("🚨 NEW EMERGENCY ALERT 🚨\n\n");
    let _ = writeln!(message, "Type: {kind}");
    let _ = writeln!(message, "Time: {time}");
    message.push('\n');

    if let Some(coordinates) = report.coordinates() {
        let _ = writeln!(message, "📍 Location: {coordinates}");
    }
    if let Some(address) = report.address_text() {
        let _ = writeln!(message, "🏠 Address: {}", escape_html(address));
    }
    message
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

//! Intake service: the presentation layer's single entry point.
//!
//! Every call names a session, waits for that session's lock and forwards
//! to the matching [`IntakeSession`] transition. Rejections from the core
//! come back unchanged as [`ServiceError::Intake`].
//!
//! [`IntakeSession`]: livlina_core::intake::IntakeSession

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use livlina_config::{EtaWindow, LivlinaConfig};
use livlina_core::prelude::*;
use livlina_telemetry::{EventLogger, MetricsRecorder};
use opentelemetry::KeyValue;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, instrument};

use crate::attachments::AttachmentPolicy;
use crate::session::{EntryGuard, SessionId, SessionStore};
use crate::status::ResponseStatus;
use crate::ServiceError;

/// Runtime knobs of the service, usually derived from [`LivlinaConfig`].
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub dispatch: DispatchSettings,
    pub resolver_timeout: Duration,
    pub attachments: AttachmentPolicy,
    pub eta: EtaWindow,
    pub emergency_number: String,
    pub session_idle: Duration,
}

impl ServiceSettings {
    pub fn from_config(config: &LivlinaConfig, recipient: &str) -> Self {
        let mut dispatch = DispatchSettings::new(recipient);
        dispatch.attachment_caption = config.channel.attachment_caption.clone();
        dispatch.share_location = config.channel.share_location;
        Self {
            dispatch,
            resolver_timeout: config.resolver.timeout(),
            attachments: AttachmentPolicy::from_config(&config.intake),
            eta: config.intake.eta,
            emergency_number: config.intake.emergency_number.clone(),
            session_idle: Duration::from_secs(config.intake.session_idle_secs),
        }
    }
}

/// Read-only view of a session for rendering the next prompt.
#[derive(Debug, Clone)]
pub struct SessionView {
    pub id: SessionId,
    pub step: Step,
    pub kind: Option<EmergencyKind>,
    pub location_source: LocationSource,
    pub coordinates: Option<Coordinates>,
    pub address_text: Option<String>,
    pub attachment_count: usize,
    pub created_at: Option<DateTime<Utc>>,
    pub dispatch_outcome: DispatchOutcome,
    pub attempts: usize,
    pub last_dispatch: Option<DispatchReport>,
    pub status: Option<ResponseStatus>,
}

pub struct IntakeService {
    store: SessionStore,
    dispatcher: AlertDispatcher,
    resolver: Arc<dyn AddressResolver>,
    clock: Arc<dyn Clock>,
    metrics: Arc<MetricsRecorder>,
    settings: ServiceSettings,
}

impl IntakeService {
    pub fn new(
        channel: Arc<dyn NotificationChannel>,
        resolver: Arc<dyn AddressResolver>,
        clock: Arc<dyn Clock>,
        metrics: Arc<MetricsRecorder>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            store: SessionStore::new(),
            dispatcher: AlertDispatcher::new(channel, settings.dispatch.clone()),
            resolver,
            clock,
            metrics,
            settings,
        }
    }

    pub fn metrics(&self) -> &MetricsRecorder {
        &self.metrics
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.store
    }

    async fn entry(&self, id: SessionId) -> Result<EntryGuard, ServiceError> {
        self.store
            .lock(id)
            .await
            .ok_or(ServiceError::UnknownSession(id))
    }

    pub async fn start_session(&self) -> SessionId {
        let id = self.store.start();
        self.metrics.sessions_started.inc();
        EventLogger::log_event(
            "session_started",
            vec![KeyValue::new("session", id.to_string())],
        )
        .await;
        id
    }

    pub fn end_session(&self, id: SessionId) -> bool {
        let ended = self.store.end(id);
        if ended {
            info!(session = %id, "Session ended");
        }
        ended
    }

    /// Drops sessions idle longer than the configured window.
    pub fn purge_idle(&self) -> usize {
        let purged = self.store.purge_idle(self.settings.session_idle);
        if purged > 0 {
            info!(purged, "Purged idle sessions");
        }
        purged
    }

    /// Purges idle sessions in the background until the handle is aborted.
    pub fn spawn_idle_sweeper(self: Arc<Self>) -> JoinHandle<()> {
        let period = (self.settings.session_idle / 4).max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.purge_idle();
            }
        })
    }

    pub async fn snapshot(&self, id: SessionId) -> Result<SessionView, ServiceError> {
        let entry = self.entry(id).await?;
        let session = &entry.session;
        let report = session.report();
        Ok(SessionView {
            id,
            step: session.step(),
            kind: report.kind(),
            location_source: report.location_source(),
            coordinates: report.coordinates(),
            address_text: report.address_text().map(str::to_string),
            attachment_count: report.attachments().len(),
            created_at: report.created_at(),
            dispatch_outcome: report.dispatch_outcome(),
            attempts: session.attempts(),
            last_dispatch: session.last_dispatch().copied(),
            status: entry.status.clone(),
        })
    }

    #[instrument(skip(self), fields(session = %id))]
    pub async fn select_type(
        &self,
        id: SessionId,
        kind: EmergencyKind,
    ) -> Result<Step, ServiceError> {
        let mut entry = self.entry(id).await?;
        Ok(entry.session.select_type(kind)?)
    }

    #[instrument(skip(self), fields(session = %id))]
    pub async fn choose_location_method(
        &self,
        id: SessionId,
        method: LocationMethod,
    ) -> Result<Step, ServiceError> {
        let mut entry = self.entry(id).await?;
        Ok(entry.session.choose_location_method(method)?)
    }

    #[instrument(skip(self), fields(session = %id))]
    pub async fn submit_coordinates(
        &self,
        id: SessionId,
        latitude: f64,
        longitude: f64,
    ) -> Result<Step, ServiceError> {
        let mut entry = self.entry(id).await?;
        let step = entry
            .session
            .submit_coordinates(
                latitude,
                longitude,
                self.resolver.as_ref(),
                self.settings.resolver_timeout,
            )
            .await?;
        if step == Step::EnteringAddress {
            self.metrics.resolver_fallbacks.inc();
        }
        Ok(step)
    }

    #[instrument(skip(self), fields(session = %id))]
    pub async fn submit_address(&self, id: SessionId, text: &str) -> Result<Step, ServiceError> {
        let mut entry = self.entry(id).await?;
        Ok(entry.session.submit_address(text)?)
    }

    /// Checks the photos against the attachment policy before handing them
    /// to the session. A rejected batch leaves the session untouched.
    #[instrument(skip(self, attachments), fields(session = %id, count = attachments.len()))]
    pub async fn submit_attachments(
        &self,
        id: SessionId,
        attachments: Vec<Attachment>,
    ) -> Result<Step, ServiceError> {
        let mut entry = self.entry(id).await?;
        if !entry.session.step().permits(Action::SubmitAttachments) {
            // Out-of-order calls report the transition error, not the policy.
            return Ok(entry.session.submit_attachments(attachments)?);
        }
        self.settings.attachments.check(&attachments)?;
        Ok(entry.session.submit_attachments(attachments)?)
    }

    #[instrument(skip(self), fields(session = %id))]
    pub async fn confirm_submission(&self, id: SessionId) -> Result<DispatchReport, ServiceError> {
        let mut entry = self.entry(id).await?;
        let started = Instant::now();
        let report = entry
            .session
            .confirm_submission(&self.dispatcher, self.clock.as_ref())
            .await?;

        let sent = report.outcome == DispatchOutcome::Sent;
        self.metrics.record_dispatch(
            sent,
            report.attachments_failed,
            started.elapsed().as_secs_f64(),
        );
        if sent {
            entry.status = Some(self.draw_status());
        }

        EventLogger::log_event(
            "alert_dispatched",
            vec![
                KeyValue::new("session", id.to_string()),
                KeyValue::new("outcome", format!("{:?}", report.outcome)),
                KeyValue::new("attachments_failed", report.attachments_failed as i64),
            ],
        )
        .await;
        Ok(report)
    }

    fn draw_status(&self) -> ResponseStatus {
        ResponseStatus::generate(
            &mut rand::rng(),
            self.settings.eta,
            self.settings.emergency_number.clone(),
        )
    }

    /// Response status of the dispatched record, if its alert went out.
    pub async fn response_status(
        &self,
        id: SessionId,
    ) -> Result<Option<ResponseStatus>, ServiceError> {
        Ok(self.entry(id).await?.status.clone())
    }

    #[instrument(skip(self), fields(session = %id))]
    pub async fn retry(&self, id: SessionId) -> Result<Step, ServiceError> {
        let mut entry = self.entry(id).await?;
        let step = entry.session.retry()?;
        entry.status = None;
        Ok(step)
    }

    #[instrument(skip(self), fields(session = %id))]
    pub async fn reset(&self, id: SessionId) -> Result<Step, ServiceError> {
        let mut entry = self.entry(id).await?;
        entry.status = None;
        Ok(entry.session.reset())
    }
}

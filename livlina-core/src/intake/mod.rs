//! ## livlina-core::intake
//! **Intake state machine**
//!
//! One [`IntakeSession`] per reporter. Each transition checks the current
//! step against the static table in [`step`], validates its input, and only
//! then mutates the record, so a rejected call leaves the session untouched.
//!
//! Flow:
//! `ChoosingType → ChoosingLocationMethod → {CapturingCoordinates | EnteringAddress}
//!  → CapturingAttachments → ReadyToSubmit → Dispatched`
//!
//! The only sideways move is the resolver fallback from
//! `CapturingCoordinates` to `EnteringAddress`. `reset` returns to the start
//! from anywhere; `retry` reopens a record whose dispatch failed.

mod step;

#[cfg(test)]
mod proptests;

use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::dispatch::{AlertDispatcher, DispatchReport};
use crate::error::IntakeError;
use crate::report::{
    Attachment, Coordinates, DispatchOutcome, EmergencyKind, EmergencyReport, LocationMethod,
    LocationSource,
};
use crate::resolver::{resolve_bounded, AddressResolver, Resolution};
use crate::time::Clock;

pub use step::{Action, Step, TRANSITIONS};

/// Per-reporter intake state.
#[derive(Debug, Clone)]
pub struct IntakeSession {
    step: Step,
    report: EmergencyReport,
    /// Records whose dispatch failed before a retry reopened them.
    failed_records: Vec<EmergencyReport>,
    last_dispatch: Option<DispatchReport>,
}

impl Default for IntakeSession {
    fn default() -> Self {
        Self::new()
    }
}

impl IntakeSession {
    pub fn new() -> Self {
        Self {
            step: Step::ChoosingType,
            report: EmergencyReport::default(),
            failed_records: Vec::new(),
            last_dispatch: None,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn report(&self) -> &EmergencyReport {
        &self.report
    }

    pub fn last_dispatch(&self) -> Option<&DispatchReport> {
        self.last_dispatch.as_ref()
    }

    /// Number of confirmed submissions for the current flow (failed ones
    /// included).
    pub fn attempts(&self) -> usize {
        self.failed_records.len() + usize::from(self.step == Step::Dispatched)
    }

    pub fn failed_records(&self) -> &[EmergencyReport] {
        &self.failed_records
    }

    fn guard(&self, action: Action) -> Result<(), IntakeError> {
        if self.step.permits(action) {
            Ok(())
        } else {
            debug!(step = %self.step, %action, "Rejected transition");
            Err(IntakeError::InvalidTransition {
                step: self.step,
                action,
            })
        }
    }

    pub fn select_type(&mut self, kind: EmergencyKind) -> Result<Step, IntakeError> {
        self.guard(Action::SelectType)?;
        self.report.kind = Some(kind);
        self.step = Step::ChoosingLocationMethod;
        Ok(self.step)
    }

    pub fn choose_location_method(&mut self, method: LocationMethod) -> Result<Step, IntakeError> {
        self.guard(Action::ChooseLocationMethod)?;
        self.report.location_source = LocationSource::from(method);
        self.step = match method {
            LocationMethod::Coordinates => Step::CapturingCoordinates,
            LocationMethod::Address => Step::EnteringAddress,
        };
        Ok(self.step)
    }

    /// Records the coordinates and tries to resolve them to an address
    /// within `timeout`. On success the session moves on to attachments; on
    /// failure it falls back to manual address entry with the coordinates
    /// kept.
    #[instrument(skip(self, resolver))]
    pub async fn submit_coordinates(
        &mut self,
        latitude: f64,
        longitude: f64,
        resolver: &dyn AddressResolver,
        timeout: Duration,
    ) -> Result<Step, IntakeError> {
        self.guard(Action::SubmitCoordinates)?;
        let coordinates = Coordinates::new(latitude, longitude)?;

        let resolution = resolve_bounded(resolver, coordinates, timeout).await;

        self.report.coordinates = Some(coordinates);
        self.step = match resolution {
            Resolution::Resolved(address) => {
                self.report.address_text = Some(address);
                Step::CapturingAttachments
            }
            Resolution::Unresolved => {
                info!("Falling back to manual address entry");
                Step::EnteringAddress
            }
        };
        Ok(self.step)
    }

    pub fn submit_address(&mut self, text: &str) -> Result<Step, IntakeError> {
        self.guard(Action::SubmitAddress)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(IntakeError::Validation("address must not be empty".into()));
        }
        self.report.address_text = Some(text.to_string());
        self.step = Step::CapturingAttachments;
        Ok(self.step)
    }

    pub fn submit_attachments(&mut self, attachments: Vec<Attachment>) -> Result<Step, IntakeError> {
        self.guard(Action::SubmitAttachments)?;
        self.report.attachments = attachments;
        self.step = Step::ReadyToSubmit;
        Ok(self.step)
    }

    /// Stamps the record, moves to `Dispatched` and hands it to the
    /// dispatcher. This is the only path into the dispatcher, and the step
    /// change happens before the first send, so a second call (or a call
    /// racing an abandoned first one) is rejected without side effects.
    #[instrument(skip_all)]
    pub async fn confirm_submission(
        &mut self,
        dispatcher: &AlertDispatcher,
        clock: &dyn Clock,
    ) -> Result<DispatchReport, IntakeError> {
        self.guard(Action::ConfirmSubmission)?;

        self.report.created_at = Some(clock.now());
        self.step = Step::Dispatched;

        let result = dispatcher
            .dispatch(&self.report, self.report.attachments())
            .await;

        // Outcome is written exactly once per record.
        if self.report.dispatch_outcome == DispatchOutcome::Pending {
            self.report.dispatch_outcome = result.outcome;
        }
        self.last_dispatch = Some(result);

        match result.outcome {
            DispatchOutcome::Sent => info!(
                attachments_failed = result.attachments_failed,
                "Emergency dispatched"
            ),
            _ => warn!("Emergency dispatch failed"),
        }
        Ok(result)
    }

    /// Reopens a record whose dispatch failed so the reporter can submit
    /// again. The failed record is archived with its outcome intact.
    pub fn retry(&mut self) -> Result<Step, IntakeError> {
        self.guard(Action::Retry)?;
        if self.report.dispatch_outcome != DispatchOutcome::Failed {
            return Err(IntakeError::InvalidTransition {
                step: self.step,
                action: Action::Retry,
            });
        }
        let reopened = self.report.reopened();
        let failed = std::mem::replace(&mut self.report, reopened);
        self.failed_records.push(failed);
        self.last_dispatch = None;
        self.step = Step::ReadyToSubmit;
        Ok(self.step)
    }

    /// Discards everything collected so far.
    pub fn reset(&mut self) -> Step {
        *self = Self::new();
        self.step
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::DateTime;

    use super::*;
    use crate::dispatch::DispatchSettings;
    use crate::resolver::ResolverError;
    use crate::testing::{RecordingChannel, StubResolver};
    use crate::time::ManualClock;

    const TIMEOUT: Duration = Duration::from_millis(500);

    fn clock() -> ManualClock {
        ManualClock::new(DateTime::from_timestamp(1_700_000_000, 0).unwrap())
    }

    fn dispatcher(channel: &Arc<RecordingChannel>) -> AlertDispatcher {
        AlertDispatcher::new(channel.clone(), DispatchSettings::new("-100123"))
    }

    async fn session_at_coordinates() -> IntakeSession {
        let mut session = IntakeSession::new();
        session.select_type(EmergencyKind::ChestPain).unwrap();
        session
            .choose_location_method(LocationMethod::Coordinates)
            .unwrap();
        session
    }

    fn ready_session() -> IntakeSession {
        let mut session = IntakeSession::new();
        session.select_type(EmergencyKind::Accident).unwrap();
        session.choose_location_method(LocationMethod::Address).unwrap();
        session.submit_address("221B Baker St").unwrap();
        session.submit_attachments(Vec::new()).unwrap();
        session
    }

    #[test]
    fn starts_choosing_type() {
        let session = IntakeSession::new();
        assert_eq!(session.step(), Step::ChoosingType);
        assert_eq!(session.report().dispatch_outcome(), DispatchOutcome::Pending);
    }

    #[test]
    fn address_path_walks_forward() {
        let mut session = IntakeSession::new();
        assert_eq!(
            session.select_type(EmergencyKind::Pregnancy),
            Ok(Step::ChoosingLocationMethod)
        );
        assert_eq!(
            session.choose_location_method(LocationMethod::Address),
            Ok(Step::EnteringAddress)
        );
        assert_eq!(session.report().location_source(), LocationSource::Address);
        assert_eq!(
            session.submit_address("  12 Elm Road  "),
            Ok(Step::CapturingAttachments)
        );
        assert_eq!(session.report().address_text(), Some("12 Elm Road"));
    }

    #[test]
    fn skipping_a_step_is_rejected() {
        let mut session = IntakeSession::new();
        session.select_type(EmergencyKind::Accident).unwrap();
        let err = session.submit_attachments(Vec::new()).unwrap_err();
        assert_eq!(
            err,
            IntakeError::InvalidTransition {
                step: Step::ChoosingLocationMethod,
                action: Action::SubmitAttachments,
            }
        );
        assert_eq!(session.step(), Step::ChoosingLocationMethod);
    }

    #[test]
    fn selecting_type_twice_is_rejected() {
        let mut session = IntakeSession::new();
        session.select_type(EmergencyKind::Accident).unwrap();
        assert!(session.select_type(EmergencyKind::ChestPain).is_err());
        assert_eq!(session.report().kind(), Some(EmergencyKind::Accident));
    }

    #[test]
    fn blank_address_is_a_validation_error() {
        let mut session = IntakeSession::new();
        session.select_type(EmergencyKind::Accident).unwrap();
        session.choose_location_method(LocationMethod::Address).unwrap();
        assert!(matches!(
            session.submit_address(" \t\n"),
            Err(IntakeError::Validation(_))
        ));
        assert_eq!(session.step(), Step::EnteringAddress);
        assert_eq!(session.report().address_text(), None);
    }

    #[tokio::test]
    async fn out_of_range_coordinates_leave_session_untouched() {
        let mut session = session_at_coordinates().await;
        let resolver = StubResolver::answering("nowhere");
        let err = session
            .submit_coordinates(91.0, 10.0, &resolver, TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, IntakeError::Validation(_)));
        assert_eq!(session.step(), Step::CapturingCoordinates);
        assert_eq!(session.report().coordinates(), None);
    }

    #[tokio::test]
    async fn resolved_coordinates_fill_address() {
        let mut session = session_at_coordinates().await;
        let resolver = StubResolver::answering("MG Road, Bangalore");
        let step = session
            .submit_coordinates(12.97, 77.59, &resolver, TIMEOUT)
            .await
            .unwrap();
        assert_eq!(step, Step::CapturingAttachments);
        assert_eq!(session.report().address_text(), Some("MG Road, Bangalore"));
        assert_eq!(
            session.report().coordinates(),
            Some(Coordinates::new(12.97, 77.59).unwrap())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn resolver_timeout_falls_back_to_address_entry() {
        let mut session = session_at_coordinates().await;
        let resolver = StubResolver::answering("too late").with_delay(Duration::from_secs(60));
        let step = session
            .submit_coordinates(12.97, 77.59, &resolver, TIMEOUT)
            .await
            .unwrap();
        assert_eq!(step, Step::EnteringAddress);
        assert_eq!(session.report().address_text(), None);

        let step = session.submit_address("221B Baker St").unwrap();
        assert_eq!(step, Step::CapturingAttachments);
        assert_eq!(
            session.report().coordinates(),
            Some(Coordinates::new(12.97, 77.59).unwrap())
        );
        assert_eq!(session.report().address_text(), Some("221B Baker St"));
    }

    #[tokio::test]
    async fn resolver_failure_falls_back_to_address_entry() {
        let mut session = session_at_coordinates().await;
        let resolver = StubResolver::failing(ResolverError::Unavailable);
        let step = session
            .submit_coordinates(-33.86, 151.2, &resolver, TIMEOUT)
            .await
            .unwrap();
        assert_eq!(step, Step::EnteringAddress);
        assert!(session.report().coordinates().is_some());
    }

    #[test]
    fn attachments_only_once() {
        let mut session = IntakeSession::new();
        session.select_type(EmergencyKind::Accident).unwrap();
        session.choose_location_method(LocationMethod::Address).unwrap();
        session.submit_address("Main St").unwrap();
        session
            .submit_attachments(vec![Attachment::new("a.png", vec![1, 2, 3])])
            .unwrap();
        let err = session.submit_attachments(Vec::new()).unwrap_err();
        assert!(matches!(err, IntakeError::InvalidTransition { .. }));
        assert_eq!(session.report().attachments().len(), 1);
    }

    #[tokio::test]
    async fn chest_pain_scenario_dispatches_full_alert() {
        let channel = Arc::new(RecordingChannel::new());
        let mut session = session_at_coordinates().await;
        session
            .submit_coordinates(12.97, 77.59, &StubResolver::answering("MG Road, Bangalore"), TIMEOUT)
            .await
            .unwrap();
        session.submit_attachments(Vec::new()).unwrap();

        let result = session
            .confirm_submission(&dispatcher(&channel), &clock())
            .await
            .unwrap();

        assert_eq!(result.outcome, DispatchOutcome::Sent);
        assert_eq!(session.step(), Step::Dispatched);
        assert_eq!(session.report().dispatch_outcome(), DispatchOutcome::Sent);
        assert_eq!(
            session.report().created_at(),
            DateTime::from_timestamp(1_700_000_000, 0)
        );

        let messages = channel.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("Heart/Chest Pain"));
        assert!(messages[0].contains("2023-11-14 22:13:20"));
        assert!(messages[0].contains("12.97, 77.59"));
        assert!(messages[0].contains("MG Road, Bangalore"));
    }

    #[tokio::test]
    async fn confirming_twice_dispatches_once() {
        let channel = Arc::new(RecordingChannel::new());
        let dispatcher = dispatcher(&channel);
        let mut session = ready_session();

        session.confirm_submission(&dispatcher, &clock()).await.unwrap();
        let err = session
            .confirm_submission(&dispatcher, &clock())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            IntakeError::InvalidTransition {
                step: Step::Dispatched,
                action: Action::ConfirmSubmission,
            }
        );
        assert_eq!(channel.text_calls(), 1);
    }

    #[tokio::test]
    async fn confirming_early_has_no_side_effect() {
        let channel = Arc::new(RecordingChannel::new());
        let mut session = IntakeSession::new();
        session.select_type(EmergencyKind::Accident).unwrap();
        assert!(session
            .confirm_submission(&dispatcher(&channel), &clock())
            .await
            .is_err());
        assert_eq!(channel.text_calls(), 0);
        assert_eq!(session.report().created_at(), None);
    }

    #[tokio::test]
    async fn failed_dispatch_can_be_retried_into_a_new_record() {
        let failing = Arc::new(RecordingChannel::new().failing_text());
        let mut session = ready_session();

        let result = session
            .confirm_submission(&dispatcher(&failing), &clock())
            .await
            .unwrap();
        assert_eq!(result.outcome, DispatchOutcome::Failed);
        assert_eq!(session.report().dispatch_outcome(), DispatchOutcome::Failed);

        assert_eq!(session.retry(), Ok(Step::ReadyToSubmit));
        assert_eq!(session.report().dispatch_outcome(), DispatchOutcome::Pending);
        assert_eq!(session.report().created_at(), None);
        assert_eq!(session.report().address_text(), Some("221B Baker St"));
        assert_eq!(
            session.failed_records()[0].dispatch_outcome(),
            DispatchOutcome::Failed
        );

        let working = Arc::new(RecordingChannel::new());
        let result = session
            .confirm_submission(&dispatcher(&working), &clock())
            .await
            .unwrap();
        assert_eq!(result.outcome, DispatchOutcome::Sent);
        assert_eq!(session.attempts(), 2);
    }

    #[tokio::test]
    async fn retry_after_success_is_rejected() {
        let channel = Arc::new(RecordingChannel::new());
        let mut session = ready_session();
        session
            .confirm_submission(&dispatcher(&channel), &clock())
            .await
            .unwrap();
        assert!(matches!(
            session.retry(),
            Err(IntakeError::InvalidTransition { .. })
        ));
        assert_eq!(session.report().dispatch_outcome(), DispatchOutcome::Sent);
    }

    #[tokio::test]
    async fn reset_reopens_the_flow_after_dispatch() {
        let channel = Arc::new(RecordingChannel::new());
        let mut session = ready_session();
        session
            .confirm_submission(&dispatcher(&channel), &clock())
            .await
            .unwrap();

        assert_eq!(session.reset(), Step::ChoosingType);
        assert_eq!(session.report().kind(), None);
        assert!(session.last_dispatch().is_none());
        assert_eq!(session.attempts(), 0);
    }
}

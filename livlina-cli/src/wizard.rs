//! Interactive intake over a line-based terminal.
//!
//! The wizard only renders prompts and parses answers; every decision about
//! what is allowed next comes from the session snapshot.

use std::path::Path;

use livlina_core::prelude::{Attachment, DispatchOutcome, EmergencyKind, LocationMethod, Step};
use livlina_engine::{IntakeService, ResponseStatus, ServiceError, SessionId, SessionView};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};

use crate::error::CliError;

pub struct Wizard<'a, R, W> {
    service: &'a IntakeService,
    input: Lines<R>,
    output: W,
}

impl<'a, R, W> Wizard<'a, R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(service: &'a IntakeService, input: R, output: W) -> Self {
        Self {
            service,
            input: input.lines(),
            output,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    async fn say(&mut self, text: &str) -> Result<(), CliError> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await?;
        Ok(())
    }

    /// Next trimmed answer; `None` on end of input or `quit`.
    async fn ask(&mut self, prompt: &str) -> Result<Option<String>, CliError> {
        self.output.write_all(prompt.as_bytes()).await?;
        self.output.write_all(b"\n> ").await?;
        self.output.flush().await?;
        match self.input.next_line().await? {
            Some(line) if line.trim().eq_ignore_ascii_case("quit") => Ok(None),
            Some(line) => Ok(Some(line.trim().to_string())),
            None => Ok(None),
        }
    }

    /// Runs one reporter session until the alert is out or input ends.
    pub async fn run(&mut self) -> Result<Option<SessionView>, CliError> {
        let id = self.service.start_session().await;
        self.say("🚑 Emergency assistance. Type 'reset' to start over or 'quit' to leave.")
            .await?;

        let result = self.drive(id).await;
        let view = self.service.snapshot(id).await.ok();
        self.service.end_session(id);
        result?;
        Ok(view)
    }

    async fn drive(&mut self, id: SessionId) -> Result<(), CliError> {
        loop {
            let view = self.service.snapshot(id).await?;

            if view.step == Step::Dispatched {
                match view.dispatch_outcome {
                    DispatchOutcome::Sent => {
                        if let Some(status) = &view.status {
                            let text = render_status(status);
                            self.say(&text).await?;
                        }
                        return Ok(());
                    }
                    _ => {
                        let Some(answer) = self
                            .ask("❌ The alert could not be sent. Type 'retry' to send it again.")
                            .await?
                        else {
                            return Ok(());
                        };
                        let result = match answer.to_ascii_lowercase().as_str() {
                            "retry" => self.service.retry(id).await.map(|_| ()),
                            "reset" => self.service.reset(id).await.map(|_| ()),
                            _ => Ok(()),
                        };
                        self.report(result).await?;
                        continue;
                    }
                }
            }

            let prompt = prompt_for(&view);
            let Some(answer) = self.ask(&prompt).await? else {
                return Ok(());
            };
            if answer.eq_ignore_ascii_case("reset") {
                let result = self.service.reset(id).await.map(|_| ());
                self.report(result).await?;
                continue;
            }

            match self.apply(id, view.step, &answer).await {
                Ok(()) => {}
                Err(WizardInput::Invalid(hint)) => self.say(&hint).await?,
                Err(WizardInput::Rejected(e)) => self.say(&e.user_message()).await?,
                Err(WizardInput::Fatal(e)) => return Err(e),
            }
        }
    }

    async fn report(&mut self, result: Result<(), ServiceError>) -> Result<(), CliError> {
        if let Err(e) = result {
            self.say(&e.user_message()).await?;
        }
        Ok(())
    }

    async fn apply(&mut self, id: SessionId, step: Step, answer: &str) -> Result<(), WizardInput> {
        let service = self.service;
        match step {
            Step::ChoosingType => {
                let kind = parse_choice(answer, &EmergencyKind::ALL)
                    .ok_or_else(|| WizardInput::Invalid("Please pick a number from the list.".into()))?;
                service.select_type(id, kind).await?;
            }
            Step::ChoosingLocationMethod => {
                let methods = [LocationMethod::Coordinates, LocationMethod::Address];
                let method = parse_choice(answer, &methods)
                    .ok_or_else(|| WizardInput::Invalid("Please answer 1 or 2.".into()))?;
                service.choose_location_method(id, method).await?;
            }
            Step::CapturingCoordinates => {
                let (latitude, longitude) = parse_coordinates(answer).ok_or_else(|| {
                    WizardInput::Invalid("Please enter latitude and longitude, e.g. 12.97, 77.59".into())
                })?;
                let next = service.submit_coordinates(id, latitude, longitude).await?;
                if next == Step::EnteringAddress {
                    self.say("⚠️ We could not look up an address for that location.")
                        .await
                        .map_err(WizardInput::Fatal)?;
                }
            }
            Step::EnteringAddress => {
                service.submit_address(id, answer).await?;
            }
            Step::CapturingAttachments => {
                let attachments = read_attachments(answer, Path::new("."))
                    .await
                    .map_err(|e| WizardInput::Invalid(format!("Could not read photo: {e}")))?;
                service.submit_attachments(id, attachments).await?;
            }
            Step::ReadyToSubmit => {
                if !matches!(answer.to_ascii_lowercase().as_str(), "yes" | "y" | "send") {
                    return Err(WizardInput::Invalid(
                        "Type 'send' to alert the emergency team.".into(),
                    ));
                }
                let report = service.confirm_submission(id).await?;
                if report.outcome == DispatchOutcome::Sent {
                    self.say("✅ Emergency alert sent.")
                        .await
                        .map_err(WizardInput::Fatal)?;
                    if report.attachments_failed > 0 {
                        let text = format!(
                            "{} of {} photos could not be delivered.",
                            report.attachments_failed, report.attachments_attempted
                        );
                        self.say(&text).await.map_err(WizardInput::Fatal)?;
                    }
                }
            }
            Step::Dispatched => {}
        }
        Ok(())
    }
}

enum WizardInput {
    Invalid(String),
    Rejected(ServiceError),
    Fatal(CliError),
}

impl From<ServiceError> for WizardInput {
    fn from(e: ServiceError) -> Self {
        WizardInput::Rejected(e)
    }
}

fn prompt_for(view: &SessionView) -> String {
    match view.step {
        Step::ChoosingType => {
            let mut prompt = String::from("What type of emergency?");
            for (index, kind) in EmergencyKind::ALL.iter().enumerate() {
                prompt.push_str(&format!("\n  {}. {}", index + 1, kind.label()));
            }
            prompt
        }
        Step::ChoosingLocationMethod => {
            "How do you want to share your location?\n  1. Coordinates\n  2. Address".into()
        }
        Step::CapturingCoordinates => "📍 Enter your coordinates (latitude, longitude):".into(),
        Step::EnteringAddress => match view.coordinates {
            Some(coordinates) => format!("🏠 Enter the address near {coordinates}:"),
            None => "🏠 Enter your address:".into(),
        },
        Step::CapturingAttachments => {
            "📷 Photo paths, separated by commas (leave empty to skip):".into()
        }
        Step::ReadyToSubmit => {
            let mut prompt = String::from("Ready to send:");
            if let Some(kind) = view.kind {
                prompt.push_str(&format!("\n  Type: {kind}"));
            }
            if let Some(coordinates) = view.coordinates {
                prompt.push_str(&format!("\n  Location: {coordinates}"));
            }
            if let Some(address) = &view.address_text {
                prompt.push_str(&format!("\n  Address: {address}"));
            }
            prompt.push_str(&format!("\n  Photos: {}", view.attachment_count));
            prompt.push_str("\nType 'send' to alert the emergency team.");
            prompt
        }
        Step::Dispatched => String::new(),
    }
}

pub fn render_status(status: &ResponseStatus) -> String {
    let mut text = format!(
        "🚑 Help is on the way. Estimated arrival: {} minutes.\n\nWhile you wait:",
        status.eta_minutes
    );
    for instruction in status.instructions {
        text.push_str(&format!("\n  • {instruction}"));
    }
    text.push_str(&format!(
        "\n\nIf the situation gets worse, call {}.",
        status.emergency_contact
    ));
    text
}

fn parse_choice<T: Copy>(answer: &str, options: &[T]) -> Option<T> {
    let index: usize = answer.parse().ok()?;
    options.get(index.checked_sub(1)?).copied()
}

pub(crate) fn parse_coordinates(answer: &str) -> Option<(f64, f64)> {
    let mut parts = answer
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty());
    let latitude = parts.next()?.parse().ok()?;
    let longitude = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((latitude, longitude))
}

/// Reads comma-separated photo paths relative to `base`.
pub(crate) async fn read_attachments(
    answer: &str,
    base: &Path,
) -> Result<Vec<Attachment>, std::io::Error> {
    let mut attachments = Vec::new();
    for path in answer.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let path = base.join(path);
        let data = tokio::fs::read(&path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        attachments.push(Attachment::new(file_name, data));
    }
    Ok(attachments)
}

//! Scripted sessions.
//!
//! A script is a YAML list of actions applied in order to one session:
//!
//! ```yaml
//! - select_type: chest_pain
//! - choose_location: coordinates
//! - coordinates: { latitude: 12.97, longitude: 77.59 }
//! - attachments: [scene.jpg]
//! - confirm
//! ```
//!
//! Rejected actions are reported and the script carries on, so a script can
//! demonstrate the rejections as well as the happy path.

use std::path::Path;

use livlina_core::prelude::{DispatchOutcome, EmergencyKind, LocationMethod, Step};
use livlina_engine::{IntakeService, SessionId};
use serde::Deserialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::error::CliError;
use crate::wizard::{read_attachments, render_status};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptAction {
    SelectType(EmergencyKind),
    ChooseLocation(LocationMethod),
    Coordinates { latitude: f64, longitude: f64 },
    Address(String),
    Attachments(Vec<String>),
    Confirm,
    Retry,
    Reset,
}

impl ScriptAction {
    fn name(&self) -> &'static str {
        match self {
            ScriptAction::SelectType(_) => "select_type",
            ScriptAction::ChooseLocation(_) => "choose_location",
            ScriptAction::Coordinates { .. } => "coordinates",
            ScriptAction::Address(_) => "address",
            ScriptAction::Attachments(_) => "attachments",
            ScriptAction::Confirm => "confirm",
            ScriptAction::Retry => "retry",
            ScriptAction::Reset => "reset",
        }
    }
}

/// Parses a script. Actions with an argument are single-key maps, the rest
/// are bare words.
pub fn parse_script(text: &str) -> Result<Vec<ScriptAction>, CliError> {
    let deserializer = serde_yaml::Deserializer::from_str(text);
    Ok(serde_yaml::with::singleton_map_recursive::deserialize(
        deserializer,
    )?)
}

/// Summary of a replay run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub final_step: Step,
    pub rejected: usize,
}

/// Replays `actions` against a fresh session. Attachment paths are resolved
/// against `base_dir`.
pub async fn replay<W: AsyncWrite + Unpin>(
    service: &IntakeService,
    actions: &[ScriptAction],
    base_dir: &Path,
    output: &mut W,
) -> Result<ReplaySummary, CliError> {
    let id = service.start_session().await;
    let mut rejected = 0;

    for (index, action) in actions.iter().enumerate() {
        debug!(index, action = action.name(), "Replaying action");
        let line = match apply(service, id, action, base_dir).await {
            Ok(step) => format!("{:>3}. {:<16} -> {}", index + 1, action.name(), step),
            Err(e) => {
                rejected += 1;
                format!("{:>3}. {:<16} !! {}", index + 1, action.name(), e)
            }
        };
        output.write_all(line.as_bytes()).await?;
        output.write_all(b"\n").await?;
    }

    let view = service.snapshot(id).await?;
    if view.dispatch_outcome == DispatchOutcome::Sent {
        if let Some(status) = &view.status {
            output.write_all(render_status(status).as_bytes()).await?;
            output.write_all(b"\n").await?;
        }
    }
    output.flush().await?;
    service.end_session(id);

    Ok(ReplaySummary {
        final_step: view.step,
        rejected,
    })
}

async fn apply(
    service: &IntakeService,
    id: SessionId,
    action: &ScriptAction,
    base_dir: &Path,
) -> Result<String, CliError> {
    let step = match action {
        ScriptAction::SelectType(kind) => service.select_type(id, *kind).await?,
        ScriptAction::ChooseLocation(method) => service.choose_location_method(id, *method).await?,
        ScriptAction::Coordinates {
            latitude,
            longitude,
        } => service.submit_coordinates(id, *latitude, *longitude).await?,
        ScriptAction::Address(text) => service.submit_address(id, text).await?,
        ScriptAction::Attachments(paths) => {
            let attachments = read_attachments(&paths.join(","), base_dir).await?;
            service.submit_attachments(id, attachments).await?
        }
        ScriptAction::Confirm => {
            let report = service.confirm_submission(id).await?;
            return Ok(format!(
                "{} ({:?}, {}/{} photos failed)",
                Step::Dispatched,
                report.outcome,
                report.attachments_failed,
                report.attachments_attempted
            ));
        }
        ScriptAction::Retry => service.retry(id).await?,
        ScriptAction::Reset => service.reset(id).await?,
    };
    Ok(step.to_string())
}

//! Intake steps and the static transition table.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Position of a session in the intake flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    ChoosingType,
    ChoosingLocationMethod,
    CapturingCoordinates,
    EnteringAddress,
    CapturingAttachments,
    ReadyToSubmit,
    Dispatched,
}

impl Step {
    /// Rank in the flow. The two location sub-steps share a rank except that
    /// the address step sits after the coordinate step, which is what makes
    /// the resolver fallback a forward move.
    pub fn rank(&self) -> u8 {
        match self {
            Step::ChoosingType => 0,
            Step::ChoosingLocationMethod => 1,
            Step::CapturingCoordinates => 2,
            Step::EnteringAddress => 3,
            Step::CapturingAttachments => 4,
            Step::ReadyToSubmit => 5,
            Step::Dispatched => 6,
        }
    }

    /// Whether `action` is listed for this step in [`TRANSITIONS`].
    pub fn permits(&self, action: Action) -> bool {
        action == Action::Reset
            || TRANSITIONS
                .iter()
                .any(|(step, allowed)| step == self && *allowed == action)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Step::Dispatched)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::ChoosingType => "choosing emergency type",
            Step::ChoosingLocationMethod => "choosing location method",
            Step::CapturingCoordinates => "capturing coordinates",
            Step::EnteringAddress => "entering address",
            Step::CapturingAttachments => "capturing attachments",
            Step::ReadyToSubmit => "ready to submit",
            Step::Dispatched => "dispatched",
        };
        f.write_str(name)
    }
}

/// Operations a caller can request on a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    SelectType,
    ChooseLocationMethod,
    SubmitCoordinates,
    SubmitAddress,
    SubmitAttachments,
    ConfirmSubmission,
    Retry,
    Reset,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::SelectType => "select type",
            Action::ChooseLocationMethod => "choose location method",
            Action::SubmitCoordinates => "submit coordinates",
            Action::SubmitAddress => "submit address",
            Action::SubmitAttachments => "submit attachments",
            Action::ConfirmSubmission => "confirm submission",
            Action::Retry => "retry dispatch",
            Action::Reset => "reset",
        };
        f.write_str(name)
    }
}

/// Every (step, action) pair the machine accepts, apart from `Reset` which
/// is accepted everywhere. Anything not listed is an invalid transition.
pub const TRANSITIONS: &[(Step, Action)] = &[
    (Step::ChoosingType, Action::SelectType),
    (Step::ChoosingLocationMethod, Action::ChooseLocationMethod),
    (Step::CapturingCoordinates, Action::SubmitCoordinates),
    (Step::EnteringAddress, Action::SubmitAddress),
    (Step::CapturingAttachments, Action::SubmitAttachments),
    (Step::ReadyToSubmit, Action::ConfirmSubmission),
    (Step::Dispatched, Action::Retry),
];

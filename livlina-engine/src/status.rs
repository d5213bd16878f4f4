//! Response status shown to the reporter once the alert is out.

use livlina_config::EtaWindow;
use rand::Rng;

pub const SAFETY_INSTRUCTIONS: [&str; 5] = [
    "Stay calm and remain in your current location",
    "Keep your phone nearby for updates",
    "Gather any relevant medical documents",
    "Clear the path for emergency responders",
    "If possible, have someone wait outside to guide the team",
];

/// Estimated arrival plus static guidance. The ETA is synthetic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseStatus {
    pub eta_minutes: u32,
    pub instructions: &'static [&'static str],
    pub emergency_contact: String,
}

impl ResponseStatus {
    pub fn generate<R: Rng>(
        rng: &mut R,
        eta: EtaWindow,
        emergency_contact: impl Into<String>,
    ) -> Self {
        let (low, high) = if eta.min_minutes <= eta.max_minutes {
            (eta.min_minutes, eta.max_minutes)
        } else {
            (eta.max_minutes, eta.min_minutes)
        };
        Self {
            eta_minutes: rng.random_range(low..=high),
            instructions: &SAFETY_INSTRUCTIONS,
            emergency_contact: emergency_contact.into(),
        }
    }
}

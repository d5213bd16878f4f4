//! ## livlina-core::report
//! **The emergency record assembled during intake**
//!
//! A record is built up step by step by the intake machine and frozen once
//! it is confirmed. Location is carried either as a coordinate pair, a
//! free-text address, or both when coordinates were resolved (or the
//! resolver fell back to manual entry).

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::IntakeError;

/// Kind of emergency reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergencyKind {
    MedicalEmergency,
    Accident,
    ChestPain,
    Pregnancy,
}

impl EmergencyKind {
    pub const ALL: [EmergencyKind; 4] = [
        EmergencyKind::MedicalEmergency,
        EmergencyKind::Accident,
        EmergencyKind::ChestPain,
        EmergencyKind::Pregnancy,
    ];

    /// Human-readable label used in alerts and prompts.
    pub fn label(&self) -> &'static str {
        match self {
            EmergencyKind::MedicalEmergency => "Medical Emergency",
            EmergencyKind::Accident => "Accident",
            EmergencyKind::ChestPain => "Heart/Chest Pain",
            EmergencyKind::Pregnancy => "Pregnancy",
        }
    }
}

impl fmt::Display for EmergencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How the reporter chose to disclose their location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationSource {
    #[default]
    None,
    Coordinates,
    Address,
}

/// Location methods a reporter may pick. `LocationSource::None` is only the
/// initial value and never a valid choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationMethod {
    Coordinates,
    Address,
}

impl From<LocationMethod> for LocationSource {
    fn from(method: LocationMethod) -> Self {
        match method {
            LocationMethod::Coordinates => LocationSource::Coordinates,
            LocationMethod::Address => LocationSource::Address,
        }
    }
}

/// A validated WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Builds a coordinate pair, rejecting values outside the valid ranges
    /// (and NaN, which fails every range check).
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, IntakeError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(IntakeError::Validation(format!(
                "latitude {latitude} outside [-90, 90]"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(IntakeError::Validation(format!(
                "longitude {longitude} outside [-180, 180]"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

/// A photo supplied by the reporter. Content checks happen at the
/// presentation boundary; the core only carries the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub data: Bytes,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            data: data.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Result of handing a record to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    #[default]
    Pending,
    Sent,
    Failed,
}

/// The record under construction for one session.
#[derive(Debug, Clone, Default)]
pub struct EmergencyReport {
    pub(crate) kind: Option<EmergencyKind>,
    pub(crate) location_source: LocationSource,
    pub(crate) coordinates: Option<Coordinates>,
    pub(crate) address_text: Option<String>,
    pub(crate) attachments: Vec<Attachment>,
    pub(crate) created_at: Option<DateTime<Utc>>,
    pub(crate) dispatch_outcome: DispatchOutcome,
}

impl EmergencyReport {
    pub fn kind(&self) -> Option<EmergencyKind> {
        self.kind
    }

    pub fn location_source(&self) -> LocationSource {
        self.location_source
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    pub fn address_text(&self) -> Option<&str> {
        self.address_text.as_deref()
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Submission time; `None` until the record is confirmed.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn dispatch_outcome(&self) -> DispatchOutcome {
        self.dispatch_outcome
    }

    /// Copy of the collected fields with submission state cleared. Used to
    /// open a fresh record after a failed dispatch.
    pub(crate) fn reopened(&self) -> Self {
        Self {
            kind: self.kind,
            location_source: self.location_source,
            coordinates: self.coordinates,
            address_text: self.address_text.clone(),
            attachments: self.attachments.clone(),
            created_at: None,
            dispatch_outcome: DispatchOutcome::Pending,
        }
    }
}

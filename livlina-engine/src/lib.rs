//! # livlina-engine
//!
//! Hosting layer around the intake core. Keeps one session per reporter,
//! serializes calls on it, and adds what the presentation needs on top of
//! the core transitions: attachment checks, metrics and the response status
//! shown after an alert went out.

mod attachments;
mod bootstrap;
mod error;
mod service;
mod session;
mod status;

pub use attachments::{AttachmentPolicy, ImageFormat};
pub use bootstrap::build_service;
pub use error::ServiceError;
pub use service::{IntakeService, ServiceSettings, SessionView};
pub use session::{SessionId, SessionStore};
pub use status::{ResponseStatus, SAFETY_INSTRUCTIONS};

pub mod prelude {
    pub use super::{
        build_service, AttachmentPolicy, IntakeService, ResponseStatus, ServiceError,
        ServiceSettings, SessionId, SessionView,
    };
}

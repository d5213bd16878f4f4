//! # livlina-core
//!
//! Emergency intake state machine and alert dispatch protocol.
//!
//! The core knows nothing about transports or page rendering. It owns:
//! - `intake`: the step-by-step disclosure flow with required-field gating
//! - `dispatch`: the fail-fast / best-effort alert delivery policy
//! - `channel` and `resolver`: the narrow interfaces to the outside world
//! - `report`: the record that flows between them
//!
//! A hosting layer keeps one [`intake::IntakeSession`] per reporter and
//! serializes calls on it.

pub mod channel;
pub mod dispatch;
pub mod error;
pub mod intake;
pub mod report;
pub mod resolver;
pub mod time;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub mod prelude {
    pub use crate::channel::{Ack, ChannelError, NotificationChannel};
    pub use crate::dispatch::{AlertDispatcher, DispatchReport, DispatchSettings};
    pub use crate::error::IntakeError;
    pub use crate::intake::{Action, IntakeSession, Step};
    pub use crate::report::{
        Attachment, Coordinates, DispatchOutcome, EmergencyKind, EmergencyReport, LocationMethod,
        LocationSource,
    };
    pub use crate::resolver::{AddressResolver, Resolution, ResolverError};
    pub use crate::time::{Clock, ManualClock, SystemClock};
}

pub use error::IntakeError;

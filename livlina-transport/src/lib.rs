//! # livlina-transport
//!
//! Concrete implementations of the core's outbound interfaces:
//! - [`TelegramChannel`]: bot-API notification channel over HTTPS
//! - [`LogChannel`]: dry-run channel writing alerts to the log
//! - [`NominatimResolver`]: reverse geocoding over HTTPS
//! - [`DisabledResolver`]: always unavailable, forcing manual address entry

pub mod log_channel;
pub mod nominatim;
pub mod telegram;

pub use log_channel::LogChannel;
pub use nominatim::{DisabledResolver, NominatimResolver};
pub use telegram::TelegramChannel;

//! # Livlina Telemetry
//!
//! Logging initialisation and Prometheus metrics for intake and dispatch.

pub mod logging;
pub mod metrics;

pub use logging::EventLogger;
pub use metrics::MetricsRecorder;

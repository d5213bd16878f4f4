//! Structured logging with tracing and OpenTelemetry attributes.

use opentelemetry::KeyValue;
use tracing::{info_span, Instrument};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Install the global fmt subscriber.
    ///
    /// `RUST_LOG` wins over `default_filter`. Returns `false` when a
    /// subscriber was already installed (e.g. by a test harness).
    pub fn init(default_filter: &str) -> bool {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new(default_filter)),
            )
            .with_thread_names(true)
            .with_span_events(FmtSpan::ENTER)
            .with_writer(std::io::stderr)
            .try_init()
            .is_ok()
    }

    pub async fn log_event(event_type: &str, metadata: Vec<KeyValue>) {
        let span = info_span!(
            "intake_event",
            event_type = event_type,
            otel.kind = "INTERNAL"
        );

        async {
            tracing::info!(metadata = ?metadata, "Intake event recorded");
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[traced_test]
    #[test]
    fn test_logging() {
        tokio::runtime::Runtime::new()
            .unwrap()
            .block_on(EventLogger::log_event(
                "alert_dispatched",
                vec![KeyValue::new("outcome", "Sent")],
            ));
        assert!(logs_contain("Intake event recorded"));
        assert!(logs_contain("outcome"));
    }
}

//! Prometheus counters and the dispatch latency histogram.

use prometheus::{Counter, Histogram, HistogramOpts, Registry};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub sessions_started: Counter,
    pub alerts_sent: Counter,
    pub alerts_failed: Counter,
    pub attachment_failures: Counter,
    pub resolver_fallbacks: Counter,
    pub dispatch_latency: Histogram,
}

impl MetricsRecorder {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let sessions_started = Counter::new(
            "livlina_sessions_started_total",
            "Intake sessions opened",
        )?;
        let alerts_sent = Counter::new(
            "livlina_alerts_sent_total",
            "Alerts whose primary message was delivered",
        )?;
        let alerts_failed = Counter::new(
            "livlina_alerts_failed_total",
            "Alerts whose primary message could not be delivered",
        )?;
        let attachment_failures = Counter::new(
            "livlina_attachment_failures_total",
            "Photos that failed to reach the monitoring channel",
        )?;
        let resolver_fallbacks = Counter::new(
            "livlina_resolver_fallbacks_total",
            "Coordinate submissions that fell back to manual address entry",
        )?;
        let dispatch_latency = Histogram::with_opts(
            HistogramOpts::new(
                "livlina_dispatch_latency_seconds",
                "Time spent dispatching one alert",
            )
            .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        )?;

        registry.register(Box::new(sessions_started.clone()))?;
        registry.register(Box::new(alerts_sent.clone()))?;
        registry.register(Box::new(alerts_failed.clone()))?;
        registry.register(Box::new(attachment_failures.clone()))?;
        registry.register(Box::new(resolver_fallbacks.clone()))?;
        registry.register(Box::new(dispatch_latency.clone()))?;

        Ok(Self {
            registry,
            sessions_started,
            alerts_sent,
            alerts_failed,
            attachment_failures,
            resolver_fallbacks,
            dispatch_latency,
        })
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    pub fn record_dispatch(&self, sent: bool, attachments_failed: usize, seconds: f64) {
        if sent {
            self.alerts_sent.inc();
        } else {
            self.alerts_failed.inc();
        }
        self.attachment_failures.inc_by(attachments_failed as f64);
        self.dispatch_latency.observe(seconds);
    }
}

//! Wires an [`IntakeService`] from configuration.

use std::sync::Arc;
use std::time::Duration;

use livlina_config::LivlinaConfig;
use livlina_core::prelude::{AddressResolver, NotificationChannel, SystemClock};
use livlina_telemetry::MetricsRecorder;
use livlina_transport::{DisabledResolver, LogChannel, NominatimResolver, TelegramChannel};
use tracing::{info, warn};

use crate::service::{IntakeService, ServiceSettings};
use crate::ServiceError;

const DRY_RUN_RECIPIENT: &str = "dry-run";

/// Builds the service for `config`.
///
/// With `dry_run` alerts go to the log and no bot credentials are needed.
/// Otherwise the token and recipient must be configured.
pub fn build_service(config: &LivlinaConfig, dry_run: bool) -> Result<IntakeService, ServiceError> {
    let (channel, recipient): (Arc<dyn NotificationChannel>, String) = if dry_run {
        info!("Dry run: alerts are written to the log");
        let recipient = config
            .channel
            .recipient
            .clone()
            .unwrap_or_else(|| DRY_RUN_RECIPIENT.to_string());
        (Arc::new(LogChannel::new()), recipient)
    } else {
        let credentials = config.channel.credentials()?;
        let channel = TelegramChannel::with_timeout(
            &config.channel.api_base,
            credentials.bot_token,
            Duration::from_secs(config.channel.request_timeout_secs),
        )?
        .with_parse_mode(config.channel.parse_mode.clone());
        (Arc::new(channel), credentials.recipient.to_string())
    };

    let resolver: Arc<dyn AddressResolver> = if config.resolver.enabled {
        Arc::new(NominatimResolver::new(
            &config.resolver.endpoint,
            &config.resolver.user_agent,
            config.resolver.timeout(),
        )?)
    } else {
        warn!("Reverse geocoding disabled; coordinates need a manual address");
        Arc::new(DisabledResolver)
    };

    let metrics = Arc::new(MetricsRecorder::new()?);
    Ok(IntakeService::new(
        channel,
        resolver,
        Arc::new(SystemClock),
        metrics,
        ServiceSettings::from_config(config, &recipient),
    ))
}

//! Reverse geocoding against a Nominatim-compatible endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use livlina_core::report::Coordinates;
use livlina_core::resolver::{AddressResolver, ResolverError};

pub const DEFAULT_ENDPOINT: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_USER_AGENT: &str = concat!("livlina/", env!("CARGO_PKG_VERSION"));

#[derive(Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Resolver calling `GET {endpoint}/reverse?format=jsonv2&lat=..&lon=..`.
///
/// The HTTP client carries its own timeout as a backstop; the intake machine
/// applies the caller's tighter bound on top.
#[derive(Debug, Clone)]
pub struct NominatimResolver {
    http: reqwest::Client,
    endpoint: String,
}

impl NominatimResolver {
    pub fn new(endpoint: &str, user_agent: &str, timeout: Duration) -> Result<Self, ResolverError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| ResolverError::Request(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl AddressResolver for NominatimResolver {
    async fn reverse_geocode(&self, coordinates: Coordinates) -> Result<String, ResolverError> {
        let response = self
            .http
            .get(format!("{}/reverse", self.endpoint))
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", coordinates.latitude().to_string()),
                ("lon", coordinates.longitude().to_string()),
            ])
            .send()
            .await
            .map_err(|e| ResolverError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ResolverError::Request(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let body: ReverseResponse = response
            .json()
            .await
            .map_err(|e| ResolverError::Request(e.to_string()))?;

        if let Some(error) = body.error {
            debug!(%coordinates, "Resolver found nothing: {error}");
            return Err(ResolverError::NotFound);
        }
        body.display_name
            .filter(|name| !name.trim().is_empty())
            .ok_or(ResolverError::NotFound)
    }
}

/// Resolver used when reverse geocoding is switched off. Every lookup
/// fails, which sends reporters straight to manual address entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledResolver;

#[async_trait]
impl AddressResolver for DisabledResolver {
    async fn reverse_geocode(&self, _coordinates: Coordinates) -> Result<String, ResolverError> {
        Err(ResolverError::Unavailable)
    }
}

//! Reverse geocoding boundary.
//!
//! Resolution is best-effort. Whatever goes wrong inside a resolver, the
//! intake machine only ever sees [`Resolution::Unresolved`].

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::report::Coordinates;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolverError {
    #[error("Resolver unavailable")]
    Unavailable,

    #[error("Resolver request failed: {0}")]
    Request(String),

    #[error("No address found for the given coordinates")]
    NotFound,
}

/// Converts a coordinate pair into a readable address.
#[async_trait]
pub trait AddressResolver: Send + Sync {
    async fn reverse_geocode(&self, coordinates: Coordinates) -> Result<String, ResolverError>;
}

/// Outcome of a bounded resolution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(String),
    Unresolved,
}

/// Runs the resolver under `timeout`. Expiry, errors and blank answers all
/// collapse into `Unresolved`.
pub async fn resolve_bounded(
    resolver: &dyn AddressResolver,
    coordinates: Coordinates,
    timeout: Duration,
) -> Resolution {
    match tokio::time::timeout(timeout, resolver.reverse_geocode(coordinates)).await {
        Ok(Ok(address)) if !address.trim().is_empty() => {
            debug!(%coordinates, "Coordinates resolved");
            Resolution::Resolved(address.trim().to_string())
        }
        Ok(Ok(_)) => {
            warn!(%coordinates, "Resolver returned an empty address");
            Resolution::Unresolved
        }
        Ok(Err(e)) => {
            warn!(%coordinates, "Reverse geocoding failed: {e}");
            Resolution::Unresolved
        }
        Err(_) => {
            warn!(%coordinates, ?timeout, "Reverse geocoding timed out");
            Resolution::Unresolved
        }
    }
}

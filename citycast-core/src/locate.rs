//! One-shot position lookup with a fallback city.

use async_trait::async_trait;

use crate::{
    error::{LocationError, LookupError},
    model::{Coordinates, LookupTarget, WeatherSnapshot},
    saved::CitySlot,
    workflow::RefreshWorkflow,
};

pub const DEFAULT_FALLBACK_CITY: &str = "London";

/// Source of the user's position. Each call is a single request with a
/// single answer; there is no continuous watch.
#[async_trait]
pub trait Locator: Send + Sync {
    async fn locate(&self) -> Result<Coordinates, LocationError>;
}

/// Always answers with the same coordinates.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocator(pub Coordinates);

#[async_trait]
impl Locator for FixedLocator {
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        Ok(self.0)
    }
}

/// Stands in when no positioning capability exists.
#[derive(Debug, Clone, Copy)]
pub struct UnavailableLocator(pub LocationError);

impl Default for UnavailableLocator {
    fn default() -> Self {
        Self(LocationError::Unsupported)
    }
}

#[async_trait]
impl Locator for UnavailableLocator {
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        Err(self.0)
    }
}

#[derive(Debug)]
pub struct HereOutcome {
    pub snapshot: WeatherSnapshot,
    /// Set when the fallback city was used instead of the position.
    pub notice: Option<String>,
}

/// Weather for the current position, falling back to `fallback_city` when no
/// position can be obtained. Nothing is saved.
pub async fn lookup_here<S: CitySlot>(
    workflow: &RefreshWorkflow<S>,
    locator: &dyn Locator,
    fallback_city: &str,
) -> Result<HereOutcome, LookupError> {
    match locator.locate().await {
        Ok(coords) => {
            tracing::debug!(latitude = coords.latitude, longitude = coords.longitude, "position acquired");
            let snapshot = workflow.lookup_target(LookupTarget::Coordinates(coords)).await?;
            Ok(HereOutcome { snapshot, notice: None })
        }
        Err(cause) => {
            tracing::warn!(%cause, fallback_city, "position unavailable, using fallback city");
            let notice = format!("{cause} Loading weather for {fallback_city} as fallback.");

            match workflow.lookup(fallback_city).await {
                Ok(snapshot) => Ok(HereOutcome { snapshot, notice: Some(notice) }),
                Err(e) => {
                    tracing::warn!(error = %e, "fallback lookup failed");
                    Err(LookupError::GeolocationUnavailable(cause))
                }
            }
        }
    }
}

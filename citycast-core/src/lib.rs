//! Core library for the `citycast` weather client.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Abstraction over weather providers (weatherapi.com, OpenWeather)
//! - The persisted list of saved cities
//! - The refresh workflow that looks up weather for saved and searched cities
//! - Unit-aware display projections
//!
//! It is used by `citycast-cli`, but can also be reused by other front ends.

pub mod config;
pub mod display;
pub mod error;
pub mod locate;
pub mod model;
pub mod provider;
pub mod saved;
pub mod units;
pub mod workflow;

pub use config::{Config, ProviderConfig};
pub use error::{ErrorKind, LocationError, LookupError};
pub use locate::{FixedLocator, HereOutcome, Locator, UnavailableLocator, lookup_here};
pub use model::{
    CityIdentifier, Coordinates, LookupTarget, WeatherRequest, WeatherSnapshot,
};
pub use provider::{ProviderId, WeatherProvider};
pub use saved::{CitySlot, FileSlot, MemorySlot, SavedCities};
pub use units::TemperatureUnit;
pub use workflow::{FailurePolicy, RefreshMode, RefreshOutcome, RefreshWorkflow};

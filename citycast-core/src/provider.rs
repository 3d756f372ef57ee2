use crate::{
    Config, LookupError, WeatherRequest, WeatherSnapshot,
    provider::{openweather::OpenWeatherProvider, weatherapi::WeatherApiProvider},
    units::TemperatureUnit,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt::Debug, sync::Arc};

pub mod openweather;
pub mod weatherapi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    WeatherApi,
    OpenWeather,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::WeatherApi => "weatherapi",
            ProviderId::OpenWeather => "openweather",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::WeatherApi, ProviderId::OpenWeather]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "weatherapi" => Ok(ProviderId::WeatherApi),
            "openweather" => Ok(ProviderId::OpenWeather),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: weatherapi, openweather."
            )),
        }
    }
}

/// A remote weather service. One call is one network round trip (or two for
/// providers that split current and forecast data); nothing is cached.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    async fn lookup(&self, request: &WeatherRequest) -> Result<WeatherSnapshot, LookupError>;
}

/// Construct a provider from config and explicit ProviderId.
///
/// `unit` is only consulted by providers that convert server-side.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
    unit: TemperatureUnit,
) -> Result<Arc<dyn WeatherProvider>, LookupError> {
    let api_key =
        config.provider_api_key(id).ok_or(LookupError::ConfigurationMissing { provider: id })?;
    let base_url = config.provider_base_url(id);

    let provider: Arc<dyn WeatherProvider> = match id {
        ProviderId::WeatherApi => {
            let p = WeatherApiProvider::new(api_key.to_owned());
            Arc::new(match base_url {
                Some(url) => p.with_base_url(url),
                None => p,
            })
        }
        ProviderId::OpenWeather => {
            let p = OpenWeatherProvider::new(api_key.to_owned(), unit);
            Arc::new(match base_url {
                Some(url) => p.with_base_url(url),
                None => p,
            })
        }
    };

    tracing::debug!(provider = %id, "weather provider constructed");
    Ok(provider)
}

/// Construct the default provider from config, using `default_provider` field.
pub fn default_provider_from_config(
    config: &Config,
    unit: TemperatureUnit,
) -> Result<Arc<dyn WeatherProvider>, LookupError> {
    provider_from_config(config.default_provider_id(), config, unit)
}

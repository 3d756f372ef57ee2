use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::LookupError,
    model::{
        Condition, CurrentConditions, ForecastDay, Temperature, WeatherRequest, WeatherSnapshot,
    },
};

use super::{ProviderId, WeatherProvider};

const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com";

/// weatherapi.com. A single `forecast.json` call returns current conditions
/// and the daily forecast in both metric and imperial units.
#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String) -> Self {
        Self { api_key, base_url: DEFAULT_BASE_URL.to_string(), http: Client::new() }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn fetch_forecast(&self, request: &WeatherRequest) -> Result<WeatherSnapshot, LookupError> {
        let url = format!("{}/v1/forecast.json", self.base_url);
        let query = request.target.query();
        let days = request.days.to_string();

        tracing::debug!(%query, days = request.days, "requesting weatherapi forecast");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", query.as_str()),
                ("days", days.as_str()),
                ("aqi", "no"),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            tracing::warn!(%query, %status, "weatherapi request failed");
            return Err(LookupError::from_status(status, &query, &body));
        }

        let parsed: WaForecastResponse = serde_json::from_str(&body)
            .map_err(|e| LookupError::Parse(format!("weatherapi forecast JSON: {e}")))?;

        Ok(parsed.into_snapshot())
    }
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    name: String,
    country: String,
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
    icon: String,
}

impl From<WaCondition> for Condition {
    fn from(c: WaCondition) -> Self {
        Condition { text: c.text, icon: c.icon }
    }
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    temp_f: f64,
    humidity: u8,
    wind_kph: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaDay {
    maxtemp_c: f64,
    maxtemp_f: f64,
    mintemp_c: f64,
    mintemp_f: f64,
    avghumidity: f64,
    maxwind_kph: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    date: NaiveDate,
    day: WaDay,
}

#[derive(Debug, Deserialize, Default)]
struct WaForecast {
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaForecastResponse {
    location: WaLocation,
    current: WaCurrent,
    #[serde(default)]
    forecast: WaForecast,
}

impl WaForecastResponse {
    fn into_snapshot(self) -> WeatherSnapshot {
        let forecast = self
            .forecast
            .forecastday
            .into_iter()
            .map(|fd| ForecastDay {
                date: fd.date,
                max: Temperature { celsius: fd.day.maxtemp_c, fahrenheit: fd.day.maxtemp_f },
                min: Temperature { celsius: fd.day.mintemp_c, fahrenheit: fd.day.mintemp_f },
                avg_humidity_pct: fd.day.avghumidity.round().clamp(0.0, 100.0) as u8,
                max_wind_kph: fd.day.maxwind_kph,
                condition: fd.day.condition.into(),
            })
            .collect();

        WeatherSnapshot {
            provider: ProviderId::WeatherApi.to_string(),
            city: self.location.name,
            country: self.location.country,
            current: CurrentConditions {
                temperature: Temperature {
                    celsius: self.current.temp_c,
                    fahrenheit: self.current.temp_f,
                },
                humidity_pct: self.current.humidity,
                wind_kph: self.current.wind_kph,
                condition: self.current.condition.into(),
            },
            forecast,
            fetched_at: Utc::now(),
        }
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::WeatherApi
    }

    async fn lookup(&self, request: &WeatherRequest) -> Result<WeatherSnapshot, LookupError> {
        self.fetch_forecast(request).await
    }
}

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Timelike, Utc};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    error::LookupError,
    model::{
        Condition, CurrentConditions, ForecastDay, LookupTarget, Temperature, WeatherRequest,
        WeatherSnapshot,
    },
    units::{TemperatureUnit, c_to_f, f_to_c, mph_to_kph, mps_to_kph},
};

use super::{ProviderId, WeatherProvider};

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// The free 3-hourly forecast covers five days.
const MAX_DAYS: usize = 5;

/// OpenWeather. Values come back in one unit system only, selected by the
/// `units` parameter; the other unit is derived locally.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    unit: TemperatureUnit,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, unit: TemperatureUnit) -> Self {
        Self { api_key, unit, base_url: DEFAULT_BASE_URL.to_string(), http: Client::new() }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn location_params(target: &LookupTarget) -> Vec<(&'static str, String)> {
        match target {
            LookupTarget::City(name) => vec![("q", name.clone())],
            LookupTarget::Coordinates(c) => {
                vec![("lat", c.latitude.to_string()), ("lon", c.longitude.to_string())]
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        target: &LookupTarget,
    ) -> Result<T, LookupError> {
        let url = format!("{}/data/2.5/{endpoint}", self.base_url);
        let mut params = Self::location_params(target);
        params.push(("appid", self.api_key.clone()));
        params.push(("units", self.unit.api_units().to_string()));

        tracing::debug!(query = %target, endpoint, units = self.unit.api_units(), "requesting openweather");

        let res = self.http.get(&url).query(&params).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            tracing::warn!(query = %target, endpoint, %status, "openweather request failed");
            return Err(LookupError::from_status(status, &target.query(), &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| LookupError::Parse(format!("openweather {endpoint} JSON: {e}")))
    }

    fn temperature(&self, value: f64) -> Temperature {
        match self.unit {
            TemperatureUnit::Celsius => Temperature { celsius: value, fahrenheit: c_to_f(value) },
            TemperatureUnit::Fahrenheit => {
                Temperature { celsius: f_to_c(value), fahrenheit: value }
            }
        }
    }

    /// Metric wind is m/s, imperial is mph.
    fn wind_kph(&self, value: f64) -> f64 {
        match self.unit {
            TemperatureUnit::Celsius => mps_to_kph(value),
            TemperatureUnit::Fahrenheit => mph_to_kph(value),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    temp_min: f64,
    temp_max: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    sys: OwSys,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    #[serde(default)]
    timezone: i64,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: OwCity,
    list: Vec<OwForecastEntry>,
}

fn condition(weather: &[OwWeather]) -> Condition {
    weather
        .first()
        .map(|w| Condition {
            text: w.description.clone(),
            icon: format!("https://openweathermap.org/img/wn/{}@2x.png", w.icon),
        })
        .unwrap_or_else(|| Condition { text: "Unknown".to_string(), icon: String::new() })
}

/// Collapses 3-hourly entries into calendar days in the city's local time.
/// Raw values stay in the requested unit; conversion happens afterwards.
struct DailyAggregate<'a> {
    date: NaiveDate,
    max: f64,
    min: f64,
    humidity_sum: u32,
    samples: u32,
    max_wind: f64,
    /// Entry closest to local noon and its distance in hours.
    noon: (u32, &'a [OwWeather]),
}

impl DailyAggregate<'_> {
    fn mean_humidity(&self) -> u8 {
        let mean = f64::from(self.humidity_sum) / f64::from(self.samples.max(1));
        mean.round().clamp(0.0, 100.0) as u8
    }
}

fn aggregate_days(response: &OwForecastResponse, limit: usize) -> Vec<DailyAggregate<'_>> {
    let mut days: BTreeMap<NaiveDate, DailyAggregate<'_>> = BTreeMap::new();

    for entry in &response.list {
        let Some(local) = DateTime::<Utc>::from_timestamp(entry.dt + response.city.timezone, 0)
        else {
            continue;
        };
        let date = local.date_naive();
        let from_noon = local.hour().abs_diff(12);

        let day = days.entry(date).or_insert_with(|| DailyAggregate {
            date,
            max: f64::MIN,
            min: f64::MAX,
            humidity_sum: 0,
            samples: 0,
            max_wind: 0.0,
            noon: (u32::MAX, entry.weather.as_slice()),
        });

        day.max = day.max.max(entry.main.temp_max);
        day.min = day.min.min(entry.main.temp_min);
        day.humidity_sum += u32::from(entry.main.humidity);
        day.samples += 1;
        day.max_wind = day.max_wind.max(entry.wind.speed);
        if from_noon < day.noon.0 {
            day.noon = (from_noon, entry.weather.as_slice());
        }
    }

    days.into_values().take(limit).collect()
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeather
    }

    async fn lookup(&self, request: &WeatherRequest) -> Result<WeatherSnapshot, LookupError> {
        let current: OwCurrentResponse = self.get_json("weather", &request.target).await?;
        let forecast: OwForecastResponse = self.get_json("forecast", &request.target).await?;

        let limit = usize::from(request.days).min(MAX_DAYS);
        let days = aggregate_days(&forecast, limit)
            .into_iter()
            .map(|d| ForecastDay {
                date: d.date,
                max: self.temperature(d.max),
                min: self.temperature(d.min),
                avg_humidity_pct: d.mean_humidity(),
                max_wind_kph: self.wind_kph(d.max_wind),
                condition: condition(d.noon.1),
            })
            .collect();

        Ok(WeatherSnapshot {
            provider: ProviderId::OpenWeather.to_string(),
            city: current.name,
            country: current.sys.country,
            current: CurrentConditions {
                temperature: self.temperature(current.main.temp),
                humidity_pct: current.main.humidity,
                wind_kph: self.wind_kph(current.wind.speed),
                condition: condition(&current.weather),
            },
            forecast: days,
            fetched_at: Utc::now(),
        })
    }
}

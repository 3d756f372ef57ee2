use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::units::TemperatureUnit;

/// Canonical city name as reported by the provider.
pub type CityIdentifier = String;

/// Forecast horizon supported by the free weatherapi.com plan.
pub const MAX_FORECAST_DAYS: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// What to look up: free-text city query or a position.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupTarget {
    City(String),
    Coordinates(Coordinates),
}

impl LookupTarget {
    /// Value of the provider's `q` parameter.
    pub fn query(&self) -> String {
        match self {
            LookupTarget::City(name) => name.clone(),
            LookupTarget::Coordinates(c) => format!("{},{}", c.latitude, c.longitude),
        }
    }
}

impl fmt::Display for LookupTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.query())
    }
}

#[derive(Debug, Clone)]
pub struct WeatherRequest {
    pub target: LookupTarget,
    pub days: u8,
}

impl WeatherRequest {
    pub fn city(name: impl Into<String>, days: u8) -> Self {
        Self { target: LookupTarget::City(name.into()), days: clamp_days(days) }
    }

    pub fn coordinates(coords: Coordinates, days: u8) -> Self {
        Self { target: LookupTarget::Coordinates(coords), days: clamp_days(days) }
    }
}

pub fn clamp_days(days: u8) -> u8 {
    days.clamp(1, MAX_FORECAST_DAYS)
}

/// A temperature carried in both supported units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    pub celsius: f64,
    pub fahrenheit: f64,
}

impl Temperature {
    pub fn in_unit(&self, unit: TemperatureUnit) -> f64 {
        match unit {
            TemperatureUnit::Celsius => self.celsius,
            TemperatureUnit::Fahrenheit => self.fahrenheit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub text: String,
    /// Icon reference as provided by the API (usually a URL).
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature: Temperature,
    pub humidity_pct: u8,
    pub wind_kph: f64,
    pub condition: Condition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub max: Temperature,
    pub min: Temperature,
    pub avg_humidity_pct: u8,
    pub max_wind_kph: f64,
    pub condition: Condition,
}

/// Current conditions plus forecast for one city, fetched fresh per lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub provider: String,
    pub city: CityIdentifier,
    pub country: String,
    pub current: CurrentConditions,
    pub forecast: Vec<ForecastDay>,
    pub fetched_at: DateTime<Utc>,
}

use serde::{Deserialize, Serialize};

/// Session-scoped temperature unit preference.
///
/// Only affects how an already-fetched snapshot is displayed, except for the
/// OpenWeather provider which asks the API for values in this unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn toggle(self) -> Self {
        match self {
            TemperatureUnit::Celsius => TemperatureUnit::Fahrenheit,
            TemperatureUnit::Fahrenheit => TemperatureUnit::Celsius,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }

    /// Value of the `units` query parameter understood by OpenWeather.
    pub fn api_units(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "metric",
            TemperatureUnit::Fahrenheit => "imperial",
        }
    }
}

pub fn c_to_f(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

pub fn f_to_c(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

const KM_PER_MILE: f64 = 1.609_344;

pub fn mph_to_kph(mph: f64) -> f64 {
    mph * KM_PER_MILE
}

pub fn mps_to_kph(mps: f64) -> f64 {
    mps * 3.6
}

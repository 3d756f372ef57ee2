//! Unit-aware views over a fetched snapshot. Switching units only re-projects
//! the snapshot already in memory.

use chrono::NaiveDate;

use crate::{
    model::{ForecastDay, WeatherSnapshot},
    units::TemperatureUnit,
};

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentView {
    pub city: String,
    pub country: String,
    pub temperature: i64,
    pub unit_symbol: &'static str,
    pub humidity_pct: u8,
    pub wind_kph: i64,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayView {
    pub date: NaiveDate,
    pub max: i64,
    pub min: i64,
    pub unit_symbol: &'static str,
    pub humidity_pct: u8,
    pub wind_kph: i64,
    pub description: String,
    pub icon: String,
}

/// Halves round towards positive infinity, so -0.5 shows as 0.
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

pub fn current_view(snapshot: &WeatherSnapshot, unit: TemperatureUnit) -> CurrentView {
    let current = &snapshot.current;
    CurrentView {
        city: snapshot.city.clone(),
        country: snapshot.country.clone(),
        temperature: round_half_up(current.temperature.in_unit(unit)),
        unit_symbol: unit.symbol(),
        humidity_pct: current.humidity_pct,
        wind_kph: round_half_up(current.wind_kph),
        description: current.condition.text.clone(),
        icon: current.condition.icon.clone(),
    }
}

pub fn day_view(day: &ForecastDay, unit: TemperatureUnit) -> DayView {
    DayView {
        date: day.date,
        max: round_half_up(day.max.in_unit(unit)),
        min: round_half_up(day.min.in_unit(unit)),
        unit_symbol: unit.symbol(),
        humidity_pct: day.avg_humidity_pct,
        wind_kph: round_half_up(day.max_wind_kph),
        description: day.condition.text.clone(),
        icon: day.condition.icon.clone(),
    }
}

pub fn forecast_views(snapshot: &WeatherSnapshot, unit: TemperatureUnit) -> Vec<DayView> {
    snapshot.forecast.iter().map(|d| day_view(d, unit)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Condition, CurrentConditions, Temperature};
    use chrono::Utc;

    fn snapshot() -> WeatherSnapshot {
        let cond = Condition { text: "Sunny".into(), icon: "sun.png".into() };
        WeatherSnapshot {
            provider: "weatherapi".into(),
            city: "Madrid".into(),
            country: "Spain".into(),
            current: CurrentConditions {
                temperature: Temperature { celsius: 21.6, fahrenheit: 70.9 },
                humidity_pct: 40,
                wind_kph: 12.4,
                condition: cond.clone(),
            },
            forecast: vec![ForecastDay {
                date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
                max: Temperature { celsius: 24.4, fahrenheit: 75.9 },
                min: Temperature { celsius: 12.5, fahrenheit: 54.5 },
                avg_humidity_pct: 45,
                max_wind_kph: 18.5,
                condition: cond,
            }],
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn toggling_unit_changes_only_temperatures() {
        let snap = snapshot();
        let c = current_view(&snap, TemperatureUnit::Celsius);
        let f = current_view(&snap, TemperatureUnit::Celsius.toggle());

        assert_eq!((c.temperature, c.unit_symbol), (22, "°C"));
        assert_eq!((f.temperature, f.unit_symbol), (71, "°F"));
        assert_eq!(c.wind_kph, f.wind_kph);
        assert_eq!(c.humidity_pct, f.humidity_pct);
        assert_eq!(c.description, f.description);
    }

    #[test]
    fn halves_round_up_including_below_zero() {
        assert_eq!(round_half_up(-0.5), 0);
        assert_eq!(round_half_up(-1.5), -1);
        assert_eq!(round_half_up(-1.6), -2);
        assert_eq!(round_half_up(12.5), 13);
        assert_eq!(round_half_up(12.4), 12);

        let mut snap = snapshot();
        snap.current.temperature = Temperature { celsius: -0.5, fahrenheit: 31.1 };
        assert_eq!(current_view(&snap, TemperatureUnit::Celsius).temperature, 0);
    }

    #[test]
    fn forecast_days_are_rounded_per_unit() {
        let snap = snapshot();

        let c = forecast_views(&snap, TemperatureUnit::Celsius);
        assert_eq!((c[0].max, c[0].min, c[0].wind_kph), (24, 13, 19));

        let f = forecast_views(&snap, TemperatureUnit::Fahrenheit);
        assert_eq!((f[0].max, f[0].min), (76, 55));
        assert_eq!(f[0].unit_symbol, "°F");
    }
}

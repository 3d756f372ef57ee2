//! Plain-text rendering of snapshots and errors.

use std::fmt::Write;

use chrono::Local;
use citycast_core::{
    ErrorKind, LookupError, TemperatureUnit, WeatherSnapshot,
    display::{DayView, current_view, forecast_views},
};

const CHART_WIDTH: usize = 30;

pub fn snapshot(snapshot: &WeatherSnapshot, unit: TemperatureUnit, saved: bool) -> String {
    let mut out = String::new();
    let current = current_view(snapshot, unit);
    let marker = if saved { "  [saved]" } else { "" };

    let _ = writeln!(out, "Current Weather - {}, {}{marker}", current.city, current.country);
    let _ = writeln!(out, "  {}{}  {}", current.temperature, current.unit_symbol, current.description);
    let _ = writeln!(out, "  Humidity {}%   Wind {} km/h", current.humidity_pct, current.wind_kph);
    let _ = writeln!(
        out,
        "  Updated {} via {}",
        snapshot.fetched_at.with_timezone(&Local).format("%H:%M"),
        snapshot.provider
    );

    let days = forecast_views(snapshot, unit);
    if !days.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}-Day Forecast", days.len());
        out.push_str(&forecast_table(&days));
        let _ = writeln!(out);
        let _ = writeln!(out, "Temperature range");
        out.push_str(&range_chart(&days));
    }

    out
}

pub fn saved(snapshots: &[WeatherSnapshot], unit: TemperatureUnit) -> String {
    let mut out = String::from("Saved Cities\n");
    for s in snapshots {
        out.push('\n');
        out.push_str(&snapshot(s, unit, true));
    }
    out
}

fn forecast_table(days: &[DayView]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  {:<11} {:>6} {:>6} {:>5} {:>9}  Conditions", "Date", "High", "Low", "Hum", "Wind");
    for d in days {
        let _ = writeln!(
            out,
            "  {:<11} {:>6} {:>6} {:>5} {:>9}  {}",
            d.date.format("%a %d %b").to_string(),
            format!("{}{}", d.max, d.unit_symbol),
            format!("{}{}", d.min, d.unit_symbol),
            format!("{}%", d.humidity_pct),
            format!("{} km/h", d.wind_kph),
            d.description,
        );
    }
    out
}

/// One bar per day spanning min..max on a scale shared by all days.
fn range_chart(days: &[DayView]) -> String {
    let mut out = String::new();
    let (Some(lo), Some(hi)) =
        (days.iter().map(|d| d.min).min(), days.iter().map(|d| d.max).max())
    else {
        return out;
    };
    let span = (hi - lo).max(1) as f64;
    let column = |t: i64| (((t - lo) as f64 / span) * (CHART_WIDTH - 1) as f64).round() as usize;

    for d in days {
        let (start, end) = (column(d.min), column(d.max));
        let bar: String = (0..CHART_WIDTH)
            .map(|i| if (start..=end).contains(&i) { '#' } else { ' ' })
            .collect();
        let _ = writeln!(out, "  {:<11} {:>4} |{bar}| {}", d.date.format("%a %d %b").to_string(), d.min, d.max);
    }
    out
}

pub fn error(err: &LookupError) -> String {
    let hint = match err.kind() {
        ErrorKind::Configuration => {
            "To fix this: get a free API key from https://www.weatherapi.com/ and run \
             `citycast configure weatherapi`, or set CITYCAST_API_KEY."
        }
        ErrorKind::Location => "Pass --lat and --lon, or search for a city manually.",
        ErrorKind::NotFound => "Check the city name and try again.",
        ErrorKind::Storage => "Check that the data directory is writable.",
        ErrorKind::Network | ErrorKind::Provider => {
            "Try again later or check your internet connection."
        }
    };
    format!("{err}\n{hint}\n")
}

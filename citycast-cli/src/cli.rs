use std::{process::ExitCode, sync::Arc};

use anyhow::Context;
use citycast_core::{
    CitySlot, Config, Coordinates, FailurePolicy, FileSlot, FixedLocator, LocationError, Locator,
    LookupError, ProviderId, RefreshOutcome, RefreshWorkflow, SavedCities, TemperatureUnit,
    UnavailableLocator, WeatherProvider, WeatherSnapshot, lookup_here,
    provider::default_provider_from_config, workflow::DEFAULT_FORECAST_DAYS,
};
use clap::{Parser, Subcommand};

use crate::render;

/// Forecast length for the current-location view.
const HERE_FORECAST_DAYS: u8 = 7;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "citycast", version, about = "Weather for your location and your saved cities")]
pub struct Cli {
    /// Show temperatures in Fahrenheit instead of Celsius.
    #[arg(long, global = true)]
    pub fahrenheit: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "weatherapi" or "openweather".
        provider: String,

        /// Make this provider the default even if another one is set.
        #[arg(long)]
        default: bool,
    },

    /// Look up a city and add it to the saved cities.
    Search {
        /// City name, e.g. "New York".
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        #[arg(long, default_value_t = DEFAULT_FORECAST_DAYS)]
        days: u8,

        /// Only show the weather; leave the saved cities untouched.
        #[arg(long)]
        no_save: bool,
    },

    /// Weather for the current position, or the fallback city.
    Here {
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        #[arg(long, default_value_t = HERE_FORECAST_DAYS)]
        days: u8,

        /// Also add the resolved city to the saved cities.
        #[arg(long)]
        save: bool,
    },

    /// Refresh and show weather for every saved city.
    Saved {
        #[arg(long, default_value_t = DEFAULT_FORECAST_DAYS)]
        days: u8,

        /// List cities whose lookup failed instead of silently skipping them.
        #[arg(long)]
        report_failures: bool,
    },

    /// Print the saved city names.
    List,

    /// Remove a city from the saved cities.
    Remove {
        #[arg(required = true, num_args = 1..)]
        city: Vec<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        let unit = if self.fahrenheit {
            TemperatureUnit::default().toggle()
        } else {
            TemperatureUnit::default()
        };

        match self.command {
            Command::Configure { provider, default } => configure(&provider, default),
            Command::Search { query, days, no_save } => {
                let query = query.join(" ");
                let config = Config::load()?;
                let mut wf = match workflow(&config, unit, days)? {
                    Ok(wf) => wf,
                    Err(e) => return Ok(failed(&e)),
                };

                match search(&mut wf, &query, !no_save).await {
                    Ok((snapshot, saved)) => {
                        print!("{}", render::snapshot(&snapshot, unit, saved));
                        Ok(ExitCode::SUCCESS)
                    }
                    Err(e) => Ok(failed(&e)),
                }
            }
            Command::Here { lat, lon, days, save } => {
                let config = Config::load()?;
                let mut wf = match workflow(&config, unit, days)? {
                    Ok(wf) => wf,
                    Err(e) => return Ok(failed(&e)),
                };

                let coords = match (lat, lon) {
                    (Some(latitude), Some(longitude)) => Some(Coordinates { latitude, longitude }),
                    _ => config.location,
                };
                let locator: Box<dyn Locator> = match coords {
                    Some(c) => Box::new(FixedLocator(c)),
                    None => Box::new(UnavailableLocator(LocationError::PositionUnavailable)),
                };

                let here = match lookup_here(&wf, locator.as_ref(), config.fallback_city()).await {
                    Ok(here) => here,
                    Err(e) => return Ok(failed(&e)),
                };

                if let Some(notice) = &here.notice {
                    eprintln!("{notice}");
                }
                if save {
                    wf.save(&here.snapshot.city)?;
                }

                let saved = wf.is_saved(&here.snapshot.city);
                print!("{}", render::snapshot(&here.snapshot, unit, saved));
                Ok(ExitCode::SUCCESS)
            }
            Command::Saved { days, report_failures } => {
                let config = Config::load()?;
                let saved = SavedCities::new(FileSlot::default_location()?);
                let policy =
                    if report_failures { FailurePolicy::Report } else { FailurePolicy::default() };

                let refreshed = refresh_saved(
                    saved,
                    || default_provider_from_config(&config, unit),
                    |wf| wf.with_days(days).with_mode(config.refresh_mode).with_policy(policy),
                )
                .await;

                let outcome = match refreshed {
                    Ok(Some(outcome)) => outcome,
                    Ok(None) => {
                        println!("No saved cities yet.");
                        return Ok(ExitCode::SUCCESS);
                    }
                    Err(e) => return Ok(failed(&e)),
                };

                print!("{}", render::saved(&outcome.snapshots, unit));
                for failure in &outcome.failures {
                    eprintln!("{}: {}", failure.city, failure.error);
                }
                Ok(ExitCode::SUCCESS)
            }
            Command::List => {
                let saved = SavedCities::new(FileSlot::default_location()?);
                let cities = saved.load();
                if cities.is_empty() {
                    println!("No saved cities yet.");
                }
                for city in cities {
                    println!("{city}");
                }
                Ok(ExitCode::SUCCESS)
            }
            Command::Remove { city } => {
                let city = city.join(" ");
                let mut saved = SavedCities::new(FileSlot::default_location()?);
                if saved.remove(&city)? {
                    println!("Removed {city}.");
                } else {
                    println!("{city} is not in the saved cities.");
                }
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

/// Outer error: local setup problem. Inner error: the lookup cannot work as configured.
fn workflow(
    config: &Config,
    unit: TemperatureUnit,
    days: u8,
) -> anyhow::Result<Result<RefreshWorkflow<FileSlot>, LookupError>> {
    let slot = FileSlot::default_location()?;
    tracing::debug!(path = %slot.path().display(), "using saved cities file");

    Ok(default_provider_from_config(config, unit).map(|provider| {
        RefreshWorkflow::new(provider, SavedCities::new(slot))
            .with_days(days)
            .with_mode(config.refresh_mode)
    }))
}

/// Looks up `query`, saving the canonical name only when `save` is set.
/// The flag returned alongside the snapshot says whether the city is saved.
async fn search<S: CitySlot>(
    wf: &mut RefreshWorkflow<S>,
    query: &str,
    save: bool,
) -> Result<(WeatherSnapshot, bool), LookupError> {
    let snapshot =
        if save { wf.lookup_and_save(query).await? } else { wf.lookup(query).await? };
    let saved = wf.is_saved(&snapshot.city);
    Ok((snapshot, saved))
}

/// Refreshes every saved city. `None` means the list is empty, in which case
/// no provider is built, so a missing API key does not matter yet.
async fn refresh_saved<S: CitySlot>(
    saved: SavedCities<S>,
    provider: impl FnOnce() -> Result<Arc<dyn WeatherProvider>, LookupError>,
    setup: impl FnOnce(RefreshWorkflow<S>) -> RefreshWorkflow<S>,
) -> Result<Option<RefreshOutcome>, LookupError> {
    let cities = saved.load();
    if cities.is_empty() {
        return Ok(None);
    }

    let wf = setup(RefreshWorkflow::new(provider()?, saved));
    Ok(Some(wf.refresh_all(&cities).await))
}

fn failed(err: &LookupError) -> ExitCode {
    eprint!("{}", render::error(err));
    ExitCode::FAILURE
}

fn configure(provider: &str, make_default: bool) -> anyhow::Result<ExitCode> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    let api_key = inquire::Password::new(&format!("API key for {id}:"))
        .without_confirmation()
        .with_display_mode(inquire::PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;

    config.upsert_provider_api_key(id, api_key.trim().to_string());
    if make_default {
        config.set_default_provider(id);
    }
    config.save()?;

    println!(
        "Saved {id} credentials to {} (default provider: {}).",
        Config::config_file_path()?.display(),
        config.default_provider_id()
    );
    Ok(ExitCode::SUCCESS)
}

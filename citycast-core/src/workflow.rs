//! Weather refresh workflow: lookups for saved cities and search-and-save.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use serde::{Deserialize, Serialize};

use crate::{
    error::LookupError,
    model::{CityIdentifier, LookupTarget, WeatherRequest, WeatherSnapshot, clamp_days},
    provider::WeatherProvider,
    saved::{CitySlot, SavedCities},
};

/// Forecast length used for searches and saved-city refreshes.
pub const DEFAULT_FORECAST_DAYS: u8 = 3;

/// How the lookups of one refresh cycle are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshMode {
    /// One lookup at a time, in list order.
    #[default]
    Sequential,
    /// All lookups in flight at once; results are still delivered in list order.
    Concurrent,
}

/// What happens to per-city failures when a refresh cycle is joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Failed cities are left out of the outcome without further trace.
    #[default]
    DropFailed,
    /// Failed cities are reported alongside the successes.
    Report,
}

#[derive(Debug)]
pub struct CityFailure {
    pub city: CityIdentifier,
    pub error: LookupError,
}

/// Result of one refresh cycle.
#[derive(Debug)]
pub struct RefreshOutcome {
    /// Cycle number; see [`RefreshWorkflow::is_current`].
    pub generation: u64,
    /// Successful lookups, in the order of the input list.
    pub snapshots: Vec<WeatherSnapshot>,
    /// Always empty under [`FailurePolicy::DropFailed`].
    pub failures: Vec<CityFailure>,
}

/// Split per-city results into successes and, depending on `policy`, reported failures.
pub fn join_results(
    results: Vec<(CityIdentifier, Result<WeatherSnapshot, LookupError>)>,
    policy: FailurePolicy,
) -> (Vec<WeatherSnapshot>, Vec<CityFailure>) {
    let mut snapshots = Vec::with_capacity(results.len());
    let mut failures = Vec::new();

    for (city, result) in results {
        match result {
            Ok(snapshot) => snapshots.push(snapshot),
            Err(error) => {
                tracing::debug!(%city, %error, "lookup failed during refresh");
                if policy == FailurePolicy::Report {
                    failures.push(CityFailure { city, error });
                }
            }
        }
    }

    (snapshots, failures)
}

pub struct RefreshWorkflow<S> {
    provider: Arc<dyn WeatherProvider>,
    saved: SavedCities<S>,
    days: u8,
    mode: RefreshMode,
    policy: FailurePolicy,
    generation: AtomicU64,
}

impl<S: CitySlot> RefreshWorkflow<S> {
    pub fn new(provider: Arc<dyn WeatherProvider>, saved: SavedCities<S>) -> Self {
        Self {
            provider,
            saved,
            days: DEFAULT_FORECAST_DAYS,
            mode: RefreshMode::default(),
            policy: FailurePolicy::default(),
            generation: AtomicU64::new(0),
        }
    }

    pub fn with_days(mut self, days: u8) -> Self {
        self.days = days;
        self
    }

    pub fn with_mode(mut self, mode: RefreshMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn saved_cities(&self) -> Vec<CityIdentifier> {
        self.saved.load()
    }

    pub fn is_saved(&self, city: &str) -> bool {
        self.saved.contains(city)
    }

    /// Single lookup for any target. Does not touch the saved list.
    pub async fn lookup_target(&self, target: LookupTarget) -> Result<WeatherSnapshot, LookupError> {
        let request = WeatherRequest { target, days: clamp_days(self.days) };
        self.provider.lookup(&request).await
    }

    pub async fn lookup(&self, query: &str) -> Result<WeatherSnapshot, LookupError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(LookupError::NotFound { query: query.to_string() });
        }
        self.lookup_target(LookupTarget::City(query.to_string())).await
    }

    /// Looks up free-text input and saves the canonical city name on success.
    pub async fn lookup_and_save(&mut self, query: &str) -> Result<WeatherSnapshot, LookupError> {
        let snapshot = self.lookup(query).await?;

        self.saved
            .add(&snapshot.city)
            .map_err(|e| LookupError::Storage(format!("{e:#}")))?;

        Ok(snapshot)
    }

    pub fn save(&mut self, city: &str) -> anyhow::Result<bool> {
        self.saved.add(city)
    }

    pub fn remove(&mut self, city: &str) -> anyhow::Result<bool> {
        self.saved.remove(city)
    }

    /// Reads the saved list once and refreshes every entry.
    pub async fn refresh_saved(&self) -> RefreshOutcome {
        let cities = self.saved.load();
        self.refresh_all(&cities).await
    }

    /// One lookup per city. Failures never abort the batch; what happens to
    /// them is decided by the configured [`FailurePolicy`].
    pub async fn refresh_all(&self, cities: &[CityIdentifier]) -> RefreshOutcome {
        let generation = self.begin_cycle();
        tracing::debug!(generation, count = cities.len(), mode = ?self.mode, "refresh cycle started");

        let results = match self.mode {
            RefreshMode::Sequential => self.fetch_sequential(cities).await,
            RefreshMode::Concurrent => self.fetch_concurrent(cities).await,
        };

        let (snapshots, failures) = join_results(results, self.policy);
        tracing::info!(generation, fetched = snapshots.len(), requested = cities.len(), "refresh cycle finished");

        RefreshOutcome { generation, snapshots, failures }
    }

    /// False once a newer refresh cycle has started; stale outcomes should be discarded.
    pub fn is_current(&self, outcome: &RefreshOutcome) -> bool {
        outcome.generation == self.generation.load(Ordering::SeqCst)
    }

    fn begin_cycle(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn request_for(&self, city: &str) -> WeatherRequest {
        WeatherRequest::city(city, self.days)
    }

    async fn fetch_sequential(
        &self,
        cities: &[CityIdentifier],
    ) -> Vec<(CityIdentifier, Result<WeatherSnapshot, LookupError>)> {
        let mut results = Vec::with_capacity(cities.len());
        for city in cities {
            let result = self.provider.lookup(&self.request_for(city)).await;
            results.push((city.clone(), result));
        }
        results
    }

    async fn fetch_concurrent(
        &self,
        cities: &[CityIdentifier],
    ) -> Vec<(CityIdentifier, Result<WeatherSnapshot, LookupError>)> {
        let handles: Vec<_> = cities
            .iter()
            .map(|city| {
                let provider = Arc::clone(&self.provider);
                let request = self.request_for(city);
                (city.clone(), tokio::spawn(async move { provider.lookup(&request).await }))
            })
            .collect();

        // Awaiting handles in spawn order keeps results aligned with the input.
        let mut results = Vec::with_capacity(handles.len());
        for (city, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(LookupError::Network(format!("lookup task failed: {e}"))),
            };
            results.push((city, result));
        }
        results
    }
}

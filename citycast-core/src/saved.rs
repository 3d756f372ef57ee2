//! Durable list of saved cities.
//!
//! The list is stored as a single JSON array of canonical city names, e.g.
//! `["London","Tokyo"]`. Every mutation rewrites the whole value.

use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::model::CityIdentifier;

/// A single named storage slot holding a string value.
pub trait CitySlot {
    /// Current raw value, or `None` when the slot was never written or cannot be read.
    fn read(&self) -> Option<String>;

    fn write(&mut self, value: &str) -> Result<()>;
}

/// Slot backed by one file on disk.
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `saved_cities.json` in the platform data directory.
    pub fn default_location() -> Result<Self> {
        let dirs = ProjectDirs::from("dev", "citycast", "citycast")
            .ok_or_else(|| anyhow!("Could not determine platform data directory"))?;

        Ok(Self::new(dirs.data_dir().join("saved_cities.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CitySlot for FileSlot {
    fn read(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Some(contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to read saved cities");
                None
            }
        }
    }

    fn write(&mut self, value: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create data directory: {}", parent.display())
            })?;
        }

        fs::write(&self.path, value)
            .with_context(|| format!("Failed to write saved cities: {}", self.path.display()))
    }
}

/// Slot that lives only as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    value: Option<String>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: impl Into<String>) -> Self {
        Self { value: Some(value.into()) }
    }
}

impl CitySlot for MemorySlot {
    fn read(&self) -> Option<String> {
        self.value.clone()
    }

    fn write(&mut self, value: &str) -> Result<()> {
        self.value = Some(value.to_string());
        Ok(())
    }
}

/// Ordered, duplicate-free list of saved cities kept in a [`CitySlot`].
#[derive(Debug, Clone)]
pub struct SavedCities<S> {
    slot: S,
}

impl<S: CitySlot> SavedCities<S> {
    pub fn new(slot: S) -> Self {
        Self { slot }
    }

    /// Missing or corrupt data reads as an empty list.
    pub fn load(&self) -> Vec<CityIdentifier> {
        let Some(raw) = self.slot.read() else {
            return Vec::new();
        };

        match serde_json::from_str::<Vec<CityIdentifier>>(&raw) {
            Ok(cities) => dedup_in_order(cities),
            Err(e) => {
                tracing::warn!(error = %e, "saved cities are corrupt; treating as empty");
                Vec::new()
            }
        }
    }

    pub fn contains(&self, city: &str) -> bool {
        self.load().iter().any(|c| c == city)
    }

    /// Appends `city` unless already present. Returns whether the list changed.
    pub fn add(&mut self, city: &str) -> Result<bool> {
        let mut cities = self.load();
        if cities.iter().any(|c| c == city) {
            return Ok(false);
        }

        cities.push(city.to_string());
        self.store(&cities)?;
        tracing::info!(city, "saved city");
        Ok(true)
    }

    /// Removes every entry equal to `city`. Returns whether anything was removed.
    pub fn remove(&mut self, city: &str) -> Result<bool> {
        let cities = self.load();
        let before = cities.len();
        let remaining: Vec<_> = cities.into_iter().filter(|c| c != city).collect();

        self.store(&remaining)?;
        let removed = remaining.len() != before;
        if removed {
            tracing::info!(city, "removed saved city");
        }
        Ok(removed)
    }

    fn store(&mut self, cities: &[CityIdentifier]) -> Result<()> {
        let json = serde_json::to_string(cities).context("Failed to serialize saved cities")?;
        self.slot.write(&json)
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }
}

fn dedup_in_order(cities: Vec<CityIdentifier>) -> Vec<CityIdentifier> {
    let mut out: Vec<CityIdentifier> = Vec::with_capacity(cities.len());
    for city in cities {
        if !out.contains(&city) {
            out.push(city);
        }
    }
    out
}

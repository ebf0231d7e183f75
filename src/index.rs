//! Historical observation index, partitioned by normalized location.
//!
//! An [`HistoricalIndex`] is built once from a set of observations and never
//! mutated afterwards. [`SharedIndex`] hands out `Arc` snapshots to request
//! handlers and replaces the whole snapshot on reload, so a classification
//! always sees one consistent index.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Observation, RawObservation, ReferenceProfile};

// ---

/// Canonical lookup key for a location: trimmed and lower-cased.
pub fn normalize_location(location: &str) -> String {
    location.trim().to_lowercase()
}

/// Immutable snapshot of historical observations.
#[derive(Debug, Clone)]
pub struct HistoricalIndex {
    // ---
    partitions: HashMap<String, Vec<Observation>>,
    observation_count: usize,
    source: Option<PathBuf>,
    loaded_at: DateTime<Utc>,
}

/// Summary of a snapshot, returned by the health and reload endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct IndexSummary {
    pub locations: usize,
    pub observations: usize,
    pub source: Option<String>,
    pub loaded_at: DateTime<Utc>,
}

impl HistoricalIndex {
    // ---
    pub fn empty() -> Self {
        Self::from_observations(Vec::new())
    }

    pub fn from_observations(observations: Vec<Observation>) -> Self {
        // ---
        let observation_count = observations.len();
        let mut partitions: HashMap<String, Vec<Observation>> = HashMap::new();
        for obs in observations {
            partitions
                .entry(normalize_location(&obs.location))
                .or_default()
                .push(obs);
        }

        HistoricalIndex {
            partitions,
            observation_count,
            source: None,
            loaded_at: Utc::now(),
        }
    }

    /// Startup load: like [`HistoricalIndex::load`], but a missing file
    /// yields an empty index instead of an error.
    pub fn load_or_empty(path: &Path) -> Result<Self> {
        // ---
        if !path.exists() {
            tracing::warn!(
                "Data file {} not found, starting with an empty index",
                path.display()
            );
            let mut index = Self::empty();
            index.source = Some(path.to_path_buf());
            return Ok(index);
        }
        Self::load(path)
    }

    /// Load the index from a JSON array of observation records.
    ///
    /// Records that fail to parse or validate are skipped with a warning.
    /// A missing or unreadable file, or anything other than a JSON array,
    /// is an error.
    pub fn load(path: &Path) -> Result<Self> {
        // ---
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let mut index = Self::parse(&text)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        index.source = Some(path.to_path_buf());

        tracing::info!(
            "Loaded {} observations across {} locations from {}",
            index.observation_count,
            index.partitions.len(),
            path.display()
        );
        Ok(index)
    }

    /// Build an index from JSON text.
    pub fn parse(text: &str) -> Result<Self> {
        // ---
        let value: serde_json::Value = serde_json::from_str(text)?;
        let items = value
            .as_array()
            .ok_or_else(|| anyhow!("expected a JSON array of observation records"))?;

        let mut observations = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let parsed = serde_json::from_value::<RawObservation>(item.clone())
                .map_err(|e| e.to_string())
                .and_then(|raw| raw.to_observation());
            match parsed {
                Ok(obs) => observations.push(obs),
                Err(e) => {
                    tracing::warn!("Skipping record {}: {} - Raw item: {}", i, e, item);
                }
            }
        }

        Ok(Self::from_observations(observations))
    }

    /// Observations recorded for a location, if any.
    pub fn partition(&self, location: &str) -> Option<&[Observation]> {
        self.partitions
            .get(&normalize_location(location))
            .map(Vec::as_slice)
            .filter(|p| !p.is_empty())
    }

    pub fn summary(&self) -> IndexSummary {
        IndexSummary {
            locations: self.partitions.len(),
            observations: self.observation_count,
            source: self.source.as_ref().map(|p| p.display().to_string()),
            loaded_at: self.loaded_at,
        }
    }
}

/// Mean readings over the flooded subset of `observations`.
pub fn reference_profile(observations: &[Observation]) -> Option<ReferenceProfile> {
    // ---
    let flooded: Vec<&Observation> = observations.iter().filter(|o| o.flood_occurred).collect();
    if flooded.is_empty() {
        return None;
    }

    let n = flooded.len() as f64;
    let mean = |f: fn(&Observation) -> f64| flooded.iter().map(|o| f(o)).sum::<f64>() / n;

    Some(ReferenceProfile {
        avg_rainfall: mean(|o| o.rainfall),
        avg_river_level: mean(|o| o.river_level),
        avg_dam_release: mean(|o| o.dam_release),
    })
}

/// Reloadable handle to the current index snapshot.
#[derive(Debug, Clone)]
pub struct SharedIndex {
    current: Arc<RwLock<Arc<HistoricalIndex>>>,
}

impl SharedIndex {
    // ---
    pub fn new(index: HistoricalIndex) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(index))),
        }
    }

    /// Current snapshot. Later reloads do not affect the returned value.
    pub fn snapshot(&self) -> Arc<HistoricalIndex> {
        // ---
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Replace the current snapshot as a whole.
    pub fn replace(&self, index: HistoricalIndex) {
        // ---
        let next = Arc::new(index);
        match self.current.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    /// Load `path` and swap it in. The previous snapshot stays active on any
    /// error, including a missing file.
    pub fn reload_from(&self, path: &Path) -> Result<IndexSummary> {
        // ---
        let index = HistoricalIndex::load(path)?;
        let summary = index.summary();
        self.replace(index);
        Ok(summary)
    }
}

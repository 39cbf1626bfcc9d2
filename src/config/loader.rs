// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{
    DEFAULT_DIGEST_SUFFIX_LENGTH, DEFAULT_DISCARD_SIZE, DEFAULT_GENERATION_SIZE,
    DEFAULT_MAX_POPULATION, DEFAULT_MAX_SETTLE_ROUNDS, DEFAULT_RELEVANCE_THRESHOLD,
    DEFAULT_TIMEOUT_MS, MAX_DIGEST_SUFFIX_LENGTH,
};
use crate::errors::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Planner configuration.
///
/// Every field is optional; missing values fall back to the defaults in
/// [`crate::config::consts`]. Loaded from YAML or TOML, chosen by file
/// extension.
///
/// # Example
/// ```yaml
/// planner:
///   max_population: 100
///   generation_size: 100
///   discard_size: 20
///   timeout_ms: 5000
/// speculation:
///   max_settle_rounds: 16
///   relevance_threshold: 0.0
/// suggestions:
///   digest_suffix_length: 4
/// ```
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ArcwoodConfig {
    #[serde(default)]
    pub planner: PlannerOptions,
    #[serde(default)]
    pub speculation: SpeculationOptions,
    #[serde(default)]
    pub suggestions: SuggestionOptions,
}

/// Search engine limits.
///
/// # Fields
/// * `max_population` - Cap on the candidate population (defaults to 100)
/// * `generation_size` - Cap on new candidates per generation (defaults to 100)
/// * `discard_size` - Lowest scorers dropped on overflow (defaults to 20)
/// * `timeout_ms` - Planning window used by the CLI (defaults to 5000)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PlannerOptions {
    pub max_population: Option<usize>,
    pub generation_size: Option<usize>,
    pub discard_size: Option<usize>,
    pub timeout_ms: Option<u64>,
}

impl PlannerOptions {
    pub fn get_max_population(&self) -> usize {
        self.max_population.unwrap_or(DEFAULT_MAX_POPULATION)
    }

    pub fn get_generation_size(&self) -> usize {
        self.generation_size.unwrap_or(DEFAULT_GENERATION_SIZE)
    }

    pub fn get_discard_size(&self) -> usize {
        self.discard_size.unwrap_or(DEFAULT_DISCARD_SIZE)
    }

    pub fn get_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS))
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct SpeculationOptions {
    pub max_settle_rounds: Option<usize>,
    pub relevance_threshold: Option<f64>,
}

impl SpeculationOptions {
    /// At least one round always runs.
    pub fn get_max_settle_rounds(&self) -> usize {
        self.max_settle_rounds
            .unwrap_or(DEFAULT_MAX_SETTLE_ROUNDS)
            .max(1)
    }

    pub fn get_relevance_threshold(&self) -> f64 {
        self.relevance_threshold
            .unwrap_or(DEFAULT_RELEVANCE_THRESHOLD)
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct SuggestionOptions {
    pub digest_suffix_length: Option<usize>,
}

impl SuggestionOptions {
    /// Clamped to `1..=64`.
    pub fn get_digest_suffix_length(&self) -> usize {
        self.digest_suffix_length
            .unwrap_or(DEFAULT_DIGEST_SUFFIX_LENGTH)
            .clamp(1, MAX_DIGEST_SUFFIX_LENGTH)
    }
}

pub(crate) fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a config from a `.yaml`, `.yml` or `.toml` file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ArcwoodConfig, ConfigError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match extension.as_str() {
        "yaml" | "yml" => Ok(serde_yaml::from_str(&read(path)?)?),
        "toml" => Ok(toml::from_str(&read(path)?)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

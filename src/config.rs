//! Configuration structures and utilities
//!
//! Every section has a `Default` carrying the constants the dashboard and the
//! live feed were tuned for. A JSON file may override any subset of them; the
//! binaries then apply their command-line flags on top.

use crate::core::timestamps::default_origin;
use crate::core::Timestamp;
use crate::generation::series_generator::InjectionIntensity;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Lowest contamination the scorer accepts.
pub const MIN_CONTAMINATION: f64 = 0.01;
/// Highest contamination the scorer accepts.
pub const MAX_CONTAMINATION: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Number of hourly points per batch series
    pub length: usize,
    pub base_seed: u64,
    /// First timestamp of every batch series
    pub origin: Timestamp,
    pub intensity: InjectionIntensity,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            length: 24,
            base_seed: 69,
            origin: default_origin(),
            intensity: InjectionIntensity::Fixed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    /// Maximum number of samples kept per stream
    pub capacity: usize,
    /// Samples required before the detector starts scoring
    pub min_samples: usize,
    /// Span of the exponentially weighted bounds
    pub span: usize,
    /// Contamination handed to the scorer for every live window
    pub contamination: f64,
    /// Streams registered at start-up
    pub streams: Vec<String>,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            capacity: 24,
            min_samples: 6,
            span: 6,
            contamination: 0.1,
            streams: vec!["deposits".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    /// Fixed seed so repeated scoring of one series gives the same labels
    pub seed: u64,
    pub trees: usize,
    pub max_samples: usize,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            trees: 100,
            max_samples: 256,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArgusConfig {
    pub generator: GeneratorConfig,
    pub live: LiveConfig,
    pub scorer: ScorerConfig,
    pub server: ServerConfig,
}

impl ArgusConfig {
    /// Reads a (possibly partial) JSON configuration file and validates it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: ArgusConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.generator.length < 3 {
            return Err(Error::Config(format!(
                "series length must be at least 3, got {}",
                self.generator.length
            )));
        }
        if self.live.min_samples < 2 {
            return Err(Error::Config("live warm-up needs at least 2 samples".to_string()));
        }
        if self.live.capacity < self.live.min_samples {
            return Err(Error::Config(format!(
                "live capacity {} is smaller than the warm-up of {} samples",
                self.live.capacity, self.live.min_samples
            )));
        }
        if self.live.span == 0 {
            return Err(Error::Config("exponential span must be at least 1".to_string()));
        }
        if !(MIN_CONTAMINATION..=MAX_CONTAMINATION).contains(&self.live.contamination) {
            return Err(Error::Config(format!(
                "live contamination {} outside [{}, {}]",
                self.live.contamination, MIN_CONTAMINATION, MAX_CONTAMINATION
            )));
        }
        if self.scorer.trees == 0 || self.scorer.max_samples < 2 {
            return Err(Error::Config(
                "scorer needs at least one tree and a sub-sample of 2".to_string(),
            ));
        }
        Ok(())
    }
}

//! Deterministic synthetic series with reproducible spike and drop injection.
//!
//! Two independent random streams are used. The base stream, seeded by
//! `base_seed` alone, draws the normally distributed values. The injection
//! stream is seeded by a mix of `base_seed`, the metric offset and both
//! injection counts, so changing a count moves the perturbed positions without
//! touching the underlying series.

use crate::core::{hourly_timestamps, Sample, Timestamp};
use crate::{Error, Result};
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use tracing::debug;

/// Value written at spike positions with [`InjectionIntensity::Fixed`].
pub const SPIKE_VALUE: f64 = 300.0;
/// Value written at drop positions with [`InjectionIntensity::Fixed`].
pub const DROP_VALUE: f64 = 30.0;
/// Spike band for [`InjectionIntensity::Variable`].
pub const SPIKE_RANGE: RangeInclusive<i64> = 270..=350;
/// Drop band for [`InjectionIntensity::Variable`].
pub const DROP_RANGE: RangeInclusive<i64> = 10..=60;

const SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// How injected anomalies are valued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InjectionIntensity {
    /// Spikes are always 300 and drops always 30
    #[default]
    Fixed,
    /// Spikes drawn from 270..=350 and drops from 10..=60
    Variable,
}

/// Everything needed to synthesize one series.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub base_seed: u64,
    pub metric_offset: u64,
    pub length: usize,
    pub mean: f64,
    pub stddev: f64,
    pub spikes: i64,
    pub drops: i64,
    pub intensity: InjectionIntensity,
    pub origin: Timestamp,
}

impl GenerationRequest {
    /// Rejects negative counts, counts that do not fit in the series and
    /// distributions that cannot be sampled.
    pub fn validate(&self) -> Result<()> {
        if self.spikes < 0 || self.drops < 0 {
            return Err(Error::InvalidParameter(format!(
                "spike and drop counts must be non-negative (spikes={}, drops={})",
                self.spikes, self.drops
            )));
        }
        let fits = self
            .spikes
            .checked_add(self.drops)
            .and_then(|injected| usize::try_from(injected).ok())
            .is_some_and(|injected| injected <= self.length);
        if !fits {
            return Err(Error::InvalidParameter(format!(
                "{} spikes + {} drops exceed the series length of {}",
                self.spikes, self.drops, self.length
            )));
        }
        if !self.mean.is_finite() || !self.stddev.is_finite() || self.stddev < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "cannot sample from N({}, {})",
                self.mean, self.stddev
            )));
        }
        Ok(())
    }
}

/// A generated series plus the positions that were overwritten.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticSeries {
    pub samples: Vec<Sample>,
    pub spike_positions: Vec<usize>,
    pub drop_positions: Vec<usize>,
}

impl SyntheticSeries {
    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    /// Spike positions followed by drop positions.
    pub fn injected_positions(&self) -> Vec<usize> {
        self.spike_positions
            .iter()
            .chain(&self.drop_positions)
            .copied()
            .collect()
    }
}

pub struct SeriesGenerator;

impl SeriesGenerator {
    /// Synthesizes a series. Identical requests always yield identical series.
    pub fn generate(request: &GenerationRequest) -> Result<SyntheticSeries> {
        request.validate()?;

        let normal = Normal::new(request.mean, request.stddev)
            .map_err(|e| Error::InvalidParameter(e.to_string()))?;
        let mut base_rng = ChaCha8Rng::seed_from_u64(request.base_seed);
        let mut values: Vec<f64> = (0..request.length)
            .map(|_| normal.sample(&mut base_rng).trunc())
            .collect();

        let spikes = request.spikes as usize;
        let drops = request.drops as usize;
        let seed = injection_seed(request.base_seed, request.metric_offset, spikes, drops);
        let mut injector = ChaCha8Rng::seed_from_u64(seed);

        // Random order without replacement; the first `spikes` become spikes.
        let chosen = index::sample(&mut injector, request.length, spikes + drops).into_vec();
        let (spike_positions, drop_positions) = chosen.split_at(spikes);

        for &idx in spike_positions {
            values[idx] = match request.intensity {
                InjectionIntensity::Fixed => SPIKE_VALUE,
                InjectionIntensity::Variable => injector.gen_range(SPIKE_RANGE) as f64,
            };
        }
        for &idx in drop_positions {
            values[idx] = match request.intensity {
                InjectionIntensity::Fixed => DROP_VALUE,
                InjectionIntensity::Variable => injector.gen_range(DROP_RANGE) as f64,
            };
        }

        debug!(
            seed = request.base_seed,
            injection_seed = seed,
            ?spike_positions,
            ?drop_positions,
            "generated synthetic series"
        );

        let samples = hourly_timestamps(request.origin, request.length)
            .into_iter()
            .zip(values)
            .map(|(timestamp, value)| Sample::new(timestamp, value))
            .collect();

        Ok(SyntheticSeries {
            samples,
            spike_positions: spike_positions.to_vec(),
            drop_positions: drop_positions.to_vec(),
        })
    }
}

/// Seed of the injection stream. Order-sensitive in its inputs, so swapping the
/// spike and drop counts gives a different seed.
pub fn injection_seed(base_seed: u64, metric_offset: u64, spikes: usize, drops: usize) -> u64 {
    [metric_offset, spikes as u64, drops as u64]
        .iter()
        .fold(base_seed ^ SEED_MIX, |seed, &part| {
            (seed ^ part).wrapping_mul(SEED_MIX).rotate_left(29)
        })
}

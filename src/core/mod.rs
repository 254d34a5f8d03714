//! Core data structures and types for the Argus anomaly scoring engine

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

pub mod timestamps;
pub use timestamps::{hourly_timestamps, Timestamp, TIMESTAMP_FORMAT};

/// Outlier flags aligned index-for-index with the series they were computed from.
/// `true` marks a value the scorer considers an outlier.
pub type OutlierLabels = Vec<bool>;

/// A single observation of a metric. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    #[serde(serialize_with = "timestamps::serialize")]
    pub timestamp: Timestamp,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: Timestamp, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Smoothed expected range at one series position.
///
/// `mean` and `spread` are `None` where too little neighbouring data existed to
/// compute them. On the wire every undefined part is reported as `0`, so a
/// consumer cannot tell an undefined band from a genuinely zero one; use
/// [`Band::is_defined`] in-process instead.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Band {
    pub mean: Option<f64>,
    pub spread: Option<f64>,
}

impl Band {
    pub fn new(mean: Option<f64>, spread: Option<f64>) -> Self {
        Self {
            mean,
            spread: spread.map(|s| s.max(0.0)),
        }
    }

    pub fn undefined() -> Self {
        Self::default()
    }

    /// `mean + 2 * spread`
    pub fn upper(&self) -> Option<f64> {
        Some(self.mean? + 2.0 * self.spread?)
    }

    /// `mean - 2 * spread`
    pub fn lower(&self) -> Option<f64> {
        Some(self.mean? - 2.0 * self.spread?)
    }

    pub fn is_defined(&self) -> bool {
        self.mean.is_some() && self.spread.is_some()
    }
}

impl Serialize for Band {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Band", 4)?;
        state.serialize_field("mean", &self.mean.unwrap_or(0.0))?;
        state.serialize_field("std", &self.spread.unwrap_or(0.0))?;
        state.serialize_field("upper", &self.upper().unwrap_or(0.0))?;
        state.serialize_field("lower", &self.lower().unwrap_or(0.0))?;
        state.end()
    }
}

/// The externally visible unit of output: one per series position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionRecord {
    #[serde(serialize_with = "timestamps::serialize")]
    pub timestamp: Timestamp,
    pub value: f64,
    pub anomaly: bool,
    #[serde(flatten)]
    pub band: Band,
}

impl DetectionRecord {
    /// Zips a window of samples with its labels and bands.
    ///
    /// The three slices must have the same length; extra elements in any of
    /// them are ignored.
    pub fn from_parts(samples: &[Sample], labels: &[bool], bands: &[Band]) -> Vec<Self> {
        samples
            .iter()
            .zip(labels)
            .zip(bands)
            .map(|((sample, &anomaly), &band)| DetectionRecord {
                timestamp: sample.timestamp,
                value: sample.value,
                anomaly,
                band,
            })
            .collect()
    }
}

/// A metric to synthesize and score in batch mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    /// Centre of the synthetic normal distribution
    pub mean: f64,
    /// Spread of the synthetic normal distribution
    pub stddev: f64,
    /// Mixed into the injection seed so metrics with equal counts still get
    /// different spike/drop positions
    pub seed_offset: u64,
    pub spikes: i64,
    pub drops: i64,
    /// Explicit contamination; estimated from the series when absent
    pub contamination: Option<f64>,
}

impl Metric {
    /// A metric with one spike, one drop and estimated contamination.
    pub fn new(name: &str, mean: f64, stddev: f64, seed_offset: u64) -> Self {
        Self {
            name: name.to_string(),
            mean,
            stddev,
            seed_offset,
            spikes: 1,
            drops: 1,
            contamination: None,
        }
    }

    pub fn with_injections(mut self, spikes: i64, drops: i64) -> Self {
        self.spikes = spikes;
        self.drops = drops;
        self
    }

    pub fn with_contamination(mut self, contamination: Option<f64>) -> Self {
        self.contamination = contamination;
        self
    }

    /// The four ATM metrics shown on the dashboard.
    pub fn default_set() -> Vec<Metric> {
        vec![
            Metric::new("visits", 150.0, 20.0, 0),
            Metric::new("withdrawals", 120.0, 15.0, 1),
            Metric::new("deposits", 100.0, 12.0, 2),
            Metric::new("checkbalance", 80.0, 10.0, 3),
        ]
    }
}

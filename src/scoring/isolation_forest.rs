//! Seeded one-dimensional isolation forest.
//!
//! Anomalies are few and different, so random axis splits isolate them in
//! fewer steps than regular points. Each tree is grown on a random sub-sample
//! until points are isolated or the height limit `ceil(log2(psi))` is hit; a
//! value's anomaly score is `2^(-E[h(x)] / c(psi))`, where `c` is the average
//! path length of an unsuccessful binary-search-tree lookup. Scores near 1 are
//! anomalous, scores well below 0.5 are regular.

use super::contamination::quantile;
use super::scorer::{validate_contamination, Scorer};
use crate::config::ScorerConfig;
use crate::core::OutlierLabels;
use crate::{Error, Result};
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Default [`Scorer`]: flags the `contamination` fraction of values with the
/// highest isolation scores.
#[derive(Debug, Clone)]
pub struct IsolationForestScorer {
    seed: u64,
    trees: usize,
    max_samples: usize,
}

impl IsolationForestScorer {
    pub fn new(seed: u64) -> Self {
        Self::from_config(&ScorerConfig {
            seed,
            ..ScorerConfig::default()
        })
    }

    pub fn from_config(config: &ScorerConfig) -> Self {
        Self {
            seed: config.seed,
            trees: config.trees.max(1),
            max_samples: config.max_samples.max(2),
        }
    }

    /// Anomaly score per value, in `(0, 1]`. Reseeds on every call, so the same
    /// input always produces the same scores.
    pub fn score_samples(&self, values: &[f64]) -> Vec<f64> {
        let n = values.len();
        if n == 0 {
            return Vec::new();
        }

        let psi = self.max_samples.min(n);
        let height_limit = ((psi as f64).log2().ceil() as usize).max(1);
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let forest: Vec<IsolationTree> = (0..self.trees)
            .map(|_| {
                let subsample: Vec<f64> =
                    index::sample(&mut rng, n, psi).iter().map(|i| values[i]).collect();
                IsolationTree::grow(&subsample, 0, height_limit, &mut rng)
            })
            .collect();

        let normaliser = average_path_length(psi);
        values
            .iter()
            .map(|&x| {
                let total_depth: f64 = forest.iter().map(|tree| tree.path_length(x)).sum();
                let mean_depth = total_depth / forest.len() as f64;
                if normaliser > 0.0 {
                    2f64.powf(-mean_depth / normaliser)
                } else {
                    0.5
                }
            })
            .collect()
    }
}

impl Scorer for IsolationForestScorer {
    fn label(&self, values: &[f64], contamination: f64) -> Result<OutlierLabels> {
        validate_contamination(contamination)?;
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(Error::Scoring(format!("cannot score non-finite value {}", bad)));
        }

        let scores = self.score_samples(values);
        let mut sorted = scores.clone();
        sorted.sort_by(f64::total_cmp);
        let threshold = quantile(&sorted, 1.0 - contamination);

        let labels: OutlierLabels = scores.iter().map(|&s| s > threshold).collect();
        debug!(
            points = values.len(),
            contamination,
            threshold,
            flagged = labels.iter().filter(|&&l| l).count(),
            "isolation forest labelled batch"
        );
        Ok(labels)
    }

    fn name(&self) -> &'static str {
        "isolation-forest"
    }
}

enum IsolationTree {
    Leaf { size: usize },
    Split {
        threshold: f64,
        left: Box<IsolationTree>,
        right: Box<IsolationTree>,
    },
}

impl IsolationTree {
    fn grow(values: &[f64], depth: usize, height_limit: usize, rng: &mut ChaCha8Rng) -> Self {
        if depth >= height_limit || values.len() <= 1 {
            return IsolationTree::Leaf { size: values.len() };
        }

        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        if max <= min {
            return IsolationTree::Leaf { size: values.len() };
        }

        let threshold = rng.gen_range(min..max);
        let (left, right): (Vec<f64>, Vec<f64>) = values.iter().partition(|&&v| v < threshold);

        IsolationTree::Split {
            threshold,
            left: Box::new(Self::grow(&left, depth + 1, height_limit, rng)),
            right: Box::new(Self::grow(&right, depth + 1, height_limit, rng)),
        }
    }

    fn path_length(&self, x: f64) -> f64 {
        let mut node = self;
        let mut depth = 0.0;
        loop {
            match node {
                IsolationTree::Leaf { size } => return depth + average_path_length(*size),
                IsolationTree::Split { threshold, left, right } => {
                    node = if x < *threshold { left } else { right };
                    depth += 1.0;
                }
            }
        }
    }
}

/// Average path length of an unsuccessful search in a binary search tree of
/// `n` points.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        n => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

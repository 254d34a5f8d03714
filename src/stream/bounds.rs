//! Expected-range estimation over outlier-masked series.
//!
//! Both strategies first replace every flagged value by a gap and fill the
//! gaps by linear interpolation, so an anomaly never widens its own band.
//! A leading gap has no left neighbour and stays missing; a trailing gap is
//! carried forward from the last known value.

use crate::core::Band;
use crate::{Error, Result};

/// Masks flagged positions and fills them by linear interpolation.
pub fn mask_and_interpolate(values: &[f64], labels: &[bool]) -> Result<Vec<Option<f64>>> {
    if values.len() != labels.len() {
        return Err(Error::InvalidParameter(format!(
            "{} labels for {} values",
            labels.len(),
            values.len()
        )));
    }

    let masked: Vec<Option<f64>> = values
        .iter()
        .zip(labels)
        .map(|(&v, &outlier)| if outlier || !v.is_finite() { None } else { Some(v) })
        .collect();

    Ok(interpolate(&masked))
}

/// Linear interpolation between the nearest known neighbours on each side.
pub fn interpolate(masked: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut filled = masked.to_vec();
    let mut previous: Option<(usize, f64)> = None;

    for (i, slot) in masked.iter().enumerate() {
        let Some(value) = *slot else { continue };
        if let Some((p, start)) = previous {
            let gap = (i - p) as f64;
            for (step, missing) in filled[p + 1..i].iter_mut().enumerate() {
                *missing = Some(start + (value - start) * (step + 1) as f64 / gap);
            }
        }
        previous = Some((i, value));
    }

    if let Some((p, last)) = previous {
        for missing in &mut filled[p + 1..] {
            *missing = Some(last);
        }
    }

    filled
}

/// Turns values and outlier labels into one [`Band`] per position.
pub trait BoundEstimator: Send + Sync {
    /// Bands over an already interpolated series.
    fn smooth(&self, interpolated: &[Option<f64>]) -> Vec<Band>;

    fn estimate(&self, values: &[f64], labels: &[bool]) -> Result<Vec<Band>> {
        let interpolated = mask_and_interpolate(values, labels)?;
        Ok(self.smooth(&interpolated))
    }
}

/// Centered rolling window. Used for batch series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingBounds {
    width: usize,
}

impl RollingBounds {
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(1),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }
}

impl Default for RollingBounds {
    fn default() -> Self {
        Self::new(3)
    }
}

impl BoundEstimator for RollingBounds {
    fn smooth(&self, interpolated: &[Option<f64>]) -> Vec<Band> {
        let before = (self.width - 1) / 2;
        let after = self.width - 1 - before;

        (0..interpolated.len())
            .map(|i| {
                if i < before || i + after >= interpolated.len() {
                    return Band::undefined();
                }
                // Any gap inside the window leaves the position undefined.
                let window: Option<Vec<f64>> =
                    interpolated[i - before..=i + after].iter().copied().collect();
                match window {
                    Some(window) => Band::new(Some(mean(&window)), sample_std(&window)),
                    None => Band::undefined(),
                }
            })
            .collect()
    }
}

/// Exponentially weighted mean and standard deviation. Used for live windows.
///
/// Weights are the adjusted form `(1 - alpha)^k` with `alpha = 2 / (span + 1)`,
/// and the variance is bias-corrected for the effective sample size. Gaps still
/// age older observations. The first observation has a mean but no spread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialBounds {
    span: usize,
}

impl ExponentialBounds {
    pub fn new(span: usize) -> Self {
        Self { span: span.max(1) }
    }

    pub fn alpha(&self) -> f64 {
        2.0 / (self.span as f64 + 1.0)
    }
}

impl Default for ExponentialBounds {
    fn default() -> Self {
        Self::new(6)
    }
}

impl BoundEstimator for ExponentialBounds {
    fn smooth(&self, interpolated: &[Option<f64>]) -> Vec<Band> {
        let decay = 1.0 - self.alpha();
        let mut state: Option<EwmState> = None;

        interpolated
            .iter()
            .map(|&x| {
                match state.as_mut() {
                    Some(s) => s.update(x, decay),
                    None => state = x.map(EwmState::first),
                }
                state.as_ref().map_or_else(Band::undefined, EwmState::band)
            })
            .collect()
    }
}

/// Running weighted moments.
struct EwmState {
    mean: f64,
    variance: f64,
    old_weight: f64,
    sum_weights: f64,
    sum_weights_sq: f64,
}

impl EwmState {
    fn first(x: f64) -> Self {
        Self {
            mean: x,
            variance: 0.0,
            old_weight: 1.0,
            sum_weights: 1.0,
            sum_weights_sq: 1.0,
        }
    }

    fn update(&mut self, x: Option<f64>, decay: f64) {
        self.sum_weights *= decay;
        self.sum_weights_sq *= decay * decay;
        self.old_weight *= decay;

        let Some(x) = x else { return };
        let old_mean = self.mean;
        let total = self.old_weight + 1.0;
        if self.mean != x {
            self.mean = (self.old_weight * old_mean + x) / total;
        }
        self.variance = (self.old_weight * (self.variance + (old_mean - self.mean).powi(2))
            + (x - self.mean).powi(2))
            / total;
        self.sum_weights += 1.0;
        self.sum_weights_sq += 1.0;
        self.old_weight += 1.0;
    }

    fn band(&self) -> Band {
        let numerator = self.sum_weights * self.sum_weights;
        let denominator = numerator - self.sum_weights_sq;
        let spread = (denominator > 0.0)
            .then(|| (numerator / denominator * self.variance).max(0.0).sqrt());
        Band::new(Some(self.mean), spread)
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator); undefined below two values.
fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

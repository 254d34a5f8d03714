use crate::config::{MAX_CONTAMINATION, MIN_CONTAMINATION};
use crate::{Error, Result};

/// Estimates contamination with Tukey fences when the caller supplies none.
pub struct ContaminationEstimator;

impl ContaminationEstimator {
    /// Fraction of values outside `[Q1 - 1.5 IQR, Q3 + 1.5 IQR]`, clamped into
    /// the scorer's domain. A constant series yields the floor of 0.01.
    pub fn estimate(values: &[f64]) -> Result<f64> {
        if values.is_empty() {
            return Err(Error::InvalidParameter(
                "cannot estimate contamination of an empty series".to_string(),
            ));
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let q1 = quantile(&sorted, 0.25);
        let q3 = quantile(&sorted, 0.75);
        let iqr = q3 - q1;
        let lower = q1 - 1.5 * iqr;
        let upper = q3 + 1.5 * iqr;

        let outside = values.iter().filter(|&&v| v < lower || v > upper).count();
        let fraction = outside as f64 / values.len() as f64;

        Ok(fraction.clamp(MIN_CONTAMINATION, MAX_CONTAMINATION))
    }
}

/// Quantile of ascending `sorted` data, interpolating linearly between the
/// closest ranks. Returns `NaN` for empty input.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let rank = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&sorted, 0.0), 1.0);
        assert_eq!(quantile(&sorted, 1.0), 4.0);
        assert!((quantile(&sorted, 0.25) - 1.75).abs() < 1e-12);
        assert!((quantile(&sorted, 0.5) - 2.5).abs() < 1e-12);
    }
}

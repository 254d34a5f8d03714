use crate::config::{MAX_CONTAMINATION, MIN_CONTAMINATION};
use crate::core::OutlierLabels;
use crate::{Error, Result};

/// Labels each value of a batch as outlier or inlier.
///
/// `contamination` is the expected fraction of outliers and must lie in
/// `[0.01, 0.5]`. Implementations should flag roughly that fraction, but the
/// exact count is not part of the contract. Implementations that are random
/// internally must seed themselves so that the same batch yields the same
/// labels; batch scoring relies on this.
pub trait Scorer: Send + Sync {
    fn label(&self, values: &[f64], contamination: f64) -> Result<OutlierLabels>;

    /// Short name used in logs.
    fn name(&self) -> &'static str {
        "scorer"
    }
}

/// Rejects contamination outside the range every scorer accepts.
pub fn validate_contamination(contamination: f64) -> Result<()> {
    if (MIN_CONTAMINATION..=MAX_CONTAMINATION).contains(&contamination) {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!(
            "contamination {} outside [{}, {}]",
            contamination, MIN_CONTAMINATION, MAX_CONTAMINATION
        )))
    }
}

//! Outlier labelling and contamination estimation
//!
//! The pipeline only depends on the [`Scorer`] capability. The isolation
//! forest in [`isolation_forest`] is the default adapter; any other labelling
//! model can be dropped in without touching generation or bound estimation.

pub mod contamination;
pub mod isolation_forest;
pub mod scorer;

pub use contamination::ContaminationEstimator;
pub use isolation_forest::IsolationForestScorer;
pub use scorer::{validate_contamination, Scorer};

pub mod bounds;
pub mod live_detector;

pub use bounds::{BoundEstimator, ExponentialBounds, RollingBounds};
pub use live_detector::{DetectorState, LiveAssessment, LiveDetector, LiveRecord, LiveWindow};

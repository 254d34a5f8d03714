//! # Argus
//!
//! Argus scores short, regularly-sampled metric series for anomalous values and
//! reports, for every timestamp, whether the value is anomalous together with a
//! smoothed expected range.
//!
//! The name is borrowed from Argus Panoptes, the many-eyed watchman of Greek
//! myth who never closed all of his eyes at once. Argus watches in two ways:
//!
//! - **Batch** scoring synthesizes a fixed 24-hour series per metric, injects
//!   reproducible spikes and drops, and scores the whole series in one pass.
//! - **Live** scoring ingests one observation at a time into a bounded sliding
//!   window and scores the newest point against the window it belongs to.
//!
//! ## Example
//!
//! ```rust
//! use argus::api::anomaly_api::AnomalyApi;
//! use argus::config::ArgusConfig;
//! use argus::core::Metric;
//!
//! fn example() -> argus::Result<()> {
//!     let api = AnomalyApi::new(ArgusConfig::default())?;
//!     let rows = api.score_batch(&[Metric::new("visits", 150.0, 20.0, 0)])?;
//!     assert_eq!(rows.len(), 24);
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

/// Core data structures and types
pub mod core;

/// Configuration structures and defaults
pub mod config;

/// Synthetic series generation with controlled anomaly injection
pub mod generation;

/// Outlier labelling and contamination estimation
pub mod scoring;

/// Bound estimation and the live sliding-window detector
pub mod stream;

/// Registry of live metric streams
pub mod registry;

/// Top-level API tying generation, scoring and live detection together
pub mod api;

/// HTTP surface for batch and live scoring
pub mod http;

/// Log output for the binaries
pub mod logging;

pub mod error {
    //! Error types and result definitions

    use thiserror::Error;

    /// Result type alias for Argus operations
    pub type Result<T> = std::result::Result<T, Error>;

    /// Main error type for Argus
    #[derive(Error, Debug)]
    pub enum Error {
        /// A caller-supplied parameter was rejected before any work was done
        #[error("Invalid parameter: {0}")]
        InvalidParameter(String),
        /// The outlier scorer could not label a series
        #[error("Scoring error: {0}")]
        Scoring(String),
        /// No live stream is registered under this name
        #[error("Unknown stream: {0}")]
        UnknownStream(String),
        /// Live stream error (duplicate registration, poisoned window lock)
        #[error("Stream error: {0}")]
        Stream(String),
        /// Configuration error
        #[error("Configuration error: {0}")]
        Config(String),
        /// IO error
        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),
        /// JSON error
        #[error("JSON error: {0}")]
        Json(#[from] serde_json::Error),
    }
}

// Re-export commonly used types
pub use error::{Error, Result};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidParameter("spikes must be non-negative".to_string());
        assert_eq!(format!("{}", err), "Invalid parameter: spikes must be non-negative");
    }
}

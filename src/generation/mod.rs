//! Synthetic series generation
//!
//! Batch scoring runs on synthetic hourly series so that demos and test
//! fixtures are reproducible. See [`series_generator::SeriesGenerator`].

pub mod series_generator;

pub use series_generator::{GenerationRequest, InjectionIntensity, SeriesGenerator, SyntheticSeries};

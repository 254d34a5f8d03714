pub mod anomaly_api;

pub use anomaly_api::{AnomalyApi, BatchRow, MetricRecord, MetricScore};

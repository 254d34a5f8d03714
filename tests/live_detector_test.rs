use argus::config::LiveConfig;
use argus::core::timestamps::default_origin;
use argus::core::{OutlierLabels, Timestamp};
use argus::scoring::{IsolationForestScorer, Scorer};
use argus::stream::{DetectorState, LiveAssessment, LiveDetector};
use argus::{Error, Result};
use chrono::Duration;
use std::sync::Arc;

/// Flags everything above a fixed threshold.
struct ThresholdScorer(f64);

impl Scorer for ThresholdScorer {
    fn label(&self, values: &[f64], _contamination: f64) -> Result<OutlierLabels> {
        Ok(values.iter().map(|&v| v > self.0).collect())
    }
}

fn at(second: i64) -> Timestamp {
    default_origin() + Duration::seconds(second)
}

fn detector() -> LiveDetector {
    LiveDetector::new(&LiveConfig::default(), Arc::new(IsolationForestScorer::new(42)))
}

fn deposit(i: i64) -> f64 {
    // Deterministic wobble around 500.
    500.0 + f64::from(((i * 37) % 41) as i32) - 20.0
}

#[test]
fn test_warm_up_for_exactly_five_samples() {
    let mut live = detector();
    for i in 0..5 {
        let record = live.ingest(deposit(i), at(i)).unwrap();
        assert!(!record.anomaly);
        assert_eq!(
            record.assessment,
            LiveAssessment::InsufficientData {
                buffered: (i + 1) as usize,
                required: 6,
            }
        );
        assert!(record.band().is_none());
        assert_eq!(live.state(), DetectorState::WarmingUp);
    }

    for i in 5..12 {
        let record = live.ingest(deposit(i), at(i)).unwrap();
        assert!(matches!(record.assessment, LiveAssessment::Scored { .. }));
        assert_eq!(live.state(), DetectorState::Active);
    }
}

#[test]
fn test_window_evicts_oldest_after_capacity() {
    let mut live = detector();
    for i in 0..25 {
        live.ingest(deposit(i), at(i)).unwrap();
    }

    let window = live.window();
    assert_eq!(window.len(), 24);
    assert_eq!(window.oldest().unwrap().timestamp, at(1));
    assert_eq!(window.newest().unwrap().timestamp, at(24));
    assert!(window.samples().iter().all(|s| s.timestamp != at(0)));
}

#[test]
fn test_history_covers_window_and_ends_with_newest() {
    let mut live = detector();
    let mut last = None;
    for i in 0..30 {
        last = Some(live.ingest(deposit(i), at(i)).unwrap());
    }
    let record = last.unwrap();
    let history = record.history().unwrap();

    assert_eq!(history.len(), 24);
    assert_eq!(history[0].timestamp, at(6));
    let newest = history.last().unwrap();
    assert_eq!(newest.timestamp, record.timestamp);
    assert_eq!(newest.value, record.value);
    assert_eq!(newest.anomaly, record.anomaly);
    assert_eq!(Some(&newest.band), record.band());
    // The exponential estimate is defined at the newest position of a warm window.
    assert!(newest.band.is_defined());
}

#[test]
fn test_spike_is_flagged_by_pluggable_scorer() {
    let mut live = LiveDetector::new(&LiveConfig::default(), Arc::new(ThresholdScorer(1000.0)));
    for i in 0..10 {
        assert!(!live.ingest(deposit(i), at(i)).unwrap().anomaly);
    }
    let record = live.ingest(1500.0, at(10)).unwrap();
    assert!(record.anomaly);

    // The spike is masked, so its band stays near the regular deposits.
    let band = record.band().unwrap();
    assert!(band.upper().unwrap() < 1000.0);
}

#[test]
fn test_spike_is_flagged_by_isolation_forest() {
    let mut live = detector();
    for i in 0..23 {
        live.ingest(deposit(i), at(i)).unwrap();
    }
    let record = live.ingest(1500.0, at(23)).unwrap();
    assert!(record.anomaly);
}

#[test]
fn test_non_increasing_timestamp_is_rejected() {
    let mut live = detector();
    live.ingest(500.0, at(5)).unwrap();
    assert!(matches!(live.ingest(510.0, at(5)), Err(Error::InvalidParameter(_))));
    assert!(matches!(live.ingest(510.0, at(4)), Err(Error::InvalidParameter(_))));
    assert_eq!(live.window().len(), 1);
}

#[test]
fn test_non_finite_value_is_rejected() {
    let mut live = detector();
    assert!(matches!(live.ingest(f64::NAN, at(0)), Err(Error::InvalidParameter(_))));
    assert!(live.window().is_empty());
}

#[test]
fn test_reset_returns_to_warm_up() {
    let mut live = detector();
    for i in 0..8 {
        live.ingest(deposit(i), at(i)).unwrap();
    }
    assert_eq!(live.state(), DetectorState::Active);

    live.reset();
    assert_eq!(live.state(), DetectorState::WarmingUp);
    let record = live.ingest(500.0, at(100)).unwrap();
    assert!(matches!(record.assessment, LiveAssessment::InsufficientData { buffered: 1, .. }));
}

#[test]
fn test_ingest_now_keeps_timestamps_increasing() {
    let mut live = detector();
    for i in 0..50 {
        live.ingest_now(deposit(i)).unwrap();
    }
    let samples = live.window().samples();
    assert_eq!(samples.len(), 24);
    for pair in samples.windows(2) {
        assert!(pair[0].timestamp < pair[1].timestamp);
    }
}

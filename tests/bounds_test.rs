use argus::core::timestamps::default_origin;
use argus::core::Band;
use argus::generation::series_generator::{GenerationRequest, InjectionIntensity, SeriesGenerator};
use argus::scoring::{IsolationForestScorer, Scorer};
use argus::stream::bounds::{interpolate, mask_and_interpolate};
use argus::stream::{BoundEstimator, ExponentialBounds, RollingBounds};
use argus::Error;

fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
}

#[test]
fn test_interpolation_fills_interior_gaps_linearly() {
    let filled = interpolate(&[Some(1.0), None, None, Some(4.0)]);
    assert_eq!(filled, vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]);
}

#[test]
fn test_interpolation_edges() {
    let filled = interpolate(&[None, Some(2.0), None, Some(6.0), None, None]);
    assert_eq!(filled, vec![None, Some(2.0), Some(4.0), Some(6.0), Some(6.0), Some(6.0)]);
    assert_eq!(interpolate(&[None, None]), vec![None, None]);
}

#[test]
fn test_masking_without_labels_is_identity() {
    let values = [3.0, 9.0, -1.0, 4.5, 7.0];
    let interpolated = mask_and_interpolate(&values, &[false; 5]).unwrap();
    let expected: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
    assert_eq!(interpolated, expected);

    let estimator = RollingBounds::default();
    let direct = estimator.smooth(&expected);
    assert_eq!(estimator.estimate(&values, &[false; 5]).unwrap(), direct);
}

#[test]
fn test_label_length_mismatch_is_rejected() {
    let result = RollingBounds::default().estimate(&[1.0, 2.0, 3.0], &[false, true]);
    assert!(matches!(result, Err(Error::InvalidParameter(_))));
}

#[test]
fn test_rolling_window_of_three() {
    let values = [1.0, 2.0, 3.0, 4.0, 5.0];
    let bands = RollingBounds::default().estimate(&values, &[false; 5]).unwrap();

    assert!(!bands[0].is_defined());
    assert!(!bands[4].is_defined());
    for (i, band) in bands.iter().enumerate().take(4).skip(1) {
        assert_close(band.mean.unwrap(), values[i]);
        assert_close(band.spread.unwrap(), 1.0);
        assert_close(band.upper().unwrap(), values[i] + 2.0);
        assert_close(band.lower().unwrap(), values[i] - 2.0);
    }
}

#[test]
fn test_outliers_do_not_widen_their_own_band() {
    let values = [10.0, 10.0, 10.0, 1000.0, 10.0, 10.0];
    let labels = [false, false, false, true, false, false];
    let bands = RollingBounds::default().estimate(&values, &labels).unwrap();
    for band in &bands[1..5] {
        assert_close(band.mean.unwrap(), 10.0);
        assert_close(band.spread.unwrap(), 0.0);
    }
}

#[test]
fn test_leading_outlier_leaves_window_undefined() {
    let values = [500.0, 1.0, 2.0, 3.0];
    let labels = [true, false, false, false];
    let bands = RollingBounds::default().estimate(&values, &labels).unwrap();
    assert!(!bands[1].is_defined());
    assert!(bands[2].is_defined());
    assert_close(bands[2].mean.unwrap(), 2.0);
}

#[test]
fn test_undefined_band_serializes_as_zeros() {
    let json = serde_json::to_value(Band::undefined()).unwrap();
    assert_eq!(
        json,
        serde_json::json!({ "mean": 0.0, "std": 0.0, "upper": 0.0, "lower": 0.0 })
    );

    // Mean known but spread not: the bounds are undefined too.
    let json = serde_json::to_value(Band::new(Some(5.0), None)).unwrap();
    assert_eq!(
        json,
        serde_json::json!({ "mean": 5.0, "std": 0.0, "upper": 0.0, "lower": 0.0 })
    );
}

#[test]
fn test_exponential_first_index() {
    let bands = ExponentialBounds::default()
        .estimate(&[12.0, 14.0, 13.0], &[false; 3])
        .unwrap();
    assert_close(bands[0].mean.unwrap(), 12.0);
    assert_eq!(bands[0].spread, None);
    assert!(!bands[0].is_defined());
    assert!(bands[1].is_defined());
    assert!(bands[2].is_defined());
}

#[test]
fn test_exponential_matches_weighted_moments() {
    let values = [10.0, 14.0, 9.0, 12.0];
    let bands = ExponentialBounds::new(6).estimate(&values, &[false; 4]).unwrap();

    let decay: f64 = 5.0 / 7.0;
    let weights: Vec<f64> = (0..values.len()).rev().map(|k| decay.powi(k as i32)).collect();
    let sum_w: f64 = weights.iter().sum();
    let sum_w2: f64 = weights.iter().map(|w| w * w).sum();
    let mean = weights.iter().zip(&values).map(|(w, x)| w * x).sum::<f64>() / sum_w;
    let biased =
        weights.iter().zip(&values).map(|(w, x)| w * (x - mean).powi(2)).sum::<f64>() / sum_w;
    let unbiased = biased * sum_w * sum_w / (sum_w * sum_w - sum_w2);

    let last = bands[3];
    assert_close(last.mean.unwrap(), mean);
    assert_close(last.spread.unwrap(), unbiased.sqrt());
}

#[test]
fn test_exponential_constant_series_has_zero_spread() {
    let bands = ExponentialBounds::default().estimate(&[7.0; 8], &[false; 8]).unwrap();
    for band in &bands[1..] {
        assert_close(band.mean.unwrap(), 7.0);
        assert_close(band.spread.unwrap(), 0.0);
    }
}

#[test]
fn test_defined_bands_are_ordered_and_symmetric() {
    let request = GenerationRequest {
        base_seed: 7,
        metric_offset: 0,
        length: 24,
        mean: 150.0,
        stddev: 20.0,
        spikes: 2,
        drops: 1,
        intensity: InjectionIntensity::Variable,
        origin: default_origin(),
    };
    let values = SeriesGenerator::generate(&request).unwrap().values();
    let labels = IsolationForestScorer::new(42).label(&values, 0.1).unwrap();

    let rolling = RollingBounds::default().estimate(&values, &labels).unwrap();
    let exponential = ExponentialBounds::default().estimate(&values, &labels).unwrap();

    for band in rolling.iter().chain(&exponential).filter(|b| b.is_defined()) {
        let (mean, upper, lower) = (
            band.mean.unwrap(),
            band.upper().unwrap(),
            band.lower().unwrap(),
        );
        assert!(lower <= mean && mean <= upper);
        assert_close(upper - mean, mean - lower);
    }
}

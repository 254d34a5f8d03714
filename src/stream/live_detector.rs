use crate::config::LiveConfig;
use crate::core::{Band, DetectionRecord, Sample, Timestamp};
use crate::scoring::Scorer;
use crate::stream::bounds::{BoundEstimator, ExponentialBounds};
use crate::{Error, Result};
use chrono::{Duration, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

/// Capacity-bounded FIFO of the most recent samples of one metric stream.
#[derive(Debug, Clone)]
pub struct LiveWindow {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl LiveWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity: capacity.max(1),
        }
    }

    /// Appends a sample and returns the oldest one if the window overflowed.
    pub fn push(&mut self, sample: Sample) -> Option<Sample> {
        self.samples.push_back(sample);
        if self.samples.len() > self.capacity {
            self.samples.pop_front()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn newest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    pub fn oldest(&self) -> Option<&Sample> {
        self.samples.front()
    }

    pub fn samples(&self) -> Vec<Sample> {
        self.samples.iter().copied().collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Whether the detector has buffered enough samples to score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorState {
    WarmingUp,
    Active,
}

/// What the detector could say about the newest sample.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveAssessment {
    /// Too few samples buffered; the scorer was not run.
    InsufficientData { buffered: usize, required: usize },
    /// Band of the newest position plus the scored window, oldest first.
    Scored {
        band: Band,
        history: Vec<DetectionRecord>,
    },
}

/// Result of ingesting one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveRecord {
    pub timestamp: Timestamp,
    pub value: f64,
    pub anomaly: bool,
    pub assessment: LiveAssessment,
}

impl LiveRecord {
    pub fn band(&self) -> Option<&Band> {
        match &self.assessment {
            LiveAssessment::Scored { band, .. } => Some(band),
            LiveAssessment::InsufficientData { .. } => None,
        }
    }

    pub fn history(&self) -> Option<&[DetectionRecord]> {
        match &self.assessment {
            LiveAssessment::Scored { history, .. } => Some(history),
            LiveAssessment::InsufficientData { .. } => None,
        }
    }
}

/// Sliding-window detector for one metric stream.
///
/// `ingest` takes `&mut self`; callers sharing a detector across requests must
/// hold an exclusive lock for the whole call so that append, eviction and the
/// scoring read see one consistent window (see
/// [`StreamRegistry`](crate::registry::stream_registry::StreamRegistry)).
pub struct LiveDetector {
    window: LiveWindow,
    min_samples: usize,
    contamination: f64,
    scorer: Arc<dyn Scorer>,
    bounds: ExponentialBounds,
}

impl LiveDetector {
    pub fn new(config: &LiveConfig, scorer: Arc<dyn Scorer>) -> Self {
        Self {
            window: LiveWindow::new(config.capacity),
            min_samples: config.min_samples,
            contamination: config.contamination,
            scorer,
            bounds: ExponentialBounds::new(config.span),
        }
    }

    pub fn state(&self) -> DetectorState {
        if self.window.len() < self.min_samples {
            DetectorState::WarmingUp
        } else {
            DetectorState::Active
        }
    }

    pub fn window(&self) -> &LiveWindow {
        &self.window
    }

    /// Empties the window; the detector warms up again from scratch.
    pub fn reset(&mut self) {
        self.window.clear();
    }

    /// Appends a sample, evicting the oldest past capacity, and scores the
    /// newest point once the window is warm.
    ///
    /// Timestamps must be strictly increasing within a stream.
    pub fn ingest(&mut self, value: f64, timestamp: Timestamp) -> Result<LiveRecord> {
        if !value.is_finite() {
            return Err(Error::InvalidParameter(format!("observation {} is not finite", value)));
        }
        if let Some(newest) = self.window.newest() {
            if timestamp <= newest.timestamp {
                return Err(Error::InvalidParameter(format!(
                    "timestamp {} is not after the newest buffered sample {}",
                    timestamp, newest.timestamp
                )));
            }
        }

        if let Some(evicted) = self.window.push(Sample::new(timestamp, value)) {
            debug!(evicted = evicted.value, "evicted oldest sample from live window");
        }

        if self.state() == DetectorState::WarmingUp {
            return Ok(LiveRecord {
                timestamp,
                value,
                anomaly: false,
                assessment: LiveAssessment::InsufficientData {
                    buffered: self.window.len(),
                    required: self.min_samples,
                },
            });
        }

        let samples = self.window.samples();
        let values = self.window.values();
        let labels = self.scorer.label(&values, self.contamination)?;
        let bands = self.bounds.estimate(&values, &labels)?;
        let history = DetectionRecord::from_parts(&samples, &labels, &bands);

        let latest = history
            .last()
            .cloned()
            .ok_or_else(|| Error::Stream("scored an empty live window".to_string()))?;

        debug!(
            scorer = self.scorer.name(),
            window = samples.len(),
            value,
            anomaly = latest.anomaly,
            "scored live sample"
        );

        Ok(LiveRecord {
            timestamp,
            value,
            anomaly: latest.anomaly,
            assessment: LiveAssessment::Scored {
                band: latest.band,
                history,
            },
        })
    }

    /// Ingests at the current time. The timestamp is taken inside the call, so
    /// under a lock it is always later than the newest buffered sample.
    pub fn ingest_now(&mut self, value: f64) -> Result<LiveRecord> {
        let now = Utc::now().naive_utc();
        let timestamp = match self.window.newest() {
            Some(newest) if now <= newest.timestamp => newest.timestamp + Duration::microseconds(1),
            _ => now,
        };
        self.ingest(value, timestamp)
    }
}

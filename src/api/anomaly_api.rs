use crate::{
    config::ArgusConfig,
    core::{hourly_timestamps, timestamps, Band, DetectionRecord, Metric, OutlierLabels, Timestamp},
    generation::series_generator::{GenerationRequest, SeriesGenerator, SyntheticSeries},
    registry::stream_registry::StreamRegistry,
    scoring::{validate_contamination, ContaminationEstimator, IsolationForestScorer, Scorer},
    stream::{
        bounds::{BoundEstimator, RollingBounds},
        live_detector::LiveRecord,
    },
    Error, Result,
};
use serde::Serialize;
use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};
use tracing::{debug, info, warn};

/// One metric at one timestamp, as returned by batch scoring.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRecord {
    pub value: i64,
    pub anomaly: bool,
    #[serde(flatten)]
    pub band: Band,
}

/// All metrics at one timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchRow {
    #[serde(serialize_with = "timestamps::serialize")]
    pub timestamp: Timestamp,
    pub metrics: BTreeMap<String, MetricRecord>,
}

/// Full scoring result for one synthetic metric series.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricScore {
    pub metric: String,
    /// Contamination handed to the scorer
    pub contamination: f64,
    /// `true` when the contamination came from the Tukey-fence estimate
    pub estimated: bool,
    pub series: SyntheticSeries,
    pub labels: OutlierLabels,
    pub bands: Vec<Band>,
}

impl MetricScore {
    pub fn records(&self) -> Vec<DetectionRecord> {
        DetectionRecord::from_parts(&self.series.samples, &self.labels, &self.bands)
    }

    fn metric_records(&self) -> Vec<MetricRecord> {
        self.records()
            .into_iter()
            .map(|r| MetricRecord {
                value: r.value as i64,
                anomaly: r.anomaly,
                band: r.band,
            })
            .collect()
    }
}

/// Top-level API which coordinates batch scoring of synthetic series and the
/// live detectors of every registered stream.
pub struct AnomalyApi {
    config: ArgusConfig,
    scorer: Arc<dyn Scorer>,
    rolling: RollingBounds,
    streams: StreamRegistry,
}

impl AnomalyApi {
    /// Builds the API with the seeded isolation forest as scorer.
    pub fn new(config: ArgusConfig) -> Result<Self> {
        let scorer = Arc::new(IsolationForestScorer::from_config(&config.scorer));
        Self::with_scorer(config, scorer)
    }

    /// Builds the API around any [`Scorer`] and registers the configured live
    /// streams.
    pub fn with_scorer(config: ArgusConfig, scorer: Arc<dyn Scorer>) -> Result<Self> {
        config.validate()?;
        let streams = StreamRegistry::new(config.live.clone(), Arc::clone(&scorer));
        for stream in &config.live.streams {
            streams.register(stream)?;
        }
        info!(
            scorer = scorer.name(),
            streams = config.live.streams.len(),
            "anomaly API ready"
        );

        Ok(Self {
            config,
            scorer,
            rolling: RollingBounds::default(),
            streams,
        })
    }

    pub fn config(&self) -> &ArgusConfig {
        &self.config
    }

    pub fn streams(&self) -> &StreamRegistry {
        &self.streams
    }

    pub fn generation_request(&self, metric: &Metric) -> GenerationRequest {
        let generator = &self.config.generator;
        GenerationRequest {
            base_seed: generator.base_seed,
            metric_offset: metric.seed_offset,
            length: generator.length,
            mean: metric.mean,
            stddev: metric.stddev,
            spikes: metric.spikes,
            drops: metric.drops,
            intensity: generator.intensity,
            origin: generator.origin,
        }
    }

    pub fn validate_metric(&self, metric: &Metric) -> Result<()> {
        self.generation_request(metric).validate()?;
        if let Some(contamination) = metric.contamination {
            validate_contamination(contamination)?;
        }
        Ok(())
    }

    /// Generates, labels and bounds one metric series.
    pub fn score_metric(&self, metric: &Metric) -> Result<MetricScore> {
        self.validate_metric(metric)?;

        let series = SeriesGenerator::generate(&self.generation_request(metric))?;
        let values = series.values();
        let (contamination, estimated) = match metric.contamination {
            Some(c) => (c, false),
            None => (ContaminationEstimator::estimate(&values)?, true),
        };
        let labels = self.scorer.label(&values, contamination)?;
        let bands = self.rolling.estimate(&values, &labels)?;

        debug!(
            metric = %metric.name,
            contamination,
            estimated,
            flagged = labels.iter().filter(|&&l| l).count(),
            "scored metric series"
        );

        Ok(MetricScore {
            metric: metric.name.clone(),
            contamination,
            estimated,
            series,
            labels,
            bands,
        })
    }

    /// Scores every metric and lays the results out per timestamp.
    ///
    /// All metrics are validated before any series is generated, so a single
    /// bad parameter rejects the whole request.
    pub fn score_batch(&self, metrics: &[Metric]) -> Result<Vec<BatchRow>> {
        let mut seen = HashSet::new();
        for metric in metrics {
            if !seen.insert(metric.name.as_str()) {
                return Err(Error::InvalidParameter(format!(
                    "metric '{}' requested twice",
                    metric.name
                )));
            }
            if let Err(e) = self.validate_metric(metric) {
                warn!(metric = %metric.name, error = %e, "rejected batch request");
                return Err(e);
            }
        }

        let columns = metrics
            .iter()
            .map(|metric| -> Result<(String, Vec<MetricRecord>)> {
                let records = self.score_metric(metric)?.metric_records();
                Ok((metric.name.clone(), records))
            })
            .collect::<Result<Vec<_>>>()?;

        let generator = &self.config.generator;
        let rows = hourly_timestamps(generator.origin, generator.length)
            .into_iter()
            .enumerate()
            .map(|(i, timestamp)| BatchRow {
                timestamp,
                metrics: columns
                    .iter()
                    .map(|(name, records)| (name.clone(), records[i].clone()))
                    .collect(),
            })
            .collect();

        info!(metrics = metrics.len(), points = generator.length, "scored batch");
        Ok(rows)
    }

    /// Ingests one live observation on `stream` at the current time.
    pub fn ingest(&self, stream: &str, value: f64) -> Result<LiveRecord> {
        self.streams.ingest(stream, value)
    }

    pub fn reset_stream(&self, stream: &str) -> Result<()> {
        self.streams.reset(stream)
    }
}

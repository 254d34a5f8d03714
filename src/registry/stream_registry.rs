use crate::config::LiveConfig;
use crate::scoring::Scorer;
use crate::stream::live_detector::{LiveDetector, LiveRecord};
use crate::{Error, Result};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard},
};
use tracing::info;

pub type StreamId = String;

type Detectors = HashMap<StreamId, Arc<Mutex<LiveDetector>>>;

/// Live detectors keyed by metric stream.
///
/// Every stream owns its own window behind its own mutex: ingests on one
/// stream are serialized, ingests on different streams never wait on each
/// other. The outer lock is only held long enough to look a stream up.
pub struct StreamRegistry {
    streams: RwLock<Detectors>,
    config: LiveConfig,
    scorer: Arc<dyn Scorer>,
}

impl StreamRegistry {
    pub fn new(config: LiveConfig, scorer: Arc<dyn Scorer>) -> Self {
        Self {
            streams: RwLock::new(HashMap::new()),
            config,
            scorer,
        }
    }

    /// Creates an empty window for `stream_id`.
    pub fn register(&self, stream_id: &str) -> Result<Arc<Mutex<LiveDetector>>> {
        let mut streams = self
            .streams
            .write()
            .map_err(|_| Error::Stream("stream registry lock poisoned".to_string()))?;
        if streams.contains_key(stream_id) {
            return Err(Error::Stream(format!("stream '{}' is already registered", stream_id)));
        }

        let detector =
            Arc::new(Mutex::new(LiveDetector::new(&self.config, Arc::clone(&self.scorer))));
        streams.insert(stream_id.to_string(), Arc::clone(&detector));
        info!(stream = stream_id, capacity = self.config.capacity, "registered live stream");
        Ok(detector)
    }

    pub fn get(&self, stream_id: &str) -> Result<Option<Arc<Mutex<LiveDetector>>>> {
        Ok(self.read_streams()?.get(stream_id).cloned())
    }

    /// Registered stream ids, sorted.
    pub fn list(&self) -> Result<Vec<StreamId>> {
        let mut ids: Vec<StreamId> = self
            .read_streams()?
            .keys()
            .cloned()
            .collect();
        ids.sort();
        Ok(ids)
    }

    pub fn remove(&self, stream_id: &str) -> Result<()> {
        self.streams
            .write()
            .map_err(|_| Error::Stream("stream registry lock poisoned".to_string()))?
            .remove(stream_id)
            .map(|_| ())
            .ok_or_else(|| Error::UnknownStream(stream_id.to_string()))
    }

    /// Ingests one observation as a single critical section on the stream.
    pub fn ingest(&self, stream_id: &str, value: f64) -> Result<LiveRecord> {
        let detector = self.lookup(stream_id)?;
        let mut detector = lock(&detector, stream_id)?;
        detector.ingest_now(value)
    }

    pub fn reset(&self, stream_id: &str) -> Result<()> {
        let detector = self.lookup(stream_id)?;
        lock(&detector, stream_id)?.reset();
        info!(stream = stream_id, "reset live stream");
        Ok(())
    }

    fn lookup(&self, stream_id: &str) -> Result<Arc<Mutex<LiveDetector>>> {
        self.get(stream_id)?.ok_or_else(|| Error::UnknownStream(stream_id.to_string()))
    }

    fn read_streams(&self) -> Result<RwLockReadGuard<'_, Detectors>> {
        self.streams
            .read()
            .map_err(|_| Error::Stream("stream registry lock poisoned".to_string()))
    }
}

fn lock<'a>(
    detector: &'a Mutex<LiveDetector>,
    stream_id: &str,
) -> Result<MutexGuard<'a, LiveDetector>> {
    detector
        .lock()
        .map_err(|_| Error::Stream(format!("live window of stream '{}' is poisoned", stream_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::IsolationForestScorer;
    use std::thread;

    fn registry() -> Arc<StreamRegistry> {
        let scorer = Arc::new(IsolationForestScorer::new(42));
        Arc::new(StreamRegistry::new(LiveConfig::default(), scorer))
    }

    #[test]
    fn test_poisoned_registry_is_a_stream_error() {
        let registry = registry();
        registry.register("deposits").unwrap();

        let poisoner = Arc::clone(&registry);
        let _ = thread::spawn(move || {
            let _guard = poisoner.streams.write().unwrap();
            panic!("poison the registry lock");
        })
        .join();

        assert!(matches!(registry.ingest("deposits", 500.0), Err(Error::Stream(_))));
        assert!(matches!(registry.reset("deposits"), Err(Error::Stream(_))));
        assert!(matches!(registry.get("deposits"), Err(Error::Stream(_))));
        assert!(matches!(registry.list(), Err(Error::Stream(_))));
    }

    #[test]
    fn test_unknown_stream_is_reported_by_name() {
        let registry = registry();
        match registry.ingest("withdrawals", 1.0) {
            Err(Error::UnknownStream(name)) => assert_eq!(name, "withdrawals"),
            other => panic!("expected UnknownStream, got {:?}", other.map(|r| r.value)),
        }
    }
}

//! Best-effort, append-only recording of computed results.
//!
//! Writes are spawned onto the runtime and never joined into the caller's
//! result. A failed write is logged and dropped.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

use crate::constants::MEMORY_STORE_CAPACITY;
use crate::domain::{PredictionResult, WeatherSnapshot};

/// Append-only store for snapshots and predictions
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn save_snapshot(&self, snapshot: &WeatherSnapshot) -> Result<()>;
    async fn save_prediction(&self, prediction: &PredictionResult) -> Result<()>;
}

/// Process-local store, used when no database collaborator is wired in.
///
/// Each kind keeps at most `capacity` records; the oldest is dropped first.
pub struct MemoryStore {
    capacity: usize,
    snapshots: Mutex<VecDeque<WeatherSnapshot>>,
    predictions: Mutex<VecDeque<PredictionResult>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_capacity(MEMORY_STORE_CAPACITY)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A zero capacity is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            snapshots: Mutex::new(VecDeque::with_capacity(capacity)),
            predictions: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn snapshots(&self) -> Vec<WeatherSnapshot> {
        self.snapshots
            .lock()
            .map(|guard| guard.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn predictions(&self) -> Vec<PredictionResult> {
        self.predictions
            .lock()
            .map(|guard| guard.iter().cloned().collect())
            .unwrap_or_default()
    }
}

fn push_bounded<T>(log: &mut VecDeque<T>, record: T, capacity: usize) {
    while log.len() >= capacity {
        log.pop_front();
    }
    log.push_back(record);
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn save_snapshot(&self, snapshot: &WeatherSnapshot) -> Result<()> {
        let mut log = self
            .snapshots
            .lock()
            .map_err(|_| anyhow::anyhow!("snapshot log poisoned"))?;
        push_bounded(&mut log, snapshot.clone(), self.capacity);
        Ok(())
    }

    async fn save_prediction(&self, prediction: &PredictionResult) -> Result<()> {
        let mut log = self
            .predictions
            .lock()
            .map_err(|_| anyhow::anyhow!("prediction log poisoned"))?;
        push_bounded(&mut log, prediction.clone(), self.capacity);
        Ok(())
    }
}

/// Fire-and-forget front for a `RecordStore`
#[derive(Clone)]
pub struct Recorder {
    store: Arc<dyn RecordStore>,
}

impl Recorder {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// The returned handle may be dropped; the write still runs.
    pub fn record_snapshot(&self, snapshot: WeatherSnapshot) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(e) = store.save_snapshot(&snapshot).await {
                tracing::warn!(
                    location = %snapshot.location,
                    provider = %snapshot.source,
                    error = %e,
                    "Failed to record weather snapshot"
                );
            }
        })
    }

    pub fn record_prediction(&self, prediction: PredictionResult) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(e) = store.save_prediction(&prediction).await {
                tracing::warn!(
                    district = %prediction.district_id,
                    date = %prediction.predicted_for,
                    error = %e,
                    "Failed to record prediction"
                );
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_snapshot, FailingStore};

    #[tokio::test]
    async fn recorder_appends_to_memory_store() {
        let store = Arc::new(MemoryStore::new());
        let recorder = Recorder::new(store.clone());

        recorder.record_snapshot(sample_snapshot()).await.unwrap();
        recorder.record_snapshot(sample_snapshot()).await.unwrap();

        assert_eq!(store.snapshots().len(), 2);
        assert!(store.predictions().is_empty());
    }

    #[tokio::test]
    async fn full_store_drops_the_oldest_record() {
        let store = MemoryStore::with_capacity(3);
        for i in 0..5 {
            let snapshot = WeatherSnapshot {
                location: format!("town-{i}"),
                ..sample_snapshot()
            };
            store.save_snapshot(&snapshot).await.unwrap();
        }

        let kept: Vec<String> = store.snapshots().into_iter().map(|s| s.location).collect();
        assert_eq!(kept, vec!["town-2", "town-3", "town-4"]);
    }

    #[test]
    fn default_store_is_bounded() {
        assert_eq!(MemoryStore::new().capacity, MEMORY_STORE_CAPACITY);
        assert_eq!(MemoryStore::with_capacity(0).capacity, 1);
    }

    #[tokio::test]
    async fn failed_write_completes_without_panicking() {
        let recorder = Recorder::new(Arc::new(FailingStore));
        let handle = recorder.record_snapshot(sample_snapshot());
        assert!(handle.await.is_ok());
    }
}

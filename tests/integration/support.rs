use async_trait::async_trait;
use beholder::error::ApiError;
use beholder::provider::CacheHandler;
use beholder::store::PathEntry;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

/// Handler that keeps every batch it receives
#[derive(Default)]
pub struct RecordingHandler {
    pub refreshed: Mutex<Vec<Vec<PathEntry>>>,
    pub preloaded: Mutex<Vec<Vec<PathEntry>>>,
}

impl RecordingHandler {
    pub fn refreshed_paths(&self) -> Vec<Vec<String>> {
        paths(&self.refreshed.lock())
    }

    pub fn preloaded_paths(&self) -> Vec<Vec<String>> {
        paths(&self.preloaded.lock())
    }
}

fn paths(batches: &[Vec<PathEntry>]) -> Vec<Vec<String>> {
    batches
        .iter()
        .map(|batch| batch.iter().map(|e| e.path.clone()).collect())
        .collect()
}

#[async_trait]
impl CacheHandler for RecordingHandler {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn refresh(
        &self,
        entries: &[PathEntry],
        _cancel: &CancellationToken,
    ) -> Result<bool, ApiError> {
        self.refreshed.lock().push(entries.to_vec());
        Ok(true)
    }

    async fn preload(
        &self,
        entries: &[PathEntry],
        _cancel: &CancellationToken,
    ) -> Result<bool, ApiError> {
        self.preloaded.lock().push(entries.to_vec());
        Ok(true)
    }
}

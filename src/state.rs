use crate::errors::AppError;
use crate::models::Snapshot;
use crate::storage::persist_snapshot;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub streak_lookback_days: u32,
    pub snapshot: Arc<Mutex<Snapshot>>,
}

impl AppState {
    pub fn new(data_path: PathBuf, streak_lookback_days: u32, snapshot: Snapshot) -> Self {
        Self {
            data_path,
            streak_lookback_days,
            snapshot: Arc::new(Mutex::new(snapshot)),
        }
    }

    pub async fn current(&self) -> Snapshot {
        self.snapshot.lock().await.clone()
    }

    /// Derives the next snapshot, persists it and only then makes it current.
    /// A failed write keeps the previous snapshot.
    pub async fn apply<F>(&self, mutate: F) -> Result<Snapshot, AppError>
    where
        F: FnOnce(&Snapshot) -> Snapshot,
    {
        let mut current = self.snapshot.lock().await;
        let next = mutate(&current);
        if next == *current {
            debug!("mutation left snapshot unchanged");
            return Ok(next);
        }

        persist_snapshot(&self.data_path, &next).await?;
        *current = next.clone();
        Ok(next)
    }
}

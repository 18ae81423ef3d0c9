use std::path::PathBuf;

use tramtimes_core::error::AppError;
use tramtimes_core::models::{StopId, WeeklySchedule};
use tramtimes_core::traits::ScheduleStore;

/// Writes each stop's schedule to `<dir>/_<STOP>.json` as pretty JSON.
///
/// The directory is created on first save. An existing file for the same
/// stop is overwritten.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, stop: &StopId) -> PathBuf {
        self.dir.join(format!("_{}.json", stop.to_upper()))
    }
}

impl ScheduleStore for JsonFileStore {
    async fn save(&self, stop: &StopId, schedule: &WeeklySchedule) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(schedule)?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            AppError::StorageError(format!("Cannot create {}: {e}", self.dir.display()))
        })?;

        let path = self.path_for(stop);
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| AppError::StorageError(format!("Cannot write {}: {e}", path.display())))?;

        tracing::debug!(path = %path.display(), "Wrote schedule");
        Ok(())
    }
}

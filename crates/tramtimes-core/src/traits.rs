use std::future::Future;

use crate::error::AppError;
use crate::models::{StopId, WeeklySchedule};

/// A raw HTTP answer: status plus body, before any status policy is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn ok(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues a single GET without retrying.
///
/// Transport failures map to `AppError::NetworkError` / `AppError::Timeout`;
/// any HTTP status (including 5xx) is returned as a response.
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchResponse, AppError>> + Send;
}

/// Reads table rows out of an HTML document.
///
/// Returns one entry per table row that has at least one `td` cell,
/// holding the trimmed text of each `td` in column order.
pub trait TableReader: Send + Sync + Clone {
    fn read_rows(&self, html: &str) -> Result<Vec<Vec<String>>, AppError>;
}

/// Persists a finished weekly schedule for a stop.
pub trait ScheduleStore: Send + Sync + Clone {
    fn save(
        &self,
        stop: &StopId,
        schedule: &WeeklySchedule,
    ) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// A no-op ScheduleStore for use when persistence is not needed.
#[derive(Debug, Clone)]
pub struct NullStore;

impl ScheduleStore for NullStore {
    async fn save(&self, _stop: &StopId, _schedule: &WeeklySchedule) -> Result<(), AppError> {
        Ok(())
    }
}

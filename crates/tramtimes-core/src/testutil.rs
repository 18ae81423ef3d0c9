//! Test utilities: mock implementations of all core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::sync::{Arc, Mutex};

use crate::error::AppError;
use crate::models::{StopId, WeeklySchedule};
use crate::traits::{FetchResponse, Fetcher, ScheduleStore, TableReader};

type Handler = dyn Fn(&str) -> Result<FetchResponse, AppError> + Send + Sync;

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Mock fetcher that replays queued responses or answers through a handler.
#[derive(Clone)]
pub struct MockFetcher {
    /// Queue of responses. Each call pops the first element.
    /// If empty, falls back to the handler (or an empty page).
    responses: Arc<Mutex<Vec<Result<FetchResponse, AppError>>>>,
    handler: Option<Arc<Handler>>,
    pub requested: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    pub fn new(html: &str) -> Self {
        Self::with_responses(vec![Ok(FetchResponse::ok("mock://page", html))])
    }

    pub fn with_error(error: AppError) -> Self {
        Self::with_responses(vec![Err(error)])
    }

    pub fn with_responses(responses: Vec<Result<FetchResponse, AppError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            handler: None,
            requested: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answer every request by calling `handler` with the URL.
    pub fn with_handler<H>(handler: H) -> Self
    where
        H: Fn(&str) -> Result<FetchResponse, AppError> + Send + Sync + 'static,
    {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            handler: Some(Arc::new(handler)),
            requested: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requested.lock().unwrap().len()
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, AppError> {
        self.requested.lock().unwrap().push(url.to_string());

        let queued = {
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                None
            } else {
                Some(responses.remove(0))
            }
        };

        match (queued, &self.handler) {
            (Some(response), _) => response,
            (None, Some(handler)) => (**handler)(url),
            (None, None) => Ok(FetchResponse::ok(url, "<html><body></body></html>")),
        }
    }
}

// ---------------------------------------------------------------------------
// MockTableReader
// ---------------------------------------------------------------------------

/// Reads a plain-text stand-in for an HTML table.
///
/// Each non-empty line is a row; cells are separated by `|` and trimmed.
#[derive(Clone, Default)]
pub struct MockTableReader;

impl TableReader for MockTableReader {
    fn read_rows(&self, html: &str) -> Result<Vec<Vec<String>>, AppError> {
        Ok(html
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| line.split('|').map(|c| c.trim().to_string()).collect())
            .collect())
    }
}

// ---------------------------------------------------------------------------
// MockStore
// ---------------------------------------------------------------------------

/// Mock store that records saves and can fail for one stop.
#[derive(Clone, Default)]
pub struct MockStore {
    pub saved: Arc<Mutex<Vec<(StopId, WeeklySchedule)>>>,
    fail_for: Option<String>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that returns a storage error when saving `stop`.
    pub fn failing_for(stop: &str) -> Self {
        Self {
            saved: Arc::new(Mutex::new(Vec::new())),
            fail_for: Some(stop.to_string()),
        }
    }

    pub fn saved_stops(&self) -> Vec<String> {
        self.saved
            .lock()
            .unwrap()
            .iter()
            .map(|(stop, _)| stop.to_string())
            .collect()
    }
}

impl ScheduleStore for MockStore {
    async fn save(&self, stop: &StopId, schedule: &WeeklySchedule) -> Result<(), AppError> {
        if self.fail_for.as_deref() == Some(stop.as_str()) {
            return Err(AppError::StorageError(format!("disk full for {stop}")));
        }
        self.saved
            .lock()
            .unwrap()
            .push((stop.clone(), schedule.clone()));
        Ok(())
    }
}

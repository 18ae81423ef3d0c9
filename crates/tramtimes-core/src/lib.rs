pub mod backoff;
pub mod circuit_breaker;
pub mod classify;
pub mod config;
pub mod error;
pub mod extract;
pub mod models;
pub mod policy;
pub mod runner;
pub mod schedule;
pub mod target_date;
pub mod traits;

#[cfg(test)]
pub mod testutil;

pub use backoff::Backoff;
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use config::ScheduleConfig;
pub use error::AppError;
pub use extract::ServiceExtractor;
pub use models::{Service, StopId, WeeklySchedule, read_stops};
pub use policy::{ResilienceConfig, ResiliencePolicy, RetryConfig};
pub use runner::{RunEvent, RunReporter, RunSummary, ScheduleRunner, StopFailure, TracingRunReporter};
pub use schedule::{ScheduleService, departures_url};
pub use target_date::target_date;
pub use traits::{FetchResponse, Fetcher, NullStore, ScheduleStore, TableReader};

use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::error::AppError;
use crate::policy::ResilienceConfig;

pub const DEFAULT_BASE_URL: &str = "https://bustimes.org/";

/// Configuration for building weekly schedules.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Root of the upstream site; stop pages live under `stops/<ID>`.
    pub base_url: String,
    /// Base pause between day fetches (jittered).
    pub day_delay: Duration,
    pub resilience: ResilienceConfig,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            day_delay: Duration::from_millis(500),
            resilience: ResilienceConfig::default(),
        }
    }
}

impl ScheduleConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_day_delay(mut self, delay: Duration) -> Self {
        self.day_delay = delay;
        self
    }

    pub fn with_resilience(mut self, resilience: ResilienceConfig) -> Self {
        self.resilience = resilience;
        self
    }

    /// Read configuration from environment variables.
    ///
    /// All optional, falling back to the defaults:
    /// - `TRAMTIMES_BASE_URL`
    /// - `TRAMTIMES_DAY_DELAY_MS` (500)
    /// - `TRAMTIMES_MAX_RETRIES` (2)
    /// - `TRAMTIMES_RETRY_BASE_MS` (1000)
    /// - `TRAMTIMES_BREAKER_THRESHOLD` (3, at least 1)
    /// - `TRAMTIMES_BREAKER_COOLDOWN_SECS` (120)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<L>(lookup: L) -> Result<Self, AppError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("TRAMTIMES_BASE_URL") {
            Url::parse(&raw).map_err(|e| {
                AppError::ConfigError(format!("Invalid TRAMTIMES_BASE_URL '{raw}': {e}"))
            })?;
            config.base_url = raw;
        }

        if let Some(ms) = parse_var::<u64, _>(&lookup, "TRAMTIMES_DAY_DELAY_MS")? {
            config.day_delay = Duration::from_millis(ms);
        }
        if let Some(retries) = parse_var::<u32, _>(&lookup, "TRAMTIMES_MAX_RETRIES")? {
            config.resilience.retry.max_retries = retries;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "TRAMTIMES_RETRY_BASE_MS")? {
            config.resilience.retry.base_delay = Duration::from_millis(ms);
        }
        if let Some(threshold) = parse_var::<u32, _>(&lookup, "TRAMTIMES_BREAKER_THRESHOLD")? {
            if threshold == 0 {
                return Err(AppError::ConfigError(
                    "TRAMTIMES_BREAKER_THRESHOLD must be at least 1".into(),
                ));
            }
            config.resilience.breaker.failure_threshold = threshold;
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "TRAMTIMES_BREAKER_COOLDOWN_SECS")? {
            config.resilience.breaker.recovery_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn parse_var<T, L>(lookup: &L, key: &str) -> Result<Option<T>, AppError>
where
    T: FromStr,
    L: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| {
            AppError::ConfigError(format!(
                "Invalid {key} '{raw}': must be a non-negative integer"
            ))
        }),
    }
}

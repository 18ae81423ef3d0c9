use chrono::{Datelike, NaiveDate};
use url::Url;

use crate::backoff::Backoff;
use crate::config::ScheduleConfig;
use crate::error::AppError;
use crate::extract::ServiceExtractor;
use crate::models::{Service, StopId, WeeklySchedule};
use crate::policy::ResiliencePolicy;
use crate::target_date::{anchor, week_dates};
use crate::traits::{Fetcher, ScheduleStore, TableReader};

/// Build the departures page URL for a stop on a given date.
///
/// `<base>/stops/<STOP>?date=<yyyy-MM-dd>&time=12%3A00`
pub fn departures_url(base_url: &str, stop: &StopId, date: NaiveDate) -> Result<Url, AppError> {
    let mut url = Url::parse(base_url)
        .map_err(|e| AppError::ConfigError(format!("Invalid base URL '{base_url}': {e}")))?;

    url.path_segments_mut()
        .map_err(|_| AppError::ConfigError(format!("Base URL '{base_url}' cannot have a path")))?
        .pop_if_empty()
        .push("stops")
        .push(&stop.to_upper());

    let at = anchor(date);
    url.query_pairs_mut()
        .append_pair("date", &at.format("%Y-%m-%d").to_string())
        .append_pair("time", &at.format("%H:%M").to_string());

    Ok(url)
}

/// Orchestrates a stop's week: fetch → extract → bucket → (save).
///
/// Generic over the fetcher, table reader and store, so tests run without
/// real HTTP or HTML parsing.
pub struct ScheduleService<F, R, S>
where
    F: Fetcher,
    R: TableReader,
    S: ScheduleStore,
{
    fetcher: F,
    extractor: ServiceExtractor<R>,
    policy: ResiliencePolicy,
    backoff: Backoff,
    store: Option<S>,
    config: ScheduleConfig,
}

impl<F, R, S> ScheduleService<F, R, S>
where
    F: Fetcher,
    R: TableReader,
    S: ScheduleStore,
{
    /// Create a new ScheduleService without persistence.
    ///
    /// `policy` should be the run's single policy instance; `backoff` paces
    /// the day-to-day pauses.
    pub fn new(
        fetcher: F,
        reader: R,
        policy: ResiliencePolicy,
        backoff: Backoff,
        config: ScheduleConfig,
    ) -> Self {
        Self {
            fetcher,
            extractor: ServiceExtractor::new(reader),
            policy,
            backoff,
            store: None,
            config,
        }
    }

    /// Create a new ScheduleService that saves every finished week.
    pub fn with_store(
        fetcher: F,
        reader: R,
        store: S,
        policy: ResiliencePolicy,
        backoff: Backoff,
        config: ScheduleConfig,
    ) -> Self {
        Self {
            store: Some(store),
            ..Self::new(fetcher, reader, policy, backoff, config)
        }
    }

    pub fn policy(&self) -> &ResiliencePolicy {
        &self.policy
    }

    /// Build and persist (if a store is configured) one stop's week.
    pub async fn process(
        &self,
        stop: &StopId,
        target_date: NaiveDate,
    ) -> Result<WeeklySchedule, AppError> {
        let schedule = self.build_week(stop, target_date).await?;

        if let Some(store) = &self.store {
            store.save(stop, &schedule).await?;
            tracing::info!(%stop, services = schedule.total_services(), "Schedule saved");
        }

        Ok(schedule)
    }

    /// Build a stop's schedule from seven consecutive days at `target_date`.
    ///
    /// Any failed day aborts the whole week.
    pub async fn build_week(
        &self,
        stop: &StopId,
        target_date: NaiveDate,
    ) -> Result<WeeklySchedule, AppError> {
        let mut schedule = WeeklySchedule::empty();

        for working_date in week_dates(target_date) {
            let services = self.build_day(stop, working_date).await?;
            tracing::info!(
                %stop,
                date = %working_date,
                weekday = %working_date.weekday(),
                services = services.len(),
                "Day extracted"
            );
            schedule.extend_day(working_date.weekday(), services);

            self.backoff.pause(self.config.day_delay).await;
        }

        Ok(schedule)
    }

    /// Fetch and extract one day, then pause whatever the outcome.
    pub async fn build_day(
        &self,
        stop: &StopId,
        working_date: NaiveDate,
    ) -> Result<Vec<Service>, AppError> {
        let result = self.fetch_day(stop, working_date).await;
        if let Err(e) = &result {
            tracing::warn!(%stop, date = %working_date, error = %e, "Day failed");
        }

        self.backoff.pause(self.config.day_delay).await;
        result
    }

    async fn fetch_day(&self, stop: &StopId, working_date: NaiveDate) -> Result<Vec<Service>, AppError> {
        let url = departures_url(&self.config.base_url, stop, working_date)?;
        tracing::debug!(%url, "Fetching departures");

        let response = self
            .policy
            .execute(|| self.fetcher.fetch(url.as_str()))
            .await?;
        tracing::debug!(bytes = response.body.len(), "Fetched departures page");

        self.extractor.extract_day(&response.body)
    }
}

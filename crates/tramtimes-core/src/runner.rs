use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;

use crate::models::StopId;
use crate::schedule::ScheduleService;
use crate::traits::{Fetcher, ScheduleStore, TableReader};

/// Events emitted by the runner for monitoring/logging.
#[derive(Debug, Clone)]
pub enum RunEvent<'a> {
    Started {
        stops: usize,
        target_date: NaiveDate,
    },
    StopStarted {
        stop: &'a StopId,
    },
    StopCompleted {
        stop: &'a StopId,
        services: usize,
    },
    StopFailed {
        stop: &'a StopId,
        error: &'a str,
    },
    Cancelled {
        remaining: usize,
    },
    Finished {
        summary: &'a RunSummary,
    },
}

/// Trait for receiving run events (decoupled logging).
pub trait RunReporter: Send + Sync {
    fn report(&self, event: RunEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRunReporter;

impl RunReporter for TracingRunReporter {
    fn report(&self, event: RunEvent<'_>) {
        match event {
            RunEvent::Started { stops, target_date } => {
                tracing::info!(%stops, %target_date, "Run started");
            }
            RunEvent::StopStarted { stop } => {
                tracing::info!(%stop, "Building schedule");
            }
            RunEvent::StopCompleted { stop, services } => {
                tracing::info!(%stop, %services, "Schedule built");
            }
            RunEvent::StopFailed { stop, error } => {
                tracing::error!(%stop, %error, "Schedule failed");
            }
            RunEvent::Cancelled { remaining } => {
                tracing::warn!(%remaining, "Run cancelled");
            }
            RunEvent::Finished { summary } => {
                tracing::info!(
                    completed = summary.completed.len(),
                    failed = summary.failed.len(),
                    skipped = summary.skipped,
                    "Run finished"
                );
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopFailure {
    pub stop: StopId,
    pub error: String,
}

/// Outcome of one pass over the stop list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: Vec<StopId>,
    pub failed: Vec<StopFailure>,
    /// Stops never started because the run was cancelled.
    pub skipped: usize,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.skipped == 0
    }
}

/// Processes a list of stops one after another.
///
/// A failing stop is recorded and the run moves on; nothing is retried at
/// this level.
pub struct ScheduleRunner<F, R, S>
where
    F: Fetcher,
    R: TableReader,
    S: ScheduleStore,
{
    service: ScheduleService<F, R, S>,
}

impl<F, R, S> ScheduleRunner<F, R, S>
where
    F: Fetcher,
    R: TableReader,
    S: ScheduleStore,
{
    pub fn new(service: ScheduleService<F, R, S>) -> Self {
        Self { service }
    }

    /// Build every stop's week for `target_date`, stopping early on cancellation.
    pub async fn run<RR: RunReporter>(
        &self,
        stops: &[StopId],
        target_date: NaiveDate,
        cancel_token: CancellationToken,
        reporter: &RR,
    ) -> RunSummary {
        reporter.report(RunEvent::Started {
            stops: stops.len(),
            target_date,
        });

        let mut summary = RunSummary::default();

        for (index, stop) in stops.iter().enumerate() {
            if cancel_token.is_cancelled() {
                summary.skipped = stops.len() - index;
                reporter.report(RunEvent::Cancelled {
                    remaining: summary.skipped,
                });
                break;
            }

            reporter.report(RunEvent::StopStarted { stop });

            match self.service.process(stop, target_date).await {
                Ok(schedule) => {
                    reporter.report(RunEvent::StopCompleted {
                        stop,
                        services: schedule.total_services(),
                    });
                    summary.completed.push(stop.clone());
                }
                Err(e) => {
                    let error = e.to_string();
                    reporter.report(RunEvent::StopFailed {
                        stop,
                        error: &error,
                    });
                    summary.failed.push(StopFailure {
                        stop: stop.clone(),
                        error,
                    });
                }
            }
        }

        reporter.report(RunEvent::Finished { summary: &summary });
        summary
    }
}

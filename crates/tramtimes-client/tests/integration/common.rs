use std::time::Duration;

use tramtimes_core::backoff::Backoff;
use tramtimes_core::circuit_breaker::CircuitBreakerConfig;
use tramtimes_core::config::ScheduleConfig;
use tramtimes_core::policy::{ResilienceConfig, ResiliencePolicy, RetryConfig};

pub const STOP: &str = "9400zzsymal1";
pub const STOP_PATH: &str = "/stops/9400ZZSYMAL1";

/// A departures page in the upstream layout: header row, then one row per
/// `(route, destination, time)`.
pub fn departures_page(rows: &[(&str, &str, &str)]) -> String {
    let body: String = rows
        .iter()
        .map(|(route, destination, time)| {
            format!(
                "<tr><td><a href=\"/services/{route}\">{route}</a></td>\
                 <td>{destination}</td><td>{time}</td></tr>"
            )
        })
        .collect();

    format!(
        "<!DOCTYPE html><html><head><title>Departures</title></head><body>\
         <h2>Departures</h2>\
         <table><thead><tr><th>Route</th><th>To</th><th>Scheduled</th></tr></thead>\
         <tbody>{body}</tbody></table>\
         </body></html>"
    )
}

/// Schedule config pointed at a mock server, with the smallest delays.
pub fn fast_config(base_url: &str) -> ScheduleConfig {
    ScheduleConfig::default()
        .with_base_url(base_url)
        .with_day_delay(Duration::from_millis(1))
        .with_resilience(ResilienceConfig {
            name: "test".into(),
            retry: RetryConfig {
                max_retries: 2,
                base_delay: Duration::from_millis(1),
            },
            breaker: CircuitBreakerConfig {
                failure_threshold: 3,
                recovery_timeout: Duration::from_secs(60),
            },
        })
}

pub fn policy(config: &ScheduleConfig, backoff: &Backoff) -> ResiliencePolicy {
    ResiliencePolicy::new(config.resilience.clone(), backoff.clone())
}

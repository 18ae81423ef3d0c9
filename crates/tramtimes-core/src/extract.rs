//! Turning table rows into a day's departures.
//!
//! Rows come from a [`TableReader`]; everything here is deterministic and
//! free of I/O, so the same document always yields the same services.

use std::collections::HashSet;

use chrono::{NaiveTime, Timelike};

use crate::classify::is_header_or_noise;
use crate::error::AppError;
use crate::models::Service;
use crate::traits::TableReader;

/// Inclusive start of the departure window.
pub const WINDOW_START: NaiveTime = match NaiveTime::from_hms_opt(12, 0, 0) {
    Some(t) => t,
    None => panic!("invalid window start"),
};

/// Exclusive end of the departure window.
pub const WINDOW_END: NaiveTime = match NaiveTime::from_hms_opt(13, 0, 0) {
    Some(t) => t,
    None => panic!("invalid window end"),
};

/// Extracts departures from fetched HTML via a pluggable table reader.
#[derive(Debug, Clone, Default)]
pub struct ServiceExtractor<R> {
    reader: R,
}

impl<R: TableReader> ServiceExtractor<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Parse one day's document into filtered, deduplicated services.
    pub fn extract_day(&self, html: &str) -> Result<Vec<Service>, AppError> {
        let rows = self.reader.read_rows(html)?;
        extract_services(&rows)
    }
}

/// Build services from table rows.
///
/// Rows need at least three non-empty cells and must pass the header/noise
/// check. The third cell gains a `:00` seconds suffix and must land in
/// `[12:00:00, 13:00:00)`. Duplicates keep their first position.
pub fn extract_services(rows: &[Vec<String>]) -> Result<Vec<Service>, AppError> {
    let mut seen = HashSet::new();
    let mut services = Vec::new();

    for cells in rows {
        let [route, destination, time, ..] = cells.as_slice() else {
            continue;
        };
        let (route, destination, time) = (route.trim(), destination.trim(), time.trim());

        if route.is_empty() || destination.is_empty() || time.is_empty() {
            continue;
        }
        if is_header_or_noise(route, destination, time) {
            continue;
        }

        let service = Service::new(format!("{time}:00"), destination, route);
        if !in_departure_window(service.departure_time())? {
            continue;
        }

        if seen.insert(service.clone()) {
            services.push(service);
        }
    }

    Ok(services)
}

/// Check an `HH:MM:SS` departure against the midday window.
///
/// Midnight is rejected outright; it is what a placeholder time parses to.
pub fn in_departure_window(departure_time: &str) -> Result<bool, AppError> {
    let time = NaiveTime::parse_from_str(departure_time, "%H:%M:%S").map_err(|e| {
        AppError::ParseError(format!("invalid departure time '{departure_time}': {e}"))
    })?;

    if time.num_seconds_from_midnight() == 0 {
        return Ok(false);
    }

    Ok(time >= WINDOW_START && time < WINDOW_END)
}

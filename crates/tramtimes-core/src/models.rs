use std::fmt;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A single scheduled departure at a stop.
///
/// Identity is the (departure_time, destination_name, route_name) triple;
/// derived `Eq`/`Hash` cover exactly those three fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Service {
    departure_time: String,
    destination_name: String,
    route_name: String,
}

impl Service {
    pub fn new(
        departure_time: impl Into<String>,
        destination_name: impl Into<String>,
        route_name: impl Into<String>,
    ) -> Self {
        Self {
            departure_time: departure_time.into(),
            destination_name: destination_name.into(),
            route_name: route_name.into(),
        }
    }

    /// `HH:MM:SS`, 24-hour clock.
    pub fn departure_time(&self) -> &str {
        &self.departure_time
    }

    pub fn destination_name(&self) -> &str {
        &self.destination_name
    }

    pub fn route_name(&self) -> &str {
        &self.route_name
    }
}

/// Seven day buckets of services for one stop.
///
/// Field order is the serialized key order (monday first).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    monday: Vec<Service>,
    tuesday: Vec<Service>,
    wednesday: Vec<Service>,
    thursday: Vec<Service>,
    friday: Vec<Service>,
    saturday: Vec<Service>,
    sunday: Vec<Service>,
}

impl WeeklySchedule {
    /// Schedule with every bucket present and empty.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Services for a given day.
    pub fn day(&self, weekday: Weekday) -> &[Service] {
        match weekday {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }

    /// Append one day's services to the matching bucket.
    pub fn extend_day(&mut self, weekday: Weekday, services: Vec<Service>) {
        let bucket = match weekday {
            Weekday::Mon => &mut self.monday,
            Weekday::Tue => &mut self.tuesday,
            Weekday::Wed => &mut self.wednesday,
            Weekday::Thu => &mut self.thursday,
            Weekday::Fri => &mut self.friday,
            Weekday::Sat => &mut self.saturday,
            Weekday::Sun => &mut self.sunday,
        };
        bucket.extend(services);
    }

    /// Total number of services across all seven days.
    pub fn total_services(&self) -> usize {
        WEEK.iter().map(|d| self.day(*d).len()).sum()
    }
}

/// Monday-first week order.
pub const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Opaque stop code, trimmed and never blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StopId(String);

impl StopId {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AppError::InvalidStop(raw.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Uppercased form used in upstream URLs and output file names.
    pub fn to_upper(&self) -> String {
        self.0.to_uppercase()
    }
}

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse a stop list: one id per line, blank lines skipped, order kept.
pub fn read_stops(text: &str) -> Vec<StopId> {
    text.lines().filter_map(|line| StopId::parse(line).ok()).collect()
}

//! Noon-anchored scheduling dates.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Time of day every schedule snapshot is taken at.
pub const ANCHOR_TIME: NaiveTime = match NaiveTime::from_hms_opt(12, 0, 0) {
    Some(t) => t,
    None => panic!("invalid anchor time"),
};

/// Days covered by one weekly schedule.
pub const WEEK_LENGTH: usize = 7;

/// The effective "today": rolls over to tomorrow once `now` is past noon.
pub fn target_date(now: NaiveDateTime) -> NaiveDate {
    let today = now.date();
    if now.time() > ANCHOR_TIME {
        today.succ_opt().unwrap_or(today)
    } else {
        today
    }
}

/// Pair a date with the noon anchor.
pub fn anchor(date: NaiveDate) -> NaiveDateTime {
    date.and_time(ANCHOR_TIME)
}

/// The seven consecutive dates starting at `target`.
pub fn week_dates(target: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    target.iter_days().take(WEEK_LENGTH)
}

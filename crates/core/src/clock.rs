//! Injectable time source.

use std::sync::RwLock;

use chrono::{Duration, NaiveDate, NaiveTime, Utc};

use crate::types::{CalendarDate, Timestamp};

/// Source of "now" for classification.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;

    /// Today's calendar date in UTC.
    fn today(&self) -> CalendarDate {
        self.now().date_naive()
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<Timestamp>,
}

impl FixedClock {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    /// A clock pinned to noon UTC on `date`.
    pub fn on_date(date: NaiveDate) -> Self {
        Self::new(date.and_time(NaiveTime::MIN).and_utc() + Duration::hours(12))
    }

    pub fn advance_days(&self, days: i64) {
        let mut guard = self.now.write().unwrap_or_else(|e| e.into_inner());
        *guard += Duration::days(days);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        *self.now.read().unwrap_or_else(|e| e.into_inner())
    }
}

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;

/// Source of "today" for filter resolution.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Calendar date in the user's timezone.
#[derive(Clone, Copy, Debug)]
pub struct ZonedClock {
    tz: Tz,
}

impl ZonedClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Default for ZonedClock {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl Clock for ZonedClock {
    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }
}

/// Always returns the same date.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

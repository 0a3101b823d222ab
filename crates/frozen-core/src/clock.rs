use chrono::{DateTime, Local, NaiveDate, Utc};

/// Source of "now" for every piece of expiration math
///
/// Nothing in the rules engine reads system time directly - pass a clock in
/// so tests (and the CLI's `--today` flag) can pin the date.
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar date used for day-granularity comparisons
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// The real wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    // Freeze dates are entered as local calendar dates, so "today" is local too
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock stuck at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    instant: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self { instant }
    }

    /// Midnight UTC at the start of `date`
    pub fn on(date: NaiveDate) -> Self {
        Self::new(date.and_time(chrono::NaiveTime::MIN).and_utc())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant
    }
}

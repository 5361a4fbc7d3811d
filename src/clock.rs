//! Wall-clock access and local-day bucketing.
//!
//! Every "today" in the crate comes from a [`Clock`], so day rollovers can be
//! driven deterministically in tests with [`FixedClock`].

use std::sync::Mutex;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Timelike};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;

    // Local calendar date of `now`
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

// Local time, carried as the current system offset
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        let local = chrono::Local::now();
        local.with_timezone(local.offset())
    }
}

// Settable clock for tests and replays
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl FixedClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        FixedClock { now: Mutex::new(now) }
    }

    // Build from a local "YYYY-MM-DD HH:MM" at UTC offset zero.
    pub fn at(local: &str) -> Option<Self> {
        let naive = NaiveDateTime::parse_from_str(local, "%Y-%m-%d %H:%M").ok()?;
        let offset = FixedOffset::east_opt(0)?;
        let now = offset.from_local_datetime(&naive).single()?;
        Some(FixedClock::new(now))
    }

    pub fn set(&self, now: DateTime<FixedOffset>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub fn yesterday(today: NaiveDate) -> NaiveDate {
    today - Duration::days(1)
}

/// Extract the calendar date from a date-ish string.
///
/// Accepts plain `YYYY-MM-DD`, RFC 3339 timestamps (date taken in the
/// timestamp's own offset) and naive `YYYY-MM-DDTHH:MM:SS` values.
pub fn parse_date_part(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if let Ok(d) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.date_naive());
    }
    NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|dt| dt.date())
}

// Between local midnight and `end_hour` the penalty pass stays quiet
pub fn is_early_morning(now: DateTime<FixedOffset>, end_hour: u32) -> bool {
    now.hour() < end_hour
}

/// Time left until the next daily reset, `minute` minutes after tomorrow's
/// local midnight.
pub fn until_next_reset(now: DateTime<FixedOffset>, minute: u32) -> std::time::Duration {
    let tomorrow = now.date_naive() + Duration::days(1);
    let Some(target) = tomorrow
        .and_hms_opt(0, minute.min(59), 0)
        .and_then(|naive| now.offset().from_local_datetime(&naive).single())
    else {
        return std::time::Duration::from_secs(60);
    };
    (target - now)
        .to_std()
        .unwrap_or_else(|_| std::time::Duration::from_secs(60))
}

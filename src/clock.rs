use chrono::{Local, NaiveDate, NaiveDateTime};

pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    pub fn on(date: NaiveDate) -> Self {
        FixedClock(date.and_time(chrono::NaiveTime::MIN))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Whole days elapsed from `since` to `now`, floored.
pub fn elapsed_days(now: NaiveDateTime, since: NaiveDateTime) -> i64 {
    (now - since).num_seconds().div_euclid(86_400)
}

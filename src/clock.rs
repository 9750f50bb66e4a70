use chrono::{Local, NaiveDate, NaiveTime};

/// Wall-clock capability. The future-date guard and the default checkout
/// time both go through this seam so tests can pin the clock.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
    fn time_now(&self) -> NaiveTime;
}

/// Local server time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn time_now(&self) -> NaiveTime {
        Local::now().time()
    }
}

//! Wall-clock access behind a trait so the date/time page can be rendered
//! against a fixed instant in tests.

use chrono::{DateTime, Local};

/// Supplies the current local time to the date/time page.
pub trait Clock {
    fn now(&self) -> DateTime<Local>;
}

/// Production clock backed by the system time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

use chrono::{Local, NaiveTime, Utc};

use crate::schedule::Instant;

/// Host time source, injectable so the scheduler can be driven by a test
/// clock instead of the wall clock.
pub trait WallClock: Send + Sync {
    fn now(&self) -> Instant;

    /// Local time of day, shown on the face.
    fn time_of_day(&self) -> NaiveTime;
}

pub struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> Instant {
        Instant(Utc::now().timestamp_millis() as u64)
    }

    fn time_of_day(&self) -> NaiveTime {
        Local::now().time()
    }
}

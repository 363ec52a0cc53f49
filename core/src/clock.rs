//! Wall-clock anchor for a generation run.
//!
//! Every timestamp a run writes is derived from one instant captured
//! when the run starts, so all transaction headers share the same
//! `fecha_hora` and credential dates are offsets from it.

use chrono::{Duration, Local, NaiveDateTime, Timelike};

#[derive(Debug, Clone)]
pub struct RunClock {
    started_at: NaiveDateTime,
}

impl RunClock {
    /// Anchor the run at the current local time, truncated to seconds.
    pub fn start() -> Self {
        let now = Local::now().naive_local();
        Self::fixed(now.with_nanosecond(0).unwrap_or(now))
    }

    /// Anchor the run at a fixed instant (tests and reproducible runs).
    pub fn fixed(started_at: NaiveDateTime) -> Self {
        Self { started_at }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.started_at
    }

    pub fn days_ago(&self, days: i64) -> NaiveDateTime {
        self.started_at - Duration::days(days)
    }
}

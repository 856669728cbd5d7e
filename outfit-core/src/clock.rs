use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_UTC_OFFSET_HOURS;

/// Fixed offset between UTC and the civil time used for every forecast step.
///
/// This is a single-region assumption: the offset is not derived from the
/// coordinate being forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CivilOffset {
    hours: i32,
}

impl CivilOffset {
    pub const fn hours(hours: i32) -> Self {
        Self { hours }
    }

    fn delta(self) -> TimeDelta {
        TimeDelta::hours(i64::from(self.hours))
    }

    /// Civil time of a UTC epoch timestamp in seconds.
    pub fn from_epoch(self, epoch_secs: i64) -> Option<NaiveDateTime> {
        DateTime::<Utc>::from_timestamp(epoch_secs, 0)
            .and_then(|utc| utc.naive_utc().checked_add_signed(self.delta()))
    }

    pub fn to_civil(self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.naive_utc() + self.delta()
    }

    pub fn now(self) -> NaiveDateTime {
        self.to_civil(Utc::now())
    }
}

impl Default for CivilOffset {
    fn default() -> Self {
        Self::hours(DEFAULT_UTC_OFFSET_HOURS)
    }
}

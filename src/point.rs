use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::{Config, Fields, Tags};

/// Nanoseconds since the Unix epoch.
pub type Time = u64;

/// One observation ready to be written to the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Point {
    pub measurement: String,
    pub time: Time,
    pub tags: Tags,
    pub fields: Fields,
}
impl Point {
    /// Stamps the current wall-clock time.
    pub fn new(config: &Config) -> Self {
        Self::at(config, now())
    }

    /// Tags and fields are cloned, so later edits to `config` never reach the point.
    pub fn at(config: &Config, time: Time) -> Self {
        Self {
            measurement: config.measurement.clone(),
            time,
            tags: config.tags.clone(),
            fields: config.fields.clone(),
        }
    }
}

pub fn now() -> Time {
    let since_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    u64::try_from(since_epoch.as_nanos()).unwrap_or(u64::MAX)
}

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Body of a `POST /tab-switch` report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabSwitchReport {
    pub count: u32,
    // ISO-8601 UTC with millisecond precision, e.g. `2024-05-01T10:00:00.000Z`.
    pub timestamp: String,
}

impl TabSwitchReport {
    pub fn new(count: u32, at: DateTime<Utc>) -> Self {
        Self {
            count,
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

//! Site statistics shown on the home page counters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::fields::lenient_count;

pub const DEFAULT_DEVELOPER_COUNT: i64 = 500;
pub const DEFAULT_COMPANY_COUNT: i64 = 30;
pub const DEFAULT_BOOTCAMP_COUNT: i64 = 8;
pub const DEFAULT_SUCCESS_RATE: i64 = 95;

/// Singleton statistics record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub developer_count: i64,
    pub company_count: i64,
    pub bootcamp_count: i64,
    /// Percentage, 0..=100
    pub success_rate: i64,
    pub last_updated: DateTime<Utc>,
}

impl Statistics {
    pub fn with_defaults(now: DateTime<Utc>) -> Self {
        Self {
            developer_count: DEFAULT_DEVELOPER_COUNT,
            company_count: DEFAULT_COMPANY_COUNT,
            bootcamp_count: DEFAULT_BOOTCAMP_COUNT,
            success_rate: DEFAULT_SUCCESS_RATE,
            last_updated: now,
        }
    }
}

/// Partial statistics update.
///
/// The dashboard form posts its values as strings, so numeric strings are
/// accepted alongside numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatisticsInput {
    #[serde(default, deserialize_with = "lenient_count")]
    pub developer_count: Option<i64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub company_count: Option<i64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub bootcamp_count: Option<i64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub success_rate: Option<i64>,
}

impl UpdateStatisticsInput {
    /// Apply the set fields and stamp `last_updated`
    pub fn apply_to(&self, stats: &mut Statistics, now: DateTime<Utc>) {
        if let Some(v) = self.developer_count {
            stats.developer_count = v;
        }
        if let Some(v) = self.company_count {
            stats.company_count = v;
        }
        if let Some(v) = self.bootcamp_count {
            stats.bootcamp_count = v;
        }
        if let Some(v) = self.success_rate {
            stats.success_rate = v;
        }
        stats.last_updated = now;
    }
}

//! Dashboard analytics
//!
//! Per-day counts of contacts and published articles over a trailing
//! window, plus overall totals.

use crate::db::repositories::{ArticleRepository, ContactRepository};
use crate::models::StatusCount;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Trailing window for the per-day series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Week,
    Month,
    Year,
    /// Unrecognized period value: no lower bound
    Unbounded,
}

impl Period {
    /// Missing period defaults to a month; unknown values mean no window
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            None => Period::Month,
            Some("week") => Period::Week,
            Some("month") => Period::Month,
            Some("year") => Period::Year,
            Some(_) => Period::Unbounded,
        }
    }

    pub fn days(&self) -> Option<i64> {
        match self {
            Period::Week => Some(7),
            Period::Month => Some(30),
            Period::Year => Some(365),
            Period::Unbounded => None,
        }
    }

    /// Start of the window relative to `now`
    pub fn since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.days().map(|days| now - Duration::days(days))
    }
}

/// Count for one UTC day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCount {
    /// `YYYY-MM-DD`
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_contacts: i64,
    /// Published articles only
    pub total_articles: i64,
    pub contacts_by_status: Vec<StatusCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub contacts_by_period: Vec<DayCount>,
    pub articles_by_period: Vec<DayCount>,
    pub overview: Overview,
}

/// Group timestamps by UTC day, ascending
pub fn bucket_by_day(dates: &[DateTime<Utc>]) -> Vec<DayCount> {
    let mut buckets: BTreeMap<String, i64> = BTreeMap::new();
    for date in dates {
        *buckets.entry(date.format("%Y-%m-%d").to_string()).or_insert(0) += 1;
    }
    buckets
        .into_iter()
        .map(|(date, count)| DayCount { date, count })
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum AnalyticsServiceError {
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct AnalyticsService {
    contacts: Arc<dyn ContactRepository>,
    articles: Arc<dyn ArticleRepository>,
}

impl AnalyticsService {
    pub fn new(contacts: Arc<dyn ContactRepository>, articles: Arc<dyn ArticleRepository>) -> Self {
        Self { contacts, articles }
    }

    pub async fn report(&self, period: Period) -> Result<AnalyticsReport, AnalyticsServiceError> {
        let since = period.since(Utc::now());

        let contact_dates = self.contacts.dates_since(since).await?;
        let article_dates = self.articles.published_dates_since(since).await?;

        Ok(AnalyticsReport {
            contacts_by_period: bucket_by_day(&contact_dates),
            articles_by_period: bucket_by_day(&article_dates),
            overview: Overview {
                total_contacts: self.contacts.count().await?,
                total_articles: self.articles.count_published().await?,
                contacts_by_status: self.contacts.count_by_status().await?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxArticleRepository, SqlxContactRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{Contact, ContactReason, ContactStatus};
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_period_parse() {
        assert_eq!(Period::parse(None), Period::Month);
        assert_eq!(Period::parse(Some("week")), Period::Week);
        assert_eq!(Period::parse(Some("year")).days(), Some(365));
        assert_eq!(Period::parse(Some("decade")), Period::Unbounded);
        assert_eq!(Period::Unbounded.since(Utc::now()), None);
    }

    #[test]
    fn test_bucket_by_day() {
        let dates = vec![at(3, 23), at(1, 0), at(3, 1), at(2, 12), at(1, 23)];
        assert_eq!(
            bucket_by_day(&dates),
            vec![
                DayCount { date: "2024-01-01".to_string(), count: 2 },
                DayCount { date: "2024-01-02".to_string(), count: 1 },
                DayCount { date: "2024-01-03".to_string(), count: 2 },
            ]
        );
        assert!(bucket_by_day(&[]).is_empty());
    }

    #[tokio::test]
    async fn test_report_counts_recent_contacts() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let contacts = SqlxContactRepository::boxed(pool.clone());
        let service = AnalyticsService::new(contacts.clone(), SqlxArticleRepository::boxed(pool));

        let now = Utc::now();
        for (days_ago, status) in [
            (1, ContactStatus::New),
            (1, ContactStatus::New),
            (3, ContactStatus::Completed),
            (40, ContactStatus::New),
        ] {
            contacts
                .create(&Contact {
                    id: 0,
                    company_name: "Co".to_string(),
                    contact_person: "Person".to_string(),
                    email: "p@co.test".to_string(),
                    phone: None,
                    reason: ContactReason::Other,
                    developers_needed: None,
                    tech_stack: Vec::new(),
                    message: None,
                    newsletter: false,
                    status,
                    date: now - Duration::days(days_ago),
                })
                .await
                .unwrap();
        }

        let report = service.report(Period::Week).await.unwrap();
        let counted: i64 = report.contacts_by_period.iter().map(|d| d.count).sum();
        assert_eq!(counted, 3);
        assert_eq!(report.contacts_by_period.len(), 2);
        assert_eq!(report.overview.total_contacts, 4);
        assert_eq!(report.overview.total_articles, 0);
        assert!(report.articles_by_period.is_empty());
        assert!(report
            .overview
            .contacts_by_status
            .contains(&StatusCount { status: ContactStatus::New, count: 3 }));

        let everything = service.report(Period::Unbounded).await.unwrap();
        let counted: i64 = everything.contacts_by_period.iter().map(|d| d.count).sum();
        assert_eq!(counted, 4);
    }

    proptest! {
        #[test]
        fn prop_buckets_preserve_total_and_order(offsets in proptest::collection::vec(0i64..1_000_000, 0..50)) {
            let base = at(1, 0);
            let dates: Vec<_> = offsets.iter().map(|s| base + Duration::seconds(*s * 60)).collect();
            let buckets = bucket_by_day(&dates);

            prop_assert_eq!(buckets.iter().map(|b| b.count).sum::<i64>(), dates.len() as i64);
            prop_assert!(buckets.windows(2).all(|w| w[0].date < w[1].date));
        }
    }
}

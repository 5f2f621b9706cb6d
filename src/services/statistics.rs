//! Statistics service
//!
//! The home page counters. The record is created with defaults on first
//! read; concurrent updates are last-write-wins.

use crate::db::repositories::StatisticsRepository;
use crate::models::{Statistics, UpdateStatisticsInput};
use chrono::Utc;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum StatisticsServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct StatisticsService {
    repo: Arc<dyn StatisticsRepository>,
}

impl StatisticsService {
    pub fn new(repo: Arc<dyn StatisticsRepository>) -> Self {
        Self { repo }
    }

    pub async fn get(&self) -> Result<Statistics, StatisticsServiceError> {
        Ok(self
            .repo
            .get_or_create(&Statistics::with_defaults(Utc::now()))
            .await?)
    }

    /// Apply a partial update and stamp `last_updated`
    pub async fn update(
        &self,
        input: &UpdateStatisticsInput,
    ) -> Result<Statistics, StatisticsServiceError> {
        validate(input)?;

        let mut stats = self.get().await?;
        input.apply_to(&mut stats, Utc::now());
        let saved = self.repo.save(&stats).await?;

        tracing::info!(
            developers = saved.developer_count,
            companies = saved.company_count,
            bootcamps = saved.bootcamp_count,
            success_rate = saved.success_rate,
            "Statistics updated"
        );
        Ok(saved)
    }
}

fn validate(input: &UpdateStatisticsInput) -> Result<(), StatisticsServiceError> {
    let counts = [
        input.developer_count,
        input.company_count,
        input.bootcamp_count,
    ];
    if counts.iter().flatten().any(|count| *count < 0) {
        return Err(StatisticsServiceError::ValidationError(
            "ערכים חייבים להיות חיוביים".to_string(),
        ));
    }
    if let Some(rate) = input.success_rate {
        if !(0..=100).contains(&rate) {
            return Err(StatisticsServiceError::ValidationError(
                "אחוז הצלחה חייב להיות בין 0 ל-100".to_string(),
            ));
        }
    }
    Ok(())
}

//! Statistics repository
//!
//! The statistics table holds a single row with the fixed primary key 1.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Statistics;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use std::sync::Arc;

const SINGLETON_ID: i64 = 1;

#[async_trait]
pub trait StatisticsRepository: Send + Sync {
    /// Load the singleton, inserting `defaults` first if it does not exist
    async fn get_or_create(&self, defaults: &Statistics) -> Result<Statistics>;

    /// Overwrite the singleton
    async fn save(&self, stats: &Statistics) -> Result<Statistics>;
}

pub struct SqlxStatisticsRepository {
    pool: DynDatabasePool,
}

impl SqlxStatisticsRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn StatisticsRepository> {
        Arc::new(Self::new(pool))
    }

    async fn load(&self) -> Result<Statistics> {
        let sql = "SELECT developer_count, company_count, bootcamp_count, success_rate, last_updated \
                   FROM statistics WHERE id = ?";
        let stats = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(sql)
                    .bind(SINGLETON_ID)
                    .fetch_one(self.pool.sqlite()?)
                    .await
                    .context("Failed to load statistics")?;
                Statistics {
                    developer_count: row.get("developer_count"),
                    company_count: row.get("company_count"),
                    bootcamp_count: row.get("bootcamp_count"),
                    success_rate: row.get("success_rate"),
                    last_updated: row.get::<DateTime<Utc>, _>("last_updated"),
                }
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(sql)
                    .bind(SINGLETON_ID)
                    .fetch_one(self.pool.mysql()?)
                    .await
                    .context("Failed to load statistics")?;
                Statistics {
                    developer_count: row.get("developer_count"),
                    company_count: row.get("company_count"),
                    bootcamp_count: row.get("bootcamp_count"),
                    success_rate: row.get("success_rate"),
                    last_updated: row.get::<DateTime<Utc>, _>("last_updated"),
                }
            }
        };
        Ok(stats)
    }
}

#[async_trait]
impl StatisticsRepository for SqlxStatisticsRepository {
    async fn get_or_create(&self, defaults: &Statistics) -> Result<Statistics> {
        let columns = "(id, developer_count, company_count, bootcamp_count, success_rate, last_updated) \
                       VALUES (?, ?, ?, ?, ?, ?)";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(&format!("INSERT OR IGNORE INTO statistics {}", columns))
                    .bind(SINGLETON_ID)
                    .bind(defaults.developer_count)
                    .bind(defaults.company_count)
                    .bind(defaults.bootcamp_count)
                    .bind(defaults.success_rate)
                    .bind(defaults.last_updated)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to seed statistics")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(&format!("INSERT IGNORE INTO statistics {}", columns))
                    .bind(SINGLETON_ID)
                    .bind(defaults.developer_count)
                    .bind(defaults.company_count)
                    .bind(defaults.bootcamp_count)
                    .bind(defaults.success_rate)
                    .bind(defaults.last_updated)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to seed statistics")?;
            }
        }

        self.load().await
    }

    async fn save(&self, stats: &Statistics) -> Result<Statistics> {
        let sql = "UPDATE statistics SET developer_count = ?, company_count = ?, bootcamp_count = ?, \
                   success_rate = ?, last_updated = ? WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(stats.developer_count)
                    .bind(stats.company_count)
                    .bind(stats.bootcamp_count)
                    .bind(stats.success_rate)
                    .bind(stats.last_updated)
                    .bind(SINGLETON_ID)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to save statistics")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(stats.developer_count)
                    .bind(stats.company_count)
                    .bind(stats.bootcamp_count)
                    .bind(stats.success_rate)
                    .bind(stats.last_updated)
                    .bind(SINGLETON_ID)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to save statistics")?;
            }
        }

        self.load().await
    }
}

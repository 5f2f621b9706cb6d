//! Contact repository
//!
//! Database operations for contact form submissions.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Contact, ContactQuery, ContactReason, ContactStatus, ListParams, StatusCount};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use super::{decode_list, encode_list};

const CONTACT_COLUMNS: &str = "id, company_name, contact_person, email, phone, reason, \
     developers_needed, tech_stack, message, newsletter, status, date";

/// Contact repository trait
#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// Insert a new submission; the `id` of the input is ignored
    async fn create(&self, contact: &Contact) -> Result<Contact>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Contact>>;

    /// List submissions, newest first, with the total match count
    async fn list(&self, query: &ContactQuery, params: &ListParams) -> Result<(Vec<Contact>, i64)>;

    /// Set the status; returns the updated record or `None` when absent
    async fn update_status(&self, id: i64, status: ContactStatus) -> Result<Option<Contact>>;

    /// Delete a submission; returns `false` when no row matched
    async fn delete(&self, id: i64) -> Result<bool>;

    async fn count(&self) -> Result<i64>;

    /// Number of submissions per status, only statuses that occur
    async fn count_by_status(&self) -> Result<Vec<StatusCount>>;

    /// Submission dates, optionally only those on or after `since`
    async fn dates_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<DateTime<Utc>>>;
}

/// SQLx-based contact repository implementation
pub struct SqlxContactRepository {
    pool: DynDatabasePool,
}

impl SqlxContactRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ContactRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ContactRepository for SqlxContactRepository {
    async fn create(&self, contact: &Contact) -> Result<Contact> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_contact_sqlite(self.pool.sqlite()?, contact).await,
            DatabaseDriver::Mysql => create_contact_mysql(self.pool.mysql()?, contact).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Contact>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_contact_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_contact_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn list(&self, query: &ContactQuery, params: &ListParams) -> Result<(Vec<Contact>, i64)> {
        let (clause, binds) = contact_filter(query);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_contacts_sqlite(self.pool.sqlite()?, &clause, &binds, params).await
            }
            DatabaseDriver::Mysql => {
                list_contacts_mysql(self.pool.mysql()?, &clause, &binds, params).await
            }
        }
    }

    async fn update_status(&self, id: i64, status: ContactStatus) -> Result<Option<Contact>> {
        let sql = "UPDATE contacts SET status = ? WHERE id = ?";
        let outcome = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(status.as_str())
                .bind(id)
                .execute(self.pool.sqlite()?)
                .await
                .map(|_| ()),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(status.as_str())
                .bind(id)
                .execute(self.pool.mysql()?)
                .await
                .map(|_| ()),
        };
        outcome.context("Failed to update contact status")?;

        // Affected-row counts differ between drivers for no-op updates
        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let sql = "DELETE FROM contacts WHERE id = ?";
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(id)
                .execute(self.pool.sqlite()?)
                .await
                .map(|r| r.rows_affected()),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(id)
                .execute(self.pool.mysql()?)
                .await
                .map(|r| r.rows_affected()),
        }
        .context("Failed to delete contact")?;
        Ok(affected > 0)
    }

    async fn count(&self) -> Result<i64> {
        let sql = "SELECT COUNT(*) FROM contacts";
        let count = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query_scalar::<_, i64>(sql).fetch_one(self.pool.sqlite()?).await
            }
            DatabaseDriver::Mysql => {
                sqlx::query_scalar::<_, i64>(sql).fetch_one(self.pool.mysql()?).await
            }
        }
        .context("Failed to count contacts")?;
        Ok(count)
    }

    async fn count_by_status(&self) -> Result<Vec<StatusCount>> {
        let sql = "SELECT status, COUNT(*) AS count FROM contacts GROUP BY status ORDER BY status";
        let rows: Vec<(String, i64)> = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query_as(sql).fetch_all(self.pool.sqlite()?).await,
            DatabaseDriver::Mysql => sqlx::query_as(sql).fetch_all(self.pool.mysql()?).await,
        }
        .context("Failed to count contacts by status")?;

        Ok(rows
            .into_iter()
            .filter_map(|(status, count)| {
                ContactStatus::from_str(&status).map(|status| StatusCount { status, count })
            })
            .collect())
    }

    async fn dates_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<DateTime<Utc>>> {
        let sql = "SELECT date FROM contacts WHERE (? IS NULL OR date >= ?) ORDER BY date";
        let dates = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query_scalar::<_, DateTime<Utc>>(sql)
                    .bind(since)
                    .bind(since)
                    .fetch_all(self.pool.sqlite()?)
                    .await
            }
            DatabaseDriver::Mysql => {
                sqlx::query_scalar::<_, DateTime<Utc>>(sql)
                    .bind(since)
                    .bind(since)
                    .fetch_all(self.pool.mysql()?)
                    .await
            }
        }
        .context("Failed to load contact dates")?;
        Ok(dates)
    }
}

fn contact_filter(query: &ContactQuery) -> (String, Vec<&'static str>) {
    let mut conditions = Vec::new();
    let mut binds = Vec::new();

    if let Some(status) = query.status {
        conditions.push("status = ?");
        binds.push(status.as_str());
    }
    if let Some(reason) = query.reason {
        conditions.push("reason = ?");
        binds.push(reason.as_str());
    }

    if conditions.is_empty() {
        (String::new(), binds)
    } else {
        (format!("WHERE {}", conditions.join(" AND ")), binds)
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_contact_sqlite(pool: &SqlitePool, contact: &Contact) -> Result<Contact> {
    let result = sqlx::query(
        r#"
        INSERT INTO contacts (company_name, contact_person, email, phone, reason,
                              developers_needed, tech_stack, message, newsletter, status, date)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&contact.company_name)
    .bind(&contact.contact_person)
    .bind(&contact.email)
    .bind(&contact.phone)
    .bind(contact.reason.as_str())
    .bind(&contact.developers_needed)
    .bind(encode_list(&contact.tech_stack)?)
    .bind(&contact.message)
    .bind(contact.newsletter)
    .bind(contact.status.as_str())
    .bind(contact.date)
    .execute(pool)
    .await
    .context("Failed to create contact")?;

    Ok(Contact {
        id: result.last_insert_rowid(),
        ..contact.clone()
    })
}

async fn get_contact_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Contact>> {
    let row = sqlx::query(&format!("SELECT {} FROM contacts WHERE id = ?", CONTACT_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get contact by ID")?;

    row.as_ref().map(row_to_contact_sqlite).transpose()
}

async fn list_contacts_sqlite(
    pool: &SqlitePool,
    clause: &str,
    binds: &[&'static str],
    params: &ListParams,
) -> Result<(Vec<Contact>, i64)> {
    let count_sql = format!("SELECT COUNT(*) FROM contacts {}", clause);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for value in binds {
        count_query = count_query.bind(*value);
    }
    let total = count_query
        .fetch_one(pool)
        .await
        .context("Failed to count contacts")?;

    let page_sql = format!(
        "SELECT {} FROM contacts {} ORDER BY date DESC, id DESC LIMIT ? OFFSET ?",
        CONTACT_COLUMNS, clause
    );
    let mut page_query = sqlx::query(&page_sql);
    for value in binds {
        page_query = page_query.bind(*value);
    }
    let rows = page_query
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list contacts")?;

    let contacts = rows
        .iter()
        .map(row_to_contact_sqlite)
        .collect::<Result<Vec<_>>>()?;

    Ok((contacts, total))
}

fn row_to_contact_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Contact> {
    let reason: String = row.get("reason");
    let status: String = row.get("status");

    Ok(Contact {
        id: row.get("id"),
        company_name: row.get("company_name"),
        contact_person: row.get("contact_person"),
        email: row.get("email"),
        phone: row.get("phone"),
        reason: ContactReason::from_str(&reason).unwrap_or(ContactReason::Other),
        developers_needed: row.get("developers_needed"),
        tech_stack: decode_list(row.get("tech_stack"))?,
        message: row.get("message"),
        newsletter: row.get("newsletter"),
        status: ContactStatus::from_str(&status).unwrap_or_default(),
        date: row.get("date"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_contact_mysql(pool: &MySqlPool, contact: &Contact) -> Result<Contact> {
    let result = sqlx::query(
        r#"
        INSERT INTO contacts (company_name, contact_person, email, phone, reason,
                              developers_needed, tech_stack, message, newsletter, status, date)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&contact.company_name)
    .bind(&contact.contact_person)
    .bind(&contact.email)
    .bind(&contact.phone)
    .bind(contact.reason.as_str())
    .bind(&contact.developers_needed)
    .bind(encode_list(&contact.tech_stack)?)
    .bind(&contact.message)
    .bind(contact.newsletter)
    .bind(contact.status.as_str())
    .bind(contact.date)
    .execute(pool)
    .await
    .context("Failed to create contact")?;

    Ok(Contact {
        id: result.last_insert_id() as i64,
        ..contact.clone()
    })
}

async fn get_contact_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Contact>> {
    let row = sqlx::query(&format!("SELECT {} FROM contacts WHERE id = ?", CONTACT_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get contact by ID")?;

    row.as_ref().map(row_to_contact_mysql).transpose()
}

async fn list_contacts_mysql(
    pool: &MySqlPool,
    clause: &str,
    binds: &[&'static str],
    params: &ListParams,
) -> Result<(Vec<Contact>, i64)> {
    let count_sql = format!("SELECT COUNT(*) FROM contacts {}", clause);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for value in binds {
        count_query = count_query.bind(*value);
    }
    let total = count_query
        .fetch_one(pool)
        .await
        .context("Failed to count contacts")?;

    let page_sql = format!(
        "SELECT {} FROM contacts {} ORDER BY date DESC, id DESC LIMIT ? OFFSET ?",
        CONTACT_COLUMNS, clause
    );
    let mut page_query = sqlx::query(&page_sql);
    for value in binds {
        page_query = page_query.bind(*value);
    }
    let rows = page_query
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list contacts")?;

    let contacts = rows
        .iter()
        .map(row_to_contact_mysql)
        .collect::<Result<Vec<_>>>()?;

    Ok((contacts, total))
}

fn row_to_contact_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Contact> {
    let reason: String = row.get("reason");
    let status: String = row.get("status");

    Ok(Contact {
        id: row.get("id"),
        company_name: row.get("company_name"),
        contact_person: row.get("contact_person"),
        email: row.get("email"),
        phone: row.get("phone"),
        reason: ContactReason::from_str(&reason).unwrap_or(ContactReason::Other),
        developers_needed: row.get("developers_needed"),
        tech_stack: decode_list(row.get("tech_stack"))?,
        message: row.get("message"),
        newsletter: row.get("newsletter"),
        status: ContactStatus::from_str(&status).unwrap_or_default(),
        date: row.get("date"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use chrono::{Duration, TimeZone};

    async fn setup() -> SqlxContactRepository {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool).await.expect("Failed to migrate");
        SqlxContactRepository::new(pool)
    }

    fn contact(company: &str, date: DateTime<Utc>) -> Contact {
        Contact {
            id: 0,
            company_name: company.to_string(),
            contact_person: "Avi Cohen".to_string(),
            email: "avi@example.com".to_string(),
            phone: Some("0521234567".to_string()),
            reason: ContactReason::Recruitment,
            developers_needed: Some("3-5".to_string()),
            tech_stack: vec!["react".to_string(), "node".to_string()],
            message: None,
            newsletter: true,
            status: ContactStatus::New,
            date,
        }
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, d, 8, 30, 0).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = setup().await;
        let created = repo.create(&contact("Acme", day(1))).await.unwrap();

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.tech_stack, vec!["react", "node"]);
        assert!(fetched.newsletter);
    }

    #[tokio::test]
    async fn test_list_newest_first_with_status_filter() {
        let repo = setup().await;
        let first = repo.create(&contact("First", day(1))).await.unwrap();
        repo.create(&contact("Second", day(2))).await.unwrap();
        repo.update_status(first.id, ContactStatus::Completed).await.unwrap();

        let (items, total) = repo
            .list(&ContactQuery::default(), &ListParams::default())
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(items[0].company_name, "Second");

        let query = ContactQuery {
            status: Some(ContactStatus::Completed),
            ..Default::default()
        };
        let (items, total) = repo.list(&query, &ListParams::default()).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].id, first.id);
    }

    #[tokio::test]
    async fn test_update_status_missing_returns_none() {
        let repo = setup().await;
        assert!(repo
            .update_status(42, ContactStatus::InProgress)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = setup().await;
        let created = repo.create(&contact("Gone", day(1))).await.unwrap();

        assert!(repo.delete(created.id).await.unwrap());
        assert!(!repo.delete(created.id).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_count_by_status_and_dates() {
        let repo = setup().await;
        let a = repo.create(&contact("A", day(1))).await.unwrap();
        repo.create(&contact("B", day(3))).await.unwrap();
        repo.create(&contact("C", day(3))).await.unwrap();
        repo.update_status(a.id, ContactStatus::InProgress).await.unwrap();

        let counts = repo.count_by_status().await.unwrap();
        assert!(counts.contains(&StatusCount { status: ContactStatus::New, count: 2 }));
        assert!(counts.contains(&StatusCount { status: ContactStatus::InProgress, count: 1 }));
        assert_eq!(counts.len(), 2);

        let recent = repo.dates_since(Some(day(2) - Duration::hours(1))).await.unwrap();
        assert_eq!(recent, vec![day(3), day(3)]);
        assert_eq!(repo.dates_since(None).await.unwrap().len(), 3);
    }
}

//! Storage for articles, contacts, users and the statistics record
//!
//! SQLite is the default; MySQL is picked with `database.driver: mysql`.
//! Repositories hold a [`DynDatabasePool`] and branch on the driver for
//! each query, so both backends share one schema history in
//! [`migrations`].
//!
//! ```ignore
//! let pool = techhub::db::create_pool(&config.database).await?;
//! techhub::db::migrations::run_migrations(&pool).await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};

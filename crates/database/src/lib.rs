//! SQLite persistence for prompt history and credit balances.
//!
//! This crate provides async database operations for prompt-history entries,
//! credit accounts and their transaction log using SQLx with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{history, Database, IntentCategory, NewEntry, Source};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:history.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Store a prompt
//!     let entry = NewEntry {
//!         owner_id: "user-1".to_string(),
//!         original_prompt: "Summarize this article".to_string(),
//!         intent_category: IntentCategory::Summary,
//!         source: Source::Extension,
//!         tags: vec!["reading".to_string()],
//!         meta: Default::default(),
//!     };
//!     let stored = history::create_entry(db.pool(), &entry).await?;
//!     println!("stored {}", stored.id);
//!
//!     Ok(())
//! }
//! ```

pub mod credits;
pub mod error;
pub mod history;
pub mod models;
pub mod timestamp;
pub mod validation;

pub use error::{DatabaseError, Result};
pub use history::HistoryFilter;
pub use models::{
    CreditTransaction, EnhancementRecord, EntryPatch, IntentCategory, Meta, NewEntry,
    PromptHistoryEntry, Source,
};
pub use validation::ValidationError;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 10;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/history.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let db = database::Database::connect("sqlite::memory:").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        let pool_size = if is_memory_url(url) {
            1
        } else {
            Self::DEFAULT_POOL_SIZE
        };
        Self::connect_with_pool_size(url, pool_size).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(std::time::Duration::from_secs(5));

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30));

        // Each in-memory connection is its own database; keep the only one alive.
        if is_memory_url(url) {
            pool_options = pool_options
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options.connect_with(options).await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_entry_and_credits_share_one_database() {
        let db = test_db().await;

        let entry = NewEntry {
            owner_id: "alice".to_string(),
            original_prompt: "Explain monads".to_string(),
            intent_category: IntentCategory::Analysis,
            source: Source::Web,
            tags: vec![],
            meta: Meta::new(),
        };
        let stored = history::create_entry(db.pool(), &entry).await.unwrap();
        assert!(!stored.is_enhanced());

        credits::grant_credits(db.pool(), "alice", enhance_core::Credits::from_cents(100), "signup")
            .await
            .unwrap();

        assert_eq!(history::count_entries(db.pool(), "alice", false).await.unwrap(), 1);
        assert_eq!(
            credits::get_balance(db.pool(), "alice").await.unwrap(),
            Some(enhance_core::Credits::from_cents(100))
        );

        db.close().await;
    }

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let db = test_db().await;
        db.migrate().await.unwrap();
    }
}

//! Local store: persisted movies in SQLite.
//!
//! - `model`: row decoding and store view models.
//! - `repo`: SQL-only functions over a pool.
//!
//! Controllers depend on the [`MovieStore`] trait; [`SqliteStore`] is the
//! production implementation.

pub mod model;
pub mod repo;

use anyhow::Result;
use async_trait::async_trait;

use crate::model::PersistedItem;

pub use model::StoreSummary;
pub use repo::*;

/// Record store for persisted movies.
#[async_trait]
pub trait MovieStore: Send + Sync {
    /// Insert (or replace) one record and commit it.
    async fn insert(&self, item: &PersistedItem) -> Result<()>;

    async fn count(&self) -> Result<i64>;

    /// Records in insertion order starting at `offset`.
    async fn fetch(&self, offset: i64, limit: i64) -> Result<Vec<PersistedItem>>;

    async fn find(&self, movie_id: i64) -> Result<Option<PersistedItem>>;
}

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: Pool,
}

impl SqliteStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database at `database_url` and migrate it.
    pub async fn open(database_url: &str) -> Result<Self> {
        let pool = init_pool(database_url).await?;
        run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub async fn summary(&self, page_size: u32) -> Result<StoreSummary> {
        let count = count_movies(&self.pool).await?;
        Ok(StoreSummary::new(count, page_size))
    }
}

#[async_trait]
impl MovieStore for SqliteStore {
    async fn insert(&self, item: &PersistedItem) -> Result<()> {
        insert_movie(&self.pool, item).await
    }

    async fn count(&self) -> Result<i64> {
        count_movies(&self.pool).await
    }

    async fn fetch(&self, offset: i64, limit: i64) -> Result<Vec<PersistedItem>> {
        fetch_movies(&self.pool, offset, limit).await
    }

    async fn find(&self, movie_id: i64) -> Result<Option<PersistedItem>> {
        find_movie(&self.pool, movie_id).await
    }
}

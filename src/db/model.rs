//! Row decoding and view models returned by the store.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::model::PersistedItem;

/// Decode one `movies` row.
pub(crate) fn movie_from_row(row: &SqliteRow) -> Result<PersistedItem> {
    let movie_id: i64 = row.get("movie_id");
    let genres_raw: String = row.get("genres");
    let genres: Vec<String> = serde_json::from_str(&genres_raw)
        .with_context(|| format!("movie {} has malformed genres", movie_id))?;

    Ok(PersistedItem {
        movie_id,
        title: row.get("title"),
        overview: row.get("overview"),
        popularity: row.get("popularity"),
        vote_average: row.get("vote_average"),
        vote_count: row.get("vote_count"),
        release_date: row.get("release_date"),
        genres,
        poster: row.try_get::<Option<Vec<u8>>, _>("poster").ok().flatten(),
        backdrop: row.try_get::<Option<Vec<u8>>, _>("backdrop").ok().flatten(),
        cached_at: row.try_get::<DateTime<Utc>, _>("cached_at").ok(),
    })
}

/// Persisted record count and the number of full pages it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreSummary {
    pub count: i64,
    pub page_size: u32,
    pub persisted_pages: i64,
}

impl StoreSummary {
    pub fn new(count: i64, page_size: u32) -> Self {
        Self {
            count,
            page_size,
            persisted_pages: persisted_pages(count, page_size),
        }
    }
}

/// Number of complete pages available locally: `floor(count / page_size)`.
pub fn persisted_pages(count: i64, page_size: u32) -> i64 {
    if page_size == 0 {
        return 0;
    }
    count.max(0) / i64::from(page_size)
}

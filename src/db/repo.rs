use super::model::movie_from_row;
use crate::model::PersistedItem;
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::instrument;

pub type Pool = SqlitePool;

const MOVIE_COLUMNS: &str = "movie_id, title, overview, popularity, vote_average, vote_count, \
     release_date, genres, poster, backdrop, cached_at";

pub async fn init_pool(database_url: &str) -> Result<Pool> {
    let normalized = normalize_sqlite_url(database_url)?;
    // WAL lets page reads proceed while background persistence writes.
    let options = SqliteConnectOptions::from_str(&normalized)
        .with_context(|| format!("invalid database url {}", normalized))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Full);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    Ok(pool)
}

/// Rewrite a file-backed SQLite URL as `sqlite://<path>[?query]`, expanding a
/// leading `~/` and creating the database's parent directory. In-memory and
/// non-SQLite URLs pass through.
fn normalize_sqlite_url(url: &str) -> Result<String> {
    let Some(rest) = url.strip_prefix("sqlite:") else {
        return Ok(url.to_string());
    };
    if rest.starts_with(":memory") {
        return Ok(url.to_string());
    }
    let rest = rest.strip_prefix("//").unwrap_or(rest);
    let (path, query) = rest.split_at(rest.find('?').unwrap_or(rest.len()));
    if path.is_empty() {
        return Ok(url.to_string());
    }

    let path = expand_home(path);
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create database directory {}", dir.display()))?;
    }
    Ok(format!("sqlite://{}{}", path.display(), query))
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(path),
    }
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Insert one movie in its own transaction. An existing `movie_id` is
/// updated in place (keeping its position); stored images survive an update
/// that carries none.
#[instrument(skip_all, fields(movie_id = item.movie_id))]
pub async fn insert_movie(pool: &Pool, item: &PersistedItem) -> Result<()> {
    let genres = serde_json::to_string(&item.genres)?;
    let cached_at = item.cached_at.unwrap_or_else(Utc::now);

    let mut tx = pool.begin().await?;
    sqlx::query(
        "INSERT INTO movies (movie_id, title, overview, popularity, vote_average, vote_count, \
             release_date, genres, poster, backdrop, cached_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT(movie_id) DO UPDATE SET \
             title = excluded.title, \
             overview = excluded.overview, \
             popularity = excluded.popularity, \
             vote_average = excluded.vote_average, \
             vote_count = excluded.vote_count, \
             release_date = excluded.release_date, \
             genres = excluded.genres, \
             poster = COALESCE(excluded.poster, movies.poster), \
             backdrop = COALESCE(excluded.backdrop, movies.backdrop), \
             cached_at = excluded.cached_at",
    )
    .bind(item.movie_id)
    .bind(&item.title)
    .bind(&item.overview)
    .bind(item.popularity)
    .bind(item.vote_average)
    .bind(item.vote_count)
    .bind(&item.release_date)
    .bind(genres)
    .bind(item.poster.as_deref())
    .bind(item.backdrop.as_deref())
    .bind(cached_at)
    .execute(&mut *tx)
    .await?;
    tx.commit()
        .await
        .with_context(|| format!("failed to commit movie {}", item.movie_id))?;
    Ok(())
}

#[instrument(skip_all)]
pub async fn count_movies(pool: &Pool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM movies")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

#[instrument(skip(pool))]
pub async fn fetch_movies(pool: &Pool, offset: i64, limit: i64) -> Result<Vec<PersistedItem>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM movies ORDER BY id ASC LIMIT ? OFFSET ?",
        MOVIE_COLUMNS
    ))
    .bind(limit.max(0))
    .bind(offset.max(0))
    .fetch_all(pool)
    .await?;
    rows.iter().map(movie_from_row).collect()
}

#[instrument(skip_all)]
pub async fn find_movie(pool: &Pool, movie_id: i64) -> Result<Option<PersistedItem>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM movies WHERE movie_id = ?",
        MOVIE_COLUMNS
    ))
    .bind(movie_id)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(movie_from_row).transpose()
}

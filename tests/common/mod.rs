#![allow(dead_code)]

use async_trait::async_trait;
use moviedeck::catalog::{CatalogError, CatalogService};
use moviedeck::db::{MovieStore, SqliteStore};
use moviedeck::factory::MovieFactory;
use moviedeck::images::ImageSource;
use moviedeck::model::{CatalogItem, CatalogPage, Genre, MovieDetail, PersistedItem};
use moviedeck::pagination::Settings;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Mutex;

pub async fn setup_store() -> (TempDir, Arc<SqliteStore>) {
    let td = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}/movies.db", td.path().display());
    let store = SqliteStore::open(&url).await.unwrap();
    (td, Arc::new(store))
}

pub fn settings() -> Settings {
    Settings {
        request_timeout: Duration::from_millis(500),
        ..Settings::default()
    }
}

pub fn factory() -> MovieFactory {
    MovieFactory::new(
        Arc::new(EchoImages),
        "https://image.tmdb.org/t/p/".into(),
        "w500".into(),
    )
}

/// Catalog item `index` (0-based) of page `page`: ids 101.. on page 1,
/// 121.. on page 2 and so on.
pub fn catalog_item(page: u32, index: usize) -> CatalogItem {
    let id = 100 + (page as i64 - 1) * 20 + index as i64 + 1;
    CatalogItem {
        id,
        title: format!("Movie Title {}", (page as usize - 1) * 20 + index),
        overview: format!("Overview of Movie {}", index),
        popularity: 100.1,
        vote_average: 7.1,
        vote_count: 100,
        release_date: Some("2024-01-01".into()),
        poster_path: Some(format!("/poster{}.jpg", id)),
        backdrop_path: Some(format!("/backdrop{}.jpg", id)),
        genre_ids: vec![28, 80],
    }
}

pub fn catalog_page(page: u32, count: usize) -> CatalogPage {
    CatalogPage {
        page: page as i64,
        items: (0..count).map(|i| catalog_item(page, i)).collect(),
        total_pages: 3,
        total_results: 60,
    }
}

pub fn detail(genres: &[&str]) -> MovieDetail {
    MovieDetail {
        genres: genres
            .iter()
            .enumerate()
            .map(|(i, name)| Genre {
                id: i as i64,
                name: name.to_string(),
            })
            .collect(),
    }
}

pub fn api_error() -> CatalogError {
    CatalogError::Api {
        status: 500,
        body: "boom".into(),
    }
}

/// Serves the requested URL as the image bytes.
pub struct EchoImages;

#[async_trait]
impl ImageSource for EchoImages {
    async fn fetch(&self, url: &str) -> Option<Vec<u8>> {
        Some(url.as_bytes().to_vec())
    }
}

type Queue<T> = Arc<Mutex<VecDeque<Result<T, CatalogError>>>>;

/// Catalog that records calls and replays queued responses. With an empty
/// queue it serves a full page for discover, no genres for detail and an
/// empty related list.
#[derive(Clone, Default)]
pub struct RecordingCatalog {
    discover_responses: Queue<CatalogPage>,
    detail_responses: Queue<MovieDetail>,
    related_responses: Queue<CatalogPage>,
    discover_calls: Arc<Mutex<Vec<u32>>>,
    detail_calls: Arc<Mutex<Vec<i64>>>,
    related_calls: Arc<Mutex<Vec<i64>>>,
}

impl RecordingCatalog {
    pub async fn push_discover(&self, response: Result<CatalogPage, CatalogError>) {
        self.discover_responses.lock().await.push_back(response);
    }

    pub async fn push_detail(&self, response: Result<MovieDetail, CatalogError>) {
        self.detail_responses.lock().await.push_back(response);
    }

    pub async fn push_related(&self, response: Result<CatalogPage, CatalogError>) {
        self.related_responses.lock().await.push_back(response);
    }

    pub async fn discover_calls(&self) -> Vec<u32> {
        self.discover_calls.lock().await.clone()
    }

    pub async fn detail_calls(&self) -> Vec<i64> {
        self.detail_calls.lock().await.clone()
    }

    pub async fn related_calls(&self) -> Vec<i64> {
        self.related_calls.lock().await.clone()
    }
}

#[async_trait]
impl CatalogService for RecordingCatalog {
    async fn discover(&self, page: u32) -> Result<CatalogPage, CatalogError> {
        self.discover_calls.lock().await.push(page);
        let queued = self.discover_responses.lock().await.pop_front();
        queued.unwrap_or_else(|| Ok(catalog_page(page, 20)))
    }

    async fn detail(&self, movie_id: i64) -> Result<MovieDetail, CatalogError> {
        self.detail_calls.lock().await.push(movie_id);
        let queued = self.detail_responses.lock().await.pop_front();
        queued.unwrap_or_else(|| Ok(MovieDetail::default()))
    }

    async fn related(&self, movie_id: i64) -> Result<CatalogPage, CatalogError> {
        self.related_calls.lock().await.push(movie_id);
        let queued = self.related_responses.lock().await.pop_front();
        queued.unwrap_or_else(|| Ok(catalog_page(1, 0)))
    }
}

/// Catalog whose requests never complete.
pub struct HangingCatalog;

#[async_trait]
impl CatalogService for HangingCatalog {
    async fn discover(&self, _page: u32) -> Result<CatalogPage, CatalogError> {
        std::future::pending().await
    }

    async fn detail(&self, _movie_id: i64) -> Result<MovieDetail, CatalogError> {
        std::future::pending().await
    }

    async fn related(&self, _movie_id: i64) -> Result<CatalogPage, CatalogError> {
        std::future::pending().await
    }
}

/// SQLite-backed store whose inserts fail for the given movie ids.
pub struct FailingStore {
    inner: Arc<SqliteStore>,
    failing: Vec<i64>,
    attempts: Arc<Mutex<Vec<i64>>>,
}

impl FailingStore {
    pub fn new(inner: Arc<SqliteStore>, failing: &[i64]) -> Self {
        Self {
            inner,
            failing: failing.to_vec(),
            attempts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn insert_attempts(&self) -> Vec<i64> {
        self.attempts.lock().await.clone()
    }
}

#[async_trait]
impl MovieStore for FailingStore {
    async fn insert(&self, item: &PersistedItem) -> anyhow::Result<()> {
        self.attempts.lock().await.push(item.movie_id);
        if self.failing.contains(&item.movie_id) {
            anyhow::bail!("disk full while writing movie {}", item.movie_id);
        }
        self.inner.insert(item).await
    }

    async fn count(&self) -> anyhow::Result<i64> {
        self.inner.count().await
    }

    async fn fetch(&self, offset: i64, limit: i64) -> anyhow::Result<Vec<PersistedItem>> {
        self.inner.fetch(offset, limit).await
    }

    async fn find(&self, movie_id: i64) -> anyhow::Result<Option<PersistedItem>> {
        self.inner.find(movie_id).await
    }
}

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::model::{CatalogPage, MovieDetail};

const TMDB_API_BASE: &str = "https://api.themoviedb.org/3/";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("catalog error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("invalid catalog response JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("catalog request timed out after {0:?}")]
    Timeout(Duration),
    #[error("invalid catalog URL: {0}")]
    InvalidUrl(String),
}

/// `Url::join` replaces the last path segment unless the base ends in `/`.
fn as_directory(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn join(base: &Url, path: &str) -> Result<Url, CatalogError> {
    base.join(path)
        .map_err(|err| CatalogError::InvalidUrl(format!("{}: {}", path, err)))
}

/// Remote movie catalog: paginated discovery, per-movie detail and similar titles.
#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn discover(&self, page: u32) -> Result<CatalogPage, CatalogError>;

    async fn detail(&self, movie_id: i64) -> Result<MovieDetail, CatalogError>;

    async fn related(&self, movie_id: i64) -> Result<CatalogPage, CatalogError>;
}

/// Bound a catalog call by `limit`; expiry becomes [`CatalogError::Timeout`].
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, CatalogError>
where
    F: std::future::Future<Output = Result<T, CatalogError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(CatalogError::Timeout(limit)),
    }
}

#[derive(Clone)]
pub struct TmdbClient {
    http: Client,
    base_url: Url,
    api_key: String,
    language: String,
}

impl fmt::Debug for TmdbClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TmdbClient")
            .field("base_url", &self.base_url)
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

impl TmdbClient {
    pub fn new(http: Client, api_key: String) -> Self {
        let base_url = Url::parse(TMDB_API_BASE).expect("valid default TMDB URL");
        Self::with_base_url(http, api_key, base_url)
    }

    pub fn with_base_url(http: Client, api_key: String, base_url: Url) -> Self {
        Self {
            http,
            base_url: as_directory(base_url),
            api_key,
            language: "en-US".into(),
        }
    }

    pub fn from_config(http: Client, cfg: &Config) -> Result<Self, CatalogError> {
        let base_url = Url::parse(&cfg.catalog.base_url)
            .map_err(|err| CatalogError::InvalidUrl(err.to_string()))?;
        Ok(Self::with_base_url(http, cfg.catalog.api_key.clone(), base_url)
            .with_language(cfg.catalog.language.clone()))
    }

    pub fn with_language(mut self, language: String) -> Self {
        self.language = language;
        self
    }

    /// `GET discover/movie` with the fixed browsing filters.
    pub fn discover_request(&self, page: u32) -> Result<reqwest::Request, CatalogError> {
        let url = join(&self.base_url, "discover/movie")?;
        let page = page.to_string();
        let request = self
            .http
            .get(url)
            .query(&[
                ("include_adult", "false"),
                ("include_video", "false"),
                ("language", self.language.as_str()),
                ("page", page.as_str()),
                ("sort_by", "popularity.desc"),
                ("api_key", self.api_key.as_str()),
            ])
            .build()?;
        Ok(request)
    }

    /// `GET movie/{id}`.
    pub fn detail_request(&self, movie_id: i64) -> Result<reqwest::Request, CatalogError> {
        let url = join(&self.base_url, &format!("movie/{}", movie_id))?;
        self.simple_request(url)
    }

    /// `GET movie/{id}/similar`.
    pub fn related_request(&self, movie_id: i64) -> Result<reqwest::Request, CatalogError> {
        let url = join(&self.base_url, &format!("movie/{}/similar", movie_id))?;
        self.simple_request(url)
    }

    fn simple_request(&self, url: Url) -> Result<reqwest::Request, CatalogError> {
        let request = self
            .http
            .get(url)
            .query(&[
                ("language", self.language.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
            .build()?;
        Ok(request)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::Request,
    ) -> Result<T, CatalogError> {
        debug!(path = request.url().path(), "catalog request");
        let res = self.http.execute(request).await?;
        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            warn!(%status, "catalog returned an error status");
            return Err(CatalogError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl CatalogService for TmdbClient {
    async fn discover(&self, page: u32) -> Result<CatalogPage, CatalogError> {
        let request = self.discover_request(page)?;
        self.execute(request).await
    }

    async fn detail(&self, movie_id: i64) -> Result<MovieDetail, CatalogError> {
        let request = self.detail_request(movie_id)?;
        self.execute(request).await
    }

    async fn related(&self, movie_id: i64) -> Result<CatalogPage, CatalogError> {
        let request = self.related_request(movie_id)?;
        self.execute(request).await
    }
}

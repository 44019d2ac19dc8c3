//! Poster/backdrop downloads and the in-memory image cache.

use async_trait::async_trait;
use reqwest::Client;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Build `{base}/{size}{path}` for a TMDB-style relative image path.
/// Returns `None` when the catalog has no image for the field.
pub fn image_url(base: &str, size: &str, path: Option<&str>) -> Option<String> {
    let path = path.map(str::trim).filter(|p| !p.is_empty())?;
    let path = path.trim_start_matches('/');
    Some(format!(
        "{}/{}/{}",
        base.trim_end_matches('/'),
        size.trim_matches('/'),
        path
    ))
}

/// Source of raw image bytes. Failures are absorbed into `None`.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Option<Vec<u8>>;
}

#[derive(Debug, Clone)]
pub struct HttpImageSource {
    http: Client,
}

impl HttpImageSource {
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, reqwest::Error> {
        let res = self.http.get(url).send().await?.error_for_status()?;
        Ok(res.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self, url: &str) -> Option<Vec<u8>> {
        match self.download(url).await {
            Ok(bytes) if !bytes.is_empty() => Some(bytes),
            Ok(_) => None,
            Err(err) => {
                warn!(%url, ?err, "image download failed");
                None
            }
        }
    }
}

/// Key/value store for downloaded images, keyed by URL.
pub trait ImageCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Vec<u8>>;
    fn put(&self, key: String, value: Vec<u8>);
}

/// Bounded in-memory cache; the oldest insert is evicted first.
#[derive(Debug)]
pub struct MemoryImageCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<String, Vec<u8>>,
    order: VecDeque<String>,
}

impl MemoryImageCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|g| g.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ImageCache for MemoryImageCache {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let guard = self.inner.lock().ok()?;
        guard.entries.get(key).cloned()
    }

    fn put(&self, key: String, value: Vec<u8>) {
        if self.capacity == 0 {
            return;
        }
        let Ok(mut guard) = self.inner.lock() else {
            return;
        };
        if guard.entries.insert(key.clone(), value).is_none() {
            guard.order.push_back(key);
        }
        while guard.entries.len() > self.capacity {
            let Some(oldest) = guard.order.pop_front() else {
                break;
            };
            guard.entries.remove(&oldest);
        }
    }
}

/// Image source that consults a cache before going to the network and keeps
/// every successful download.
pub struct CachedImageSource<S> {
    inner: S,
    cache: Arc<dyn ImageCache>,
}

impl<S> CachedImageSource<S> {
    pub fn new(inner: S, cache: Arc<dyn ImageCache>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl<S: ImageSource> ImageSource for CachedImageSource<S> {
    async fn fetch(&self, url: &str) -> Option<Vec<u8>> {
        if let Some(hit) = self.cache.get(url) {
            debug!(%url, "image cache hit");
            return Some(hit);
        }
        let bytes = self.inner.fetch(url).await?;
        self.cache.put(url.to_string(), bytes.clone());
        Some(bytes)
    }
}

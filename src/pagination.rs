//! Paginated movie list: serves pages from the local store while it has them,
//! otherwise from the catalog, persisting fetched pages in the background.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::catalog::{with_timeout, CatalogService};
use crate::config::Config;
use crate::db::model::persisted_pages;
use crate::db::MovieStore;
use crate::detail::DetailController;
use crate::factory::MovieFactory;
use crate::model::{CatalogItem, DisplayItem, OperationState, PersistedItem};
use crate::state::StateCell;

pub const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub page_size: u32,
    pub request_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout: Duration::from_secs(15),
        }
    }
}

impl Settings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            page_size: cfg.app.page_size,
            request_timeout: cfg.request_timeout(),
        }
    }
}

pub struct PaginationController {
    catalog: Arc<dyn CatalogService>,
    store: Arc<dyn MovieStore>,
    factory: MovieFactory,
    settings: Settings,
    page: u32,
    persisted_count: i64,
    movies: Vec<DisplayItem>,
    state: StateCell,
    persistence: Vec<JoinHandle<usize>>,
}

impl PaginationController {
    /// Build the controller and read the persisted record count once. The
    /// cursor starts at page 1; nothing is requested until the first trigger.
    pub async fn new(
        catalog: Arc<dyn CatalogService>,
        store: Arc<dyn MovieStore>,
        factory: MovieFactory,
        settings: Settings,
    ) -> Self {
        let persisted_count = match store.count().await {
            Ok(count) => count,
            Err(err) => {
                warn!(?err, "failed to count persisted movies; assuming none");
                0
            }
        };
        debug!(persisted_count, "pagination controller ready");
        Self {
            catalog,
            store,
            factory,
            settings,
            page: 1,
            persisted_count,
            movies: Vec::new(),
            state: StateCell::new("list"),
            persistence: Vec::new(),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn persisted_count(&self) -> i64 {
        self.persisted_count
    }

    /// Full pages available locally: `floor(persisted_count / page_size)`.
    pub fn total_persisted_pages(&self) -> i64 {
        persisted_pages(self.persisted_count, self.settings.page_size)
    }

    pub fn factory(&self) -> &MovieFactory {
        &self.factory
    }

    pub fn movies(&self) -> &[DisplayItem] {
        &self.movies
    }

    pub fn state(&self) -> OperationState {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<OperationState> {
        self.state.subscribe()
    }

    /// First appearance of the list: request the initial page if nothing is
    /// shown yet.
    pub async fn on_appear(&mut self) {
        if self.movies.is_empty() && self.state() != OperationState::Loading {
            self.request_page().await;
        }
    }

    /// Infinite-scroll trigger: when the last displayed item becomes visible,
    /// advance the cursor and request that page.
    pub async fn item_appeared(&mut self, item: &DisplayItem) {
        let is_last = self.movies.last().map(|last| last.uid) == Some(item.uid);
        if is_last {
            self.page += 1;
            self.request_page().await;
        }
    }

    /// Manual retry after a failure; the cursor does not move.
    pub async fn retry(&mut self) {
        self.request_page().await;
    }

    /// Serve the page under the cursor from the store when it is fully
    /// persisted, otherwise from the catalog.
    #[instrument(skip(self), fields(page = self.page))]
    pub async fn request_page(&mut self) {
        if i64::from(self.page) <= self.total_persisted_pages() {
            self.load_from_store().await;
        } else {
            self.load_from_catalog().await;
        }
    }

    // Items are appended as read; no dedup against what is already shown.
    async fn load_from_store(&mut self) {
        let page_size = self.settings.page_size as usize;
        let offset = self.persisted_count.min(self.movies.len() as i64);
        let records = match self
            .store
            .fetch(offset, i64::from(self.settings.page_size))
            .await
        {
            Ok(records) => records,
            Err(err) => {
                warn!(?err, offset, "failed to read persisted page");
                return;
            }
        };
        let fetched = self.factory.display_from_persisted(records).await;
        info!(offset, count = fetched.len(), "served page from store");
        self.movies.extend(fetched);
        self.page = (self.movies.len() / page_size) as u32;
    }

    async fn load_from_catalog(&mut self) {
        self.state.begin();
        let call = self.catalog.discover(self.page);
        match with_timeout(self.settings.request_timeout, call).await {
            Ok(page) => {
                self.state.succeed();
                let fetched = self.factory.display_from_catalog(&page.items);
                info!(
                    page = self.page,
                    count = fetched.len(),
                    total_pages = page.total_pages,
                    "served page from catalog"
                );
                self.movies.extend(fetched);
                self.persist_in_background(page.items);
            }
            Err(err) => {
                warn!(?err, page = self.page, "failed to fetch catalog page");
                self.state.fail();
            }
        }
    }

    fn persist_in_background(&mut self, items: Vec<CatalogItem>) {
        if items.is_empty() {
            return;
        }
        let factory = self.factory.clone();
        let store = Arc::clone(&self.store);
        let handle = tokio::spawn(async move {
            let records = factory.persisted_from_catalog(&items).await;
            persist_all(store.as_ref(), &records).await
        });
        self.persistence.push(handle);
    }

    /// Wait for every background persistence task started so far; returns
    /// the number of records written.
    pub async fn wait_for_persistence(&mut self) -> usize {
        let mut written = 0;
        for handle in self.persistence.drain(..) {
            match handle.await {
                Ok(count) => written += count,
                Err(err) => warn!(?err, "persistence task failed"),
            }
        }
        written
    }

    /// Detail controller for one displayed movie, sharing this list's
    /// catalog, store and factory.
    pub fn detail_for(&self, movie: DisplayItem) -> DetailController {
        DetailController::new(
            Arc::clone(&self.catalog),
            Arc::clone(&self.store),
            self.factory.clone(),
            self.settings.request_timeout,
            movie,
        )
    }
}

/// Insert records one by one, each committed on its own. A failed insert is
/// logged and skipped.
pub async fn persist_all(store: &dyn MovieStore, records: &[PersistedItem]) -> usize {
    let mut written = 0;
    for record in records {
        match store.insert(record).await {
            Ok(()) => written += 1,
            Err(err) => warn!(?err, movie_id = record.movie_id, "failed to persist movie"),
        }
    }
    written
}

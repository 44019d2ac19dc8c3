//! Detail screen data: genre enrichment and related titles for one movie.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::catalog::{with_timeout, CatalogService};
use crate::db::MovieStore;
use crate::factory::MovieFactory;
use crate::model::{DisplayItem, OperationState};
use crate::state::StateCell;

pub struct DetailController {
    catalog: Arc<dyn CatalogService>,
    store: Arc<dyn MovieStore>,
    factory: MovieFactory,
    request_timeout: Duration,
    movie: DisplayItem,
    related: Vec<DisplayItem>,
    detail_state: StateCell,
    related_state: StateCell,
}

impl DetailController {
    pub fn new(
        catalog: Arc<dyn CatalogService>,
        store: Arc<dyn MovieStore>,
        factory: MovieFactory,
        request_timeout: Duration,
        movie: DisplayItem,
    ) -> Self {
        Self {
            catalog,
            store,
            factory,
            request_timeout,
            movie,
            related: Vec::new(),
            detail_state: StateCell::new("detail"),
            related_state: StateCell::new("related"),
        }
    }

    pub fn movie(&self) -> &DisplayItem {
        &self.movie
    }

    pub fn related(&self) -> &[DisplayItem] {
        &self.related
    }

    pub fn detail_state(&self) -> OperationState {
        self.detail_state.get()
    }

    pub fn related_state(&self) -> OperationState {
        self.related_state.get()
    }

    pub fn subscribe_detail(&self) -> watch::Receiver<OperationState> {
        self.detail_state.subscribe()
    }

    pub fn subscribe_related(&self) -> watch::Receiver<OperationState> {
        self.related_state.subscribe()
    }

    /// Load genres for the movie, then related titles, then persist the
    /// enriched record. Does nothing once the movie already has genres.
    #[instrument(skip(self), fields(movie_id = self.movie.movie_id))]
    pub async fn fetch_detail(&mut self) {
        if !self.movie.genres.is_empty() {
            return;
        }
        self.detail_state.begin();
        let call = self.catalog.detail(self.movie.movie_id);
        match with_timeout(self.request_timeout, call).await {
            Ok(detail) => {
                self.movie = self.factory.attach_detail(self.movie.clone(), &detail);
                self.detail_state.succeed();
                info!(genres = self.movie.genres.len(), "movie detail loaded");
                self.fetch_related().await;
                self.persist_enriched().await;
            }
            Err(err) => {
                warn!(?err, "failed to fetch movie detail");
                self.detail_state.fail();
            }
        }
    }

    /// Load titles similar to the movie. On failure the previous list stays.
    #[instrument(skip(self), fields(movie_id = self.movie.movie_id))]
    pub async fn fetch_related(&mut self) {
        self.related_state.begin();
        let call = self.catalog.related(self.movie.movie_id);
        match with_timeout(self.request_timeout, call).await {
            Ok(page) => {
                self.related = self.factory.display_from_catalog(&page.items);
                self.related_state.succeed();
            }
            Err(err) => {
                warn!(?err, "failed to fetch related movies");
                self.related_state.fail();
            }
        }
    }

    /// Store the current movie, genres included. Failures are only logged.
    pub async fn persist_enriched(&self) {
        let record = self.factory.persisted_from_display(&self.movie);
        if let Err(err) = self.store.insert(&record).await {
            warn!(?err, movie_id = record.movie_id, "failed to persist movie detail");
        }
    }
}

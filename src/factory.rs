//! Conversions between catalog, persisted and display movie records.

use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::config::Config;
use crate::images::{image_url, ImageSource};
use crate::model::{Artwork, CatalogItem, DisplayItem, MovieDetail, PersistedItem};
use crate::task_group::TaskGroup;

/// Format a vote average the way it is displayed: two decimals.
pub fn format_vote(value: f64) -> String {
    format!("{:.2}", value)
}

/// Parse a displayed vote average back; unparseable text reads as 0.
pub fn parse_vote(text: &str) -> f64 {
    text.trim().parse().unwrap_or(0.0)
}

#[derive(Clone)]
pub struct MovieFactory {
    images: Arc<dyn ImageSource>,
    image_base: String,
    image_size: String,
}

impl MovieFactory {
    pub fn new(images: Arc<dyn ImageSource>, image_base: String, image_size: String) -> Self {
        Self {
            images,
            image_base,
            image_size,
        }
    }

    pub fn from_config(images: Arc<dyn ImageSource>, cfg: &Config) -> Self {
        Self::new(
            images,
            cfg.images.base_url.clone(),
            cfg.images.size.clone(),
        )
    }

    pub fn image_url(&self, path: Option<&str>) -> Option<String> {
        image_url(&self.image_base, &self.image_size, path)
    }

    /// Catalog page to display items, same order, URL-backed artwork.
    pub fn display_from_catalog(&self, items: &[CatalogItem]) -> Vec<DisplayItem> {
        items
            .iter()
            .map(|item| DisplayItem {
                uid: Uuid::new_v4(),
                movie_id: item.id,
                title: item.title.clone(),
                overview: item.overview.clone(),
                popularity: item.popularity,
                vote_average: format_vote(item.vote_average),
                vote_count: item.vote_count,
                release_date: item.release_date.clone().unwrap_or_default(),
                genres: Vec::new(),
                poster: self.remote_artwork(item.poster_path.as_deref()),
                backdrop: self.remote_artwork(item.backdrop_path.as_deref()),
            })
            .collect()
    }

    /// Persisted records to display items, converted in parallel. The result
    /// is in completion order, not input order.
    pub async fn display_from_persisted(&self, items: Vec<PersistedItem>) -> Vec<DisplayItem> {
        let mut group = TaskGroup::new("display_from_persisted");
        for item in items {
            group.spawn(async move { Some(display_from_record(item)) });
        }
        group.join_all().await
    }

    /// Catalog page to persisted records, downloading poster and backdrop for
    /// every item concurrently. A failed download leaves that blob empty.
    pub async fn persisted_from_catalog(&self, items: &[CatalogItem]) -> Vec<PersistedItem> {
        let mut group = TaskGroup::new("persisted_from_catalog");
        for item in items.iter().cloned() {
            let images = Arc::clone(&self.images);
            let poster_url = self.image_url(item.poster_path.as_deref());
            let backdrop_url = self.image_url(item.backdrop_path.as_deref());
            group.spawn(async move {
                let (poster, backdrop) = futures::join!(
                    fetch_optional(images.as_ref(), poster_url.as_deref()),
                    fetch_optional(images.as_ref(), backdrop_url.as_deref()),
                );
                debug!(
                    movie_id = item.id,
                    poster = poster.is_some(),
                    backdrop = backdrop.is_some(),
                    "images fetched"
                );
                Some(PersistedItem {
                    movie_id: item.id,
                    title: item.title,
                    overview: item.overview,
                    popularity: item.popularity,
                    vote_average: item.vote_average,
                    vote_count: item.vote_count,
                    release_date: item.release_date.unwrap_or_default(),
                    genres: Vec::new(),
                    poster,
                    backdrop,
                    cached_at: None,
                })
            });
        }
        group.join_all().await
    }

    /// Direct copy of a display item, keeping any embedded image bytes.
    pub fn persisted_from_display(&self, item: &DisplayItem) -> PersistedItem {
        PersistedItem {
            movie_id: item.movie_id,
            title: item.title.clone(),
            overview: item.overview.clone(),
            popularity: item.popularity,
            vote_average: parse_vote(&item.vote_average),
            vote_count: item.vote_count,
            release_date: item.release_date.clone(),
            genres: item.genres.clone(),
            poster: item.poster.clone().into_blob(),
            backdrop: item.backdrop.clone().into_blob(),
            cached_at: None,
        }
    }

    /// Append the detail's genre names to the item.
    pub fn attach_detail(&self, mut item: DisplayItem, detail: &MovieDetail) -> DisplayItem {
        item.genres
            .extend(detail.genres.iter().map(|genre| genre.name.clone()));
        item
    }

    fn remote_artwork(&self, path: Option<&str>) -> Artwork {
        self.image_url(path)
            .map(Artwork::Remote)
            .unwrap_or(Artwork::Missing)
    }
}

fn display_from_record(item: PersistedItem) -> DisplayItem {
    DisplayItem {
        uid: Uuid::new_v4(),
        movie_id: item.movie_id,
        title: item.title,
        overview: item.overview,
        popularity: item.popularity,
        vote_average: format_vote(item.vote_average),
        vote_count: item.vote_count,
        release_date: item.release_date,
        genres: item.genres,
        poster: Artwork::from_blob(item.poster),
        backdrop: Artwork::from_blob(item.backdrop),
    }
}

async fn fetch_optional(images: &dyn ImageSource, url: Option<&str>) -> Option<Vec<u8>> {
    match url {
        Some(url) => images.fetch(url).await,
        None => None,
    }
}

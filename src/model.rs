use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One movie as returned by the catalog's discover/similar endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogItem {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: i64,
    pub release_date: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
}

/// A page of catalog results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogPage {
    #[serde(default)]
    pub page: i64,
    #[serde(rename = "results")]
    pub items: Vec<CatalogItem>,
    #[serde(default)]
    pub total_pages: i64,
    #[serde(default)]
    pub total_results: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// Extended movie detail; only the genre breakdown is consumed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MovieDetail {
    #[serde(default)]
    pub genres: Vec<Genre>,
}

/// Durable copy of a movie kept for offline browsing.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedItem {
    pub movie_id: i64,
    pub title: String,
    pub overview: String,
    pub popularity: f64,
    pub vote_average: f64,
    pub vote_count: i64,
    pub release_date: String,
    pub genres: Vec<String>,
    pub poster: Option<Vec<u8>>,
    pub backdrop: Option<Vec<u8>>,
    pub cached_at: Option<DateTime<Utc>>,
}

/// Where a display item's image comes from. Embedded bytes win over a URL,
/// so at most one source is ever carried.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Artwork {
    Remote(String),
    Embedded(Vec<u8>),
    #[default]
    Missing,
}

impl Artwork {
    pub fn url(&self) -> Option<&str> {
        match self {
            Artwork::Remote(url) => Some(url),
            _ => None,
        }
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Artwork::Embedded(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub(crate) fn from_blob(blob: Option<Vec<u8>>) -> Self {
        match blob {
            Some(bytes) if !bytes.is_empty() => Artwork::Embedded(bytes),
            _ => Artwork::Missing,
        }
    }

    pub(crate) fn into_blob(self) -> Option<Vec<u8>> {
        match self {
            Artwork::Embedded(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// UI-facing projection of a catalog or persisted movie.
///
/// `uid` is generated locally on every conversion and identifies the row in a
/// rendered list; `movie_id` is the catalog id.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayItem {
    pub uid: Uuid,
    pub movie_id: i64,
    pub title: String,
    pub overview: String,
    pub popularity: f64,
    /// Vote average formatted with two decimals.
    pub vote_average: String,
    pub vote_count: i64,
    pub release_date: String,
    pub genres: Vec<String>,
    pub poster: Artwork,
    pub backdrop: Artwork,
}

/// Progress of one independently tracked async activity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum OperationState {
    #[default]
    NotStarted,
    Loading,
    Success,
    Failure,
}

impl OperationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationState::NotStarted => "not_started",
            OperationState::Loading => "loading",
            OperationState::Success => "success",
            OperationState::Failure => "failure",
        }
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(&self, next: OperationState) -> bool {
        match (self, next) {
            (OperationState::Loading, OperationState::Success | OperationState::Failure) => true,
            (OperationState::Loading, _) => false,
            (_, OperationState::Loading) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for OperationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

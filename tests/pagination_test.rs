mod common;

use common::*;
use moviedeck::db::MovieStore;
use moviedeck::model::OperationState;
use moviedeck::pagination::{persist_all, PaginationController, Settings};
use std::sync::Arc;
use std::time::Duration;

/// Fill the store with `pages` full catalog pages, ids 101 upwards.
async fn seed_store(store: &dyn MovieStore, pages: u32) {
    let factory = factory();
    for page in 1..=pages {
        let records = factory
            .persisted_from_catalog(&catalog_page(page, 20).items)
            .await;
        // Completion order is arbitrary; keep the store in catalog order.
        let mut records = records;
        records.sort_by_key(|r| r.movie_id);
        assert_eq!(persist_all(store, &records).await, 20);
    }
}

#[tokio::test]
async fn empty_store_first_page_comes_from_catalog() {
    let (_td, store) = setup_store().await;
    let catalog = Arc::new(RecordingCatalog::default());
    let mut list = PaginationController::new(catalog.clone(), store.clone(), factory(), settings()).await;

    assert_eq!(list.persisted_count(), 0);
    assert_eq!(list.total_persisted_pages(), 0);
    assert_eq!(list.page(), 1);
    assert_eq!(list.state(), OperationState::NotStarted);

    list.on_appear().await;

    assert_eq!(catalog.discover_calls().await, vec![1]);
    assert_eq!(list.state(), OperationState::Success);
    let movies = list.movies();
    assert_eq!(movies.len(), 20);
    let ids: Vec<i64> = movies.iter().map(|m| m.movie_id).collect();
    assert_eq!(ids, (101..=120).collect::<Vec<_>>());
    for (i, movie) in movies.iter().enumerate() {
        assert_eq!(movie.title, format!("Movie Title {}", i));
        assert_eq!(movie.vote_average, "7.10");
        assert!(movie.poster.url().is_some());
        assert!(movie.poster.bytes().is_none());
    }

    let detail = list.detail_for(movies[0].clone());
    assert_eq!(detail.detail_state(), OperationState::NotStarted);
    assert_eq!(detail.related_state(), OperationState::NotStarted);
}

#[tokio::test]
async fn remote_page_is_persisted_in_background() {
    let (_td, store) = setup_store().await;
    let catalog = Arc::new(RecordingCatalog::default());
    let mut list = PaginationController::new(catalog.clone(), store.clone(), factory(), settings()).await;

    list.on_appear().await;
    assert_eq!(list.wait_for_persistence().await, 20);
    assert_eq!(store.count().await.unwrap(), 20);

    let stored = store.find(105).await.unwrap().unwrap();
    assert_eq!(stored.title, "Movie Title 4");
    assert_eq!(
        stored.poster.as_deref(),
        Some("https://image.tmdb.org/t/p/w500/poster105.jpg".as_bytes())
    );
    assert!(stored.genres.is_empty());

    // Nothing left to wait for.
    assert_eq!(list.wait_for_persistence().await, 0);
}

#[tokio::test]
async fn persisted_pages_are_served_without_catalog() {
    let (_td, store) = setup_store().await;
    seed_store(store.as_ref(), 2).await;

    let catalog = Arc::new(RecordingCatalog::default());
    let mut list = PaginationController::new(catalog.clone(), store.clone(), factory(), settings()).await;
    assert_eq!(list.persisted_count(), 40);
    assert_eq!(list.total_persisted_pages(), 2);

    list.on_appear().await;
    assert!(catalog.discover_calls().await.is_empty());
    assert_eq!(list.movies().len(), 20);
    assert_eq!(list.page(), 1);
    assert_eq!(list.state(), OperationState::NotStarted);
    assert!(list.movies().iter().all(|m| m.poster.bytes().is_some()));

    let mut first_page: Vec<i64> = list.movies().iter().map(|m| m.movie_id).collect();
    first_page.sort();
    assert_eq!(first_page, (101..=120).collect::<Vec<_>>());

    let last = list.movies().last().cloned().unwrap();
    list.item_appeared(&last).await;
    assert!(catalog.discover_calls().await.is_empty());
    assert_eq!(list.movies().len(), 40);
    assert_eq!(list.page(), 2);

    let last = list.movies().last().cloned().unwrap();
    list.item_appeared(&last).await;
    assert_eq!(catalog.discover_calls().await, vec![3]);
    assert_eq!(list.movies().len(), 60);
    assert_eq!(list.state(), OperationState::Success);
    list.wait_for_persistence().await;
}

#[tokio::test]
async fn partial_persisted_page_goes_remote() {
    let (_td, store) = setup_store().await;
    let factory = factory();
    let records = factory
        .persisted_from_catalog(&catalog_page(1, 15).items)
        .await;
    persist_all(store.as_ref(), &records).await;

    let catalog = Arc::new(RecordingCatalog::default());
    let mut list = PaginationController::new(catalog.clone(), store.clone(), factory, settings()).await;
    assert_eq!(list.total_persisted_pages(), 0);

    list.on_appear().await;
    assert_eq!(catalog.discover_calls().await, vec![1]);
    assert_eq!(list.movies().len(), 20);

    // Re-persisting page 1 upserts by movie id.
    list.wait_for_persistence().await;
    assert_eq!(store.count().await.unwrap(), 20);
}

#[tokio::test]
async fn failed_fetch_keeps_list_and_cursor() {
    let (_td, store) = setup_store().await;
    let catalog = Arc::new(RecordingCatalog::default());
    catalog.push_discover(Err(api_error())).await;
    let mut list = PaginationController::new(catalog.clone(), store.clone(), factory(), settings()).await;

    let mut states = list.subscribe();
    list.on_appear().await;
    assert_eq!(list.state(), OperationState::Failure);
    assert!(states.has_changed().unwrap());
    assert_eq!(*states.borrow_and_update(), OperationState::Failure);
    assert!(list.movies().is_empty());
    assert_eq!(list.page(), 1);
    assert_eq!(list.wait_for_persistence().await, 0);
    assert_eq!(store.count().await.unwrap(), 0);

    list.retry().await;
    assert_eq!(catalog.discover_calls().await, vec![1, 1]);
    assert_eq!(list.state(), OperationState::Success);
    assert_eq!(list.movies().len(), 20);
    list.wait_for_persistence().await;
}

#[tokio::test]
async fn hung_catalog_request_times_out() {
    let (_td, store) = setup_store().await;
    let settings = Settings {
        request_timeout: Duration::from_millis(50),
        ..Settings::default()
    };
    let mut list = PaginationController::new(Arc::new(HangingCatalog), store, factory(), settings).await;

    list.on_appear().await;
    assert_eq!(list.state(), OperationState::Failure);
    assert!(list.movies().is_empty());
}

#[tokio::test]
async fn only_the_last_item_advances_the_cursor() {
    let (_td, store) = setup_store().await;
    let catalog = Arc::new(RecordingCatalog::default());
    let mut list = PaginationController::new(catalog.clone(), store.clone(), factory(), settings()).await;

    list.on_appear().await;
    let middle = list.movies()[5].clone();
    list.item_appeared(&middle).await;
    assert_eq!(list.page(), 1);
    assert_eq!(catalog.discover_calls().await, vec![1]);

    // Already showing items: appearing again does not refetch.
    list.on_appear().await;
    assert_eq!(catalog.discover_calls().await, vec![1]);

    let last = list.movies().last().cloned().unwrap();
    list.item_appeared(&last).await;
    assert_eq!(list.page(), 2);
    assert_eq!(catalog.discover_calls().await, vec![1, 2]);
    let ids: Vec<i64> = list.movies()[20..].iter().map(|m| m.movie_id).collect();
    assert_eq!(ids, (121..=140).collect::<Vec<_>>());
    assert_eq!(list.wait_for_persistence().await, 40);
}

#[tokio::test]
async fn persisted_round_trip_keeps_fields() {
    let (_td, store) = setup_store().await;
    let factory = factory();
    let mut item = catalog_item(1, 0);
    item.vote_average = 6.666;
    let records = factory.persisted_from_catalog(&[item.clone()]).await;
    persist_all(store.as_ref(), &records).await;

    let stored = store.fetch(0, 20).await.unwrap();
    let display = factory.display_from_persisted(stored).await;
    assert_eq!(display.len(), 1);
    let movie = &display[0];
    assert_eq!(movie.movie_id, item.id);
    assert_eq!(movie.title, item.title);
    assert_eq!(movie.overview, item.overview);
    assert_eq!(movie.vote_count, item.vote_count);
    let vote: f64 = movie.vote_average.parse().unwrap();
    assert!((vote - item.vote_average).abs() <= 0.005);
}

#[tokio::test]
async fn failed_insert_does_not_stop_the_rest() {
    let (_td, sqlite) = setup_store().await;
    let store = FailingStore::new(sqlite.clone(), &[102, 105]);
    let mut records: Vec<_> = factory()
        .persisted_from_catalog(&catalog_page(1, 6).items)
        .await;
    records.sort_by_key(|r| r.movie_id);

    assert_eq!(persist_all(&store, &records).await, 4);
    assert_eq!(store.insert_attempts().await, (101..=106).collect::<Vec<_>>());
    assert_eq!(sqlite.count().await.unwrap(), 4);
    assert!(sqlite.find(102).await.unwrap().is_none());
    assert!(sqlite.find(103).await.unwrap().is_some());
    assert!(sqlite.find(106).await.unwrap().is_some());
}

#[tokio::test]
async fn remote_page_survives_failed_persistence() {
    let (_td, sqlite) = setup_store().await;
    let store = Arc::new(FailingStore::new(sqlite.clone(), &[101, 110, 120]));
    let catalog = Arc::new(RecordingCatalog::default());
    let mut list = PaginationController::new(catalog.clone(), store.clone(), factory(), settings()).await;

    list.on_appear().await;
    assert_eq!(list.state(), OperationState::Success);
    assert_eq!(list.movies().len(), 20);

    assert_eq!(list.wait_for_persistence().await, 17);
    assert_eq!(list.state(), OperationState::Success);
    assert_eq!(list.movies().len(), 20);
    assert_eq!(store.insert_attempts().await.len(), 20);
    assert_eq!(sqlite.count().await.unwrap(), 17);
}

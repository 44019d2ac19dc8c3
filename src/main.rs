use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use moviedeck::catalog::TmdbClient;
use moviedeck::config::{self, Config};
use moviedeck::db::{MovieStore, SqliteStore};
use moviedeck::factory::MovieFactory;
use moviedeck::images::{CachedImageSource, HttpImageSource, MemoryImageCache};
use moviedeck::model::{Artwork, OperationState};
use moviedeck::pagination::{PaginationController, Settings};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Browse the catalog page by page, caching what is fetched
    Browse {
        /// Number of pages to load
        #[arg(long, default_value = "1")]
        pages: u32,
    },
    /// Show genres and related titles for a cached movie
    Detail { movie_id: i64 },
    /// Print a sample configuration
    ExampleConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    if let Command::ExampleConfig = args.command {
        print!("{}", config::example());
        return Ok(());
    }

    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;
    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| cfg.database_url());

    let store = Arc::new(SqliteStore::open(&database_url).await?);
    let mut list = build_controller(&cfg, store.clone()).await?;

    match args.command {
        Command::Browse { pages } => browse(&mut list, pages).await,
        Command::Detail { movie_id } => detail(&list, store.as_ref(), movie_id).await,
        Command::ExampleConfig => Ok(()),
    }
}

async fn build_controller(cfg: &Config, store: Arc<SqliteStore>) -> Result<PaginationController> {
    let http = reqwest::Client::builder()
        .user_agent("moviedeck/0.1")
        .timeout(cfg.request_timeout())
        .build()?;
    let catalog = TmdbClient::from_config(http.clone(), cfg)?;
    let cache = Arc::new(MemoryImageCache::new(cfg.images.cache_capacity));
    let images = CachedImageSource::new(HttpImageSource::new(http), cache);
    let factory = MovieFactory::from_config(Arc::new(images), cfg);
    Ok(PaginationController::new(
        Arc::new(catalog),
        store,
        factory,
        Settings::from_config(cfg),
    )
    .await)
}

async fn browse(list: &mut PaginationController, pages: u32) -> Result<()> {
    info!(
        persisted = list.persisted_count(),
        persisted_pages = list.total_persisted_pages(),
        "starting browse"
    );
    list.on_appear().await;
    for _ in 1..pages {
        if list.state() == OperationState::Failure {
            break;
        }
        let Some(last) = list.movies().last().cloned() else {
            break;
        };
        list.item_appeared(&last).await;
    }
    if list.state() == OperationState::Failure {
        eprintln!("failed to load page {}", list.page());
    }

    for movie in list.movies() {
        let offline = if matches!(movie.poster, Artwork::Embedded(_)) {
            "*"
        } else {
            " "
        };
        println!(
            "{:>8} {} {:>5}  {}",
            movie.movie_id, offline, movie.vote_average, movie.title
        );
    }

    let written = list.wait_for_persistence().await;
    info!(written, "background persistence finished");
    Ok(())
}

async fn detail(list: &PaginationController, store: &dyn MovieStore, movie_id: i64) -> Result<()> {
    let record = store
        .find(movie_id)
        .await?
        .ok_or_else(|| anyhow!("movie {} is not cached; browse first", movie_id))?;
    let movie = list
        .factory()
        .display_from_persisted(vec![record])
        .await
        .pop()
        .ok_or_else(|| anyhow!("movie {} could not be converted", movie_id))?;
    let mut detail = list.detail_for(movie);
    detail.fetch_detail().await;

    let movie = detail.movie();
    println!("{} ({})", movie.title, movie.release_date);
    println!("rating: {} from {} votes", movie.vote_average, movie.vote_count);
    println!("genres: {}", movie.genres.join(", "));
    if detail.detail_state() == OperationState::Failure {
        eprintln!("failed to load movie detail");
    }
    if !detail.related().is_empty() {
        println!("related:");
        for related in detail.related() {
            println!("  {:>8}  {}", related.movie_id, related.title);
        }
    }
    Ok(())
}

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use moviedeck::config;
use moviedeck::db::{MovieStore, SqliteStore};

#[derive(Parser, Debug)]
#[command(about = "Print what the local movie store holds")]
struct Args {
    /// Path to YAML config
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// 1-based page of records to list
    #[arg(long, default_value = "1")]
    page: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let cfg = config::load(Some(&args.config))?;
    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| cfg.database_url());
    let store = SqliteStore::open(&database_url).await?;

    let summary = store.summary(cfg.app.page_size).await?;
    println!("Database: {}", database_url);
    println!("Persisted movies: {}", summary.count);
    println!(
        "Full pages: {} (page size {})",
        summary.persisted_pages, summary.page_size
    );

    let page_size = i64::from(cfg.app.page_size);
    let offset = i64::from(args.page.max(1) - 1) * page_size;
    let records = store.fetch(offset, page_size).await?;
    println!("Page {}:", args.page.max(1));
    for record in records {
        println!(
            "  {:>8}  {:>5.2}  poster={} backdrop={} genres=[{}]  {}",
            record.movie_id,
            record.vote_average,
            record.poster.as_ref().map_or(0, Vec::len),
            record.backdrop.as_ref().map_or(0, Vec::len),
            record.genres.join(", "),
            record.title
        );
    }
    Ok(())
}

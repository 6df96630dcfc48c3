use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tempfile::tempdir;

use sxodim_scraper::config::Config;
use sxodim_scraper::domain::Category;
use sxodim_scraper::error::{Result as ScraperResult, ScraperError};
use sxodim_scraper::fetch::PageFetcher;
use sxodim_scraper::pipeline::{FetchOptions, Pipeline};
use sxodim_scraper::store::EventStore;

/// Serves canned pages instead of hitting sxodim.com.
struct FixtureFetcher {
    pages: HashMap<String, String>,
}

#[async_trait]
impl PageFetcher for FixtureFetcher {
    async fn get(&self, url: &str) -> ScraperResult<String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| ScraperError::Parse(format!("404 for {url}")))
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.source.listing_slugs = vec!["kontserty".to_string(), "vystavki".to_string()];
    config
}

fn fixture_pages() -> HashMap<String, String> {
    let mut pages = HashMap::new();
    pages.insert(
        "https://sxodim.com/almaty/events/kontserty".to_string(),
        r#"
        <html><body>
          <a href="/almaty/event/koncert-one">Концерт</a>
          <a href="/almaty/event/koncert-one">Концерт (повтор)</a>
          <a href="/almaty/event/broken-page">Сломанная страница</a>
          <a href="/almaty/events/vystavki">Другая категория</a>
        </body></html>
        "#
        .to_string(),
    );
    pages.insert(
        "https://sxodim.com/almaty/events/vystavki".to_string(),
        r#"
        <html><body>
          <a href="/almaty/event/vystavka-art">Выставка</a>
          <a href="/almaty/event/koncert-one">Концерт из другой категории</a>
        </body></html>
        "#
        .to_string(),
    );
    pages.insert(
        "https://sxodim.com/almaty/event/koncert-one".to_string(),
        r#"
        <html>
          <head>
            <meta property="og:image" content="https://sxodim.com/uploads/posts/one.jpg">
            <meta property="og:description" content="Большой концерт с симфоническим оркестром.">
          </head>
          <body>
            <h1>Симфонический оркестр</h1>
            <p>25 декабря 2026, начало в 19:30</p>
            <p>от 8 000 ₸</p>
            <p>Адрес: пр. Достык 40, Дворец Республики
            </p>
          </body>
        </html>
        "#
        .to_string(),
    );
    pages.insert(
        "https://sxodim.com/almaty/event/vystavka-art".to_string(),
        "<html><body><h1>Выставка современного искусства</h1></body></html>".to_string(),
    );
    // broken-page has no fixture on purpose: its fetch fails.
    pages
}

fn pipeline() -> Pipeline {
    Pipeline::new(
        Box::new(FixtureFetcher {
            pages: fixture_pages(),
        }),
        test_config(),
    )
    .unwrap()
}

fn options() -> FetchOptions {
    FetchOptions {
        limit: 0,
        dry_run: false,
        delay: Duration::from_millis(0),
    }
}

#[tokio::test]
async fn full_run_upserts_events_and_translations() -> Result<()> {
    let dir = tempdir()?;
    let mut store = EventStore::open(dir.path().join("events.db"))?;

    let summary = pipeline().run(&mut store, &options()).await?;
    assert_eq!(summary.listings_scraped, 2);
    assert_eq!(summary.links_found, 3);
    assert_eq!(summary.created, 2);
    assert_eq!(summary.updated, 0);
    assert_eq!(summary.errors, 1);

    assert_eq!(store.count_events()?, 2);
    let events = store.list_events(0)?;
    let concert = events
        .iter()
        .find(|e| e.link.ends_with("koncert-one"))
        .unwrap();
    assert_eq!(concert.artist, "Симфонический оркестр");
    assert_eq!(concert.cost, 8_000);
    // The concert listing saw the link first, so its category wins.
    assert_eq!(concert.category, Category::Concert);

    let exhibition = events
        .iter()
        .find(|e| e.link.ends_with("vystavka-art"))
        .unwrap();
    assert_eq!(exhibition.category, Category::Culture);
    assert_eq!(exhibition.address, "Алматы");

    let translations = store.translations_for(concert.id)?;
    assert_eq!(translations.len(), 3);
    assert!(translations
        .iter()
        .all(|t| t.name == "Симфонический оркестр"));
    Ok(())
}

#[tokio::test]
async fn listings_without_event_links_still_succeed() -> Result<()> {
    let dir = tempdir()?;
    let mut store = EventStore::open(dir.path().join("events.db"))?;

    let mut pages = HashMap::new();
    pages.insert(
        "https://sxodim.com/almaty/events/kontserty".to_string(),
        r#"<html><body><a href="/almaty/places/arbat">Места</a></body></html>"#.to_string(),
    );
    pages.insert(
        "https://sxodim.com/almaty/events/vystavki".to_string(),
        "<html><body>Сегодня мероприятий нет</body></html>".to_string(),
    );
    let pipeline = Pipeline::new(Box::new(FixtureFetcher { pages }), test_config())?;

    let summary = pipeline.run(&mut store, &options()).await?;
    assert_eq!(summary.listings_scraped, 2);
    assert_eq!(summary.links_found, 0);
    assert_eq!(summary.created, 0);
    assert_eq!(summary.updated, 0);
    assert_eq!(summary.errors, 0);
    assert_eq!(store.count_events()?, 0);
    Ok(())
}

#[tokio::test]
async fn rerun_is_idempotent() -> Result<()> {
    let dir = tempdir()?;
    let mut store = EventStore::open(dir.path().join("events.db"))?;

    pipeline().run(&mut store, &options()).await?;
    let summary = pipeline().run(&mut store, &options()).await?;

    assert_eq!(summary.created, 0);
    assert_eq!(summary.updated, 2);
    assert_eq!(summary.errors, 1);
    assert_eq!(store.count_events()?, 2);

    let concert_id = store
        .event_id_by_link("https://sxodim.com/almaty/event/koncert-one")?
        .unwrap();
    assert_eq!(store.translations_for(concert_id)?.len(), 3);
    Ok(())
}

#[tokio::test]
async fn dry_run_writes_nothing() -> Result<()> {
    let dir = tempdir()?;
    let mut store = EventStore::open(dir.path().join("events.db"))?;

    let mut opts = options();
    opts.dry_run = true;
    let summary = pipeline().run(&mut store, &opts).await?;

    assert_eq!(summary.links_found, 3);
    assert_eq!(summary.created, 0);
    assert_eq!(summary.updated, 0);
    assert_eq!(store.count_events()?, 0);
    Ok(())
}

#[tokio::test]
async fn limit_caps_processed_links() -> Result<()> {
    let dir = tempdir()?;
    let mut store = EventStore::open(dir.path().join("events.db"))?;

    let mut opts = options();
    opts.limit = 1;
    let summary = pipeline().run(&mut store, &opts).await?;

    assert_eq!(summary.links_found, 1);
    assert_eq!(summary.created, 1);
    assert_eq!(store.count_events()?, 1);
    Ok(())
}

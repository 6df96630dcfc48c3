use crate::config::Config;
use crate::domain::{Category, ScrapedEvent};
use crate::error::{Result, ScraperError};
use crate::extract::{DetailParser, ListingParser};
use crate::fetch::PageFetcher;
use crate::store::{EventStore, UpsertOutcome};
use serde::Serialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Cap on detail pages processed; 0 means no limit.
    pub limit: usize,
    /// Extract and report without writing to the database.
    pub dry_run: bool,
    /// Pause between consecutive HTTP requests.
    pub delay: Duration,
}

#[derive(Debug, Default, Serialize)]
pub struct FetchSummary {
    pub listings_scraped: usize,
    pub links_found: usize,
    pub created: usize,
    pub updated: usize,
    pub errors: usize,
}

/// The scraping pipeline: listing pages to detail links to extracted
/// events to upserted rows. Per-item failures are logged and counted;
/// only setup problems abort the run.
pub struct Pipeline {
    fetcher: Box<dyn PageFetcher>,
    listing: ListingParser,
    detail: DetailParser,
    config: Config,
}

impl Pipeline {
    pub fn new(fetcher: Box<dyn PageFetcher>, config: Config) -> Result<Self> {
        let listing = ListingParser::new(&config.source.base_url, &config.source.city_slug)?;
        let detail = DetailParser::new(&config.source.base_url);
        Ok(Self {
            fetcher,
            listing,
            detail,
            config,
        })
    }

    pub async fn run(&self, store: &mut EventStore, options: &FetchOptions) -> Result<FetchSummary> {
        let mut summary = FetchSummary::default();

        // Step 1: collect detail links from every listing. The first listing
        // that mentions an event decides its category.
        let mut links: Vec<(String, Category)> = Vec::new();
        let mut seen = HashSet::new();
        for slug in &self.config.source.listing_slugs {
            let listing_url = self.config.listing_url(slug);
            info!(url = %listing_url, "Scraping listing");
            match self.fetcher.get(&listing_url).await {
                Ok(html) => {
                    let found = self.listing.collect_event_links(&html);
                    info!(count = found.len(), url = %listing_url, "Found event links");
                    summary.listings_scraped += 1;
                    let category = Category::from_slug(slug);
                    for link in found {
                        if seen.insert(link.clone()) {
                            links.push((link, category));
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, url = %listing_url, "Failed to scrape listing");
                }
            }
            tokio::time::sleep(options.delay).await;
        }

        if options.limit > 0 {
            links.truncate(options.limit);
        }
        summary.links_found = links.len();
        info!(total = links.len(), "Unique event links to process");
        if links.is_empty() {
            warn!("No event links found - the site markup may have changed");
        }

        // Step 2: scrape each detail page and reconcile into the store.
        for (link, category) in &links {
            match self.scrape_event(link, *category).await {
                Ok(event) => {
                    if options.dry_run {
                        println!(
                            "  [DRY RUN] {} | {} | {} {}",
                            event.artist, event.date, event.cost, event.currency
                        );
                    } else {
                        match store.save_event(&event) {
                            Ok(UpsertOutcome::Created) => {
                                summary.created += 1;
                                info!(title = %event.artist, "Created event");
                            }
                            Ok(UpsertOutcome::Updated) => {
                                summary.updated += 1;
                                info!(title = %event.artist, "Updated event");
                            }
                            Err(e) => {
                                summary.errors += 1;
                                error!(error = %e, url = %link, "Failed to save event");
                            }
                        }
                    }
                }
                Err(e) => {
                    summary.errors += 1;
                    error!(error = %e, url = %link, "Failed to scrape event");
                }
            }
            tokio::time::sleep(options.delay).await;
        }

        Ok(summary)
    }

    async fn scrape_event(&self, url: &str, category: Category) -> Result<ScrapedEvent> {
        let html = self.fetcher.get(url).await?;
        self.detail
            .extract(&html, url, category)
            .ok_or_else(|| ScraperError::Parse(format!("No title found for {url}")))
    }
}

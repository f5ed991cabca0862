use chrono::{DateTime, Local};
use tracing::{error, info, warn};

use crate::error::ScrapeError;
use crate::extract::{extract, MovieRecord};
use crate::scraper::{fetch_detail, fetch_listing, ListingReference, PageSource};

/// A listing entry that was skipped.
#[derive(Debug)]
pub struct ItemFailure {
    pub rank: usize,
    pub url: String,
    pub error: ScrapeError,
}

#[derive(Debug)]
pub struct ScrapeReport {
    /// Extracted movies in listing rank order.
    pub records: Vec<MovieRecord>,
    pub failures: Vec<ItemFailure>,
    /// Listing entries considered after applying the limit.
    pub attempted: usize,
    /// Set when the listing itself could not be read; nothing else ran.
    pub listing_error: Option<ScrapeError>,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

impl ScrapeReport {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Scrape the listing at `url` and every detail page it references, in order.
///
/// A failed detail page is logged and skipped; a failed listing yields an
/// empty report.
pub fn run(source: &dyn PageSource, url: &str, limit: Option<usize>) -> ScrapeReport {
    let started_at = Local::now();

    let references = match fetch_listing(source, url, limit) {
        Ok(references) => references,
        Err(e) => {
            error!(%url, error = %e, "Error fetching or parsing main page data");
            return ScrapeReport {
                records: Vec::new(),
                failures: Vec::new(),
                attempted: 0,
                listing_error: Some(e),
                started_at,
                finished_at: Local::now(),
            };
        }
    };
    info!(count = references.len(), "listing fetched");

    let attempted = references.len();
    let (records, failures) = scrape_items(source, references);

    info!(found = records.len(), skipped = failures.len(), "scrape finished");
    ScrapeReport {
        records,
        failures,
        attempted,
        listing_error: None,
        started_at,
        finished_at: Local::now(),
    }
}

fn scrape_items(
    source: &dyn PageSource,
    references: Vec<ListingReference>,
) -> (Vec<MovieRecord>, Vec<ItemFailure>) {
    let mut records = Vec::with_capacity(references.len());
    let mut failures = Vec::new();

    for reference in references {
        match fetch_detail(source, &reference.url) {
            Ok(raw) => {
                let record = extract(raw);
                info!(rank = reference.rank, name = %record.name, "extracted");
                records.push(record);
            }
            Err(e) => {
                warn!(
                    rank = reference.rank,
                    url = %reference.url,
                    error = %e,
                    "Error fetching or parsing data for movie"
                );
                failures.push(ItemFailure { rank: reference.rank, url: reference.url, error: e });
            }
        }
    }

    (records, failures)
}

use reqwest::blocking::Client;
use reqwest::Url;
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::{browser_headers, REQUEST_TIMEOUT};
use crate::error::ScrapeError;
use crate::extract::RawItemRecord;

/// Where pages come from. The pipeline only ever asks for a page body by URL.
pub trait PageSource {
    fn fetch_page(&self, url: &str) -> Result<String, ScrapeError>;
}

/// Blocking HTTP client presenting itself as an ordinary browser.
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new() -> reqwest::Result<Self> {
        let client = Client::builder()
            .default_headers(browser_headers())
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

impl PageSource for HttpSource {
    fn fetch_page(&self, url: &str) -> Result<String, ScrapeError> {
        debug!(%url, "GET");
        let fetch_err = |source| ScrapeError::Fetch { url: url.to_string(), source };

        let response = self.client.get(url).send().map_err(fetch_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status { url: url.to_string(), status });
        }
        response.text().map_err(fetch_err)
    }
}

/// One entry of the ranked listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingReference {
    pub url: String,
    pub rank: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemList {
    item_list_element: Option<Vec<ListItem>>,
}

#[derive(Debug, Deserialize)]
struct ListItem {
    position: Option<Value>,
    item: Option<ListItemTarget>,
    url: Option<String>,
}

/// `item` may be the linked thing itself or just its URL.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListItemTarget {
    Url(String),
    Thing { url: Option<String> },
}

impl ListItemTarget {
    fn into_url(self) -> Option<String> {
        match self {
            ListItemTarget::Url(url) => Some(url),
            ListItemTarget::Thing { url } => url,
        }
    }
}

/// Pull the first `<script type="application/ld+json">` payload out of a page.
pub fn structured_data(url: &str, html: &str) -> Result<Value, ScrapeError> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#)
        .expect("structured data selector parses");

    let script = document
        .select(&selector)
        .next()
        .ok_or_else(|| ScrapeError::MissingStructuredData(url.to_string()))?;
    let text = script.text().collect::<String>();

    serde_json::from_str(&text).map_err(|source| ScrapeError::Json { url: url.to_string(), source })
}

/// Fetch the listing page and return its entries in rank order, keeping at most `limit`.
pub fn fetch_listing(
    source: &dyn PageSource,
    url: &str,
    limit: Option<usize>,
) -> Result<Vec<ListingReference>, ScrapeError> {
    let html = source.fetch_page(url)?;
    let data = structured_data(url, &html)?;
    let list: ItemList = serde_json::from_value(data)
        .map_err(|source| ScrapeError::Json { url: url.to_string(), source })?;

    let listing_err = |reason: String| ScrapeError::Listing { url: url.to_string(), reason };
    let entries = list
        .item_list_element
        .ok_or_else(|| listing_err("no itemListElement".to_string()))?;

    let take = limit.unwrap_or(entries.len());
    let base = Url::parse(url).ok();

    entries
        .into_iter()
        .take(take)
        .enumerate()
        .map(|(index, entry)| -> Result<ListingReference, ScrapeError> {
            let href = entry
                .item
                .and_then(ListItemTarget::into_url)
                .or(entry.url)
                .ok_or_else(|| listing_err(format!("entry {} has no url", index + 1)))?;
            let rank = entry
                .position
                .as_ref()
                .and_then(position_number)
                .unwrap_or(index + 1);
            Ok(ListingReference { url: resolve(base.as_ref(), &href), rank })
        })
        .collect()
}

/// Fetch one detail page and decode its structured data.
pub fn fetch_detail(source: &dyn PageSource, url: &str) -> Result<RawItemRecord, ScrapeError> {
    let html = source.fetch_page(url)?;
    let data = structured_data(url, &html)?;
    serde_json::from_value(data).map_err(|source| ScrapeError::Json { url: url.to_string(), source })
}

fn position_number(position: &Value) -> Option<usize> {
    match position {
        Value::Number(n) => n.as_u64().map(|n| n as usize),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn resolve(base: Option<&Url>, href: &str) -> String {
    base.and_then(|base| base.join(href).ok())
        .map(String::from)
        .unwrap_or_else(|| href.to_string())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// In-memory pages keyed by URL; records every request in order.
    #[derive(Default)]
    pub(crate) struct FakeSource {
        pages: HashMap<String, String>,
        pub(crate) requests: RefCell<Vec<String>>,
    }

    impl FakeSource {
        pub(crate) fn with_page(mut self, url: &str, body: String) -> Self {
            self.pages.insert(url.to_string(), body);
            self
        }
    }

    impl PageSource for FakeSource {
        fn fetch_page(&self, url: &str) -> Result<String, ScrapeError> {
            self.requests.borrow_mut().push(url.to_string());
            self.pages.get(url).cloned().ok_or_else(|| ScrapeError::Status {
                url: url.to_string(),
                status: reqwest::StatusCode::NOT_FOUND,
            })
        }
    }

    pub(crate) fn page_with_ld_json(payload: &Value) -> String {
        format!(
            r#"<html><head><title>t</title><script type="application/ld+json">{payload}</script></head><body></body></html>"#
        )
    }

    pub(crate) fn listing_page(urls: &[String]) -> String {
        let items: Vec<Value> = urls
            .iter()
            .map(|url| serde_json::json!({ "@type": "ListItem", "item": { "@type": "Movie", "url": url } }))
            .collect();
        page_with_ld_json(&serde_json::json!({ "@type": "ItemList", "itemListElement": items }))
    }

    #[test]
    fn finds_the_structured_data_block() {
        let html = page_with_ld_json(&serde_json::json!({ "@type": "Movie", "name": "Alien" }));
        let data = structured_data("https://example.com/a", &html).unwrap();
        assert_eq!(data["name"], "Alien");
    }

    #[test]
    fn page_without_block_is_a_parse_error() {
        let err = structured_data("https://example.com/a", "<html><body><p>hi</p></body></html>").unwrap_err();
        assert!(matches!(err, ScrapeError::MissingStructuredData(_)));
        assert!(err.is_parse());
    }

    #[test]
    fn malformed_block_is_a_parse_error() {
        let html = r#"<script type="application/ld+json">{"name": </script>"#;
        let err = structured_data("https://example.com/a", html).unwrap_err();
        assert!(matches!(err, ScrapeError::Json { .. }));
    }

    #[test]
    fn listing_keeps_rank_order_and_limit() {
        let urls: Vec<String> = (1..=5).map(|i| format!("https://example.com/title/tt{i}/")).collect();
        let source = FakeSource::default().with_page("https://example.com/chart/", listing_page(&urls));

        let refs = fetch_listing(&source, "https://example.com/chart/", Some(3)).unwrap();
        assert_eq!(refs.len(), 3);
        assert_eq!(refs[0], ListingReference { url: urls[0].clone(), rank: 1 });
        assert_eq!(refs[2].url, urls[2]);

        let all = fetch_listing(&source, "https://example.com/chart/", None).unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(all[4].rank, 5);
    }

    #[test]
    fn relative_links_resolve_against_the_listing() {
        let payload = serde_json::json!({
            "itemListElement": [{ "position": 7, "url": "/title/tt0111161/" }]
        });
        let source = FakeSource::default().with_page("https://www.imdb.com/chart/top/", page_with_ld_json(&payload));

        let refs = fetch_listing(&source, "https://www.imdb.com/chart/top/", None).unwrap();
        assert_eq!(
            refs,
            vec![ListingReference { url: "https://www.imdb.com/title/tt0111161/".into(), rank: 7 }]
        );
    }

    #[test]
    fn item_may_be_given_as_a_bare_url() {
        let payload = serde_json::json!({
            "itemListElement": [
                { "position": 1, "item": "https://example.com/title/tt1/" },
                { "position": 2, "item": { "url": "https://example.com/title/tt2/" } }
            ]
        });
        let source = FakeSource::default().with_page("https://example.com/chart/", page_with_ld_json(&payload));

        let refs = fetch_listing(&source, "https://example.com/chart/", None).unwrap();
        let urls: Vec<&str> = refs.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["https://example.com/title/tt1/", "https://example.com/title/tt2/"]);
    }

    #[test]
    fn listing_without_items_is_rejected() {
        let source = FakeSource::default()
            .with_page("https://example.com/chart/", page_with_ld_json(&serde_json::json!({ "@type": "WebPage" })));
        let err = fetch_listing(&source, "https://example.com/chart/", None).unwrap_err();
        assert!(matches!(err, ScrapeError::Listing { .. }));
    }

    #[test]
    fn unreachable_listing_is_a_fetch_error() {
        let err = fetch_listing(&FakeSource::default(), "https://example.com/chart/", None).unwrap_err();
        assert!(err.is_fetch());
    }

    #[test]
    fn detail_page_decodes_into_a_raw_record() {
        let payload = serde_json::json!({ "@type": "Movie", "name": "Heat", "datePublished": "1995-12-15" });
        let source = FakeSource::default().with_page("https://example.com/title/tt1/", page_with_ld_json(&payload));

        let raw = fetch_detail(&source, "https://example.com/title/tt1/").unwrap();
        assert_eq!(raw.name.as_deref(), Some("Heat"));
        assert_eq!(raw.date_published.as_deref(), Some("1995-12-15"));
    }
}

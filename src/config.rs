use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, CONNECTION,
    UPGRADE_INSECURE_REQUESTS, USER_AGENT,
};

/// IMDb's Top 250 chart.
pub const DEFAULT_LISTING_URL: &str = "https://www.imdb.com/chart/top/";
pub const DEFAULT_OUTPUT: &str = "movie_library.csv";
pub const DASHBOARD_LOG: &str = "movie_master.log";

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 6.0) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/70.0.3538.110 Safari/537.36";

/// Headers sent with every request so the site serves the same page a browser gets.
pub fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US;q=0.5,en;q=0.3"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers
}

#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub listing_url: String,
    /// `None` scrapes every entry on the listing page.
    pub limit: Option<usize>,
    pub output: PathBuf,
}

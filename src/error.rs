use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: StatusCode },
    #[error("no structured data block found at {0}")]
    MissingStructuredData(String),
    #[error("malformed structured data at {url}: {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("unusable listing at {url}: {reason}")]
    Listing { url: String, reason: String },
}

impl ScrapeError {
    /// Transport-level failure: network error or non-success status.
    pub fn is_fetch(&self) -> bool {
        matches!(self, ScrapeError::Fetch { .. } | ScrapeError::Status { .. })
    }

    /// The page arrived but its structured data could not be used.
    pub fn is_parse(&self) -> bool {
        !self.is_fetch()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_count_as_fetch_failures() {
        let err = ScrapeError::Status {
            url: "https://example.com/chart".into(),
            status: StatusCode::FORBIDDEN,
        };
        assert!(err.is_fetch());
        assert!(err.to_string().contains("403"));
    }

    #[test]
    fn missing_block_is_a_parse_failure() {
        let err = ScrapeError::MissingStructuredData("https://example.com/title/tt1".into());
        assert!(err.is_parse());
        assert!(!err.is_fetch());
    }
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// Connection failure, or a body that did not decode.
    #[error("catalog request failed: {0}")]
    Request(reqwest::Error),

    #[error("catalog returned status {0}")]
    Status(reqwest::StatusCode),
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        // The request URL carries the API key
        Self::Request(e.without_url())
    }
}

use thiserror::Error;

/// Page-level failures. None of these abort a run; the page is recorded as
/// failed and skipped.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("no classifications extracted from {url}")]
    NoClassifications { url: String },

    #[error("fallback parser failed: {0}")]
    Fallback(String),
}

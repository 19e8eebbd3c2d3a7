use thiserror::Error;

/// Failure to retrieve or prepare a single page.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error fetching {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("timed out after {timeout_secs}s waiting for {url}")]
    Timeout { url: String, timeout_secs: u64 },

    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("page not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid CSS selector \"{selector}\": {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// The run was cancelled while waiting to send a request.
    #[error("run cancelled before the request was sent")]
    Cancelled,
}

/// A variants payload that was found but could not be read as a JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed variants payload: {reason}")]
pub struct MalformedPayload {
    pub reason: String,
}

/// Run-level failure. Everything below this level is absorbed into
/// per-product diagnostics.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("first listing page {url} could not be fetched: {source}")]
    FirstPageUnavailable {
        url: String,
        #[source]
        source: ScraperError,
    },

    #[error("pipeline setup failed: {0}")]
    Setup(#[from] ScraperError),
}

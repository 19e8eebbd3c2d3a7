//! Page retrieval behind the [`PageSource`] seam.
//!
//! The pipeline only ever talks to a `PageSource`; [`HttpPageSource`] is the
//! shipped implementation. A browser-backed source can implement the same
//! trait and release its session in [`PageSource::close`].

mod http;

use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};

use crate::error::ScraperError;

pub use http::HttpPageSource;

/// Markup returned for a URL.
#[derive(Debug, Clone)]
pub struct PageContent {
    /// Final URL after redirects. Relative links on the page resolve against it.
    pub url: String,
    pub body: String,
    /// Whether the ready selector matched the delivered document.
    pub ready: bool,
}

/// The "page is rendered" condition a fetch waits for, bounded by `timeout`.
#[derive(Debug, Clone)]
pub struct ReadyCondition {
    selector_text: String,
    selector: Selector,
    timeout: Duration,
}

impl ReadyCondition {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidSelector`] if `selector` is not valid CSS.
    pub fn new(selector: &str, timeout: Duration) -> Result<Self, ScraperError> {
        Ok(Self {
            selector_text: selector.to_owned(),
            selector: compile_selector(selector)?,
            timeout,
        })
    }

    #[must_use]
    pub fn selector(&self) -> &str {
        &self.selector_text
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns `true` when at least one element in `html` matches the selector.
    #[must_use]
    pub fn is_met_by(&self, html: &str) -> bool {
        Html::parse_document(html)
            .select(&self.selector)
            .next()
            .is_some()
    }
}

/// Something that can turn a URL into page markup.
///
/// Implementations must not retry on their own; retry policy belongs to the
/// caller.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches `url`, waiting at most `ready.timeout()` for the page to satisfy
    /// the ready condition.
    ///
    /// # Errors
    ///
    /// Returns a [`ScraperError`] carrying the URL for network failures,
    /// timeouts and non-2xx statuses.
    async fn fetch(&self, url: &str, ready: &ReadyCondition) -> Result<PageContent, ScraperError>;

    /// Releases any session held by the source. Called exactly once by the
    /// pipeline when a run ends, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns a [`ScraperError`] if the session could not be shut down cleanly.
    async fn close(&mut self) -> Result<(), ScraperError> {
        Ok(())
    }
}

/// Parses a CSS selector, mapping parse failures into [`ScraperError`].
pub(crate) fn compile_selector(selector: &str) -> Result<Selector, ScraperError> {
    Selector::parse(selector).map_err(|e| ScraperError::InvalidSelector {
        selector: selector.to_owned(),
        reason: e.to_string(),
    })
}

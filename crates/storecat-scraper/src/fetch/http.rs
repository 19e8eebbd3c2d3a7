//! Plain HTTP implementation of [`PageSource`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use storecat_core::AppConfig;

use super::{PageContent, PageSource, ReadyCondition};
use crate::error::ScraperError;

/// Fetches server-rendered storefront HTML with a browser-like request profile.
///
/// The storefront renders listing and detail markup on the server, so the
/// ready condition is evaluated once on the delivered document; the wait is
/// bounded by wrapping the whole request in the condition's timeout.
pub struct HttpPageSource {
    client: Client,
}

impl HttpPageSource {
    /// Creates a source sending `user_agent` on every request.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::ClientBuild`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(user_agent: &str) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()
            .map_err(ScraperError::ClientBuild)?;
        Ok(Self { client })
    }

    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, ScraperError> {
        Self::new(&config.user_agent)
    }

    /// Issues the GET and maps non-2xx statuses to typed errors.
    ///
    /// Returns the final URL (after redirects) together with the body. The
    /// page's own origin goes out as `Referer` so requests read as in-site
    /// navigation.
    async fn get_html(&self, url: &str) -> Result<(String, String), ScraperError> {
        let target = reqwest::Url::parse(url).map_err(|e| ScraperError::InvalidUrl {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;
        let referer = target.origin().ascii_serialization();
        let response = self
            .client
            .get(target.clone())
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "es-AR,es;q=0.9,en;q=0.8")
            .header(reqwest::header::REFERER, &referer)
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|source| ScraperError::Http {
                url: url.to_owned(),
                source,
            })?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(ScraperError::RateLimited {
                domain: target.host_str().unwrap_or(url).to_owned(),
                retry_after_secs,
            });
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ScraperError::NotFound {
                url: url.to_owned(),
            });
        }

        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        let final_url = response.url().to_string();
        let body = response.text().await.map_err(|source| ScraperError::Http {
            url: url.to_owned(),
            source,
        })?;
        Ok((final_url, body))
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch(&self, url: &str, ready: &ReadyCondition) -> Result<PageContent, ScraperError> {
        let timeout = ready.timeout();
        let (final_url, body) = tokio::time::timeout(timeout, self.get_html(url))
            .await
            .map_err(|_| ScraperError::Timeout {
                url: url.to_owned(),
                timeout_secs: timeout.as_secs(),
            })??;

        let is_ready = ready.is_met_by(&body);
        if !is_ready {
            tracing::debug!(
                url,
                selector = ready.selector(),
                "ready selector absent from delivered page"
            );
        }

        Ok(PageContent {
            url: final_url,
            body,
            ready: is_ready,
        })
    }
}

//! Listing-page walk with link deduplication.
//!
//! The storefront exposes no total page count. Listing pages are requested as
//! `?page=1`, `?page=2`, … and the walk ends on the first page that fails or
//! has no product links at all:
//!
//! ```text
//! Fetching(1) --links--> Fetching(2) --links--> ... Fetching(k)
//!      |                      |                      |
//!      +--- failure / empty --+----------------------+--> Terminated
//! ```
//!
//! A page made only of already-seen links still advances the walk, since the
//! same product can be listed on several pages. [`ListingPaginator::with_repeat_guard`]
//! turns such a page into a stop instead.
//!
//! The paginator never issues requests itself. The caller asks for the next
//! request, fetches it, and reports the result back, so request counting and
//! pacing stay with the caller.

use std::collections::HashSet;

use reqwest::Url;
use storecat_core::ProductUrl;

use crate::error::ScraperError;

/// Why the walk stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The page loaded but contained no product links at all.
    EmptyPage { page: u32 },
    /// The page loaded but every link had already been seen (repeat guard only).
    NoNewLinks { page: u32 },
    /// The page could not be fetched.
    FetchFailed { page: u32 },
    /// The configured page limit was reached after this page.
    PageLimit { page: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginatorState {
    Fetching(u32),
    Terminated(Termination),
}

/// The next listing page to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRequest {
    pub page: u32,
    pub url: String,
}

#[derive(Debug)]
pub struct ListingPaginator {
    base_url: Url,
    page_param: String,
    max_pages: Option<u32>,
    stop_on_repeat: bool,
    state: PaginatorState,
    seen: HashSet<ProductUrl>,
}

impl ListingPaginator {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] if `base_url` is not an absolute
    /// http(s) URL.
    pub fn new(
        base_url: &str,
        page_param: &str,
        max_pages: Option<u32>,
    ) -> Result<Self, ScraperError> {
        let parsed = Url::parse(base_url).map_err(|e| ScraperError::InvalidUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ScraperError::InvalidUrl {
                url: base_url.to_owned(),
                reason: format!("unsupported scheme \"{}\"", parsed.scheme()),
            });
        }
        Ok(Self {
            base_url: parsed,
            page_param: page_param.to_owned(),
            max_pages,
            stop_on_repeat: false,
            state: PaginatorState::Fetching(1),
            seen: HashSet::new(),
        })
    }

    /// Ends the walk on a page whose links were all seen before.
    #[must_use]
    pub fn with_repeat_guard(mut self, enabled: bool) -> Self {
        self.stop_on_repeat = enabled;
        self
    }

    #[must_use]
    pub fn state(&self) -> PaginatorState {
        self.state
    }

    /// Returns why the walk ended, or `None` while it is still running.
    #[must_use]
    pub fn termination(&self) -> Option<Termination> {
        match self.state {
            PaginatorState::Terminated(reason) => Some(reason),
            PaginatorState::Fetching(_) => None,
        }
    }

    /// Number of distinct product links emitted so far.
    #[must_use]
    pub fn discovered(&self) -> usize {
        self.seen.len()
    }

    /// The listing page to fetch next, or `None` once terminated.
    #[must_use]
    pub fn next_request(&self) -> Option<ListingRequest> {
        match self.state {
            PaginatorState::Fetching(page) => Some(ListingRequest {
                page,
                url: self.page_url(page),
            }),
            PaginatorState::Terminated(_) => None,
        }
    }

    /// Records a successfully fetched page and returns the links not seen
    /// before, in page order.
    pub fn record_links(&mut self, page: u32, links: Vec<ProductUrl>) -> Vec<ProductUrl> {
        self.record_page(page, links, |link| link)
    }

    /// Generic form of [`Self::record_links`] for items that carry a link,
    /// such as listing cards. Items whose link was already seen are dropped.
    pub fn record_page<T, F>(&mut self, page: u32, items: Vec<T>, link_of: F) -> Vec<T>
    where
        F: Fn(&T) -> &ProductUrl,
    {
        if self.state != PaginatorState::Fetching(page) {
            tracing::warn!(
                page,
                state = ?self.state,
                "ignoring result for a page that is not being fetched"
            );
            return Vec::new();
        }

        let found = items.len();
        let fresh: Vec<T> = items
            .into_iter()
            .filter(|item| self.seen.insert(link_of(item).clone()))
            .collect();

        self.state = if found == 0 {
            PaginatorState::Terminated(Termination::EmptyPage { page })
        } else if fresh.is_empty() && self.stop_on_repeat {
            PaginatorState::Terminated(Termination::NoNewLinks { page })
        } else if self.max_pages.is_some_and(|max| page >= max) {
            PaginatorState::Terminated(Termination::PageLimit { page })
        } else {
            PaginatorState::Fetching(page + 1)
        };

        fresh
    }

    /// Records a failed fetch for `page`, which ends the walk.
    pub fn record_failure(&mut self, page: u32) {
        if self.state == PaginatorState::Fetching(page) {
            self.state = PaginatorState::Terminated(Termination::FetchFailed { page });
        }
    }

    /// Builds the listing URL for `page`, replacing any existing page parameter.
    fn page_url(&self, page: u32) -> String {
        let mut url = self.base_url.clone();
        let kept: Vec<(String, String)> = self
            .base_url
            .query_pairs()
            .filter(|(key, _)| key != self.page_param.as_str())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        url.set_query(None);
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &kept {
                pairs.append_pair(key, value);
            }
            pairs.append_pair(&self.page_param, &page.to_string());
        }
        url.to_string()
    }
}

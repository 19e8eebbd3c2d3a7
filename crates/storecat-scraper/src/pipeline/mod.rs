//! Full-catalog traversal: listing pages, then each new product's detail page.
//!
//! The run is strictly sequential. Every fetch after the first waits on the
//! [`Pacer`], transient failures are retried with backoff, and everything that
//! goes wrong below the first listing page becomes a [`Diagnostic`] instead of
//! an error.

mod diagnostics;

use std::time::Duration;

use storecat_core::{AppConfig, ProductCard, ProductUrl, VariantRecord};

use crate::cancel::CancelFlag;
use crate::detail::NameExtractor;
use crate::error::{CatalogError, ScraperError};
use crate::fetch::{PageContent, PageSource, ReadyCondition};
use crate::listing::{CardExtractor, LinkExtractor};
use crate::locate::locate_variants;
use crate::normalize::normalize_variants;
use crate::pacing::Pacer;
use crate::pagination::{ListingPaginator, ListingRequest};
use crate::rate_limit::{retry_with_backoff, RetryPolicy};

pub use diagnostics::{CatalogRun, Diagnostic, DiagnosticKind, RunSummary};

pub type CatalogResult = CatalogRun<VariantRecord>;
pub type CardResult = CatalogRun<ProductCard>;

/// Compiled selectors and policy knobs for one run.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub base_url: String,
    pub page_param: String,
    pub max_listing_pages: Option<u32>,
    pub stop_on_repeated_page: bool,
    pub links: LinkExtractor,
    pub cards: CardExtractor,
    pub names: NameExtractor,
    pub listing_ready: ReadyCondition,
    pub detail_ready: ReadyCondition,
    pub variants_marker: String,
    pub inter_request_delay_ms: u64,
    pub request_jitter_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
    pub max_backoff_secs: u64,
}

impl PipelineSettings {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidSelector`] for the first configured
    /// selector that is not valid CSS.
    pub fn from_config(config: &AppConfig) -> Result<Self, ScraperError> {
        let ready_timeout = Duration::from_secs(config.ready_timeout_secs);
        Ok(Self {
            base_url: config.base_url.clone(),
            page_param: config.page_param.clone(),
            max_listing_pages: config.max_listing_pages,
            stop_on_repeated_page: config.stop_on_repeated_page,
            links: LinkExtractor::new(&config.listing_link_selector)?,
            cards: CardExtractor::new(
                &config.card_selector,
                &config.listing_link_selector,
                &config.card_name_selector,
                &config.card_price_selector,
                &config.card_image_selector,
            )?,
            names: NameExtractor::new(&config.product_name_selector)?,
            listing_ready: ReadyCondition::new(&config.listing_link_selector, ready_timeout)?,
            detail_ready: ReadyCondition::new(&config.detail_ready_selector, ready_timeout)?,
            variants_marker: config.variants_marker.clone(),
            inter_request_delay_ms: config.inter_request_delay_ms,
            request_jitter_ms: config.request_jitter_ms,
            max_retries: config.max_retries,
            retry_backoff_base_secs: config.retry_backoff_base_secs,
            max_backoff_secs: config.max_backoff_secs,
        })
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff_base_secs: self.retry_backoff_base_secs,
            max_backoff_secs: self.max_backoff_secs,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum PageKind {
    Listing,
    Detail,
}

/// Drives a complete catalog run over an exclusively owned [`PageSource`].
///
/// `run` and `run_cards` consume the pipeline and close the source before
/// returning, on success, fatal failure and cancellation alike.
pub struct CatalogPipeline<S: PageSource> {
    source: S,
    settings: PipelineSettings,
    pacer: Pacer,
    cancel: CancelFlag,
}

impl<S: PageSource> CatalogPipeline<S> {
    pub fn new(source: S, settings: PipelineSettings) -> Self {
        let pacer = Pacer::new(settings.inter_request_delay_ms, settings.request_jitter_ms);
        Self {
            source,
            settings,
            pacer,
            cancel: CancelFlag::default(),
        }
    }

    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Walks every listing page and extracts the variants of each new product.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::FirstPageUnavailable`] if listing page 1 cannot be fetched.
    /// - [`CatalogError::Setup`] if the base URL is invalid.
    pub async fn run(mut self) -> Result<CatalogResult, CatalogError> {
        let outcome = self.collect_variants().await;
        self.close_source().await;
        outcome
    }

    /// Walks every listing page and emits one card per new product, without
    /// visiting detail pages.
    ///
    /// # Errors
    ///
    /// Same as [`Self::run`].
    pub async fn run_cards(mut self) -> Result<CardResult, CatalogError> {
        let outcome = self.collect_cards().await;
        self.close_source().await;
        outcome
    }

    async fn collect_variants(&mut self) -> Result<CatalogResult, CatalogError> {
        let mut paginator = self.paginator()?;
        let mut records: Vec<VariantRecord> = Vec::new();
        let mut summary = RunSummary::default();

        'listing: while let Some(request) = paginator.next_request() {
            if self.cancel.is_cancelled() {
                summary.aborted = true;
                break;
            }

            let Some(page) = self
                .fetch_listing(&request, &mut paginator, &mut summary)
                .await?
            else {
                continue;
            };

            let links = self.settings.links.extract(&page);
            let found = links.len();
            let fresh = paginator.record_links(request.page, links);
            tracing::info!(
                page = request.page,
                found,
                new = fresh.len(),
                "listing page processed"
            );

            for link in fresh {
                if self.cancel.is_cancelled() {
                    summary.aborted = true;
                    break 'listing;
                }
                let product_records = self.process_product(&link, &mut summary).await;
                records.extend(product_records);
            }
        }

        summary.termination = paginator.termination();
        summary.records = records.len();
        log_summary(&summary);
        Ok(CatalogRun { records, summary })
    }

    async fn collect_cards(&mut self) -> Result<CardResult, CatalogError> {
        let mut paginator = self.paginator()?;
        let mut records: Vec<ProductCard> = Vec::new();
        let mut summary = RunSummary::default();

        while let Some(request) = paginator.next_request() {
            if self.cancel.is_cancelled() {
                summary.aborted = true;
                break;
            }

            let Some(page) = self
                .fetch_listing(&request, &mut paginator, &mut summary)
                .await?
            else {
                continue;
            };

            let cards = self.settings.cards.extract(&page);
            let found = cards.len();
            let fresh = paginator.record_page(request.page, cards, |card| &card.link);
            tracing::info!(
                page = request.page,
                found,
                new = fresh.len(),
                "listing page processed"
            );
            records.extend(fresh);
        }

        summary.termination = paginator.termination();
        summary.records = records.len();
        log_summary(&summary);
        Ok(CatalogRun { records, summary })
    }

    fn paginator(&self) -> Result<ListingPaginator, CatalogError> {
        let paginator = ListingPaginator::new(
            &self.settings.base_url,
            &self.settings.page_param,
            self.settings.max_listing_pages,
        )?;
        Ok(paginator.with_repeat_guard(self.settings.stop_on_repeated_page))
    }

    /// Fetches one listing page. A failure on page 1 is fatal; later failures
    /// end the walk and are recorded. Cancellation yields `None` and leaves
    /// the paginator untouched.
    async fn fetch_listing(
        &mut self,
        request: &ListingRequest,
        paginator: &mut ListingPaginator,
        summary: &mut RunSummary,
    ) -> Result<Option<PageContent>, CatalogError> {
        tracing::info!(page = request.page, url = %request.url, "fetching listing page");
        match self.fetch_page(&request.url, PageKind::Listing).await {
            Ok(page) => {
                summary.listing_pages += 1;
                Ok(Some(page))
            }
            Err(ScraperError::Cancelled) => {
                summary.aborted = true;
                Ok(None)
            }
            Err(source) if request.page == 1 => {
                tracing::error!(url = %request.url, error = %source, "first listing page unavailable");
                Err(CatalogError::FirstPageUnavailable {
                    url: request.url.clone(),
                    source,
                })
            }
            Err(err) => {
                summary.record(Diagnostic::new(
                    request.url.clone(),
                    DiagnosticKind::FetchFailure {
                        reason: err.to_string(),
                    },
                ));
                paginator.record_failure(request.page);
                Ok(None)
            }
        }
    }

    /// Fetches a detail page and turns it into zero or more records.
    async fn process_product(
        &mut self,
        link: &ProductUrl,
        summary: &mut RunSummary,
    ) -> Vec<VariantRecord> {
        tracing::info!(url = %link, "processing product");

        let fetched = self.fetch_page(link.as_str(), PageKind::Detail).await;
        if matches!(fetched, Err(ScraperError::Cancelled)) {
            summary.aborted = true;
            return Vec::new();
        }
        summary.products_visited += 1;

        let page = match fetched {
            Ok(page) => page,
            Err(err) => {
                summary.products_skipped += 1;
                summary.record(Diagnostic::new(
                    link.as_str(),
                    DiagnosticKind::FetchFailure {
                        reason: err.to_string(),
                    },
                ));
                return Vec::new();
            }
        };

        let name = self.settings.names.extract(&page);
        let Some(fragment) = locate_variants(&page, &self.settings.variants_marker) else {
            summary.products_skipped += 1;
            summary.record(Diagnostic::new(
                link.as_str(),
                DiagnosticKind::PayloadNotFound,
            ));
            return Vec::new();
        };

        match normalize_variants(&fragment, &name, link) {
            Ok(records) => {
                if records.is_empty() {
                    summary.products_skipped += 1;
                    summary.record(Diagnostic::new(link.as_str(), DiagnosticKind::NoVariants));
                }
                tracing::debug!(url = %link, name, variants = records.len(), "product normalized");
                records
            }
            Err(malformed) => {
                summary.products_skipped += 1;
                summary.record(Diagnostic::new(
                    link.as_str(),
                    DiagnosticKind::MalformedPayload {
                        reason: malformed.reason,
                    },
                ));
                Vec::new()
            }
        }
    }

    /// Paces, then fetches `url` with the retry policy. Returns
    /// [`ScraperError::Cancelled`] if the run is cancelled while waiting.
    async fn fetch_page(&mut self, url: &str, kind: PageKind) -> Result<PageContent, ScraperError> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(ScraperError::Cancelled),
            () = self.pacer.pace() => {}
        }

        let ready = match kind {
            PageKind::Listing => &self.settings.listing_ready,
            PageKind::Detail => &self.settings.detail_ready,
        };
        let source = &self.source;
        let page = retry_with_backoff(self.settings.retry_policy(), &self.cancel, || {
            source.fetch(url, ready)
        })
        .await?;

        if !page.ready {
            tracing::debug!(url, ?kind, selector = ready.selector(), "page not ready");
        }
        Ok(page)
    }

    async fn close_source(&mut self) {
        if let Err(e) = self.source.close().await {
            tracing::warn!(error = %e, "failed to close page source");
        }
    }
}

fn log_summary(summary: &RunSummary) {
    tracing::info!(
        listing_pages = summary.listing_pages,
        products = summary.products_visited,
        skipped = summary.products_skipped,
        records = summary.records,
        diagnostics = summary.diagnostics.len(),
        termination = ?summary.termination,
        aborted = summary.aborted,
        "catalog run finished"
    );
}

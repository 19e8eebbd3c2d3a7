//! Per-run bookkeeping: skip reasons and the run summary.

use std::fmt;

use crate::pagination::Termination;

/// Why a page contributed no records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    FetchFailure { reason: String },
    /// The detail page carried no variants payload. Expected for some products.
    PayloadNotFound,
    MalformedPayload { reason: String },
    /// The payload parsed but held no usable variant objects.
    NoVariants,
}

/// A non-fatal problem tied to the URL it happened on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub url: String,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub(crate) fn new(url: impl Into<String>, kind: DiagnosticKind) -> Self {
        Self {
            url: url.into(),
            kind,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::FetchFailure { reason } => {
                write!(f, "{}: fetch failed: {reason}", self.url)
            }
            DiagnosticKind::PayloadNotFound => write!(f, "{}: no variants payload", self.url),
            DiagnosticKind::MalformedPayload { reason } => {
                write!(f, "{}: malformed variants payload: {reason}", self.url)
            }
            DiagnosticKind::NoVariants => write!(f, "{}: variants payload is empty", self.url),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Listing pages fetched successfully.
    pub listing_pages: u32,
    /// Detail pages attempted (variant flavor only).
    pub products_visited: usize,
    /// Detail pages that contributed no records. Each has a matching diagnostic.
    pub products_skipped: usize,
    pub records: usize,
    pub termination: Option<Termination>,
    /// Set when the run was cancelled between requests.
    pub aborted: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl RunSummary {
    pub(crate) fn record(&mut self, diagnostic: Diagnostic) {
        match &diagnostic.kind {
            DiagnosticKind::PayloadNotFound | DiagnosticKind::NoVariants => {
                tracing::info!(url = %diagnostic.url, "skipping product: {diagnostic}");
            }
            DiagnosticKind::FetchFailure { .. } | DiagnosticKind::MalformedPayload { .. } => {
                tracing::warn!(url = %diagnostic.url, "skipping: {diagnostic}");
            }
        }
        self.diagnostics.push(diagnostic);
    }
}

/// Records in discovery order plus the run summary.
#[derive(Debug, Clone)]
pub struct CatalogRun<T> {
    pub records: Vec<T>,
    pub summary: RunSummary,
}

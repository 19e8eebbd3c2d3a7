mod cancel;
pub mod detail;
pub mod error;
pub mod fetch;
pub mod listing;
pub mod locate;
pub mod normalize;
pub mod pacing;
pub mod pagination;
pub mod pipeline;
mod rate_limit;

pub use cancel::CancelFlag;
pub use error::{CatalogError, MalformedPayload, ScraperError};
pub use fetch::{HttpPageSource, PageContent, PageSource, ReadyCondition};
pub use locate::{locate_variants, RawVariantFragment};
pub use normalize::normalize_variants;
pub use pagination::{ListingPaginator, PaginatorState, Termination};
pub use pipeline::{
    CardResult, CatalogPipeline, CatalogResult, CatalogRun, Diagnostic,
    DiagnosticKind, PipelineSettings, RunSummary,
};

use std::path::PathBuf;

/// Runtime configuration for a catalog run, loaded from `STORECAT_*`
/// environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Listing URL without the page parameter, e.g.
    /// `https://www.tiendacasajorge.com.ar/productos`.
    pub base_url: String,
    /// Query parameter that carries the 1-based listing page number.
    pub page_param: String,
    pub listing_link_selector: String,
    pub product_name_selector: String,
    /// Selector whose presence marks a detail page as fully rendered.
    pub detail_ready_selector: String,
    /// Script token that precedes the embedded variants array.
    pub variants_marker: String,
    pub card_selector: String,
    pub card_name_selector: String,
    pub card_price_selector: String,
    pub card_image_selector: String,
    pub ready_timeout_secs: u64,
    pub user_agent: String,
    pub inter_request_delay_ms: u64,
    /// Upper bound of the random extra delay added to `inter_request_delay_ms`.
    pub request_jitter_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
    /// Ceiling for any single retry wait, including a server's `Retry-After`.
    pub max_backoff_secs: u64,
    /// Hard stop for the listing walk. `None` relies on the empty-page signal alone.
    pub max_listing_pages: Option<u32>,
    /// End the walk on a page whose links were all seen before. When off,
    /// only an empty page ends it.
    pub stop_on_repeated_page: bool,
    pub log_level: String,
    pub output_path: PathBuf,
}

pub const DEFAULT_BASE_URL: &str = "https://www.tiendacasajorge.com.ar/productos";

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

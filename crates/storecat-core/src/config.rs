use crate::app_config::{AppConfig, DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
use crate::ConfigError;

/// Load run configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load run configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build run configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let non_empty = |var: &str, default: &str| -> Result<String, ConfigError> {
        let raw = or_default(var, default);
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(trimmed.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_bool = |var: &str, default: bool| -> Result<bool, ConfigError> {
        match lookup(var) {
            Err(_) => Ok(default),
            Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "" => Ok(default),
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                other => Err(ConfigError::InvalidEnvVar {
                    var: var.to_string(),
                    reason: format!("\"{other}\" is not a boolean"),
                }),
            },
        }
    };

    let base_url = non_empty("STORECAT_BASE_URL", DEFAULT_BASE_URL)?;
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::InvalidEnvVar {
            var: "STORECAT_BASE_URL".to_string(),
            reason: format!("\"{base_url}\" is not an http(s) URL"),
        });
    }

    let page_param = non_empty("STORECAT_PAGE_PARAM", "page")?;
    let listing_link_selector = non_empty("STORECAT_LISTING_LINK_SELECTOR", "a.item-link")?;
    let product_name_selector =
        non_empty("STORECAT_PRODUCT_NAME_SELECTOR", "meta[name='twitter:title']")?;
    let detail_ready_selector = non_empty("STORECAT_DETAIL_READY_SELECTOR", "script")?;
    let variants_marker = non_empty("STORECAT_VARIANTS_MARKER", "LS.variants")?;
    let card_selector = non_empty("STORECAT_CARD_SELECTOR", ".js-item-product")?;
    let card_name_selector = non_empty("STORECAT_CARD_NAME_SELECTOR", ".js-item-name")?;
    let card_price_selector = non_empty("STORECAT_CARD_PRICE_SELECTOR", ".js-price-display")?;
    let card_image_selector = non_empty("STORECAT_CARD_IMAGE_SELECTOR", "img")?;

    let ready_timeout_secs = parse_u64("STORECAT_READY_TIMEOUT_SECS", "10")?;
    if ready_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "STORECAT_READY_TIMEOUT_SECS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    let user_agent = or_default("STORECAT_USER_AGENT", DEFAULT_USER_AGENT);
    let inter_request_delay_ms = parse_u64("STORECAT_INTER_REQUEST_DELAY_MS", "1000")?;
    let request_jitter_ms = parse_u64("STORECAT_REQUEST_JITTER_MS", "0")?;
    let max_retries = parse_u32("STORECAT_MAX_RETRIES", "2")?;
    let retry_backoff_base_secs = parse_u64("STORECAT_RETRY_BACKOFF_BASE_SECS", "2")?;
    let max_backoff_secs = parse_u64("STORECAT_MAX_BACKOFF_SECS", "60")?;

    let max_listing_pages = match lookup("STORECAT_MAX_LISTING_PAGES") {
        Ok(raw) if !raw.trim().is_empty() => {
            let pages = raw
                .trim()
                .parse::<u32>()
                .map_err(|e| ConfigError::InvalidEnvVar {
                    var: "STORECAT_MAX_LISTING_PAGES".to_string(),
                    reason: e.to_string(),
                })?;
            if pages == 0 {
                return Err(ConfigError::InvalidEnvVar {
                    var: "STORECAT_MAX_LISTING_PAGES".to_string(),
                    reason: "must be at least 1 when set".to_string(),
                });
            }
            Some(pages)
        }
        _ => None,
    };

    let stop_on_repeated_page = parse_bool("STORECAT_STOP_ON_REPEATED_PAGE", false)?;

    let log_level = or_default("STORECAT_LOG_LEVEL", "info");
    let output_path = PathBuf::from(or_default("STORECAT_OUTPUT_PATH", "productos.csv"));

    Ok(AppConfig {
        base_url,
        page_param,
        listing_link_selector,
        product_name_selector,
        detail_ready_selector,
        variants_marker,
        card_selector,
        card_name_selector,
        card_price_selector,
        card_image_selector,
        ready_timeout_secs,
        user_agent,
        inter_request_delay_ms,
        request_jitter_ms,
        max_retries,
        retry_backoff_base_secs,
        max_backoff_secs,
        max_listing_pages,
        stop_on_repeated_page,
        log_level,
        output_path,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

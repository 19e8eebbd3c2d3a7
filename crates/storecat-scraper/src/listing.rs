//! Extraction of product links and product cards from listing pages.

use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use storecat_core::{ProductCard, ProductUrl, UNKNOWN_FIELD};

use crate::error::ScraperError;
use crate::fetch::{compile_selector, PageContent};

/// Pulls product detail links out of a listing page.
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    selector: Selector,
}

impl LinkExtractor {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidSelector`] if `selector` is not valid CSS.
    pub fn new(selector: &str) -> Result<Self, ScraperError> {
        Ok(Self {
            selector: compile_selector(selector)?,
        })
    }

    /// Returns every matching link in document order, resolved against the
    /// page URL. Duplicates are kept; deduplication is the paginator's job.
    #[must_use]
    pub fn extract(&self, page: &PageContent) -> Vec<ProductUrl> {
        let Some(base) = parse_page_url(page) else {
            return Vec::new();
        };
        let document = Html::parse_document(&page.body);
        document
            .select(&self.selector)
            .filter_map(|el| el.value().attr("href"))
            .filter_map(|href| normalize_link(&base, href))
            .collect()
    }
}

/// Selectors describing one product card on a listing page.
#[derive(Debug, Clone)]
pub struct CardExtractor {
    card: Selector,
    link: Selector,
    name: Selector,
    price: Selector,
    image: Selector,
}

impl CardExtractor {
    /// `link` is matched inside each card; when nothing matches, the card
    /// element's own `href` is used.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidSelector`] for the first selector that is
    /// not valid CSS.
    pub fn new(
        card: &str,
        link: &str,
        name: &str,
        price: &str,
        image: &str,
    ) -> Result<Self, ScraperError> {
        Ok(Self {
            card: compile_selector(card)?,
            link: compile_selector(link)?,
            name: compile_selector(name)?,
            price: compile_selector(price)?,
            image: compile_selector(image)?,
        })
    }

    /// Returns one [`ProductCard`] per card that carries a usable link, in
    /// document order.
    #[must_use]
    pub fn extract(&self, page: &PageContent) -> Vec<ProductCard> {
        let Some(base) = parse_page_url(page) else {
            return Vec::new();
        };
        let document = Html::parse_document(&page.body);
        document
            .select(&self.card)
            .filter_map(|card| self.card_from_element(&base, card))
            .collect()
    }

    fn card_from_element(&self, base: &Url, card: ElementRef<'_>) -> Option<ProductCard> {
        let link_el = card.select(&self.link).next().unwrap_or(card);
        let link = link_el
            .value()
            .attr("href")
            .and_then(|href| normalize_link(base, href))?;

        let name = card
            .select(&self.name)
            .next()
            .map(element_text)
            .filter(|s| !s.is_empty())
            .or_else(|| {
                link_el
                    .value()
                    .attr("title")
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned)
            })
            .unwrap_or_else(|| UNKNOWN_FIELD.to_owned());

        let price = card
            .select(&self.price)
            .next()
            .map_or(0.0, |el| parse_display_price(&element_text(el)));

        // Lazy-loaded images keep the real URL in a data attribute.
        let image = card
            .select(&self.image)
            .next()
            .and_then(|img| {
                let value = img.value();
                value
                    .attr("data-src")
                    .or_else(|| value.attr("src"))
                    .or_else(|| value.attr("data-srcset").and_then(first_srcset_url))
                    .or_else(|| value.attr("srcset").and_then(first_srcset_url))
            })
            .and_then(|src| resolve(base, src))
            .unwrap_or_default();

        Some(ProductCard {
            name,
            price,
            link,
            image,
        })
    }
}

/// Resolves `href` against `base` into a comparable absolute product link.
///
/// The fragment is dropped so `/p/1#reviews` and `/p/1` dedup together.
/// Returns `None` for empty, in-page, `javascript:`/`mailto:` and other
/// non-http(s) links.
#[must_use]
pub fn normalize_link(base: &Url, href: &str) -> Option<ProductUrl> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let mut url = base.join(href).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(ProductUrl::new(url.to_string()))
}

/// Parses a displayed price such as `"$12.500,00"`, `"$ 1,299.99"` or
/// `"12500"` into a non-negative number. Returns `0` when no digits exist.
///
/// When both `,` and `.` appear, the later one is the decimal separator. A
/// lone separator is decimal only if it appears once with one or two digits
/// after it; otherwise it groups thousands (`"$12.500"` is twelve thousand).
#[must_use]
pub fn parse_display_price(text: &str) -> f64 {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return 0.0;
    }

    let decimal_sep = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(comma), Some(dot)) => Some(if comma > dot { ',' } else { '.' }),
        (Some(_), None) => lone_decimal_separator(&cleaned, ','),
        (None, Some(_)) => lone_decimal_separator(&cleaned, '.'),
        (None, None) => None,
    };

    let normalized: String = cleaned
        .chars()
        .filter_map(|c| match c {
            d if d.is_ascii_digit() => Some(d),
            sep if Some(sep) == decimal_sep => Some('.'),
            _ => None,
        })
        .collect();

    normalized
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p > 0.0)
        .unwrap_or(0.0)
}

fn lone_decimal_separator(cleaned: &str, sep: char) -> Option<char> {
    if cleaned.matches(sep).count() != 1 {
        return None;
    }
    let tail = cleaned.rsplit(sep).next().unwrap_or("");
    matches!(tail.len(), 1 | 2).then_some(sep)
}

fn first_srcset_url(srcset: &str) -> Option<&str> {
    srcset
        .split(',')
        .next()
        .and_then(|candidate| candidate.split_whitespace().next())
}

fn resolve(base: &Url, src: &str) -> Option<String> {
    let src = src.trim();
    if src.is_empty() {
        return None;
    }
    base.join(src).ok().map(|u| u.to_string())
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_page_url(page: &PageContent) -> Option<Url> {
    match Url::parse(&page.url) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::warn!(url = %page.url, error = %e, "listing page URL is not absolute");
            None
        }
    }
}

//! Product name extraction from a detail page.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use storecat_core::UNKNOWN_FIELD;

use crate::error::ScraperError;
use crate::fetch::{compile_selector, PageContent};

static OG_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[property="og:title"]"#).expect("valid selector"));
static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("valid selector"));

/// Reads the product name from a detail page.
///
/// Tries the configured selector first (a `meta` element contributes its
/// `content` attribute, anything else its text), then `og:title`, then the
/// document `<title>`.
#[derive(Debug, Clone)]
pub struct NameExtractor {
    selector: Selector,
}

impl NameExtractor {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidSelector`] if `selector` is not valid CSS.
    pub fn new(selector: &str) -> Result<Self, ScraperError> {
        Ok(Self {
            selector: compile_selector(selector)?,
        })
    }

    /// Returns the first non-blank candidate, or [`UNKNOWN_FIELD`].
    #[must_use]
    pub fn extract(&self, page: &PageContent) -> String {
        let document = Html::parse_document(&page.body);
        [&self.selector, &*OG_TITLE, &*TITLE]
            .into_iter()
            .find_map(|selector| {
                document
                    .select(selector)
                    .filter_map(element_value)
                    .find(|candidate| !candidate.is_empty())
            })
            .unwrap_or_else(|| {
                tracing::debug!(url = %page.url, "no product name found on detail page");
                UNKNOWN_FIELD.to_owned()
            })
    }
}

fn element_value(el: ElementRef<'_>) -> Option<String> {
    if el.value().name() == "meta" {
        return el.value().attr("content").map(|c| c.trim().to_owned());
    }
    Some(
        el.text()
            .flat_map(str::split_whitespace)
            .collect::<Vec<_>>()
            .join(" "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> PageContent {
        PageContent {
            url: "https://shop.example/productos/mate/".to_owned(),
            body: body.to_owned(),
            ready: true,
        }
    }

    fn extractor() -> NameExtractor {
        NameExtractor::new("meta[name='twitter:title']").unwrap()
    }

    #[test]
    fn reads_twitter_title_content() {
        let html = r#"<head><meta name="twitter:title" content="  Mate Imperial  ">
            <meta property="og:title" content="Other"><title>Shop</title></head>"#;
        assert_eq!(extractor().extract(&page(html)), "Mate Imperial");
    }

    #[test]
    fn falls_back_to_og_title() {
        let html = r#"<head><meta name="twitter:title" content=" ">
            <meta property="og:title" content="Bombilla"></head>"#;
        assert_eq!(extractor().extract(&page(html)), "Bombilla");
    }

    #[test]
    fn falls_back_to_document_title() {
        let html = "<html><head><title>\n Termo 1L \n</title></head></html>";
        assert_eq!(extractor().extract(&page(html)), "Termo 1L");
    }

    #[test]
    fn unknown_when_nothing_matches() {
        let html = "<html><body><p>no names</p></body></html>";
        assert_eq!(extractor().extract(&page(html)), UNKNOWN_FIELD);
    }

    #[test]
    fn text_selector_uses_element_text() {
        let extractor = NameExtractor::new("h1.product-name").unwrap();
        let html = r#"<h1 class="product-name">Yerba <b>Suave</b></h1>"#;
        assert_eq!(extractor.extract(&page(html)), "Yerba Suave");
    }
}

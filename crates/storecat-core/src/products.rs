use std::fmt;

use serde::{Serialize, Serializer};

/// Sentinel written in place of a SKU or color the storefront did not expose.
pub const UNKNOWN_FIELD: &str = "unknown";

/// Absolute link to a product detail page.
///
/// Values are produced by the listing extractor after resolving the `href`
/// against the listing page URL and stripping any fragment, so two links that
/// compare equal point at the same product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductUrl(String);

impl ProductUrl {
    /// Wraps an already-normalized absolute URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProductUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for ProductUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// One purchasable variant of a product, flattened for tabular output.
///
/// Field order matches the output column order: `name, sku, color, price, link`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantRecord {
    #[serde(rename = "name")]
    pub product_name: String,
    /// Storefront SKU, or [`UNKNOWN_FIELD`] when absent or empty.
    pub sku: String,
    /// First variant option (the color on this storefront), or [`UNKNOWN_FIELD`].
    pub color: String,
    /// Non-negative price; `0` when the payload carried no usable number.
    pub price: f64,
    pub link: ProductUrl,
}

impl VariantRecord {
    /// Column headers in serialization order.
    pub const HEADERS: [&'static str; 5] = ["name", "sku", "color", "price", "link"];
}

/// A product summary taken straight from a listing card, without visiting the
/// detail page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductCard {
    pub name: String,
    pub price: f64,
    pub link: ProductUrl,
    /// Absolute image URL; empty when the card has no image.
    pub image: String,
}

impl ProductCard {
    pub const HEADERS: [&'static str; 4] = ["name", "price", "link", "image"];
}

//! Normalization from the raw variants fragment to [`VariantRecord`]s.
//!
//! ## Observed variant shape
//!
//! Each element of the storefront's variants array is an object such as
//!
//! ```text
//! {"sku":"MT-001","option0":"Rojo","option1":null,"price_number":12500,
//!  "price_short":"$12.500","available":true, ...}
//! ```
//!
//! - `sku` may be missing, `null`, an empty string or (on older items) a number.
//! - `option0` holds the first option, which this storefront uses for color.
//! - `price_number` is usually a JSON number but has been seen as a numeric
//!   string and as `null` for unpriced variants.
//!
//! Missing or unusable fields are defaulted, never raised.

use serde_json::{Map, Value};
use storecat_core::{ProductUrl, VariantRecord, UNKNOWN_FIELD};

use crate::error::MalformedPayload;
use crate::locate::RawVariantFragment;

const SKU_FIELD: &str = "sku";
const COLOR_FIELD: &str = "option0";
const PRICE_FIELD: &str = "price_number";

/// Parses `fragment` and maps each variant object to a [`VariantRecord`]
/// carrying `product_name` and `product_url`.
///
/// Array elements that are not objects are skipped. The output order is the
/// order of the variants in the payload.
///
/// # Errors
///
/// Returns [`MalformedPayload`] if the fragment is not valid JSON or its
/// top-level value is not an array.
pub fn normalize_variants(
    fragment: &RawVariantFragment,
    product_name: &str,
    product_url: &ProductUrl,
) -> Result<Vec<VariantRecord>, MalformedPayload> {
    let value: Value =
        serde_json::from_str(fragment.as_str()).map_err(|e| MalformedPayload {
            reason: e.to_string(),
        })?;

    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(MalformedPayload {
                reason: format!("expected a JSON array, found {}", json_kind(&other)),
            })
        }
    };

    let records = items
        .iter()
        .enumerate()
        .filter_map(|(idx, item)| {
            let Some(variant) = item.as_object() else {
                tracing::debug!(
                    url = %product_url,
                    index = idx,
                    kind = json_kind(item),
                    "skipping non-object variant entry"
                );
                return None;
            };
            Some(normalize_variant(variant, product_name, product_url))
        })
        .collect();

    Ok(records)
}

fn normalize_variant(
    variant: &Map<String, Value>,
    product_name: &str,
    product_url: &ProductUrl,
) -> VariantRecord {
    VariantRecord {
        product_name: product_name.to_owned(),
        sku: text_field(variant.get(SKU_FIELD)),
        color: text_field(variant.get(COLOR_FIELD)),
        price: price_field(variant.get(PRICE_FIELD)),
        link: product_url.clone(),
    }
}

/// Reads a string-ish field, defaulting to [`UNKNOWN_FIELD`].
///
/// Numbers are stringified; blank strings, `null` and other types default.
fn text_field(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_owned(),
        Some(Value::Number(n)) => n.to_string(),
        _ => UNKNOWN_FIELD.to_owned(),
    }
}

/// Reads a price as a non-negative number, defaulting to `0`.
fn price_field(value: Option<&Value>) -> f64 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match raw {
        Some(price) if price.is_finite() && price > 0.0 => price,
        _ => 0.0,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;

//! Locates the embedded variants array inside a detail page's scripts.
//!
//! The storefront assigns its variants in an inline script, e.g.
//!
//! ```text
//! LS.variants = [{"sku":"A1","option0":"Rojo","price_number":10}, ...];
//! ```
//!
//! The value is isolated by bracket matching rather than a pattern match, so
//! nested objects and arrays (and `}];` inside string values) never cut the
//! fragment short.

use std::sync::LazyLock;

use regex::Regex;

use crate::fetch::PageContent;

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>(.*?)</script>").expect("valid regex"));

/// Raw text believed to encode the variants payload. Not yet validated as JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawVariantFragment(String);

impl RawVariantFragment {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Finds the value assigned to `marker` in any `<script>` block of `page`.
///
/// Returns `None` when no script assigns to the marker; that is an expected
/// outcome for products without exposed variants. When the marker is assigned
/// something that is not a complete array, the raw statement text is returned
/// so the normalizer can report it as malformed.
#[must_use]
pub fn locate_variants(page: &PageContent, marker: &str) -> Option<RawVariantFragment> {
    let mut unbalanced: Option<RawVariantFragment> = None;

    for cap in SCRIPT_RE.captures_iter(&page.body) {
        let Some(script) = cap.get(1).map(|m| m.as_str()) else {
            continue;
        };
        if !script.contains(marker) {
            continue;
        }

        for value in assigned_values(script, marker) {
            if let Some(array) = extract_balanced_array(value) {
                return Some(RawVariantFragment::new(array));
            }
            if unbalanced.is_none() {
                unbalanced = Some(RawVariantFragment::new(statement_text(value)));
            }
        }
    }

    unbalanced
}

/// Yields the text following each `marker =` assignment in `script`, with
/// leading whitespace removed.
fn assigned_values<'a>(script: &'a str, marker: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    script.match_indices(marker).filter_map(move |(pos, _)| {
        let preceded_by_ident = script[..pos]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$');
        if preceded_by_ident {
            return None;
        }

        let rest = script[pos + marker.len()..].trim_start();
        let value = rest.strip_prefix('=')?;
        // `==` / `===` is a comparison, not an assignment.
        if value.starts_with('=') {
            return None;
        }
        Some(value.trim_start())
    })
}

/// Text of the statement starting at `value`, up to the first `;` or end of script.
fn statement_text(value: &str) -> &str {
    value.split(';').next().unwrap_or(value).trim()
}

/// Extracts a balanced JSON array from the start of `s`.
///
/// Scans character by character with a stack of expected closers, skipping
/// string literals and escape sequences. Returns the prefix of `s` ending at
/// the bracket that closes the outermost `[`, or `None` if the array is
/// unterminated or a closer does not match its opener (e.g. `[{]`).
pub(crate) fn extract_balanced_array(s: &str) -> Option<&str> {
    if !s.starts_with('[') {
        return None;
    }
    let mut closers: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escape = false;
    for (i, c) in s.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        if in_string {
            match c {
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' => closers.push(']'),
            '{' => closers.push('}'),
            ']' | '}' => {
                if closers.pop() != Some(c) {
                    return None;
                }
                if closers.is_empty() {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
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

    #[test]
    fn finds_simple_assignment() {
        let html = r#"<html><script>var x = 1;</script><script>
            LS.variants = [{"sku":"A1","option0":"Red","price_number":10}];
        </script></html>"#;
        let fragment = locate_variants(&page(html), "LS.variants").unwrap();
        assert_eq!(
            fragment.as_str(),
            r#"[{"sku":"A1","option0":"Red","price_number":10}]"#
        );
    }

    #[test]
    fn keeps_nested_structures_intact() {
        let html = r#"<script>LS.variants = [{"sku":"A1","image":{"sizes":[1,2]},"option0":"Red"},{"sku":"B2","option0":"Azul"}]; LS.other = 1;</script>"#;
        let fragment = locate_variants(&page(html), "LS.variants").unwrap();
        let parsed: serde_json::Value = serde_json::from_str(fragment.as_str()).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
    }

    #[test]
    fn closing_sequence_inside_string_does_not_truncate() {
        let html = r#"<script>LS.variants = [{"sku":"A1","note":"ends with }];","option0":"Red"}];</script>"#;
        let fragment = locate_variants(&page(html), "LS.variants").unwrap();
        assert_eq!(
            fragment.as_str(),
            r#"[{"sku":"A1","note":"ends with }];","option0":"Red"}]"#
        );
    }

    #[test]
    fn escaped_quote_inside_string_is_respected() {
        let html = r#"<script>LS.variants = [{"sku":"A\"]1","option0":"Red"}];</script>"#;
        let fragment = locate_variants(&page(html), "LS.variants").unwrap();
        assert_eq!(fragment.as_str(), r#"[{"sku":"A\"]1","option0":"Red"}]"#);
    }

    #[test]
    fn returns_none_when_marker_absent() {
        let html = "<script>LS.product = {\"id\": 1};</script><p>LS.variants in text</p>";
        assert!(locate_variants(&page(html), "LS.variants").is_none());
    }

    #[test]
    fn ignores_comparisons_and_longer_identifiers() {
        let html = r#"<script>if (LS.variants == null) {} myLS.variants = [1];</script>
            <script>LS.variants = [{"sku":"ok"}];</script>"#;
        let fragment = locate_variants(&page(html), "LS.variants").unwrap();
        assert_eq!(fragment.as_str(), r#"[{"sku":"ok"}]"#);
    }

    #[test]
    fn unbalanced_assignment_yields_raw_statement() {
        let html = r#"<script>LS.variants = [{"sku":"A1"; broken</script>"#;
        let fragment = locate_variants(&page(html), "LS.variants").unwrap();
        assert_eq!(fragment.as_str(), r#"[{"sku":"A1""#);
    }

    #[test]
    fn later_balanced_assignment_wins_over_earlier_broken_one() {
        let html = r#"<script>LS.variants = {};</script><script>LS.variants = [{"sku":"Z"}];</script>"#;
        let fragment = locate_variants(&page(html), "LS.variants").unwrap();
        assert_eq!(fragment.as_str(), r#"[{"sku":"Z"}]"#);
    }

    #[test]
    fn extract_balanced_array_rejects_mismatched_closer() {
        assert!(extract_balanced_array("[{]").is_none());
        assert!(extract_balanced_array("[42}").is_none());
    }

    #[test]
    fn extract_balanced_array_stops_at_outermost_close() {
        assert_eq!(extract_balanced_array("[[1],[2]] trailing ]"), Some("[[1],[2]]"));
    }

    #[test]
    fn extract_balanced_array_requires_leading_bracket() {
        assert!(extract_balanced_array(" [1]").is_none());
        assert!(extract_balanced_array("[1, 2").is_none());
    }
}

//! Resolution of scanned payload text to an item lookup.
//!
//! Printed labels carry one of several payload shapes, and handheld scanners
//! add their own quirks on top. Resolution follows a fixed precedence that
//! existing labels depend on:
//!
//! 1. A JSON object payload resolves through its `id` field, or failing that
//!    its `article` field as a search term.
//! 2. Purely numeric text resolves as an item id.
//! 3. A letters-then-digits code (`ITEM000123`, `WH000123`) resolves as the
//!    item id left after stripping the letters.
//! 4. Anything else is a free-text search term.

use serde_json::Value;

/// Outcome of interpreting a scanned payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanResolution {
    /// The payload names a single item by id.
    ItemId(i64),
    /// The payload is a search term to match against item fields.
    SearchTerm(String),
}

/// Interpret scanned payload text.
///
/// Leading and trailing whitespace is ignored. The precedence order above is
/// load-bearing: an article name that happens to be all digits will resolve
/// as an id, exactly as it always has for printed labels.
#[must_use]
pub fn resolve(payload: &str) -> ScanResolution {
    let text = payload.trim();

    if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(text) {
        if let Some(id) = fields.get("id").and_then(json_id) {
            return ScanResolution::ItemId(id);
        }
        if let Some(article) = fields.get("article").and_then(Value::as_str) {
            return ScanResolution::SearchTerm(article.to_owned());
        }
        // An object payload without usable fields falls back to free text.
        return ScanResolution::SearchTerm(text.to_owned());
    }

    if let Some(id) = numeric_id(text) {
        return ScanResolution::ItemId(id);
    }

    if let Some(id) = prefixed_code_id(text) {
        return ScanResolution::ItemId(id);
    }

    ScanResolution::SearchTerm(text.to_owned())
}

/// Accept both `"id": 42` and `"id": "42"` payload encodings.
fn json_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => numeric_id(text),
        _ => None,
    }
}

fn numeric_id(text: &str) -> Option<i64> {
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Match codes shaped as letters followed by digits, e.g. `ITEM000123`.
fn prefixed_code_id(text: &str) -> Option<i64> {
    let mut digits = String::new();
    let mut seen_letter = false;
    for c in text.chars() {
        if c.is_ascii_alphabetic() {
            if !digits.is_empty() {
                return None;
            }
            seen_letter = true;
        } else if c.is_ascii_digit() {
            digits.push(c);
        } else {
            return None;
        }
    }
    if seen_letter && !digits.is_empty() {
        digits.parse().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    //! One test per resolution branch, plus the ambiguous edges.

    use rstest::rstest;

    use super::{ScanResolution, resolve};

    #[rstest]
    #[case(r#"{"id": 123, "article": "Bearing"}"#, ScanResolution::ItemId(123))]
    #[case(r#"{"id": "123"}"#, ScanResolution::ItemId(123))]
    #[case(
        r#"{"article": "Bearing 608"}"#,
        ScanResolution::SearchTerm("Bearing 608".to_owned())
    )]
    #[case("42", ScanResolution::ItemId(42))]
    #[case("  42  ", ScanResolution::ItemId(42))]
    #[case("ITEM000123", ScanResolution::ItemId(123))]
    #[case("item000123", ScanResolution::ItemId(123))]
    #[case("WH000042", ScanResolution::ItemId(42))]
    #[case(
        "M8 hex bolt",
        ScanResolution::SearchTerm("M8 hex bolt".to_owned())
    )]
    fn resolves_documented_branches(#[case] payload: &str, #[case] expected: ScanResolution) {
        assert_eq!(resolve(payload), expected);
    }

    #[rstest]
    fn json_object_without_id_or_article_falls_back_to_free_text() {
        let resolved = resolve(r#"{"location": "A1"}"#);
        assert_eq!(
            resolved,
            ScanResolution::SearchTerm(r#"{"location": "A1"}"#.to_owned())
        );
    }

    #[rstest]
    fn bare_json_number_resolves_as_numeric_id() {
        assert_eq!(resolve("7"), ScanResolution::ItemId(7));
    }

    #[rstest]
    #[case("ITEM12A3")]
    #[case("ITEM-123")]
    #[case("ITEM")]
    fn malformed_prefixed_codes_fall_back_to_search(#[case] payload: &str) {
        assert_eq!(
            resolve(payload),
            ScanResolution::SearchTerm(payload.to_owned())
        );
    }

    #[rstest]
    fn digits_then_letters_is_a_search_term() {
        assert_eq!(
            resolve("123ITEM"),
            ScanResolution::SearchTerm("123ITEM".to_owned())
        );
    }

    #[rstest]
    fn overlong_numeric_code_falls_back_to_search() {
        let payload = "ITEM99999999999999999999999999";
        assert_eq!(
            resolve(payload),
            ScanResolution::SearchTerm(payload.to_owned())
        );
    }
}

//! SKU synthesis
//!
//! `PRODUCT-NAME` followed by each selected value, in the order the caller
//! declared them, hyphen-joined and upper-cased:
//!
//! ```text
//! ("Blue Shirt", [("Size", "XL"), ("Color", "Navy Blue")])  ->  BLUE-SHIRT-XL-NAVY-BLUE
//! ```
//!
//! Selections are NOT sorted. The same attribute set declared in a different
//! order yields a different SKU; callers depend on this. Uniqueness is not
//! checked here, see [`crate::db::repository::variant`].

/// Reduce free text to a SKU token: drop everything except alphanumerics,
/// hyphens and whitespace, then turn each whitespace run into one hyphen.
pub fn normalize_token(raw: &str) -> String {
    let kept: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || c.is_whitespace())
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join("-")
}

/// Build the SKU for a product name and an ordered attribute selection
///
/// Only the values contribute; attribute names are accepted so call sites can
/// pass the selection as declared.
pub fn generate<'a, I>(product_name: &str, selections: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let tokens: Vec<String> = std::iter::once(normalize_token(product_name))
        .chain(selections.into_iter().map(|(_, value)| normalize_token(value)))
        .filter(|t| !t.is_empty())
        .collect();

    tokens
        .join("-")
        .to_uppercase()
        .trim_end_matches('-')
        .to_string()
}

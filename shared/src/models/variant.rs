//! Variant Model

use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Variant entity: one sellable unit of a product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub id: i64,
    pub product_id: i64,
    /// Unique catalog-wide, compared ignoring case
    pub sku: String,
    pub price: Decimal,
    pub stock: i64,
    /// Attribute name -> value, rebuilt from the association rows
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    pub created_at: i64,
}

/// Variant declaration carried by a product-authoring request
///
/// `attributes` keeps the caller's insertion order: it is the order in which
/// values are appended to a generated SKU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantDeclaration {
    /// Explicit SKU; blank or absent means "derive from name + selections"
    #[serde(default)]
    pub sku_override: Option<String>,
    pub price: Decimal,
    pub stock: i64,
    #[serde(default)]
    pub attributes: IndexMap<String, String>,
}

impl VariantDeclaration {
    pub fn new(price: Decimal, stock: i64) -> Self {
        Self {
            sku_override: None,
            price,
            stock,
            attributes: IndexMap::new(),
        }
    }

    /// Append an attribute selection (keeps declaration order)
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku_override = Some(sku.into());
        self
    }

    /// The explicit SKU, verbatim, if one was given and is not blank
    pub fn explicit_sku(&self) -> Option<&str> {
        self.sku_override
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }
}

/// In-place scalar update of a single variant
///
/// Attribute associations are never edited here; they are replaced wholesale
/// through the variant-set replacement path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantUpdate {
    pub sku: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i64>,
}

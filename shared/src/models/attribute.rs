//! Attribute Model
//!
//! Attributes (e.g. "Color") and their values (e.g. "Red") form one pool shared
//! by every product in the catalog. Names are unique ignoring case; values are
//! unique ignoring case within their attribute.

use serde::{Deserialize, Serialize};

/// Attribute entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Attribute {
    pub id: i64,
    /// Display name, spelled as first registered
    pub name: String,
    pub created_at: i64,
}

/// Attribute value entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct AttributeValue {
    pub id: i64,
    pub attribute_id: i64,
    /// Display value, spelled as first registered
    pub value: String,
    pub created_at: i64,
}

/// Attribute with every value it owns (pool listing)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeWithValues {
    #[serde(flatten)]
    pub attribute: Attribute,
    pub values: Vec<AttributeValue>,
}

/// Attribute declaration carried by a product-authoring request
///
/// ```json
/// { "name": "Color", "values": ["Red", "Blue"] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDeclaration {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

impl AttributeDeclaration {
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

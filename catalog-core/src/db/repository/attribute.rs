//! Attribute Pool
//!
//! Find-or-create registry for attributes and their values, shared by every
//! product. Resolution is a single upsert statement keyed on the normalized
//! spelling, so two writers introducing the same new name both end up with
//! the winner's row instead of racing a check-then-insert.

use crate::utils::{CatalogError, CatalogResult};
use shared::models::{Attribute, AttributeDeclaration, AttributeValue, AttributeWithValues};
use shared::util::{lookup_key, now_millis};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;

/// Normalized `(attribute, value)` pair used by [`ResolvedValues`]
///
/// Kept as a tuple: names and values may themselves contain any separator.
fn selection_key(name: &str, value: &str) -> (String, String) {
    (lookup_key(name), lookup_key(value))
}

/// Value ids produced by [`bulk_resolve`], keyed by normalized selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedValues {
    ids: HashMap<(String, String), i64>,
}

impl ResolvedValues {
    pub fn insert(&mut self, name: &str, value: &str, value_id: i64) {
        self.ids.insert(selection_key(name, value), value_id);
    }

    /// Value id for a selection, matched ignoring case
    pub fn get(&self, name: &str, value: &str) -> Option<i64> {
        self.ids.get(&selection_key(name, value)).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

// =========================================================================
// Resolution
// =========================================================================

/// Existing attribute matched ignoring case, or a newly created one
pub async fn resolve_attribute(conn: &mut SqliteConnection, name: &str) -> CatalogResult<Attribute> {
    let display = name.trim();
    if display.is_empty() {
        return Err(CatalogError::validation("Attribute name must not be blank"));
    }

    // The no-op DO UPDATE makes RETURNING yield the existing row on conflict
    let attr: Attribute = sqlx::query_as(
        r#"
        INSERT INTO attributes (name, name_key, created_at)
        VALUES (?, ?, ?)
        ON CONFLICT (name_key) DO UPDATE SET name_key = excluded.name_key
        RETURNING id, name, created_at
        "#,
    )
    .bind(display)
    .bind(lookup_key(display))
    .bind(now_millis())
    .fetch_one(&mut *conn)
    .await?;

    tracing::debug!(attribute_id = attr.id, name = %attr.name, "Attribute resolved");
    Ok(attr)
}

/// Existing value under `attribute` matched ignoring case, or a newly created one
pub async fn resolve_value(
    conn: &mut SqliteConnection,
    attribute: &Attribute,
    value: &str,
) -> CatalogResult<AttributeValue> {
    let display = value.trim();
    if display.is_empty() {
        return Err(CatalogError::validation(format!(
            "Value for attribute {} must not be blank",
            attribute.name
        )));
    }

    let resolved: AttributeValue = sqlx::query_as(
        r#"
        INSERT INTO attribute_values (attribute_id, value, value_key, created_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (attribute_id, value_key) DO UPDATE SET value_key = excluded.value_key
        RETURNING id, attribute_id, value, created_at
        "#,
    )
    .bind(attribute.id)
    .bind(display)
    .bind(lookup_key(display))
    .bind(now_millis())
    .fetch_one(&mut *conn)
    .await?;

    Ok(resolved)
}

/// Resolve every declared name/value pair, creating as needed
///
/// The same attribute may appear in several declarations (in any casing);
/// later occurrences reuse the id of the first.
pub async fn bulk_resolve(
    conn: &mut SqliteConnection,
    declarations: &[AttributeDeclaration],
) -> CatalogResult<ResolvedValues> {
    let mut attributes: HashMap<String, Attribute> = HashMap::new();
    let mut resolved = ResolvedValues::default();

    for decl in declarations {
        let name_key = lookup_key(&decl.name);
        let attribute = match attributes.get(&name_key) {
            Some(attr) => attr.clone(),
            None => {
                let attr = resolve_attribute(conn, &decl.name).await?;
                attributes.insert(name_key, attr.clone());
                attr
            }
        };

        for value in &decl.values {
            if resolved.get(&decl.name, value).is_some() {
                continue;
            }
            let resolved_value = resolve_value(conn, &attribute, value).await?;
            resolved.insert(&decl.name, value, resolved_value.id);
        }
    }

    tracing::debug!(
        attributes = attributes.len(),
        values = resolved.len(),
        "Attribute declarations resolved"
    );
    Ok(resolved)
}

// =========================================================================
// Read
// =========================================================================

/// Find an attribute by name, ignoring case
pub async fn find_attribute_by_name(
    pool: &SqlitePool,
    name: &str,
) -> CatalogResult<Option<Attribute>> {
    let attr: Option<Attribute> =
        sqlx::query_as("SELECT id, name, created_at FROM attributes WHERE name_key = ?")
            .bind(lookup_key(name))
            .fetch_optional(pool)
            .await?;
    Ok(attr)
}

/// Every attribute in the pool with all of its values, referenced or not
pub async fn list_pool(pool: &SqlitePool) -> CatalogResult<Vec<AttributeWithValues>> {
    let attrs: Vec<Attribute> =
        sqlx::query_as("SELECT id, name, created_at FROM attributes ORDER BY name_key")
            .fetch_all(pool)
            .await?;

    let values: Vec<AttributeValue> = sqlx::query_as(
        "SELECT id, attribute_id, value, created_at FROM attribute_values ORDER BY attribute_id, value_key",
    )
    .fetch_all(pool)
    .await?;

    let mut value_map: HashMap<i64, Vec<AttributeValue>> = HashMap::new();
    for v in values {
        value_map.entry(v.attribute_id).or_default().push(v);
    }

    Ok(attrs
        .into_iter()
        .map(|attribute| AttributeWithValues {
            values: value_map.remove(&attribute.id).unwrap_or_default(),
            attribute,
        })
        .collect())
}

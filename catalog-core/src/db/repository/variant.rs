//! Variant database operations
//!
//! Two halves:
//! 1. Factory: validate and persist a variant plus one association row per
//!    attribute selection (`create_variant`, `create_variant_batch`,
//!    `update_variant_scalars`).
//! 2. Attribute index: read-only reconstruction of a variant's flat
//!    attribute-name -> value map from the association rows.
//!
//! Nothing here commits. Callers pass the connection of their transaction;
//! an error returned mid-batch leaves the rollback to them.

use crate::sku;
use crate::utils::error::is_foreign_key_violation;
use crate::utils::{CatalogError, CatalogResult};
use rust_decimal::Decimal;
use shared::models::{Variant, VariantDeclaration, VariantUpdate};
use shared::util::{lookup_key, now_millis};
use sqlx::SqliteConnection;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::str::FromStr;

use super::attribute::ResolvedValues;

#[derive(Debug, sqlx::FromRow)]
struct VariantRow {
    id: i64,
    product_id: i64,
    sku: String,
    price: String,
    stock: i64,
    created_at: i64,
}

impl VariantRow {
    fn into_variant(self, attributes: BTreeMap<String, String>) -> CatalogResult<Variant> {
        Ok(Variant {
            price: parse_price(&self.price)?,
            id: self.id,
            product_id: self.product_id,
            sku: self.sku,
            stock: self.stock,
            attributes,
            created_at: self.created_at,
        })
    }
}

fn parse_price(raw: &str) -> CatalogResult<Decimal> {
    Decimal::from_str(raw).map_err(|e| CatalogError::Database(sqlx::Error::Decode(Box::new(e))))
}

const VARIANT_COLUMNS: &str = "id, product_id, sku, price, stock, created_at";

// =========================================================================
// Factory
// =========================================================================

/// Persist one variant and its attribute associations
///
/// The SKU is the declaration's override, verbatim, unless that is blank; then
/// it is generated from `product_name` and the selections in declared order.
pub async fn create_variant(
    conn: &mut SqliteConnection,
    product_id: i64,
    product_name: &str,
    decl: &VariantDeclaration,
    resolved: &ResolvedValues,
) -> CatalogResult<Variant> {
    let sku = match decl.explicit_sku() {
        Some(explicit) => explicit.to_string(),
        None => sku::generate(
            product_name,
            decl.attributes.iter().map(|(n, v)| (n.as_str(), v.as_str())),
        ),
    };
    if sku.is_empty() {
        return Err(CatalogError::validation(format!(
            "Cannot derive a SKU for product {product_name}: name and values have no usable characters"
        )));
    }

    validate_scalars(&sku, decl.price, decl.stock)?;
    let value_ids = selection_value_ids(&sku, decl, resolved)?;
    ensure_sku_available(conn, &sku, None).await?;

    let now = now_millis();
    let variant_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO variants (product_id, sku, sku_key, price, stock, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(product_id)
    .bind(&sku)
    .bind(lookup_key(&sku))
    .bind(decl.price.to_string())
    .bind(decl.stock)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        if is_foreign_key_violation(&e) {
            CatalogError::product_not_found(product_id)
        } else {
            CatalogError::from_sku_write(e, &sku)
        }
    })?;

    for value_id in value_ids {
        sqlx::query(
            "INSERT INTO variant_attribute_values (variant_id, attribute_value_id) VALUES (?, ?)",
        )
        .bind(variant_id)
        .bind(value_id)
        .execute(&mut *conn)
        .await?;
    }

    let attributes = attributes_of(conn, variant_id).await?;
    tracing::debug!(variant_id, product_id, sku = %sku, "Variant created");

    Ok(Variant {
        id: variant_id,
        product_id,
        sku,
        price: decl.price,
        stock: decl.stock,
        attributes,
        created_at: now,
    })
}

/// Persist variants in input order; the first failure aborts the batch
pub async fn create_variant_batch(
    conn: &mut SqliteConnection,
    product_id: i64,
    product_name: &str,
    decls: &[VariantDeclaration],
    resolved: &ResolvedValues,
) -> CatalogResult<Vec<Variant>> {
    let mut created = Vec::with_capacity(decls.len());
    for (index, decl) in decls.iter().enumerate() {
        match create_variant(conn, product_id, product_name, decl, resolved).await {
            Ok(variant) => created.push(variant),
            Err(e) => {
                tracing::warn!(product_id, index, error = %e, "Variant batch aborted");
                return Err(e);
            }
        }
    }
    Ok(created)
}

/// Update price / stock / SKU in place. Associations are left untouched.
pub async fn update_variant_scalars(
    conn: &mut SqliteConnection,
    variant_id: i64,
    update: &VariantUpdate,
) -> CatalogResult<Variant> {
    let row = find_row(conn, variant_id)
        .await?
        .ok_or_else(|| CatalogError::variant_not_found(variant_id))?;

    let sku = match update.sku.as_deref() {
        Some(s) if s.trim().is_empty() => {
            return Err(CatalogError::validation("SKU must not be blank"));
        }
        Some(s) => s.to_string(),
        None => row.sku.clone(),
    };
    let price = match update.price {
        Some(p) => p,
        None => parse_price(&row.price)?,
    };
    // Unchanged prices keep their stored text exactly
    let price_text = match update.price {
        Some(p) => p.to_string(),
        None => row.price.clone(),
    };
    let stock = update.stock.unwrap_or(row.stock);

    validate_scalars(&sku, price, stock)?;
    if lookup_key(&sku) != lookup_key(&row.sku) {
        ensure_sku_available(conn, &sku, Some(variant_id)).await?;
    }

    sqlx::query(
        r#"
        UPDATE variants SET sku = ?, sku_key = ?, price = ?, stock = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&sku)
    .bind(lookup_key(&sku))
    .bind(&price_text)
    .bind(stock)
    .bind(now_millis())
    .bind(variant_id)
    .execute(&mut *conn)
    .await
    .map_err(|e| CatalogError::from_sku_write(e, &sku))?;

    let attributes = attributes_of(conn, variant_id).await?;
    Ok(Variant {
        id: row.id,
        product_id: row.product_id,
        sku,
        price,
        stock,
        attributes,
        created_at: row.created_at,
    })
}

fn validate_scalars(sku: &str, price: Decimal, stock: i64) -> CatalogResult<()> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(CatalogError::InvalidVariant {
            sku: sku.to_string(),
            field: "price",
            reason: format!("must not be negative (got {price})"),
        });
    }
    if stock < 0 {
        return Err(CatalogError::InvalidVariant {
            sku: sku.to_string(),
            field: "stock",
            reason: format!("must not be negative (got {stock})"),
        });
    }
    Ok(())
}

/// Map each selection to its pooled value id, in declared order
///
/// A missing entry means the orchestration skipped resolution for it; that
/// is reported, never dropped.
fn selection_value_ids(
    sku: &str,
    decl: &VariantDeclaration,
    resolved: &ResolvedValues,
) -> CatalogResult<Vec<i64>> {
    let mut seen_attributes = HashSet::new();
    let mut ids = Vec::with_capacity(decl.attributes.len());

    for (name, value) in &decl.attributes {
        if !seen_attributes.insert(lookup_key(name)) {
            return Err(CatalogError::validation(format!(
                "Variant {sku} selects attribute {name} more than once"
            )));
        }
        let value_id = resolved
            .get(name, value)
            .ok_or_else(|| CatalogError::UnresolvedAttribute {
                sku: sku.to_string(),
                name: name.clone(),
                value: value.clone(),
            })?;
        ids.push(value_id);
    }
    Ok(ids)
}

/// SKUs are compared ignoring case on every write path
async fn ensure_sku_available(
    conn: &mut SqliteConnection,
    sku: &str,
    exclude_variant: Option<i64>,
) -> CatalogResult<()> {
    let taken: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM variants WHERE sku_key = ? AND (? IS NULL OR id <> ?) LIMIT 1",
    )
    .bind(lookup_key(sku))
    .bind(exclude_variant)
    .bind(exclude_variant)
    .fetch_optional(&mut *conn)
    .await?;

    if taken.is_some() {
        return Err(CatalogError::DuplicateSku {
            sku: sku.to_string(),
        });
    }
    Ok(())
}

// =========================================================================
// Attribute index (read-only)
// =========================================================================

/// Attribute name -> value for one variant
///
/// `NotFound` when the variant does not exist; an empty map when it exists
/// without associations.
pub async fn load_attributes_of(
    conn: &mut SqliteConnection,
    variant_id: i64,
) -> CatalogResult<BTreeMap<String, String>> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM variants WHERE id = ?)")
        .bind(variant_id)
        .fetch_one(&mut *conn)
        .await?;
    if !exists {
        return Err(CatalogError::variant_not_found(variant_id));
    }
    attributes_of(conn, variant_id).await
}

async fn attributes_of(
    conn: &mut SqliteConnection,
    variant_id: i64,
) -> CatalogResult<BTreeMap<String, String>> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        r#"
        SELECT a.name, v.value
        FROM variant_attribute_values vav
        JOIN attribute_values v ON v.id = vav.attribute_value_id
        JOIN attributes a ON a.id = v.attribute_id
        WHERE vav.variant_id = ?
        "#,
    )
    .bind(variant_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows.into_iter().collect())
}

async fn find_row(conn: &mut SqliteConnection, variant_id: i64) -> CatalogResult<Option<VariantRow>> {
    let row: Option<VariantRow> =
        sqlx::query_as(&format!("SELECT {VARIANT_COLUMNS} FROM variants WHERE id = ?"))
            .bind(variant_id)
            .fetch_optional(&mut *conn)
            .await?;
    Ok(row)
}

pub async fn find_variant(conn: &mut SqliteConnection, variant_id: i64) -> CatalogResult<Option<Variant>> {
    let Some(row) = find_row(conn, variant_id).await? else {
        return Ok(None);
    };
    let attributes = attributes_of(conn, variant_id).await?;
    row.into_variant(attributes).map(Some)
}

/// Lookup by SKU, ignoring case
pub async fn find_variant_by_sku(conn: &mut SqliteConnection, sku: &str) -> CatalogResult<Option<Variant>> {
    let row: Option<VariantRow> =
        sqlx::query_as(&format!("SELECT {VARIANT_COLUMNS} FROM variants WHERE sku_key = ?"))
            .bind(lookup_key(sku))
            .fetch_optional(&mut *conn)
            .await?;
    let Some(row) = row else {
        return Ok(None);
    };
    let attributes = attributes_of(conn, row.id).await?;
    row.into_variant(attributes).map(Some)
}

/// All variants of a product, oldest first, with attributes
pub async fn list_variants(conn: &mut SqliteConnection, product_id: i64) -> CatalogResult<Vec<Variant>> {
    let rows: Vec<VariantRow> = sqlx::query_as(&format!(
        "SELECT {VARIANT_COLUMNS} FROM variants WHERE product_id = ? ORDER BY id"
    ))
    .bind(product_id)
    .fetch_all(&mut *conn)
    .await?;
    if rows.is_empty() {
        return Ok(vec![]);
    }

    let assoc: Vec<(i64, String, String)> = sqlx::query_as(
        r#"
        SELECT vav.variant_id, a.name, v.value
        FROM variant_attribute_values vav
        JOIN variants var ON var.id = vav.variant_id
        JOIN attribute_values v ON v.id = vav.attribute_value_id
        JOIN attributes a ON a.id = v.attribute_id
        WHERE var.product_id = ?
        "#,
    )
    .bind(product_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut attr_map: HashMap<i64, BTreeMap<String, String>> = HashMap::new();
    for (variant_id, name, value) in assoc {
        attr_map.entry(variant_id).or_default().insert(name, value);
    }

    rows.into_iter()
        .map(|r| {
            let attributes = attr_map.remove(&r.id).unwrap_or_default();
            r.into_variant(attributes)
        })
        .collect()
}

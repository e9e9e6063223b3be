//! Variant-set removal and attribute-pool garbage collection
//!
//! Removing a variant set (a whole product's, or a single variant) also prunes
//! the shared attribute pool:
//!
//! 1. collect the attribute ids reachable from the set's associations, before
//!    anything is deleted;
//! 2. keep only the attributes that no association *outside* the set still
//!    reaches through any of their values;
//! 3. delete the set's associations, then its variants;
//! 4. delete each orphaned attribute together with **all** of its values.
//!
//! The check is per attribute, not per value. A value only the removed set
//! used survives when a sibling value of the same attribute is still in use
//! elsewhere; it stays in the pool unreferenced until its attribute is
//! collected as a whole.
//!
//! # Caller contract
//!
//! Nothing here checks order history. Before removing variants the caller
//! MUST have verified that no live order line references them.

use crate::db::repository::attribute::bulk_resolve;
use crate::db::repository::product::find_product;
use crate::db::repository::variant::create_variant_batch;
use crate::utils::{CatalogError, CatalogResult};
use serde::Serialize;
use shared::models::{AttributeDeclaration, Variant, VariantDeclaration};
use sqlx::SqliteConnection;

/// The variant set a collection pass removes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalScope {
    /// Every variant of one product
    Product(i64),
    /// One variant
    Variant(i64),
}

impl RemovalScope {
    /// `variants` column selecting the scope
    fn column(self) -> &'static str {
        match self {
            RemovalScope::Product(_) => "product_id",
            RemovalScope::Variant(_) => "id",
        }
    }

    fn id(self) -> i64 {
        match self {
            RemovalScope::Product(id) | RemovalScope::Variant(id) => id,
        }
    }
}

/// What one collection pass removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollectionReport {
    pub removed_variants: u64,
    pub removed_attributes: u64,
    pub removed_values: u64,
}

/// Result of a variant-set replacement
#[derive(Debug, Clone)]
pub struct Replacement {
    pub report: CollectionReport,
    pub variants: Vec<Variant>,
}

/// Remove the scoped variants and garbage-collect orphaned attributes
///
/// Runs inside the caller's transaction; a failure anywhere leaves the
/// rollback to the caller, so the original variants stay intact.
pub async fn collect(conn: &mut SqliteConnection, scope: RemovalScope) -> CatalogResult<CollectionReport> {
    let column = scope.column();
    let scope_id = scope.id();

    // 1. Attributes reachable from the scope, before deletion
    let candidates: Vec<i64> = sqlx::query_scalar(&format!(
        r#"
        SELECT DISTINCT v.attribute_id
        FROM variant_attribute_values vav
        JOIN variants var ON var.id = vav.variant_id
        JOIN attribute_values v ON v.id = vav.attribute_value_id
        WHERE var.{column} = ?
        ORDER BY v.attribute_id
        "#
    ))
    .bind(scope_id)
    .fetch_all(&mut *conn)
    .await?;

    // 2. Orphans: no association outside the scope reaches the attribute
    let mut orphans = Vec::new();
    for attribute_id in candidates {
        let used_elsewhere: bool = sqlx::query_scalar(&format!(
            r#"
            SELECT EXISTS(
                SELECT 1
                FROM variant_attribute_values vav
                JOIN variants var ON var.id = vav.variant_id
                JOIN attribute_values v ON v.id = vav.attribute_value_id
                WHERE v.attribute_id = ? AND var.{column} <> ?
            )
            "#
        ))
        .bind(attribute_id)
        .bind(scope_id)
        .fetch_one(&mut *conn)
        .await?;

        if !used_elsewhere {
            orphans.push(attribute_id);
        }
    }

    // 3. Associations, then variants
    sqlx::query(&format!(
        "DELETE FROM variant_attribute_values WHERE variant_id IN (SELECT id FROM variants WHERE {column} = ?)"
    ))
    .bind(scope_id)
    .execute(&mut *conn)
    .await?;

    let removed_variants = sqlx::query(&format!("DELETE FROM variants WHERE {column} = ?"))
        .bind(scope_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    // 4. Orphaned attributes and all of their values
    let mut report = CollectionReport {
        removed_variants,
        ..Default::default()
    };
    for attribute_id in orphans {
        report.removed_values += sqlx::query("DELETE FROM attribute_values WHERE attribute_id = ?")
            .bind(attribute_id)
            .execute(&mut *conn)
            .await?
            .rows_affected();
        report.removed_attributes += sqlx::query("DELETE FROM attributes WHERE id = ?")
            .bind(attribute_id)
            .execute(&mut *conn)
            .await?
            .rows_affected();
    }

    tracing::debug!(
        ?scope,
        removed_variants = report.removed_variants,
        removed_attributes = report.removed_attributes,
        removed_values = report.removed_values,
        "Variant set collected"
    );
    Ok(report)
}

/// Delete every variant of a product and collect the pool
///
/// Caller contract: no live order line references these variants.
pub async fn delete_variant_set(conn: &mut SqliteConnection, product_id: i64) -> CatalogResult<CollectionReport> {
    if find_product(conn, product_id).await?.is_none() {
        return Err(CatalogError::product_not_found(product_id));
    }
    collect(conn, RemovalScope::Product(product_id)).await
}

/// Replace a product's whole variant set
///
/// Deletes and collects first, then resolves the declarations and creates the
/// new set. Values collected in the first step are re-created when the new
/// set still selects them. An empty `specs` leaves the product with no
/// variants.
///
/// Caller contract: no live order line references the current variants.
pub async fn replace_variant_set(
    conn: &mut SqliteConnection,
    product_id: i64,
    product_name: &str,
    attributes: &[AttributeDeclaration],
    specs: &[VariantDeclaration],
) -> CatalogResult<Replacement> {
    let report = delete_variant_set(conn, product_id).await?;

    let variants = if specs.is_empty() {
        Vec::new()
    } else {
        let resolved = bulk_resolve(conn, attributes).await?;
        create_variant_batch(conn, product_id, product_name, specs, &resolved).await?
    };

    Ok(Replacement { report, variants })
}

/// Delete one variant and collect the pool
///
/// Attributes still used by the product's other variants survive.
///
/// Caller contract: no live order line references this variant.
pub async fn delete_variant(conn: &mut SqliteConnection, variant_id: i64) -> CatalogResult<CollectionReport> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM variants WHERE id = ?)")
        .bind(variant_id)
        .fetch_one(&mut *conn)
        .await?;
    if !exists {
        return Err(CatalogError::variant_not_found(variant_id));
    }
    collect(conn, RemovalScope::Variant(variant_id)).await
}

//! Catalog Service - product + variant authoring over one transaction
//!
//! Every public writer opens its own `BEGIN IMMEDIATE` transaction and commits
//! only when all of its writes succeeded. An error (or a dropped future)
//! discards the transaction, so a product and its variants appear together or
//! not at all. Waiting on another writer past the busy timeout surfaces as
//! `ConcurrencyConflict`.
//!
//! # Caller contract
//!
//! Not enforced here, owed by every caller:
//!
//! - **The owning product must exist** before variants are attached to it.
//!   `create_composite` guarantees this itself; the other writers return
//!   `NotFound` for an unknown product.
//! - **No live order line may reference a variant being removed.**
//!   `replace_variant_set`, `update_composite` (with variants),
//!   `delete_variant_set`, `delete_variant` and `delete_product` remove
//!   variants unconditionally. Checking order history first is the caller's
//!   job; skipping it is a caller defect.

use crate::db::DbService;
use crate::db::repository::attribute::{self, ResolvedValues};
use crate::db::repository::{product, variant};
use crate::services::garbage_collector::{self, CollectionReport, Replacement};
use crate::utils::{CatalogError, CatalogResult};
use shared::models::{
    AttributeDeclaration, AttributeWithValues, ProductDraft, ProductWithVariants, Variant,
    VariantDeclaration, VariantUpdate,
};
use std::collections::BTreeMap;

/// Composite product/variant orchestrator
#[derive(Debug, Clone)]
pub struct CatalogService {
    db: DbService,
}

impl CatalogService {
    pub fn new(db: DbService) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DbService {
        &self.db
    }

    // =========================================================================
    // Composite writes
    // =========================================================================

    /// Create a product, resolve its attributes and create its variants
    ///
    /// Any failure after the product insert rolls the product back too.
    pub async fn create_composite(
        &self,
        draft: &ProductDraft,
        attributes: &[AttributeDeclaration],
        variants: &[VariantDeclaration],
    ) -> CatalogResult<ProductWithVariants> {
        let mut tx = self.db.begin_write().await?;

        let product = product::create_product(&mut tx, draft).await?;
        let resolved = attribute::bulk_resolve(&mut tx, attributes).await?;
        let variants =
            variant::create_variant_batch(&mut tx, product.id, &product.name, variants, &resolved)
                .await?;

        tx.commit().await?;

        tracing::info!(
            product_id = product.id,
            name = %product.name,
            variants = variants.len(),
            "Composite product created"
        );
        Ok(ProductWithVariants { product, variants })
    }

    /// Update the product's scalar fields, and its variant set when given
    ///
    /// An empty `variants` leaves every existing variant untouched, even when
    /// `attributes` is non-empty; nothing is resolved in that case either.
    /// A non-empty `variants` replaces the whole set (see caller contract).
    pub async fn update_composite(
        &self,
        product_id: i64,
        draft: &ProductDraft,
        attributes: &[AttributeDeclaration],
        variants: &[VariantDeclaration],
    ) -> CatalogResult<ProductWithVariants> {
        let mut tx = self.db.begin_write().await?;

        let product = product::update_product(&mut tx, product_id, draft).await?;
        let variants = if variants.is_empty() {
            variant::list_variants(&mut tx, product_id).await?
        } else {
            let replacement = garbage_collector::replace_variant_set(
                &mut tx,
                product_id,
                &product.name,
                attributes,
                variants,
            )
            .await?;
            log_collection(product_id, &replacement.report);
            replacement.variants
        };

        tx.commit().await?;

        tracing::info!(product_id, variants = variants.len(), "Composite product updated");
        Ok(ProductWithVariants { product, variants })
    }

    /// Replace the product's whole variant set; `variants` may be empty
    ///
    /// Caller contract: no live order line references the current variants.
    pub async fn replace_variant_set(
        &self,
        product_id: i64,
        attributes: &[AttributeDeclaration],
        variants: &[VariantDeclaration],
    ) -> CatalogResult<Replacement> {
        let mut tx = self.db.begin_write().await?;

        let product = product::require_product(&mut tx, product_id).await?;
        let replacement = garbage_collector::replace_variant_set(
            &mut tx,
            product_id,
            &product.name,
            attributes,
            variants,
        )
        .await?;

        tx.commit().await?;

        log_collection(product_id, &replacement.report);
        Ok(replacement)
    }

    /// Delete every variant of a product, keeping the product row
    ///
    /// Caller contract: no live order line references these variants.
    pub async fn delete_variant_set(&self, product_id: i64) -> CatalogResult<CollectionReport> {
        let mut tx = self.db.begin_write().await?;
        let report = garbage_collector::delete_variant_set(&mut tx, product_id).await?;
        tx.commit().await?;

        log_collection(product_id, &report);
        Ok(report)
    }

    /// Delete a product with its variants and collect the attribute pool
    ///
    /// Caller contract: no live order line references the product's variants.
    pub async fn delete_product(&self, product_id: i64) -> CatalogResult<CollectionReport> {
        let mut tx = self.db.begin_write().await?;
        let report = garbage_collector::delete_variant_set(&mut tx, product_id).await?;
        product::delete_product_row(&mut tx, product_id).await?;
        tx.commit().await?;

        tracing::info!(product_id, "Product deleted");
        log_collection(product_id, &report);
        Ok(report)
    }

    // =========================================================================
    // Single variant
    // =========================================================================

    /// Update price / stock / SKU of one variant in place
    pub async fn update_variant(&self, variant_id: i64, update: &VariantUpdate) -> CatalogResult<Variant> {
        let mut tx = self.db.begin_write().await?;
        let variant = variant::update_variant_scalars(&mut tx, variant_id, update).await?;
        tx.commit().await?;
        Ok(variant)
    }

    /// Delete one variant
    ///
    /// Caller contract: no live order line references this variant.
    pub async fn delete_variant(&self, variant_id: i64) -> CatalogResult<CollectionReport> {
        let mut tx = self.db.begin_write().await?;
        let report = garbage_collector::delete_variant(&mut tx, variant_id).await?;
        tx.commit().await?;

        tracing::info!(
            variant_id,
            removed_attributes = report.removed_attributes,
            "Variant deleted"
        );
        Ok(report)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get_product(&self, product_id: i64) -> CatalogResult<ProductWithVariants> {
        let mut conn = self.db.pool.acquire().await?;
        let product = product::require_product(&mut conn, product_id).await?;
        let variants = variant::list_variants(&mut conn, product_id).await?;
        Ok(ProductWithVariants { product, variants })
    }

    pub async fn get_variant(&self, variant_id: i64) -> CatalogResult<Variant> {
        let mut conn = self.db.pool.acquire().await?;
        variant::find_variant(&mut conn, variant_id)
            .await?
            .ok_or_else(|| CatalogError::variant_not_found(variant_id))
    }

    /// Lookup by SKU, ignoring case
    pub async fn find_variant_by_sku(&self, sku: &str) -> CatalogResult<Option<Variant>> {
        let mut conn = self.db.pool.acquire().await?;
        variant::find_variant_by_sku(&mut conn, sku).await
    }

    pub async fn list_variants(&self, product_id: i64) -> CatalogResult<Vec<Variant>> {
        let mut conn = self.db.pool.acquire().await?;
        product::require_product(&mut conn, product_id).await?;
        variant::list_variants(&mut conn, product_id).await
    }

    /// Attribute name -> value of one variant
    pub async fn load_attributes_of(&self, variant_id: i64) -> CatalogResult<BTreeMap<String, String>> {
        let mut conn = self.db.pool.acquire().await?;
        variant::load_attributes_of(&mut conn, variant_id).await
    }

    /// The whole attribute pool, including values no variant references
    pub async fn attribute_pool(&self) -> CatalogResult<Vec<AttributeWithValues>> {
        attribute::list_pool(&self.db.pool).await
    }

    /// Resolve declarations into the pool without attaching them to anything
    pub async fn resolve_attributes(
        &self,
        declarations: &[AttributeDeclaration],
    ) -> CatalogResult<ResolvedValues> {
        let mut tx = self.db.begin_write().await?;
        let resolved = attribute::bulk_resolve(&mut tx, declarations).await?;
        tx.commit().await?;
        Ok(resolved)
    }
}

fn log_collection(product_id: i64, report: &CollectionReport) {
    tracing::info!(
        product_id,
        removed_variants = report.removed_variants,
        removed_attributes = report.removed_attributes,
        removed_values = report.removed_values,
        "Variant set removed"
    );
}

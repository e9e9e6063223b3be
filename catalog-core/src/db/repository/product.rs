//! Product database operations
//!
//! Only the scalar product row. Every function takes the caller's connection
//! so product writes share the transaction of the variant writes.

use crate::utils::{CatalogError, CatalogResult};
use shared::models::{Product, ProductDraft};
use shared::util::now_millis;
use sqlx::SqliteConnection;

pub async fn create_product(conn: &mut SqliteConnection, draft: &ProductDraft) -> CatalogResult<Product> {
    validate_draft(draft)?;
    let now = now_millis();

    let product: Product = sqlx::query_as(
        r#"
        INSERT INTO products (name, description, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id, name, description, is_active, created_at, updated_at
        "#,
    )
    .bind(draft.name.trim())
    .bind(&draft.description)
    .bind(draft.is_active.unwrap_or(true))
    .bind(now)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    Ok(product)
}

/// Overwrite the scalar fields; `is_active` is kept when the draft omits it
pub async fn update_product(
    conn: &mut SqliteConnection,
    product_id: i64,
    draft: &ProductDraft,
) -> CatalogResult<Product> {
    validate_draft(draft)?;

    let product: Option<Product> = sqlx::query_as(
        r#"
        UPDATE products SET
            name = ?,
            description = ?,
            is_active = COALESCE(?, is_active),
            updated_at = ?
        WHERE id = ?
        RETURNING id, name, description, is_active, created_at, updated_at
        "#,
    )
    .bind(draft.name.trim())
    .bind(&draft.description)
    .bind(draft.is_active)
    .bind(now_millis())
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;

    product.ok_or_else(|| CatalogError::product_not_found(product_id))
}

pub async fn find_product(conn: &mut SqliteConnection, product_id: i64) -> CatalogResult<Option<Product>> {
    let product: Option<Product> = sqlx::query_as(
        "SELECT id, name, description, is_active, created_at, updated_at FROM products WHERE id = ?",
    )
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(product)
}

pub async fn require_product(conn: &mut SqliteConnection, product_id: i64) -> CatalogResult<Product> {
    find_product(conn, product_id)
        .await?
        .ok_or_else(|| CatalogError::product_not_found(product_id))
}

/// Delete the product row. Variants must already be gone.
pub async fn delete_product_row(conn: &mut SqliteConnection, product_id: i64) -> CatalogResult<()> {
    let rows = sqlx::query("DELETE FROM products WHERE id = ?")
        .bind(product_id)
        .execute(&mut *conn)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(CatalogError::product_not_found(product_id));
    }
    Ok(())
}

fn validate_draft(draft: &ProductDraft) -> CatalogResult<()> {
    if draft.name.trim().is_empty() {
        return Err(CatalogError::validation("Product name must not be blank"));
    }
    Ok(())
}

//! Catalog error type
//!
//! [`CatalogError`] is what every repository and service function returns.
//! It converts into the coded [`AppError`] handed to callers, carrying the
//! offending SKU / attribute / value in `details`.
//!
//! Any error aborts the enclosing transaction: functions return early with
//! `?` and the uncommitted `sqlx::Transaction` rolls back when dropped.

use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Catalog error types
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Blank names/values, malformed declarations
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Scalar constraint violated on a variant (negative price or stock)
    #[error("Invalid variant {sku}: {field} {reason}")]
    InvalidVariant {
        sku: String,
        field: &'static str,
        reason: String,
    },

    #[error("SKU already exists: {sku}")]
    DuplicateSku { sku: String },

    /// A selection reached the variant factory without being resolved
    /// against the attribute pool. Always an orchestration defect.
    #[error("Unresolved attribute selection {name}:{value} on variant {sku}")]
    UnresolvedAttribute {
        sku: String,
        name: String,
        value: String,
    },

    /// Lost a uniqueness race or the write lock to a concurrent writer
    #[error("Concurrent modification: {0}")]
    ConcurrencyConflict(String),

    #[error("{entity} {key} not found")]
    NotFound { entity: &'static str, key: String },

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

impl CatalogError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn product_not_found(id: i64) -> Self {
        Self::NotFound {
            entity: "Product",
            key: id.to_string(),
        }
    }

    pub fn variant_not_found(id: i64) -> Self {
        Self::NotFound {
            entity: "Variant",
            key: id.to_string(),
        }
    }

    /// Map a failed insert/update on `variants`: a unique-constraint hit on
    /// the SKU key means another writer committed the same SKU after our
    /// pre-check.
    pub(crate) fn from_sku_write(err: sqlx::Error, sku: &str) -> Self {
        if is_unique_violation(&err) {
            tracing::warn!(sku = %sku, "SKU uniqueness race lost");
            Self::ConcurrencyConflict(format!("SKU {sku} was taken by a concurrent write"))
        } else {
            Self::from(err)
        }
    }

    /// The coded error this maps to
    pub fn code(&self) -> ErrorCode {
        match self {
            CatalogError::Validation(_) => ErrorCode::ValidationFailed,
            CatalogError::InvalidVariant { field, .. } => match *field {
                "stock" => ErrorCode::VariantInvalidStock,
                _ => ErrorCode::ProductInvalidPrice,
            },
            CatalogError::DuplicateSku { .. } => ErrorCode::VariantSkuExists,
            CatalogError::UnresolvedAttribute { .. } => ErrorCode::AttributeUnresolved,
            CatalogError::ConcurrencyConflict(_) => ErrorCode::ConcurrencyConflict,
            CatalogError::NotFound { entity, .. } => match *entity {
                "Product" => ErrorCode::ProductNotFound,
                "Variant" => ErrorCode::VariantNotFound,
                "Attribute" => ErrorCode::AttributeNotFound,
                _ => ErrorCode::NotFound,
            },
            CatalogError::Database(_) | CatalogError::Migration(_) => ErrorCode::DatabaseError,
            CatalogError::Config(_) => ErrorCode::ConfigError,
        }
    }
}

/// Lock contention becomes `ConcurrencyConflict`: a stale WAL snapshot
/// upgrading to write (`SQLITE_BUSY_SNAPSHOT`), or a database still locked
/// after the busy timeout.
impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        if is_lock_contention(&err) {
            tracing::warn!(error = %err, "Write lost to a concurrent transaction");
            return Self::ConcurrencyConflict(
                "Catalog was modified by a concurrent transaction".to_string(),
            );
        }
        Self::Database(err)
    }
}

/// Whether a sqlx error is `SQLITE_BUSY` / `SQLITE_LOCKED` (any extended code)
pub(crate) fn is_lock_contention(err: &sqlx::Error) -> bool {
    const SQLITE_BUSY: i32 = 5;
    const SQLITE_LOCKED: i32 = 6;

    let sqlx::Error::Database(db) = err else {
        return false;
    };
    db.code()
        .and_then(|code| code.parse::<i32>().ok())
        .is_some_and(|code| matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
}

/// Whether a sqlx error is a UNIQUE constraint violation
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Whether a sqlx error is a FOREIGN KEY constraint violation
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        let code = err.code();
        match err {
            CatalogError::InvalidVariant { sku, field, reason } => {
                AppError::with_message(code, format!("Variant {sku}: {field} {reason}"))
                    .with_detail("sku", sku)
                    .with_detail("field", field)
            }
            CatalogError::DuplicateSku { sku } => {
                AppError::with_message(code, format!("SKU {sku} already exists"))
                    .with_detail("sku", sku)
            }
            CatalogError::UnresolvedAttribute { sku, name, value } => AppError::with_message(
                code,
                format!("Attribute {name}:{value} was not resolved for variant {sku}"),
            )
            .with_detail("sku", sku)
            .with_detail("attribute", name)
            .with_detail("value", value),
            CatalogError::NotFound { entity, key } => {
                AppError::with_message(code, format!("{entity} {key} not found"))
                    .with_detail("resource", entity)
                    .with_detail("id", key)
            }
            CatalogError::Database(e) => {
                tracing::error!(target: "database", error = %e, "Database error occurred");
                AppError::new(code)
            }
            CatalogError::Migration(e) => {
                tracing::error!(target: "database", error = %e, "Migration error occurred");
                AppError::new(code)
            }
            other => AppError::with_message(code, other.to_string()),
        }
    }
}

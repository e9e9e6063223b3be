//! Repository Module
//!
//! Row-level operations on the catalog tables. Every writer takes the
//! caller's `&mut SqliteConnection` so a whole product-authoring operation
//! runs inside one transaction owned by the service layer.

// Attribute pool
pub mod attribute;

// Product domain
pub mod product;
pub mod variant;

// Re-exports
pub use attribute::{ResolvedValues, bulk_resolve, resolve_attribute, resolve_value};
pub use variant::{create_variant, create_variant_batch, load_attributes_of};

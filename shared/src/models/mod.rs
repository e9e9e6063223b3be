//! Data models
//!
//! Shared between the catalog core and its callers.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY); timestamps are epoch millis.

pub mod attribute;
pub mod product;
pub mod variant;

// Re-exports
pub use attribute::*;
pub use product::*;
pub use variant::*;

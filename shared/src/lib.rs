//! Shared types for the variant catalog
//!
//! Common types used by the catalog core and its callers: data models,
//! the coded error vocabulary, and small utilities.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use error::{AppError, AppResult, ErrorCategory, ErrorCode};
pub use serde::{Deserialize, Serialize};

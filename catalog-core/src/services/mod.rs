//! Services
//!
//! - `catalog`: transaction-owning orchestration of product + variant writes
//! - `garbage_collector`: variant-set removal and attribute-pool pruning

pub mod catalog;
pub mod garbage_collector;

pub use catalog::CatalogService;
pub use garbage_collector::{CollectionReport, RemovalScope, Replacement};

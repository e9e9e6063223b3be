//! Catalog Core - 商品变体目录核心
//!
//! Shared attribute pool, deterministic SKU synthesis, variant creation and
//! reference-counted cleanup of the pool when variant sets are replaced or
//! removed. Every public operation is one SQLite transaction.
//!
//! # 模块结构
//!
//! ```text
//! catalog-core/src/
//! ├── core/          # 配置
//! ├── db/            # 连接池、迁移、repository
//! ├── services/      # CatalogService, 垃圾回收
//! ├── sku.rs         # SKU 生成
//! └── utils/         # 错误、日志
//! ```

pub mod core;
pub mod db;
pub mod services;
pub mod sku;
pub mod utils;

// Re-export 公共类型
pub use core::Config;
pub use db::DbService;
pub use services::{CatalogService, CollectionReport, Replacement};
pub use utils::{CatalogError, CatalogResult};

// Re-export logger functions
pub use utils::logger::init_logger_with_file;

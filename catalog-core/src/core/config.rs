/// 目录服务配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | CATALOG_DATABASE_PATH | catalog.db | SQLite 文件路径 (`:memory:` 为内存库) |
/// | CATALOG_MAX_CONNECTIONS | 5 | 连接池大小 |
/// | CATALOG_BUSY_TIMEOUT_MS | 5000 | 写冲突等待时间(毫秒) |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | (none) | 日志目录, 未设置则输出到 stdout |
/// | ENVIRONMENT | development | 运行环境 |
///
/// # 示例
///
/// ```ignore
/// CATALOG_DATABASE_PATH=/data/catalog.db LOG_LEVEL=debug cargo run --bin catalog-migrate
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file, or `:memory:`
    pub database_path: String,
    /// Pool size (forced to 1 for in-memory databases)
    pub max_connections: u32,
    /// How long a writer waits on a locked database before failing
    pub busy_timeout_ms: u64,
    pub log_level: String,
    pub log_dir: Option<String>,
    /// 运行环境: development | staging | production
    pub environment: String,
}

pub const IN_MEMORY: &str = ":memory:";

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "catalog.db".into(),
            max_connections: 5,
            busy_timeout_ms: 5000,
            log_level: "info".into(),
            log_dir: None,
            environment: "development".into(),
        }
    }
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            database_path: std::env::var("CATALOG_DATABASE_PATH")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.database_path),
            max_connections: std::env::var("CATALOG_MAX_CONNECTIONS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.max_connections),
            busy_timeout_ms: std::env::var("CATALOG_BUSY_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.busy_timeout_ms),
            log_level: std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_dir: std::env::var("LOG_DIR").ok().filter(|s| !s.is_empty()),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    /// In-memory database, for tests and throwaway tooling
    pub fn in_memory() -> Self {
        Self {
            database_path: IN_MEMORY.into(),
            ..Self::default()
        }
    }

    /// File-backed database at `path`, other settings default
    pub fn with_database_path(path: impl Into<String>) -> Self {
        Self {
            database_path: path.into(),
            ..Self::default()
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path == IN_MEMORY
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_config() {
        let config = Config::in_memory();
        assert!(config.is_in_memory());
        assert_eq!(config.busy_timeout_ms, 5000);
        assert!(!config.is_production());
    }

    #[test]
    fn test_file_config() {
        let config = Config::with_database_path("/tmp/catalog-test.db");
        assert!(!config.is_in_memory());
        assert_eq!(config.max_connections, 5);
    }
}

use catalog_core::{CatalogService, Config, DbService, init_logger_with_file};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 加载 .env 和配置
    dotenv::dotenv().ok();
    let config = Config::from_env();

    // 2. 日志
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());
    tracing::info!(
        environment = %config.environment,
        path = %config.database_path,
        "Catalog migrate starting..."
    );

    // 3. 打开数据库 (自动迁移)
    let db = DbService::new(&config).await.inspect_err(|e| {
        tracing::error!(error = %e, "Failed to open catalog database");
    })?;

    // 4. 汇报属性池
    let catalog = CatalogService::new(db);
    let pool = catalog.attribute_pool().await?;
    let values: usize = pool.iter().map(|a| a.values.len()).sum();
    tracing::info!(attributes = pool.len(), values, "Catalog database ready");

    Ok(())
}

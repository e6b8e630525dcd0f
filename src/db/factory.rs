use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use super::sqlite::SqliteDatabase;
use super::traits::Database;
use crate::util::config::DatabaseConfig;

/// 根据配置创建并初始化数据库
pub async fn create_database(config: &DatabaseConfig) -> Result<Arc<dyn Database>> {
    info!("[card] 连接SQLite数据库: {}", config.path);
    let db = SqliteDatabase::new(&config.path, config.max_connections).await?;
    db.initialize().await?;
    info!("[ok] SQLite数据库连接和初始化成功");
    Ok(Arc::new(db))
}

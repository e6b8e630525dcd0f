//! 数据库初始化模块
//! 负责根据配置创建数据库连接并执行健康检查

use crate::db;
use crate::util::config::DatabaseConfig;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// 数据库初始化器
pub struct DatabaseInitializer;

impl DatabaseInitializer {
    /// 根据配置创建数据库实例，建表后验证连接
    pub async fn create_from_config(config: &DatabaseConfig) -> Result<Arc<dyn db::Database>> {
        info!("[cabinet] 初始化数据库连接...");
        if config.path == db::sqlite::connection::MEMORY_PATH {
            warn!("[warn] 使用内存数据库，进程退出后账户与报告将丢失");
        }

        let database = db::create_database(config)
            .await
            .with_context(|| format!("数据库初始化失败: {}", config.path))?;

        Self::validate_connection(&database).await?;
        Ok(database)
    }

    /// 验证数据库连接
    pub async fn validate_connection(database: &Arc<dyn db::Database>) -> Result<()> {
        info!("[search] 验证数据库连接...");
        if !database.health_check().await? {
            anyhow::bail!("数据库健康检查未通过");
        }
        info!("[ok] 数据库连接验证成功");
        Ok(())
    }

    /// 执行数据库健康检查
    pub async fn health_check(database: &Arc<dyn db::Database>) -> DatabaseHealth {
        let start_time = Instant::now();
        let result = database.health_check().await;
        let response_time_ms = start_time.elapsed().as_millis() as u64;

        match result {
            Ok(true) => DatabaseHealth::healthy(response_time_ms),
            Ok(false) => DatabaseHealth::unhealthy("健康检查查询返回异常".to_string()),
            Err(e) => DatabaseHealth::unhealthy(e.to_string()),
        }
    }
}

/// 数据库健康状态
#[derive(Debug, Clone)]
pub struct DatabaseHealth {
    pub is_healthy: bool,
    /// 响应时间（毫秒）
    pub response_time_ms: u64,
    pub error_message: Option<String>,
    pub last_check: chrono::DateTime<chrono::Utc>,
}

impl DatabaseHealth {
    pub fn healthy(response_time_ms: u64) -> Self {
        Self {
            is_healthy: true,
            response_time_ms,
            error_message: None,
            last_check: chrono::Utc::now(),
        }
    }

    pub fn unhealthy(error: String) -> Self {
        Self {
            is_healthy: false,
            response_time_ms: 0,
            error_message: Some(error),
            last_check: chrono::Utc::now(),
        }
    }
}

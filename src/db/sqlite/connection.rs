//! SQLite连接管理
//! 处理数据库连接池的创建和管理

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

pub const MEMORY_PATH: &str = ":memory:";

/// SQLite连接管理器
pub struct ConnectionManager;

impl ConnectionManager {
    /// 创建新的SQLite连接池
    pub async fn create_pool(db_path: &str, max_connections: u32) -> Result<SqlitePool> {
        if db_path == MEMORY_PATH {
            return Self::create_memory_pool().await;
        }

        // 确保数据库目录存在
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("创建数据库目录失败: {}", parent.display()))?;
            }
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .with_context(|| format!("连接SQLite数据库失败: {}", db_path))?;

        info!("Successfully connected to SQLite database: {}", db_path);
        Ok(pool)
    }

    /// 内存库每个连接相互独立，只保留一个永不回收的连接
    async fn create_memory_pool() -> Result<SqlitePool> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("创建SQLite内存数据库失败")?;

        info!("Using in-memory SQLite database");
        Ok(pool)
    }

    /// 获取连接池配置信息
    pub fn get_pool_info(pool: &SqlitePool) -> PoolInfo {
        let size = pool.size();
        let idle_connections = pool.num_idle();

        PoolInfo {
            size,
            idle_connections,
            active_connections: (size as usize).saturating_sub(idle_connections),
        }
    }
}

/// 连接池信息
#[derive(Debug)]
pub struct PoolInfo {
    pub size: u32,
    pub idle_connections: usize,
    pub active_connections: usize,
}

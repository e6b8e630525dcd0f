//! 服务器模块
//!
//! - 配置管理 (config.rs)
//! - 数据库初始化 (database.rs)
//! - HTTP服务器设置 (http.rs)

pub mod config;
pub mod database;
pub mod http;

pub use config::{ConfigManager, ConfigValidationReport};
pub use database::{DatabaseHealth, DatabaseInitializer};
pub use http::{HttpServer, ServerManager};

use crate::build_info;
use crate::util::config::Config;
use crate::AppState;
use anyhow::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

/// 服务器引导程序 - 统一的服务器启动入口
pub struct ServerBootstrap {
    config: Config,
    validation_report: ConfigValidationReport,
    _log_guard: Option<WorkerGuard>,
}

impl ServerBootstrap {
    pub async fn new() -> Result<Self> {
        let bootstrap = Self::load().await?;
        if bootstrap.validation_report.has_errors() {
            return Err(anyhow::anyhow!(
                "配置验证失败: {} 个错误",
                bootstrap.validation_report.error_count()
            ));
        }

        info!("[ok] 服务器引导程序初始化完成");
        Ok(bootstrap)
    }

    /// 加载配置并初始化日志，不因验证错误而失败
    async fn load() -> Result<Self> {
        let (config, validation_report) = ConfigManager::load_and_validate()?;
        let log_guard = ConfigManager::initialize_logging(&config)?;

        // 日志初始化之后再输出一次验证结果
        for error in &validation_report.errors {
            tracing::error!(event = "config.invalid", field = %error.field, message = %error.message);
        }
        for warning in &validation_report.warnings {
            tracing::warn!(event = "config.warning", field = %warning.field, message = %warning.message);
        }

        Ok(Self {
            config,
            validation_report,
            _log_guard: log_guard,
        })
    }

    /// 启动服务器，阻塞直到关闭
    pub async fn start(self) -> Result<()> {
        info!("=== ESG分析服务启动 ===");
        info!("版本信息: {}", build_info::summary());
        info!(
            "监听地址: {}:{}",
            self.config.server.host, self.config.server.port
        );

        let app_state = self.create_app_state().await?;
        let server = ServerManager::create_server(&self.config.server, app_state).await?;
        ServerManager::start_server(server).await
    }

    async fn create_app_state(&self) -> Result<AppState> {
        info!("[build] 创建应用状态...");
        let database = DatabaseInitializer::create_from_config(&self.config.database).await?;
        let app_state = AppState::new(self.config.clone(), database)?;
        info!("[ok] 应用状态创建完成");
        Ok(app_state)
    }

    /// 执行健康检查：数据库连通性与配置有效性
    pub async fn health_check(&self) -> SystemHealthReport {
        info!("[search] 执行系统健康检查...");
        build_health_report(&self.config, &self.validation_report).await
    }
}

/// 配置无效或数据库不可用都体现在报告中，不返回错误
async fn build_health_report(
    config: &Config,
    validation_report: &ConfigValidationReport,
) -> SystemHealthReport {
    let database_health = match DatabaseInitializer::create_from_config(&config.database).await {
        Ok(database) => DatabaseInitializer::health_check(&database).await,
        Err(e) => DatabaseHealth::unhealthy(format!("{:#}", e)),
    };
    let config_valid = validation_report.is_valid();

    SystemHealthReport {
        overall_healthy: database_health.is_healthy && config_valid,
        database_health,
        config_valid,
        validation_errors: validation_report
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect(),
        validation_warnings: validation_report
            .warnings
            .iter()
            .map(|w| format!("{}: {}", w.field, w.message))
            .collect(),
        check_time: chrono::Utc::now(),
    }
}

/// 系统健康检查报告
#[derive(Debug, Clone)]
pub struct SystemHealthReport {
    pub overall_healthy: bool,
    pub database_health: DatabaseHealth,
    pub config_valid: bool,
    pub validation_errors: Vec<String>,
    pub validation_warnings: Vec<String>,
    pub check_time: chrono::DateTime<chrono::Utc>,
}

/// 便捷函数：快速启动服务器
pub async fn start_server() -> Result<()> {
    let bootstrap = ServerBootstrap::new().await?;
    bootstrap.start().await
}

/// 便捷函数：执行健康检查
pub async fn check_system_health() -> Result<SystemHealthReport> {
    let bootstrap = ServerBootstrap::load().await?;
    Ok(bootstrap.health_check().await)
}

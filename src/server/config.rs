//! 配置管理模块
//! 负责配置文件的查找、加载、验证以及日志系统初始化

use crate::util::config::loader::ConfigLoader;
use crate::util::config::{Config, ConfigValidator, ValidationReport};
use crate::util::log::{cleanup_old_logs, log_init_with_config, resolve_log_dir};
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

pub const CONFIG_FILE_NAME: &str = "config.yaml";
pub const LOG_FILE_PREFIX: &str = "esg-analyzer";

/// 配置验证报告
pub type ConfigValidationReport = ValidationReport;

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 查找并加载配置文件，返回配置与验证报告
    pub fn load_and_validate() -> Result<(Config, ConfigValidationReport)> {
        let config_path = Self::find_config_file_path(CONFIG_FILE_NAME);
        Self::load_and_validate_from(&config_path)
    }

    /// 从指定路径加载；文件不存在时写出模板配置
    pub fn load_and_validate_from(config_path: &Path) -> Result<(Config, ConfigValidationReport)> {
        info!("[clipboard] 开始加载配置文件: {}", config_path.display());

        let config = match ConfigLoader::load_with_env_overrides(config_path) {
            Ok(config) => config,
            Err(e) => {
                warn!("[warn] 配置文件读取失败: {} - {:#}", config_path.display(), e);
                Self::handle_config_load_failure(config_path)?
            }
        };

        let validation_report = Self::validate_config(&config);

        info!("[ok] 配置加载完成");
        Ok((config, validation_report))
    }

    /// 初始化日志系统并清理过期日志
    pub fn initialize_logging(config: &Config) -> Result<Option<WorkerGuard>> {
        let log_guard = log_init_with_config(LOG_FILE_PREFIX, &config.logging)?;

        if let Some(retention_days) = config.logging.file.retention_days {
            if config.logging.file.enabled {
                let log_dir = resolve_log_dir(&config.logging.file.directory);
                match cleanup_old_logs(&log_dir, LOG_FILE_PREFIX, retention_days) {
                    Ok(_) => info!("[ok] 日志清理完成，保留 {} 天", retention_days),
                    Err(e) => warn!("日志清理失败: {}", e),
                }
            }
        }

        info!("[ok] 日志系统初始化完成");
        Ok(log_guard)
    }

    /// 依次查找 ./config/、../config/、可执行文件上级的 config/、当前目录
    pub fn find_config_file_path(filename: &str) -> PathBuf {
        let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|path| path.parent().map(Path::to_path_buf));
        Self::find_config_file_in(filename, &current_dir, exe_dir.as_deref())
    }

    fn find_config_file_in(filename: &str, current_dir: &Path, exe_dir: Option<&Path>) -> PathBuf {
        let config_in_current = current_dir.join("config").join(filename);
        if config_in_current.exists() {
            return config_in_current;
        }

        // 在 bin/ 目录下运行时使用上级目录的 config/
        if let Some(parent) = current_dir.parent() {
            let config_in_parent = parent.join("config").join(filename);
            if config_in_parent.exists() {
                return config_in_parent;
            }
        }

        if let Some(exe_dir) = exe_dir {
            if exe_dir.file_name() == Some(std::ffi::OsStr::new("bin")) {
                if let Some(project_root) = exe_dir.parent() {
                    let config_in_root = project_root.join("config").join(filename);
                    if config_in_root.exists() {
                        return config_in_root;
                    }
                }
            }
        }

        let dev_path = current_dir.join(filename);
        if dev_path.exists() {
            return dev_path;
        }

        if current_dir.file_name() == Some(std::ffi::OsStr::new("bin")) {
            if let Some(parent) = current_dir.parent() {
                return parent.join("config").join(filename);
            }
        }
        dev_path
    }

    fn handle_config_load_failure(config_path: &Path) -> Result<Config> {
        if config_path.exists() {
            warn!("[fail] 配置文件存在但无法解析，请检查语法");
            return Err(anyhow::anyhow!(
                "配置文件解析失败: {}",
                config_path.display()
            ));
        }

        info!("[note] 创建默认配置文件: {}", config_path.display());
        let config = Config::default();
        if let Err(write_err) = config.write_yaml_to_path(config_path) {
            warn!("[fail] 创建默认配置文件失败: {}", write_err);
        }
        // 模板没有签名密钥，允许通过环境变量补齐
        Ok(ConfigLoader::apply_env_overrides(config))
    }

    fn validate_config(config: &Config) -> ConfigValidationReport {
        let report = ConfigValidator::validate_all(config);

        if report.has_errors() {
            warn!("[warn] 配置验证发现错误: {}", report.error_count());
            for error in &report.errors {
                warn!("  - {}: {}", error.field, error.message);
            }
        }

        if report.has_warnings() {
            info!("配置验证发现警告: {}", report.warning_count());
            for warning in &report.warnings {
                info!("  - {}: {}", warning.field, warning.message);
            }
        }

        report
    }
}

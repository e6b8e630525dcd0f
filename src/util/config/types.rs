//! 配置结构定义模块

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::util::rules::EvaluatorFailurePolicy;

/// 主配置结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 单个请求的最长处理时间（秒）
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    60
}

/// JWT 签发配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// HS256 签名密钥，必须由部署方提供
    #[serde(default)]
    pub key: String,
    pub issuer: String,
    pub audience: String,
    #[serde(default = "default_expire_minutes")]
    pub expire_minutes: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            issuer: "esg-analyzer".to_string(),
            audience: "esg-analyzer-clients".to_string(),
            expire_minutes: default_expire_minutes(),
        }
    }
}

fn default_expire_minutes() -> i64 {
    60
}

/// SQLite 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库文件路径，`:memory:` 表示内存库
    pub path: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/esg.db".to_string(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

/// 账户配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
    #[serde(default)]
    pub password: PasswordPolicyConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: default_bcrypt_cost(),
            password: PasswordPolicyConfig::default(),
        }
    }
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

/// 密码强度规则
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordPolicyConfig {
    #[serde(default = "default_password_min_length")]
    pub min_length: usize,
    #[serde(default = "default_true")]
    pub require_digit: bool,
    #[serde(default = "default_true")]
    pub require_lowercase: bool,
    #[serde(default = "default_true")]
    pub require_uppercase: bool,
    #[serde(default = "default_true")]
    pub require_non_alphanumeric: bool,
}

impl Default for PasswordPolicyConfig {
    fn default() -> Self {
        Self {
            min_length: default_password_min_length(),
            require_digit: true,
            require_lowercase: true,
            require_uppercase: true,
            require_non_alphanumeric: true,
        }
    }
}

fn default_password_min_length() -> usize {
    6
}

fn default_true() -> bool {
    true
}

/// 上传配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// 上传文件最大大小（MB）
    #[serde(default = "default_max_file_mb")]
    pub max_file_mb: u64,
    /// 分析接口是否要求 Bearer 令牌
    #[serde(default)]
    pub require_auth: bool,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_mb: default_max_file_mb(),
            require_auth: false,
        }
    }
}

fn default_max_file_mb() -> u64 {
    20
}

impl UploadConfig {
    pub fn max_body_bytes(&self) -> usize {
        (self.max_file_mb as usize).saturating_mul(1024 * 1024)
    }
}

/// 分析引擎配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub failure_policy: EvaluatorFailurePolicy,
    /// 是否把每次分析结果写入报告表
    #[serde(default = "default_true")]
    pub persist_reports: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            failure_policy: EvaluatorFailurePolicy::default(),
            persist_reports: true,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: LogFileConfig,
    pub structured: Option<bool>,
    #[serde(default)]
    pub level_config: Option<LevelConfig>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: LogFileConfig::default(),
            structured: Some(false),
            level_config: None,
        }
    }
}

/// 日志文件配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogFileConfig {
    pub enabled: bool,
    pub directory: String,
    pub retention_days: Option<u32>,
}

impl Default for LogFileConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: "logs".to_string(),
            retention_days: Some(7),
        }
    }
}

/// 日志级别配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LevelConfig {
    #[serde(default)]
    pub api: Option<String>,
    #[serde(default)]
    pub analysis: Option<String>,
    #[serde(default)]
    pub system: Option<String>,
    #[serde(default)]
    pub security: Option<String>,
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}

/// 跨域配置；环境变量 CORS_ALLOWED_ORIGINS 优先
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

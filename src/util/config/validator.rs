//! 配置验证模块

use super::types::*;

/// HS256 密钥的最小长度（字节）
pub const MIN_JWT_KEY_BYTES: usize = 32;

/// 令牌有效期上限（分钟），一年
pub const MAX_JWT_EXPIRE_MINUTES: i64 = 365 * 24 * 60;

/// 配置验证器
pub struct ConfigValidator;

impl ConfigValidator {
    /// 全面验证配置
    pub fn validate_all(config: &Config) -> ValidationReport {
        let mut report = ValidationReport::new();

        Self::validate_server_config(&config.server, &mut report);
        Self::validate_jwt_config(&config.jwt, &mut report);
        Self::validate_database_config(&config.database, &mut report);
        Self::validate_auth_config(&config.auth, &mut report);
        Self::validate_upload_config(&config.upload, &mut report);
        Self::validate_logging_config(&config.logging, &mut report);

        report
    }

    fn validate_server_config(config: &ServerConfig, report: &mut ValidationReport) {
        if config.port == 0 {
            report.add_error("server.port", "端口不能为0");
        }
        if config.host.trim().is_empty() {
            report.add_error("server.host", "监听地址不能为空");
        }
        if config.request_timeout_secs == 0 {
            report.add_error("server.request_timeout_secs", "请求超时必须大于0");
        }
    }

    fn validate_jwt_config(config: &JwtConfig, report: &mut ValidationReport) {
        if config.key.trim().is_empty() {
            report.add_error("jwt.key", "JWT签名密钥未配置 (可通过 ESG_JWT_KEY 提供)");
        } else if config.key.len() < MIN_JWT_KEY_BYTES {
            report.add_warning(
                "jwt.key",
                &format!("JWT签名密钥长度不足 {} 字节，建议更换更长的随机密钥", MIN_JWT_KEY_BYTES),
            );
        }
        if config.issuer.trim().is_empty() {
            report.add_error("jwt.issuer", "JWT签发方不能为空");
        }
        if config.audience.trim().is_empty() {
            report.add_error("jwt.audience", "JWT受众不能为空");
        }
        if config.expire_minutes <= 0 {
            report.add_error("jwt.expire_minutes", "令牌有效期必须大于0");
        } else if config.expire_minutes > MAX_JWT_EXPIRE_MINUTES {
            report.add_error(
                "jwt.expire_minutes",
                &format!("令牌有效期不能超过{}分钟", MAX_JWT_EXPIRE_MINUTES),
            );
        }
    }

    fn validate_database_config(config: &DatabaseConfig, report: &mut ValidationReport) {
        if config.path.trim().is_empty() {
            report.add_error("database.path", "数据库路径不能为空");
        } else if config.path == ":memory:" {
            report.add_warning("database.path", "使用内存数据库，重启后账户数据将丢失");
        }
        if config.max_connections == 0 {
            report.add_error("database.max_connections", "连接池大小必须大于0");
        }
    }

    fn validate_auth_config(config: &AuthConfig, report: &mut ValidationReport) {
        if !(4..=31).contains(&config.bcrypt_cost) {
            report.add_error(
                "auth.bcrypt_cost",
                &format!("bcrypt cost 必须在4~31之间: {}", config.bcrypt_cost),
            );
        } else if config.bcrypt_cost < bcrypt::DEFAULT_COST {
            report.add_warning("auth.bcrypt_cost", "bcrypt cost 低于默认值，仅适用于测试环境");
        }
        if config.password.min_length == 0 {
            report.add_warning("auth.password.min_length", "未限制密码最小长度");
        }
    }

    fn validate_upload_config(config: &UploadConfig, report: &mut ValidationReport) {
        if config.max_file_mb == 0 {
            report.add_error("upload.max_file_mb", "上传文件大小上限必须大于0");
        }
    }

    fn validate_logging_config(config: &LoggingConfig, report: &mut ValidationReport) {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&config.level.to_lowercase().as_str()) {
            report.add_error("logging.level", &format!("无效的日志级别: {}", config.level));
        }

        if config.file.enabled && config.file.retention_days == Some(0) {
            report.add_warning("logging.file.retention_days", "日志保留天数为0，日志将不会被清理");
        }
    }
}

/// 验证报告
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.errors.push(ValidationIssue {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }
}

/// 验证问题
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::config::ConfigWriter;

    fn valid_config() -> Config {
        let mut config = ConfigWriter::generate_template();
        config.jwt.key = "k".repeat(MIN_JWT_KEY_BYTES);
        config
    }

    fn has_error(report: &ValidationReport, field: &str) -> bool {
        report.errors.iter().any(|issue| issue.field == field)
    }

    #[test]
    fn test_template_with_key_is_valid() {
        let report = ConfigValidator::validate_all(&valid_config());
        assert!(report.is_valid(), "{:?}", report.errors);
        assert!(!report.has_warnings(), "{:?}", report.warnings);
    }

    #[test]
    fn test_empty_jwt_key_is_rejected() {
        let report = ConfigValidator::validate_all(&ConfigWriter::generate_template());
        assert!(has_error(&report, "jwt.key"));
        assert_eq!(report.error_count(), 1);
    }

    #[test]
    fn test_short_jwt_key_only_warns() {
        let mut config = valid_config();
        config.jwt.key = "short".to_string();
        let report = ConfigValidator::validate_all(&config);
        assert!(report.is_valid());
        assert_eq!(report.warning_count(), 1);
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let mut config = valid_config();
        config.server.port = 0;
        config.jwt.expire_minutes = 0;
        config.auth.bcrypt_cost = 2;
        config.upload.max_file_mb = 0;
        config.logging.level = "verbose".to_string();

        let report = ConfigValidator::validate_all(&config);
        for field in [
            "server.port",
            "jwt.expire_minutes",
            "auth.bcrypt_cost",
            "upload.max_file_mb",
            "logging.level",
        ] {
            assert!(has_error(&report, field), "缺少错误: {}", field);
        }
    }

    #[test]
    fn test_expire_minutes_upper_bound() {
        let mut config = valid_config();
        config.jwt.expire_minutes = MAX_JWT_EXPIRE_MINUTES;
        assert!(ConfigValidator::validate_all(&config).is_valid());

        config.jwt.expire_minutes = i64::MAX;
        assert!(has_error(&ConfigValidator::validate_all(&config), "jwt.expire_minutes"));
    }
}

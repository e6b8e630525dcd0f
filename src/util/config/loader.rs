//! 配置加载和管理模块
//! 处理配置文件的读取、写入、环境变量覆盖和默认值生成

use super::types::*;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// 配置加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从YAML文件读取配置
    pub fn read_yaml(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let config_str = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        let config = serde_yaml::from_str(&config_str)
            .with_context(|| format!("解析配置文件失败: {}", path.display()))?;
        Ok(config)
    }

    /// 从进程环境变量读取配置覆盖
    pub fn apply_env_overrides(config: Config) -> Config {
        Self::apply_overrides_from(config, |key| std::env::var(key).ok())
    }

    /// 按给定的查找函数应用覆盖，便于在测试中替换环境
    pub fn apply_overrides_from<F>(mut config: Config, lookup: F) -> Config
    where
        F: Fn(&str) -> Option<String>,
    {
        tracing::info!("[tool] 应用环境变量配置覆盖...");

        if let Some(host) = lookup("ESG_HOST") {
            tracing::info!("[ok] 环境变量覆盖服务器地址: {}", host);
            config.server.host = host;
        }

        if let Some(port_str) = lookup("ESG_PORT") {
            match port_str.parse::<u16>() {
                Ok(port) => {
                    config.server.port = port;
                    tracing::info!("[ok] 环境变量覆盖服务器端口: {}", port);
                }
                Err(_) => tracing::warn!("[warn] 忽略无效的 ESG_PORT: {}", port_str),
            }
        }

        if let Some(key) = lookup("ESG_JWT_KEY") {
            config.jwt.key = key;
            tracing::info!("[ok] 环境变量覆盖JWT签名密钥: [安全隐藏]");
        }

        if let Some(issuer) = lookup("ESG_JWT_ISSUER") {
            tracing::info!("[ok] 环境变量覆盖JWT签发方: {}", issuer);
            config.jwt.issuer = issuer;
        }

        if let Some(audience) = lookup("ESG_JWT_AUDIENCE") {
            tracing::info!("[ok] 环境变量覆盖JWT受众: {}", audience);
            config.jwt.audience = audience;
        }

        if let Some(path) = lookup("ESG_DB_PATH") {
            tracing::info!("[ok] 环境变量覆盖数据库路径: {}", path);
            config.database.path = path;
        }

        if let Some(level) = lookup("ESG_LOG_LEVEL") {
            tracing::info!("[ok] 环境变量覆盖日志级别: {}", level);
            config.logging.level = level;
        }

        if let Some(flag) = lookup("ESG_UPLOAD_REQUIRE_AUTH") {
            match parse_bool(&flag) {
                Some(value) => {
                    config.upload.require_auth = value;
                    tracing::info!("[ok] 环境变量覆盖上传鉴权开关: {}", value);
                }
                None => tracing::warn!("[warn] 忽略无效的 ESG_UPLOAD_REQUIRE_AUTH: {}", flag),
            }
        }

        if let Some(origins) = lookup("CORS_ALLOWED_ORIGINS") {
            config.cors.allowed_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            tracing::info!(
                "[ok] 环境变量覆盖CORS来源: {} 个",
                config.cors.allowed_origins.len()
            );
        }

        config
    }

    /// 配置文件 + 环境变量
    pub fn load_with_env_overrides(path: impl AsRef<Path>) -> Result<Config> {
        let base_config = Self::read_yaml(path)?;
        let config = Self::apply_env_overrides(base_config);
        tracing::info!("[ok] 配置加载完成");
        Ok(config)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// 配置写入器
pub struct ConfigWriter;

impl ConfigWriter {
    /// 写入配置到指定路径，确保目录存在
    pub fn write_yaml_with_dir(config: &Config, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let yaml_content = serde_yaml::to_string(config)?;
        fs::write(path, yaml_content)
            .with_context(|| format!("写入配置文件失败: {}", path.display()))?;
        Ok(())
    }

    /// 生成配置模板；JWT 密钥留空，部署时必须填写
    pub fn generate_template() -> Config {
        Config {
            server: ServerConfig::default(),
            jwt: JwtConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            upload: UploadConfig::default(),
            analysis: AnalysisConfig::default(),
            logging: LoggingConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::rules::EvaluatorFailurePolicy;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_template_round_trips_through_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config").join("config.yaml");

        ConfigWriter::write_yaml_with_dir(&ConfigWriter::generate_template(), &path).unwrap();
        let loaded = ConfigLoader::read_yaml(&path).unwrap();

        assert_eq!(loaded.server.port, 8080);
        assert!(loaded.jwt.key.is_empty());
        assert_eq!(loaded.jwt.expire_minutes, 60);
        assert_eq!(loaded.analysis.failure_policy, EvaluatorFailurePolicy::FailFast);
        assert!(loaded.analysis.persist_reports);
        assert_eq!(loaded.auth.password.min_length, 6);
    }

    #[test]
    fn test_minimal_yaml_fills_defaults() {
        let yaml = r#"
jwt:
  key: "secret-key-for-tests-only-0123456789"
  issuer: "esg"
  audience: "esg-web"
logging:
  level: debug
  file:
    enabled: false
    directory: logs
analysis:
  failure_policy: skip
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.request_timeout_secs, 60);
        assert_eq!(config.upload.max_file_mb, 20);
        assert!(!config.upload.require_auth);
        assert_eq!(config.analysis.failure_policy, EvaluatorFailurePolicy::Skip);
        assert!(config.analysis.persist_reports);
        assert!(config.auth.password.require_non_alphanumeric);
    }

    #[test]
    fn test_env_overrides() {
        let lookup = lookup_from(&[
            ("ESG_HOST", "0.0.0.0"),
            ("ESG_PORT", "9000"),
            ("ESG_JWT_KEY", "from-env"),
            ("ESG_DB_PATH", ":memory:"),
            ("ESG_UPLOAD_REQUIRE_AUTH", "true"),
            ("CORS_ALLOWED_ORIGINS", "https://a.example, ,https://b.example"),
        ]);
        let config = ConfigLoader::apply_overrides_from(ConfigWriter::generate_template(), lookup);

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.jwt.key, "from-env");
        assert_eq!(config.database.path, ":memory:");
        assert!(config.upload.require_auth);
        assert_eq!(
            config.cors.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn test_invalid_env_values_are_ignored() {
        let lookup = lookup_from(&[("ESG_PORT", "not-a-port"), ("ESG_UPLOAD_REQUIRE_AUTH", "maybe")]);
        let config = ConfigLoader::apply_overrides_from(ConfigWriter::generate_template(), lookup);
        assert_eq!(config.server.port, 8080);
        assert!(!config.upload.require_auth);
    }

    #[test]
    fn test_read_missing_file_fails_with_path() {
        let err = ConfigLoader::read_yaml("/nonexistent/esg/config.yaml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/esg/config.yaml"));
    }

    #[test]
    fn test_example_config_parses() {
        let config: Config =
            serde_yaml::from_str(include_str!("../../../config.example.yaml")).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.analysis.failure_policy, EvaluatorFailurePolicy::FailFast);
        assert_eq!(config.cors.allowed_origins, vec!["http://localhost:3000"]);
        let levels = config.logging.level_config.unwrap();
        assert_eq!(levels.overrides.get("target:sqlx::query").map(String::as_str), Some("warn"));
    }
}

use crate::util::config::{LevelConfig, LoggingConfig};
use crate::util::logging::standards::targets;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::daily;
use tracing_subscriber::fmt::format::Format;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{filter::EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

const CRATE_TARGET: &str = "esg_analyzer";

static ACCESS_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// 初始化日志：控制台 + 按天滚动的 `{prefix}-info` 与 `{prefix}-access` 文件
///
/// `http.server` 目标只写入访问日志文件，其余事件写入主日志文件。
/// 返回主日志文件的 guard，调用方需持有到进程退出。
pub fn log_init_with_config(
    file_prefix: &str,
    config: &LoggingConfig,
) -> anyhow::Result<Option<WorkerGuard>> {
    let level_filter = parse_level_filter(&config.level);
    let filter_expression = build_env_filter_expression(level_filter, config.level_config.as_ref());
    let use_json = config.structured.unwrap_or(false);

    let mut layers: Vec<BoxedLayer> = vec![console_layer(use_json, env_filter(&filter_expression, level_filter))];

    let guard = if config.file.enabled {
        let log_dir = resolve_log_dir(&config.file.directory);
        std::fs::create_dir_all(&log_dir)?;

        let main_filter_expr = format!("{},{}=off", filter_expression, targets::HTTP_SERVER);
        let access_filter_expr = format!("{}={}", targets::HTTP_SERVER, level_filter_to_str(level_filter));

        let (main_writer, guard) =
            tracing_appender::non_blocking(daily(&log_dir, format!("{}-info", file_prefix)));
        let (access_writer, access_guard) =
            tracing_appender::non_blocking(daily(&log_dir, format!("{}-access", file_prefix)));
        let _ = ACCESS_GUARD.set(access_guard);

        layers.push(file_layer(use_json, main_writer, env_filter(&main_filter_expr, level_filter)));
        layers.push(file_layer(
            use_json,
            access_writer,
            env_filter(&access_filter_expr, level_filter),
        ));

        Registry::default().with(layers).try_init()?;

        tracing::info!(
            event = "log.init",
            level = %config.level,
            console = true,
            file = true,
            directory = %log_dir.display(),
            rotation = "daily",
            structured = use_json,
            access_file = format!("{}-access", file_prefix)
        );
        if let Some(retention) = config.file.retention_days {
            tracing::info!(event = "log.retention", days = retention);
        }

        Some(guard)
    } else {
        Registry::default().with(layers).try_init()?;
        tracing::info!(event = "log.init", level = %config.level, console = true, file = false, structured = use_json);
        None
    };

    Ok(guard)
}

fn console_layer(use_json: bool, filter: EnvFilter) -> BoxedLayer {
    if use_json {
        layer()
            .json()
            .with_writer(io::stdout)
            .with_filter(filter)
            .boxed()
    } else {
        let format = Format::default()
            .without_time()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false);
        layer()
            .event_format(format)
            .with_writer(io::stdout)
            .with_filter(filter)
            .boxed()
    }
}

fn file_layer(
    use_json: bool,
    writer: tracing_appender::non_blocking::NonBlocking,
    filter: EnvFilter,
) -> BoxedLayer {
    if use_json {
        layer()
            .json()
            .with_timer(LocalTime::rfc_3339())
            .with_ansi(false)
            .with_writer(writer)
            .with_filter(filter)
            .boxed()
    } else {
        let format = Format::default()
            .with_timer(LocalTime::rfc_3339())
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false);
        layer()
            .event_format(format)
            .with_ansi(false)
            .with_writer(writer)
            .with_filter(filter)
            .boxed()
    }
}

fn env_filter(expression: &str, fallback: LevelFilter) -> EnvFilter {
    EnvFilter::try_new(expression).unwrap_or_else(|_| EnvFilter::new(level_filter_to_str(fallback)))
}

/// 相对路径基于工作目录；在 bin 目录下运行时取上级目录
pub fn resolve_log_dir(directory: &str) -> PathBuf {
    let path = Path::new(directory);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    if current_dir.file_name() == Some(std::ffi::OsStr::new("bin")) {
        if let Some(parent) = current_dir.parent() {
            return parent.join(directory);
        }
    }
    current_dir.join(directory)
}

/// 删除修改时间早于保留期的日志文件，返回删除数量；保留天数为 0 时不清理
pub fn cleanup_old_logs(log_dir: &Path, file_prefix: &str, retention_days: u32) -> anyhow::Result<usize> {
    if retention_days == 0 {
        return Ok(0);
    }
    if !log_dir.exists() {
        tracing::debug!("日志目录不存在: {}", log_dir.display());
        return Ok(0);
    }

    let retention = std::time::Duration::from_secs(retention_days as u64 * 24 * 60 * 60);
    let cutoff = std::time::SystemTime::now()
        .checked_sub(retention)
        .unwrap_or(std::time::UNIX_EPOCH);

    let mut deleted_count = 0;
    let mut total_size_deleted = 0u64;

    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_name = path.file_name().and_then(|name| name.to_str()).unwrap_or("");

        // 只处理本服务的日志文件
        if !file_name.starts_with(file_prefix) {
            continue;
        }

        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified().unwrap_or_else(|_| std::time::SystemTime::now());
        if modified >= cutoff {
            continue;
        }

        match std::fs::remove_file(&path) {
            Ok(()) => {
                deleted_count += 1;
                total_size_deleted += metadata.len();
                tracing::debug!("已删除过期日志: {}", path.display());
            }
            Err(e) => tracing::warn!("删除日志文件失败: {} - {}", path.display(), e),
        }
    }

    if deleted_count > 0 {
        let size_mb = total_size_deleted as f64 / (1024.0 * 1024.0);
        tracing::info!(
            "已清理 {} 个过期日志文件，释放空间 {:.2} MB",
            deleted_count,
            size_mb
        );
    }

    Ok(deleted_count)
}

fn parse_level_filter(level: &str) -> LevelFilter {
    match normalize_level_str(level) {
        Some("trace") => LevelFilter::TRACE,
        Some("debug") => LevelFilter::DEBUG,
        Some("warn") => LevelFilter::WARN,
        Some("error") => LevelFilter::ERROR,
        _ => LevelFilter::INFO,
    }
}

fn build_env_filter_expression(
    default_level: LevelFilter,
    level_config: Option<&LevelConfig>,
) -> String {
    let mut directives = vec![level_filter_to_str(default_level).to_string()];

    if let Some(cfg) = level_config {
        if let Some(level) = cfg.api.as_deref().and_then(normalize_level_str) {
            directives.push(format!("{CRATE_TARGET}::api={level}"));
        }
        if let Some(level) = cfg.analysis.as_deref().and_then(normalize_level_str) {
            directives.push(format!("{CRATE_TARGET}::util::rules={level}"));
            directives.push(format!("{CRATE_TARGET}::util::converter={level}"));
            directives.push(format!("analysis.rules={level}"));
        }
        if let Some(level) = cfg.system.as_deref().and_then(normalize_level_str) {
            directives.push(format!("{CRATE_TARGET}::server={level}"));
            directives.push(format!("{CRATE_TARGET}::db={level}"));
        }
        if let Some(level) = cfg.security.as_deref().and_then(normalize_level_str) {
            directives.push(format!("{CRATE_TARGET}::util::auth={level}"));
            directives.push(format!("{}={level}", targets::SECURITY));
        }

        let mut overrides: Vec<_> = cfg.overrides.iter().collect();
        overrides.sort();
        for (target, level_str) in overrides {
            if let Some(level) = normalize_level_str(level_str) {
                directives.push(format!("{}={level}", normalize_directive_target(target)));
            }
        }
    }

    directives.join(",")
}

fn normalize_level_str(level: &str) -> Option<&'static str> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" => Some("warn"),
        "error" => Some("error"),
        _ => None,
    }
}

fn level_filter_to_str(level: LevelFilter) -> &'static str {
    match level {
        LevelFilter::OFF => "off",
        LevelFilter::ERROR => "error",
        LevelFilter::WARN => "warn",
        LevelFilter::INFO => "info",
        LevelFilter::DEBUG => "debug",
        LevelFilter::TRACE => "trace",
    }
}

/// `target:xxx` 原样使用；含 `::` 的视为完整模块路径；其余按 `a.b` 映射到本 crate 模块
fn normalize_directive_target(target: &str) -> String {
    if let Some(raw) = target.strip_prefix("target:") {
        raw.to_string()
    } else if target.contains("::") {
        target.to_string()
    } else {
        let path = target.replace('.', "::");
        format!("{CRATE_TARGET}::{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_filter_expression_without_level_config() {
        assert_eq!(build_env_filter_expression(LevelFilter::WARN, None), "warn");
    }

    #[test]
    fn test_filter_expression_with_level_config() {
        let mut overrides = HashMap::new();
        overrides.insert("db.sqlite".to_string(), "trace".to_string());
        overrides.insert("target:tower_http".to_string(), "bogus".to_string());
        let cfg = LevelConfig {
            api: Some("debug".into()),
            analysis: Some("TRACE".into()),
            system: None,
            security: Some("warn".into()),
            overrides,
        };

        let expr = build_env_filter_expression(LevelFilter::INFO, Some(&cfg));
        let directives: Vec<&str> = expr.split(',').collect();
        assert_eq!(directives[0], "info");
        assert!(directives.contains(&"esg_analyzer::api=debug"));
        assert!(directives.contains(&"esg_analyzer::util::rules=trace"));
        assert!(directives.contains(&"analysis.rules=trace"));
        assert!(directives.contains(&"security=warn"));
        assert!(directives.contains(&"esg_analyzer::db::sqlite=trace"));
        assert!(!expr.contains("tower_http"));
        assert!(!expr.contains("esg_analyzer::server"));
        assert!(EnvFilter::try_new(&expr).is_ok());
    }

    #[test]
    fn test_normalize_directive_target() {
        assert_eq!(normalize_directive_target("target:http.server"), "http.server");
        assert_eq!(normalize_directive_target("sqlx::query"), "sqlx::query");
        assert_eq!(normalize_directive_target("util.auth"), "esg_analyzer::util::auth");
    }

    #[test]
    fn test_parse_level_filter_falls_back_to_info() {
        assert_eq!(parse_level_filter("Debug"), LevelFilter::DEBUG);
        assert_eq!(parse_level_filter("verbose"), LevelFilter::INFO);
    }

    #[test]
    fn test_cleanup_keeps_recent_logs() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("esg-analyzer-info.2026-10-14");
        let other = dir.path().join("notes.txt");
        std::fs::write(&log, "x").unwrap();
        std::fs::write(&other, "y").unwrap();

        assert_eq!(cleanup_old_logs(dir.path(), "esg-analyzer", 7).unwrap(), 0);
        assert!(log.exists());
        assert!(other.exists());
        assert_eq!(cleanup_old_logs(&dir.path().join("missing"), "esg-analyzer", 7).unwrap(), 0);
    }

    fn age_file(path: &Path, days: u64) {
        let modified = std::time::SystemTime::now() - std::time::Duration::from_secs(days * 24 * 60 * 60);
        std::fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(modified)
            .unwrap();
    }

    #[test]
    fn test_cleanup_with_zero_retention_is_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("esg-analyzer-info.2026-10-14");
        std::fs::write(&log, "x").unwrap();
        age_file(&log, 30);

        assert_eq!(cleanup_old_logs(dir.path(), "esg-analyzer", 0).unwrap(), 0);
        assert!(log.exists());
    }

    #[test]
    fn test_cleanup_only_touches_own_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let expired = dir.path().join("esg-analyzer-info.2026-09-01");
        let foreign = dir.path().join("nginx.log");
        std::fs::write(&expired, "x").unwrap();
        std::fs::write(&foreign, "y").unwrap();
        age_file(&expired, 30);
        age_file(&foreign, 30);

        assert_eq!(cleanup_old_logs(dir.path(), "esg-analyzer", 7).unwrap(), 1);
        assert!(!expired.exists());
        assert!(foreign.exists());
    }
}

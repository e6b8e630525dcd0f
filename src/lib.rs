use std::sync::Arc;
use std::time::Instant;

pub mod api;
pub mod build_info;
pub mod db;
pub mod model;
pub mod server;
pub mod util;

use util::auth::AuthService;
use util::config::Config;
use util::rules::RuleBasedAnalyzer;

/// 应用状态结构
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub database: Arc<dyn db::Database>,
    /// 评估引擎在请求之间共享，自身无状态
    pub analyzer: Arc<RuleBasedAnalyzer>,
    pub auth: Arc<AuthService>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config, database: Arc<dyn db::Database>) -> anyhow::Result<Self> {
        let analyzer = RuleBasedAnalyzer::with_default_criteria(config.analysis.failure_policy);
        let auth = AuthService::new(database.clone(), &config)?;

        tracing::info!(
            event = "analysis.engine_ready",
            evaluators = analyzer.evaluator_count(),
            names = ?analyzer.evaluator_names(),
            failure_policy = %analyzer.policy()
        );

        Ok(Self {
            config: Arc::new(config),
            database,
            analyzer: Arc::new(analyzer),
            auth: Arc::new(auth),
            started_at: Instant::now(),
        })
    }
}

use serde::{Deserialize, Serialize};

pub mod evaluation;
pub mod report;
pub mod user;

pub use evaluation::{AnalysisResult, Criterion};
pub use report::ReportSummary;
pub use user::{LoginRequest, RegisterRequest, TokenResponse};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    /// 进程启动以来的秒数
    pub uptime: u64,
    pub timestamp: String,
    pub components: ComponentsHealth,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentsHealth {
    pub database: ComponentStatus,
    pub analyzer: ComponentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentStatus {
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ComponentStatus {
    pub fn healthy(detail: impl Into<String>) -> Self {
        Self {
            healthy: true,
            detail: Some(detail.into()),
        }
    }

    pub fn unhealthy(detail: impl Into<String>) -> Self {
        Self {
            healthy: false,
            detail: Some(detail.into()),
        }
    }
}

impl ComponentsHealth {
    pub fn all_healthy(&self) -> bool {
        self.database.healthy && self.analyzer.healthy
    }
}

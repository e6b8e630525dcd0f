// 重新导出traits中的模型
pub use super::traits::{AnalysisReportRecord, UserRecord};

use chrono::Utc;
use uuid::Uuid;

use crate::model::evaluation::AnalysisResult;

impl UserRecord {
    /// 以新的 UUID 和当前时间构造待插入的用户
    pub fn new(email: &str, normalized_email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.trim().to_string(),
            normalized_email,
            password_hash,
            created_at: Utc::now(),
        }
    }
}

impl AnalysisReportRecord {
    pub fn from_result(
        user_id: Option<String>,
        file_name: &str,
        result: &AnalysisResult,
        text_length: u64,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            file_name: file_name.to_string(),
            total_score: result.total_score(),
            result_json: serde_json::to_string(result)?,
            text_length,
            created_at: Utc::now(),
        })
    }

    /// 反序列化保存的评分卡
    pub fn result(&self) -> anyhow::Result<AnalysisResult> {
        Ok(serde_json::from_str(&self.result_json)?)
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::AnalysisReportRecord;
use crate::model::AnalysisResult;

/// 已保存分析报告的对外视图
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub id: String,
    pub file_name: String,
    pub total_score: u8,
    pub result: AnalysisResult,
    pub text_length: u64,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<AnalysisReportRecord> for ReportSummary {
    type Error = anyhow::Error;

    fn try_from(record: AnalysisReportRecord) -> anyhow::Result<Self> {
        let result = record.result()?;
        Ok(Self {
            id: record.id,
            file_name: record.file_name,
            total_score: record.total_score,
            result,
            text_length: record.text_length,
            created_at: record.created_at,
        })
    }
}

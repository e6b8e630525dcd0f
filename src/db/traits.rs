use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 用户账户记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    /// 注册时提交的原始邮箱
    pub email: String,
    /// 去除首尾空白并转小写后的邮箱，唯一
    pub normalized_email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// 单次文档分析的报告记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReportRecord {
    pub id: String,
    pub user_id: Option<String>,
    pub file_name: String,
    pub total_score: u8,
    /// 六个标记的 JSON 序列化结果
    pub result_json: String,
    /// 提取文本的字符数
    pub text_length: u64,
    pub created_at: DateTime<Utc>,
}

/// 数据库抽象接口
#[async_trait]
pub trait Database: Send + Sync {
    /// 初始化数据库（创建表等）
    async fn initialize(&self) -> Result<()>;

    /// 插入新用户；规范化邮箱已存在时返回 `false` 且不做任何修改
    async fn insert_user(&self, user: &UserRecord) -> Result<bool>;

    /// 按规范化邮箱查找用户
    async fn find_user_by_email(&self, normalized_email: &str) -> Result<Option<UserRecord>>;

    async fn find_user_by_id(&self, id: &str) -> Result<Option<UserRecord>>;

    /// 保存分析报告
    async fn save_analysis_report(&self, report: &AnalysisReportRecord) -> Result<()>;

    async fn get_analysis_report(&self, id: &str) -> Result<Option<AnalysisReportRecord>>;

    /// 某用户最近的报告，按创建时间倒序
    async fn list_reports_by_user(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<AnalysisReportRecord>>;

    /// 健康检查
    async fn health_check(&self) -> Result<bool>;
}

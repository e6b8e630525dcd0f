//! SQLite模块

pub mod connection;
pub mod queries;
pub mod schemas;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::SqlitePool;

use super::traits::*;
use connection::ConnectionManager;
use queries::{HealthQueries, ReportQueries, UserQueries};
use schemas::SchemaManager;

/// SQLite数据库实现
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// 创建新的SQLite数据库实例
    pub async fn new(db_path: &str, max_connections: u32) -> Result<Self> {
        let pool = ConnectionManager::create_pool(db_path, max_connections).await?;
        Ok(Self { pool })
    }

    /// 获取连接池引用
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// 获取连接池信息
    pub fn pool_info(&self) -> connection::PoolInfo {
        ConnectionManager::get_pool_info(&self.pool)
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn initialize(&self) -> Result<()> {
        SchemaManager::create_all_tables(&self.pool).await
    }

    async fn insert_user(&self, user: &UserRecord) -> Result<bool> {
        UserQueries::insert(&self.pool, user).await
    }

    async fn find_user_by_email(&self, normalized_email: &str) -> Result<Option<UserRecord>> {
        UserQueries::find_by_normalized_email(&self.pool, normalized_email).await
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<UserRecord>> {
        UserQueries::find_by_id(&self.pool, id).await
    }

    async fn save_analysis_report(&self, report: &AnalysisReportRecord) -> Result<()> {
        ReportQueries::insert(&self.pool, report).await
    }

    async fn get_analysis_report(&self, id: &str) -> Result<Option<AnalysisReportRecord>> {
        ReportQueries::get_by_id(&self.pool, id).await
    }

    async fn list_reports_by_user(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<AnalysisReportRecord>> {
        ReportQueries::list_by_user(&self.pool, user_id, limit).await
    }

    async fn health_check(&self) -> Result<bool> {
        HealthQueries::check_health(&self.pool).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::evaluation::{AnalysisResult, Criterion};
    use chrono::{Duration, Utc};

    async fn memory_db() -> SqliteDatabase {
        let db = SqliteDatabase::new(connection::MEMORY_PATH, 1).await.unwrap();
        db.initialize().await.unwrap();
        db
    }

    fn user(email: &str) -> UserRecord {
        UserRecord::new(email, email.trim().to_lowercase(), "$2b$04$hash".to_string())
    }

    #[tokio::test]
    async fn test_insert_and_find_user() {
        let db = memory_db().await;
        let record = user("Alice@Example.com");

        assert!(db.insert_user(&record).await.unwrap());

        let found = db
            .find_user_by_email("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, record.id);
        assert_eq!(found.email, "Alice@Example.com");
        assert_eq!(found.password_hash, record.password_hash);

        let by_id = db.find_user_by_id(&record.id).await.unwrap().unwrap();
        assert_eq!(by_id.normalized_email, "alice@example.com");

        assert!(db.find_user_by_email("bob@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_normalized_email_is_refused() {
        let db = memory_db().await;
        assert!(db.insert_user(&user("carol@example.com")).await.unwrap());

        let duplicate = user(" CAROL@example.com ");
        assert!(!db.insert_user(&duplicate).await.unwrap());
        assert!(db.find_user_by_id(&duplicate.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_and_list_reports() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("esg.db");
        let db = SqliteDatabase::new(path.to_str().unwrap(), 2).await.unwrap();
        db.initialize().await.unwrap();

        let owner = user("dave@example.com");
        db.insert_user(&owner).await.unwrap();

        let mut result = AnalysisResult::new();
        result.flag(Criterion::ScopeEmissions).raise();

        let mut older =
            AnalysisReportRecord::from_result(Some(owner.id.clone()), "a.docx", &result, 42)
                .unwrap();
        older.created_at = Utc::now() - Duration::minutes(5);
        let newer =
            AnalysisReportRecord::from_result(Some(owner.id.clone()), "b.docx", &result, 7)
                .unwrap();
        let anonymous = AnalysisReportRecord::from_result(None, "c.docx", &result, 0).unwrap();

        db.save_analysis_report(&older).await.unwrap();
        db.save_analysis_report(&newer).await.unwrap();
        db.save_analysis_report(&anonymous).await.unwrap();

        let stored = db.get_analysis_report(&older.id).await.unwrap().unwrap();
        assert_eq!(stored.total_score, 1);
        assert_eq!(stored.text_length, 42);
        assert_eq!(stored.result().unwrap(), result);

        let listed = db.list_reports_by_user(&owner.id, 10).await.unwrap();
        let names: Vec<&str> = listed.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, vec!["b.docx", "a.docx"]);

        let limited = db.list_reports_by_user(&owner.id, 1).await.unwrap();
        assert_eq!(limited.len(), 1);

        assert!(db.health_check().await.unwrap());
        assert!(db.pool_info().size >= 1);
    }
}

//! SQLite数据库查询操作

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::db::traits::*;

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| anyhow!("无效的时间戳 {}: {}", raw, e))
}

/// 用户查询操作
pub struct UserQueries;

impl UserQueries {
    pub async fn insert(pool: &SqlitePool, user: &UserRecord) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, email, normalized_email, password_hash, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(normalized_email) DO NOTHING
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.normalized_email)
        .bind(&user.password_hash)
        .bind(user.created_at.to_rfc3339())
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn find_by_normalized_email(
        pool: &SqlitePool,
        normalized_email: &str,
    ) -> Result<Option<UserRecord>> {
        let row = sqlx::query(
            "SELECT id, email, normalized_email, password_hash, created_at FROM users WHERE normalized_email = ?",
        )
        .bind(normalized_email)
        .fetch_optional(pool)
        .await?;

        row.map(|r| Self::map_row(&r)).transpose()
    }

    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<UserRecord>> {
        let row = sqlx::query(
            "SELECT id, email, normalized_email, password_hash, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        row.map(|r| Self::map_row(&r)).transpose()
    }

    fn map_row(row: &SqliteRow) -> Result<UserRecord> {
        let created_at: String = row.try_get("created_at")?;
        Ok(UserRecord {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            normalized_email: row.try_get("normalized_email")?,
            password_hash: row.try_get("password_hash")?,
            created_at: parse_timestamp(&created_at)?,
        })
    }
}

/// 分析报告查询操作
pub struct ReportQueries;

impl ReportQueries {
    pub async fn insert(pool: &SqlitePool, report: &AnalysisReportRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO analysis_reports (
                id, user_id, file_name, total_score, result_json, text_length, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&report.id)
        .bind(&report.user_id)
        .bind(&report.file_name)
        .bind(report.total_score as i64)
        .bind(&report.result_json)
        .bind(report.text_length as i64)
        .bind(report.created_at.to_rfc3339())
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> Result<Option<AnalysisReportRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, file_name, total_score, result_json, text_length, created_at
            FROM analysis_reports WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        row.map(|r| Self::map_row(&r)).transpose()
    }

    pub async fn list_by_user(
        pool: &SqlitePool,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<AnalysisReportRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, file_name, total_score, result_json, text_length, created_at
            FROM analysis_reports
            WHERE user_id = ?
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(pool)
        .await?;

        rows.iter().map(Self::map_row).collect()
    }

    fn map_row(row: &SqliteRow) -> Result<AnalysisReportRecord> {
        let created_at: String = row.try_get("created_at")?;
        let total_score: i64 = row.try_get("total_score")?;
        let text_length: i64 = row.try_get("text_length")?;
        Ok(AnalysisReportRecord {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            file_name: row.try_get("file_name")?,
            total_score: u8::try_from(total_score)
                .map_err(|_| anyhow!("无效的总分: {}", total_score))?,
            result_json: row.try_get("result_json")?,
            text_length: u64::try_from(text_length).unwrap_or(0),
            created_at: parse_timestamp(&created_at)?,
        })
    }
}

/// 健康检查查询
pub struct HealthQueries;

impl HealthQueries {
    /// 执行健康检查
    pub async fn check_health(pool: &SqlitePool) -> Result<bool> {
        sqlx::query("SELECT 1")
            .fetch_one(pool)
            .await
            .map(|_| true)
            .map_err(|e| e.into())
    }
}

//! 文档上传与分析接口

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::db::AnalysisReportRecord;
use crate::model::{AnalysisResult, ReportSummary};
use crate::util::auth::AuthenticatedUser;
use crate::util::converter::{docx_to_text, has_docx_extension};
use crate::util::logging::events;
use crate::util::middleware::RequestId;
use crate::util::ServerError;
use crate::AppState;

const FILE_FIELD: &str = "file";
const DEFAULT_REPORT_LIMIT: u32 = 20;
const MAX_REPORT_LIMIT: u32 = 100;

struct UploadedDocument {
    file_name: String,
    bytes: Vec<u8>,
}

fn multipart_error(err: MultipartError) -> ServerError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::PayloadTooLarge("上传文件超过大小限制".to_string())
    } else {
        ServerError::BadRequest(format!("无法解析上传内容: {}", err.body_text()))
    }
}

async fn read_document(field: Field<'_>) -> Result<UploadedDocument, ServerError> {
    let file_name = field.file_name().unwrap_or_default().trim().to_string();
    if !has_docx_extension(&file_name) {
        return Err(ServerError::BadRequest("仅支持 .docx 文件".to_string()));
    }
    let bytes = field.bytes().await.map_err(multipart_error)?;
    if bytes.is_empty() {
        return Err(ServerError::BadRequest("上传文件为空".to_string()));
    }
    Ok(UploadedDocument {
        file_name,
        bytes: bytes.to_vec(),
    })
}

/// 取出名为 `file` 的字段；其余字段忽略
async fn take_document(multipart: &mut Multipart) -> Result<UploadedDocument, ServerError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some(FILE_FIELD) {
            return read_document(field).await;
        }
    }
    Err(ServerError::BadRequest("缺少上传文件字段 file".to_string()))
}

/// 上传 .docx 并返回六项 ESG 评估结果
pub async fn analyze(
    State(state): State<AppState>,
    user: Option<Extension<AuthenticatedUser>>,
    request_id: Option<Extension<RequestId>>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisResult>, ServerError> {
    let user_id = user.map(|Extension(u)| u.user_id);
    let request_id = request_id
        .map(|Extension(RequestId(id))| id)
        .unwrap_or_default();

    let document = match take_document(&mut multipart).await {
        Ok(doc) => doc,
        Err(err) => {
            warn!(
                event = events::ANALYSIS_REJECTED,
                request_id = %request_id,
                reason = %err,
                user_id = ?user_id
            );
            return Err(err);
        }
    };
    info!(
        event = events::ANALYSIS_RECEIVED,
        request_id = %request_id,
        file_name = %document.file_name,
        bytes = document.bytes.len(),
        user_id = ?user_id
    );

    let text = match docx_to_text(document.bytes).await {
        Ok(text) => text,
        Err(e) => {
            warn!(
                event = events::ANALYSIS_REJECTED,
                request_id = %request_id,
                file_name = %document.file_name,
                error = %format!("{e:#}")
            );
            return Err(ServerError::BadRequest("无法读取DOCX文件内容".to_string()));
        }
    };

    let result = match state.analyzer.analyze(&text) {
        Ok(result) => result,
        Err(e) => {
            error!(
                event = events::ANALYSIS_ERROR,
                request_id = %request_id,
                file_name = %document.file_name,
                error = %format!("{e:#}")
            );
            return Err(ServerError::Server);
        }
    };

    info!(
        event = events::ANALYSIS_COMPLETE,
        request_id = %request_id,
        file_name = %document.file_name,
        text_chars = text.chars().count(),
        score = result.total_score()
    );

    if state.config.analysis.persist_reports {
        persist_report(&state, user_id, &document.file_name, &result, &text).await;
    }

    Ok(Json(result))
}

/// 报告保存失败不影响本次响应
async fn persist_report(
    state: &AppState,
    user_id: Option<String>,
    file_name: &str,
    result: &AnalysisResult,
    text: &str,
) {
    let text_length = text.chars().count() as u64;
    let saved = match AnalysisReportRecord::from_result(user_id, file_name, result, text_length) {
        Ok(record) => state.database.save_analysis_report(&record).await,
        Err(e) => Err(e),
    };
    if let Err(e) = saved {
        warn!(event = events::REPORT_PERSIST_FAILED, file_name = %file_name, error = %e);
    }
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub limit: Option<u32>,
}

fn require_user(user: Option<Extension<AuthenticatedUser>>) -> Result<AuthenticatedUser, ServerError> {
    user.map(|Extension(u)| u)
        .ok_or_else(|| ServerError::Unauthorized("缺少访问令牌".to_string()))
}

/// 当前用户最近的分析报告，按时间倒序
pub async fn list_reports(
    State(state): State<AppState>,
    user: Option<Extension<AuthenticatedUser>>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Vec<ReportSummary>>, ServerError> {
    let user = require_user(user)?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_REPORT_LIMIT)
        .clamp(1, MAX_REPORT_LIMIT);

    let records = state
        .database
        .list_reports_by_user(&user.user_id, limit)
        .await
        .map_err(|e| {
            error!(event = "report.list_failed", user_id = %user.user_id, error = %e);
            ServerError::Server
        })?;

    let reports = records
        .into_iter()
        .map(ReportSummary::try_from)
        .collect::<anyhow::Result<Vec<_>>>()
        .map_err(|e| {
            error!(event = "report.decode_failed", user_id = %user.user_id, error = %e);
            ServerError::Server
        })?;
    Ok(Json(reports))
}

/// 单份报告；只能读取自己的报告
pub async fn get_report(
    State(state): State<AppState>,
    user: Option<Extension<AuthenticatedUser>>,
    Path(report_id): Path<String>,
) -> Result<Json<ReportSummary>, ServerError> {
    let user = require_user(user)?;
    let record = state
        .database
        .get_analysis_report(&report_id)
        .await
        .map_err(|e| {
            error!(event = "report.load_failed", report_id = %report_id, error = %e);
            ServerError::Server
        })?
        .filter(|r| r.user_id.as_deref() == Some(user.user_id.as_str()))
        .ok_or_else(|| ServerError::NotFound(format!("报告不存在: {report_id}")))?;

    ReportSummary::try_from(record).map(Json).map_err(|e| {
        error!(event = "report.decode_failed", report_id = %report_id, error = %e);
        ServerError::Server
    })
}

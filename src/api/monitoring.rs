//! 健康检查

use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use std::time::Duration;

use crate::build_info;
use crate::model::{ComponentStatus, ComponentsHealth, HealthStatus};
use crate::AppState;

const DB_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// 基本健康检查：数据库连通性、评估器数量、构建信息
pub async fn basic_health_check(State(state): State<AppState>) -> Response {
    let database = match tokio::time::timeout(DB_CHECK_TIMEOUT, state.database.health_check()).await {
        Ok(Ok(true)) => ComponentStatus::healthy("sqlite"),
        Ok(Ok(false)) => ComponentStatus::unhealthy("数据库健康检查未通过"),
        Ok(Err(e)) => ComponentStatus::unhealthy(format!("数据库错误: {e}")),
        Err(_) => ComponentStatus::unhealthy("数据库健康检查超时"),
    };

    let evaluators = state.analyzer.evaluator_count();
    let analyzer = if evaluators > 0 {
        ComponentStatus::healthy(format!("{evaluators} 个评估器"))
    } else {
        ComponentStatus::unhealthy("未注册评估器")
    };

    let components = ComponentsHealth { database, analyzer };
    let healthy = components.all_healthy();
    let status = HealthStatus {
        status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
        version: build_info::summary(),
        uptime: state.started_at.elapsed().as_secs(),
        timestamp: Utc::now().to_rfc3339(),
        components,
    };

    let code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let mut resp = (code, Json(status)).into_response();
    resp.headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    resp
}

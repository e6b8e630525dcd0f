//! 注册与登录接口

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tracing::debug;

use crate::model::{LoginRequest, RegisterRequest, TokenResponse};
use crate::util::ServerError;
use crate::AppState;

fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ServerError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            debug!(event = "request.body_rejected", reason = %rejection.body_text());
            Err(ServerError::BadRequest(format!(
                "请求体格式错误: {}",
                rejection.body_text()
            )))
        }
    }
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ServerError> {
    let req = parse_body(payload)?;
    let token = state.auth.register(&req.email, &req.password).await?;
    Ok(Json(TokenResponse::new(token)))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ServerError> {
    let req = parse_body(payload)?;
    let token = state.auth.login(&req.email, &req.password).await?;
    Ok(Json(TokenResponse::new(token)))
}

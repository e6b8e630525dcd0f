use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt::Display;

pub mod auth;
pub mod config;
pub mod converter;
pub mod log;
pub mod logging;
pub mod middleware;
pub mod rules;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebResult {
    pub success: bool,
    #[serde(rename = "errorCode")]
    pub code: u32,
    #[serde(rename = "errorMsg")]
    pub msg: String,
    pub data: Value,
}

#[derive(Debug, Clone)]
pub enum ServerError {
    /// 请求内容不合法
    BadRequest(String),
    /// 校验失败，原因列表放入 `data`
    Validation(Vec<String>),
    Unauthorized(String),
    NotFound(String),
    PayloadTooLarge(String),
    Server,
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) | ServerError::Validation(_) => StatusCode::BAD_REQUEST,
            ServerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::Server => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerError::BadRequest(msg)
            | ServerError::Unauthorized(msg)
            | ServerError::NotFound(msg)
            | ServerError::PayloadTooLarge(msg) => write!(f, "{}", msg),
            ServerError::Validation(reasons) => write!(f, "{}", reasons.join("; ")),
            ServerError::Server => write!(f, "Server internal error"),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        (self.status(), WebResult::err(self).into_json()).into_response()
    }
}

impl From<auth::AuthError> for ServerError {
    fn from(err: auth::AuthError) -> Self {
        match err {
            auth::AuthError::RegistrationFailed(reasons) => ServerError::Validation(reasons),
            auth::AuthError::InvalidCredentials => ServerError::Unauthorized(err.to_string()),
            auth::AuthError::Token(_) => ServerError::Unauthorized(err.to_string()),
            auth::AuthError::Internal(e) => {
                tracing::error!(event = logging::events::AUTH_ERROR, error = ?e, "认证服务内部错误");
                ServerError::Server
            }
        }
    }
}

impl WebResult {
    pub fn err(err: ServerError) -> Self {
        let data = match &err {
            ServerError::Validation(reasons) => json!(reasons),
            _ => Value::Null,
        };
        Self {
            success: false,
            code: err.status().as_u16() as u32,
            msg: err.to_string(),
            data,
        }
    }
}

pub trait IntoJson {
    fn into_json(self) -> Json<WebResult>;
}

impl IntoJson for WebResult {
    fn into_json(self) -> Json<WebResult> {
        Json(self)
    }
}

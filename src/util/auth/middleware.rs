//! Bearer 令牌中间件

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::util::logging::events;
use crate::util::logging::standards::targets;
use crate::util::ServerError;
use crate::AppState;

/// 通过令牌校验的调用方，写入请求扩展
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: String,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            let (scheme, token) = v.trim().split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
        })
        .filter(|token| !token.is_empty())
}

/// 携带令牌时必须有效；未携带时按 `upload.require_auth` 决定放行或拒绝
pub async fn bearer_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let path = request.uri().path().to_string();
    let require_auth = state.config.upload.require_auth;

    let Some(token) = bearer_token(request.headers()).map(str::to_owned) else {
        if require_auth {
            tracing::warn!(
                target: targets::SECURITY,
                event = events::AUTH_FAILURE,
                path = %path,
                reason = "missing_token"
            );
            return Err(ServerError::Unauthorized("缺少访问令牌".to_string()));
        }
        return Ok(next.run(request).await);
    };

    let claims = match state.auth.validate_token(&token) {
        Ok(claims) => claims,
        Err(err) => {
            tracing::warn!(
                target: targets::SECURITY,
                event = events::AUTH_FAILURE,
                path = %path,
                reason = %err
            );
            return Err(err.into());
        }
    };

    tracing::debug!(
        target: targets::SECURITY,
        event = events::AUTH_CHECK,
        path = %path,
        user_id = %claims.sub
    );
    request.extensions_mut().insert(AuthenticatedUser {
        user_id: claims.sub,
        email: claims.email,
    });

    Ok(next.run(request).await)
}

/// 账户与令牌相关错误
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// 注册校验失败，附全部原因
    #[error("注册失败: {}", .0.join("; "))]
    RegistrationFailed(Vec<String>),

    /// 邮箱不存在或密码错误，对外不做区分
    #[error("邮箱或密码错误")]
    InvalidCredentials,

    #[error("令牌无效: {0}")]
    Token(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn registration(reason: impl Into<String>) -> Self {
        AuthError::RegistrationFailed(vec![reason.into()])
    }
}

//! 账户认证模块
//!
//! - 账户注册、查找与密码校验 (本文件的 [`AuthService`])
//! - 令牌签发与校验 (jwt.rs)
//! - 密码策略与 bcrypt 哈希 (password.rs)
//! - Bearer 令牌中间件 (middleware.rs)

pub mod error;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use error::AuthError;
pub use jwt::{Claims, TokenIssuer};
pub use middleware::{bearer_auth_middleware, AuthenticatedUser};
pub use password::check_password_policy;

use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{info, warn};

use crate::db::{Database, UserRecord};
use crate::util::config::{Config, PasswordPolicyConfig};
use crate::util::logging::events;
use crate::util::logging::standards::targets;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

const MAX_EMAIL_LEN: usize = 254;

/// 邮箱规范化：去除首尾空白并转小写
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// 账户服务：注册、登录与令牌校验
pub struct AuthService {
    database: Arc<dyn Database>,
    tokens: TokenIssuer,
    policy: PasswordPolicyConfig,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(database: Arc<dyn Database>, config: &Config) -> Result<Self, AuthError> {
        Ok(Self {
            database,
            tokens: TokenIssuer::new(&config.jwt)?,
            policy: config.auth.password.clone(),
            bcrypt_cost: config.auth.bcrypt_cost,
        })
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// 创建账户，返回新用户ID
    pub async fn create_account(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let normalized = normalize_email(email);

        let mut reasons = Vec::new();
        if normalized.is_empty() {
            reasons.push("邮箱不能为空".to_string());
        } else if normalized.len() > MAX_EMAIL_LEN || !EMAIL_RE.is_match(&normalized) {
            reasons.push(format!("邮箱格式不正确: {}", email.trim()));
        }
        reasons.extend(check_password_policy(password, &self.policy));
        if !reasons.is_empty() {
            return Err(AuthError::RegistrationFailed(reasons));
        }

        if self.database.find_user_by_email(&normalized).await?.is_some() {
            return Err(AuthError::registration(format!("邮箱 {} 已被注册", email.trim())));
        }

        let hash = password::hash_password(password, self.bcrypt_cost).await?;
        let record = UserRecord::new(email, normalized, hash);

        // 并发注册同一邮箱时由唯一约束兜底
        if !self.database.insert_user(&record).await? {
            return Err(AuthError::registration(format!("邮箱 {} 已被注册", email.trim())));
        }

        Ok(record.id)
    }

    /// 按邮箱（不区分大小写）查找账户
    pub async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRecord>> {
        self.database.find_user_by_email(&normalize_email(email)).await
    }

    pub async fn verify_password(&self, user: &UserRecord, password: &str) -> anyhow::Result<bool> {
        password::verify_password_hash(password, &user.password_hash).await
    }

    /// 注册并签发令牌
    pub async fn register(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let user_id = match self.create_account(email, password).await {
            Ok(id) => id,
            Err(err) => {
                if let AuthError::RegistrationFailed(reasons) = &err {
                    warn!(
                        target: targets::SECURITY,
                        event = events::ACCOUNT_REGISTER_REJECTED,
                        reasons = %reasons.join("; "),
                        "用户注册失败"
                    );
                }
                return Err(err);
            }
        };

        info!(
            target: targets::SECURITY,
            event = events::ACCOUNT_REGISTERED,
            user_id = %user_id,
            "用户注册成功"
        );
        self.tokens.issue(&user_id, email.trim())
    }

    /// 校验凭据并签发令牌；邮箱不存在与密码错误返回同一错误
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let user = match self.find_by_email(email).await? {
            Some(user) => user,
            None => {
                warn!(target: targets::SECURITY, event = events::AUTH_FAILURE, reason = "unknown_email");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !self.verify_password(&user, password).await? {
            warn!(
                target: targets::SECURITY,
                event = events::AUTH_FAILURE,
                user_id = %user.id,
                reason = "bad_password"
            );
            return Err(AuthError::InvalidCredentials);
        }

        info!(target: targets::SECURITY, event = events::AUTH_SUCCESS, user_id = %user.id);
        self.tokens.issue(&user.id, &user.email)
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.tokens.validate(token)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::test_service;
    use super::*;

    const PASSWORD: &str = "Passw0rd!";

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }

    #[tokio::test]
    async fn test_register_issues_token_for_new_user() {
        let (service, db) = test_service().await;
        let token = service.register("Alice@Example.com", PASSWORD).await.unwrap();

        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.email, "Alice@Example.com");
        assert_eq!(claims.iss, "TestIssuer");
        assert_eq!(claims.aud, "TestAudience");

        let stored = db.find_user_by_email("alice@example.com").await.unwrap().unwrap();
        assert_eq!(stored.id, claims.sub);
        assert_ne!(stored.password_hash, PASSWORD);
    }

    #[tokio::test]
    async fn test_duplicate_registration_is_rejected() {
        let (service, _db) = test_service().await;
        service.create_account("bob@example.com", PASSWORD).await.unwrap();

        let err = service
            .register(" BOB@example.com", PASSWORD)
            .await
            .unwrap_err();
        match err {
            AuthError::RegistrationFailed(reasons) => {
                assert_eq!(reasons.len(), 1);
                assert!(reasons[0].contains("已被注册"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_registration_collects_all_reasons() {
        let (service, db) = test_service().await;
        let err = service.register("not-an-email", "abc").await.unwrap_err();

        let message = err.to_string();
        match err {
            AuthError::RegistrationFailed(reasons) => {
                assert_eq!(reasons.len(), 5, "{:?}", reasons);
                assert!(message.contains("; "));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(db.find_user_by_email("not-an-email").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_with_valid_credentials() {
        let (service, _db) = test_service().await;
        let user_id = service.create_account("carol@example.com", PASSWORD).await.unwrap();

        let token = service.login("Carol@Example.com", PASSWORD).await.unwrap();
        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "carol@example.com");
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (service, _db) = test_service().await;
        service.create_account("dave@example.com", PASSWORD).await.unwrap();

        let unknown = service.login("nobody@example.com", PASSWORD).await.unwrap_err();
        let wrong = service.login("dave@example.com", "Wrong0rd!").await.unwrap_err();

        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn test_find_and_verify() {
        let (service, _db) = test_service().await;
        service.create_account("erin@example.com", PASSWORD).await.unwrap();

        let user = service.find_by_email("ERIN@example.com").await.unwrap().unwrap();
        assert!(service.verify_password(&user, PASSWORD).await.unwrap());
        assert!(!service.verify_password(&user, "other").await.unwrap());
        assert!(service.find_by_email("frank@example.com").await.unwrap().is_none());
    }
}

//! 密码强度校验与 bcrypt 哈希

use anyhow::{anyhow, Result};
use tokio::task;

use crate::util::config::PasswordPolicyConfig;

/// bcrypt 只使用前 72 字节，更长的密码一律拒绝
pub const MAX_PASSWORD_BYTES: usize = 72;

/// 按策略检查密码，返回全部不满足的规则；为空表示通过
pub fn check_password_policy(password: &str, policy: &PasswordPolicyConfig) -> Vec<String> {
    let mut reasons = Vec::new();

    if password.chars().count() < policy.min_length {
        reasons.push(format!("密码长度至少需要{}位", policy.min_length));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        reasons.push(format!("密码长度不能超过{}字节", MAX_PASSWORD_BYTES));
    }
    if policy.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
        reasons.push("密码必须包含至少一个数字".to_string());
    }
    if policy.require_lowercase && !password.chars().any(|c| c.is_lowercase()) {
        reasons.push("密码必须包含至少一个小写字母".to_string());
    }
    if policy.require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
        reasons.push("密码必须包含至少一个大写字母".to_string());
    }
    if policy.require_non_alphanumeric && password.chars().all(|c| c.is_alphanumeric()) {
        reasons.push("密码必须包含至少一个非字母数字字符".to_string());
    }

    reasons
}

/// 在阻塞线程池中计算 bcrypt 哈希
pub async fn hash_password(password: &str, cost: u32) -> Result<String> {
    let password = password.to_string();
    task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| anyhow!("密码哈希任务异常: {}", e))?
        .map_err(|e| anyhow!("密码哈希失败: {}", e))
}

/// 在阻塞线程池中校验密码
pub async fn verify_password_hash(password: &str, hash: &str) -> Result<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| anyhow!("密码校验任务异常: {}", e))?
        .map_err(|e| anyhow!("密码校验失败: {}", e))
}

// ==========================================
// 库存管理看板 - 会话上下文
// ==========================================
// 显式会话对象: 启动时加载一次，登出时清除，由调用方显式传给各视图
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    pub email: String,
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub authenticated_at: NaiveDateTime,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl SessionContext {
    pub fn new(email: &str, access_token: &str, token_type: Option<&str>, now: NaiveDateTime) -> Self {
        Self {
            email: email.trim().to_string(),
            access_token: access_token.to_string(),
            token_type: token_type
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(default_token_type),
            authenticated_at: now,
        }
    }

    /// Authorization 头的值
    pub fn authorization_header(&self) -> String {
        let scheme = match self.token_type.to_lowercase().as_str() {
            "bearer" => "Bearer".to_string(),
            _ => self.token_type.clone(),
        };
        format!("{} {}", scheme, self.access_token)
    }
}

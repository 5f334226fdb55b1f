// ==========================================
// 库存管理看板 - 认证 / 会话 API
// ==========================================
// 职责: 密码规则校验、重置表单校验、显式会话（建立 / 加载 / 清除）
// 红线: 不保存明文密码；远端认证服务不在本库范围内
// ==========================================

use std::sync::Arc;

use chrono::Local;

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::session::SessionContext;
use crate::i18n::t_in;
use crate::repository::SessionRepository;

/// 注册 / 修改密码的最小长度
pub const MIN_PASSWORD_LEN: usize = 8;

/// 重置密码表单的最小长度
pub const MIN_RESET_PASSWORD_LEN: usize = 6;

/// 密码规则: 至少 8 位，含大写字母与特殊字符
///
/// # 返回
/// - Ok(()): 通过
/// - Err(msg): 第一条未满足规则的本地化提示
pub fn validate_password_policy(password: &str, locale: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(t_in(
            locale,
            "auth.password_too_short",
            &[("min", &MIN_PASSWORD_LEN.to_string())],
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(t_in(locale, "auth.password_missing_uppercase", &[]));
    }
    // 下划线也算特殊字符
    if !password.chars().any(|c| !c.is_alphanumeric()) {
        return Err(t_in(locale, "auth.password_missing_special", &[]));
    }
    Ok(())
}

/// 重置密码表单: 两栏均填写、一致、至少 6 位
pub fn validate_reset_form(password: &str, confirm: &str, locale: &str) -> Result<(), String> {
    if password.is_empty() || confirm.is_empty() {
        return Err(t_in(locale, "auth.fields_required", &[]));
    }
    if password != confirm {
        return Err(t_in(locale, "auth.passwords_mismatch", &[]));
    }
    if password.chars().count() < MIN_RESET_PASSWORD_LEN {
        return Err(t_in(
            locale,
            "auth.reset_too_short",
            &[("min", &MIN_RESET_PASSWORD_LEN.to_string())],
        ));
    }
    Ok(())
}

// ==========================================
// AuthApi
// ==========================================

/// 认证 / 会话API
pub struct AuthApi {
    session_repo: Arc<SessionRepository>,
    config: Arc<ConfigManager>,
}

impl AuthApi {
    pub fn new(session_repo: Arc<SessionRepository>, config: Arc<ConfigManager>) -> Self {
        Self {
            session_repo,
            config,
        }
    }

    pub fn check_password(&self, password: &str) -> ApiResult<()> {
        let locale = self.config.locale()?;
        validate_password_policy(password, &locale).map_err(ApiError::ValidationError)
    }

    pub fn check_reset_form(&self, password: &str, confirm: &str) -> ApiResult<()> {
        let locale = self.config.locale()?;
        validate_reset_form(password, confirm, &locale).map_err(ApiError::ValidationError)
    }

    /// 登录成功后建立会话（覆盖旧会话）
    pub fn establish_session(
        &self,
        email: &str,
        access_token: &str,
        token_type: Option<&str>,
    ) -> ApiResult<SessionContext> {
        let locale = self.config.locale()?;
        if email.trim().is_empty() {
            return Err(ApiError::ValidationError(t_in(&locale, "auth.email_required", &[])));
        }
        if access_token.trim().is_empty() {
            return Err(ApiError::ValidationError(t_in(&locale, "auth.token_required", &[])));
        }

        let session = SessionContext::new(email, access_token, token_type, Local::now().naive_local());
        self.session_repo.save(&session)?;
        tracing::info!(email = %session.email, "会话已建立");
        Ok(session)
    }

    /// 启动时加载会话（无会话返回 None）
    pub fn load_session(&self) -> ApiResult<Option<SessionContext>> {
        Ok(self.session_repo.load()?)
    }

    /// 登出
    pub fn logout(&self) -> ApiResult<()> {
        self.session_repo.clear()?;
        tracing::info!("会话已清除");
        Ok(())
    }
}

// ==========================================
// 库存管理看板 - 用户提示
// ==========================================
// 职责: 将操作结果 / 错误转换为本地化提示（toast）
// 上传: 成功 / 部分成功（逐行原因）/ 失败 三种提示互不混用
// ==========================================

use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::domain::types::PurchaseOrderStatus;
use crate::i18n::t_in;
use crate::importer::report::UploadOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    /// 逐条明细（如上传被拒绝的行）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl Notification {
    fn new(level: NotificationLevel, message: String) -> Self {
        Self {
            level,
            message,
            details: Vec::new(),
        }
    }

    pub fn success(message: String) -> Self {
        Self::new(NotificationLevel::Success, message)
    }

    pub fn error(message: String) -> Self {
        Self::new(NotificationLevel::Error, message)
    }

    /// 视图加载失败
    pub fn load_failed(locale: &str, view: &str, err: &ApiError) -> Self {
        Self::error(t_in(
            locale,
            "notify.load_failed",
            &[("view", view), ("reason", &err.to_string())],
        ))
    }

    /// 上传结果
    pub fn upload(locale: &str, outcome: &UploadOutcome) -> Self {
        match outcome {
            UploadOutcome::Success(report) => Self::success(t_in(
                locale,
                "notify.upload_success",
                &[
                    ("created", &report.created_count.to_string()),
                    ("total", &report.total_rows_processed.to_string()),
                ],
            )),
            UploadOutcome::PartialSuccess(report) => Self {
                level: NotificationLevel::Warning,
                message: t_in(
                    locale,
                    "notify.upload_partial",
                    &[
                        ("created", &report.created_count.to_string()),
                        ("total", &report.total_rows_processed.to_string()),
                        ("rejected", &report.rejected_count().to_string()),
                    ],
                ),
                details: report.errors.clone(),
            },
            UploadOutcome::Failure { reason } => {
                Self::error(t_in(locale, "notify.upload_failed", &[("reason", reason)]))
            }
        }
    }

    pub fn orders_created(locale: &str, count: usize) -> Self {
        Self::success(t_in(
            locale,
            "notify.orders_created",
            &[("count", &count.to_string())],
        ))
    }

    pub fn order_status_updated(locale: &str, status: PurchaseOrderStatus) -> Self {
        Self::success(t_in(
            locale,
            "notify.order_status_updated",
            &[("status", status.to_db_str())],
        ))
    }

    pub fn sale_recorded(locale: &str, quantity: i64) -> Self {
        Self::success(t_in(
            locale,
            "notify.sale_recorded",
            &[("quantity", &quantity.to_string())],
        ))
    }

    pub fn saved(locale: &str, entity: &str) -> Self {
        Self::success(t_in(locale, "notify.saved", &[("entity", entity)]))
    }

    pub fn deleted(locale: &str, entity: &str) -> Self {
        Self::success(t_in(locale, "notify.deleted", &[("entity", entity)]))
    }

    /// 删除被引用的分类 / 供应商
    pub fn delete_blocked(locale: &str, entity: &str, count: i64) -> Self {
        Self::error(t_in(
            locale,
            "notify.delete_blocked",
            &[("entity", entity), ("count", &count.to_string())],
        ))
    }

    /// 通用失败提示
    pub fn from_error(locale: &str, err: &ApiError) -> Self {
        let prefix = t_in(locale, "common.failed", &[]);
        Self::error(format!("{}: {}", prefix, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::report::UploadReport;

    #[test]
    fn test_upload_notifications_are_distinct() {
        let ok = UploadOutcome::Success(UploadReport {
            created_count: 2,
            total_rows_processed: 2,
            errors: vec![],
        });
        let n = Notification::upload("en", &ok);
        assert_eq!(n.level, NotificationLevel::Success);
        assert_eq!(n.message, "Imported 2 of 2 rows");

        let partial = UploadOutcome::PartialSuccess(UploadReport {
            created_count: 1,
            total_rows_processed: 2,
            errors: vec!["Row 3: Missing 'name' column".to_string()],
        });
        let n = Notification::upload("en", &partial);
        assert_eq!(n.level, NotificationLevel::Warning);
        assert_eq!(n.message, "Imported 1 of 2 rows, 1 rejected");
        assert_eq!(n.details, vec!["Row 3: Missing 'name' column".to_string()]);

        let failed = UploadOutcome::Failure {
            reason: "bad file".to_string(),
        };
        assert_eq!(Notification::upload("en", &failed).level, NotificationLevel::Error);
    }

    #[test]
    fn test_load_failed_message() {
        let n = Notification::load_failed("en", "products", &ApiError::NotFound("x".to_string()));
        assert!(n.message.starts_with("Failed to load products:"));
    }
}

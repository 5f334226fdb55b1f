// ==========================================
// 库存管理看板 - API 层
// ==========================================
// 职责: 提供业务 API 接口，供展示层 / 命令行调用
// ==========================================

pub mod analytics_api;
pub mod auth_api;
pub mod error;
pub mod import_api;
pub mod restock_api;
pub mod stock_api;

// 重导出核心类型
pub use analytics_api::{AnalyticsApi, LabeledBucket, SalesTrendQuery, SalesTrendView};
pub use auth_api::{validate_password_policy, validate_reset_form, AuthApi};
pub use error::{ApiError, ApiResult};
pub use import_api::ImportApi;
pub use restock_api::RestockApi;
pub use stock_api::{ProductView, StockApi};

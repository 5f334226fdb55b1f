// ==========================================
// 库存管理看板 - 应用层
// ==========================================
// 职责: 状态装配、视图数据加载、用户提示
// ==========================================

pub mod loader;
pub mod notification;
pub mod state;

// 重导出
pub use loader::{
    DashboardDataSource, DashboardFilter, DashboardLoader, DashboardSnapshot, LoadOutcome,
    LoadTicket, RepositoryDataSource, ViewGuard,
};
pub use notification::{Notification, NotificationLevel};
pub use state::{get_default_db_path, AppState};

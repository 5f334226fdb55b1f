// ==========================================
// 库存管理看板 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享连接、仓储与 API 实例
// ==========================================

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::api::{AnalyticsApi, AuthApi, ImportApi, RestockApi, StockApi};
use crate::app::loader::{DashboardLoader, RepositoryDataSource};
use crate::config::ConfigManager;
use crate::db::open_and_init;
use crate::repository::{
    CategoryRepository, ProductRepository, PurchaseOrderRepository, SaleRepository,
    SessionRepository, StockMovementRepository, SupplierRepository,
};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "INVENTORY_DASHBOARD_DB_PATH";

/// 数据库文件名
pub const DB_FILE_NAME: &str = "inventory_dashboard.db";

/// 应用状态
///
/// 所有仓储共享同一个连接；API 实例按用例划分
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 配置管理器
    pub config: Arc<ConfigManager>,

    /// 库存管理API（商品 / 分类 / 供应商）
    pub stock_api: Arc<StockApi>,

    /// 补货API（建议 / 采购单 / 销售录入）
    pub restock_api: Arc<RestockApi>,

    /// 分析API
    pub analytics_api: Arc<AnalyticsApi>,

    /// 批量上传API
    pub import_api: Arc<ImportApi>,

    /// 认证 / 会话API
    pub auth_api: Arc<AuthApi>,

    /// 看板视图加载器
    pub dashboard_loader: Arc<DashboardLoader>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（不存在时创建并建表）
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_and_init(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let product_repo = Arc::new(ProductRepository::from_connection(conn.clone()));
        let category_repo = Arc::new(CategoryRepository::from_connection(conn.clone()));
        let supplier_repo = Arc::new(SupplierRepository::from_connection(conn.clone()));
        let sale_repo = Arc::new(SaleRepository::from_connection(conn.clone()));
        let movement_repo = Arc::new(StockMovementRepository::from_connection(conn.clone()));
        let order_repo = Arc::new(PurchaseOrderRepository::from_connection(conn.clone()));
        let session_repo = Arc::new(SessionRepository::from_connection(conn.clone()));

        let config = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化API层
        // ==========================================
        let stock_api = Arc::new(StockApi::new(
            product_repo.clone(),
            category_repo.clone(),
            supplier_repo.clone(),
            sale_repo.clone(),
            movement_repo.clone(),
        ));

        let restock_api = Arc::new(RestockApi::new(
            product_repo.clone(),
            supplier_repo.clone(),
            order_repo.clone(),
            sale_repo.clone(),
            config.clone(),
        ));

        let analytics_api = Arc::new(AnalyticsApi::new(
            product_repo.clone(),
            category_repo.clone(),
            supplier_repo.clone(),
            sale_repo.clone(),
            movement_repo,
            order_repo.clone(),
            config.clone(),
        ));

        let locale = config
            .locale()
            .map_err(|e| format!("无法读取界面语言: {}", e))?;
        let dashboard_loader = Arc::new(DashboardLoader::new(
            Arc::new(RepositoryDataSource::new(
                product_repo.clone(),
                supplier_repo.clone(),
                sale_repo.clone(),
                order_repo,
            )),
            config.clone(),
            &locale,
        ));

        let import_api = Arc::new(ImportApi::new(
            product_repo,
            category_repo,
            supplier_repo,
            sale_repo,
            config.clone(),
        ));

        let auth_api = Arc::new(AuthApi::new(session_repo, config.clone()));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            config,
            stock_api,
            restock_api,
            analytics_api,
            import_api,
            auth_api,
            dashboard_loader,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from(".").join(DB_FILE_NAME);

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染正式数据
        #[cfg(debug_assertions)]
        let dir = data_dir.join("inventory-dashboard-dev");

        #[cfg(not(debug_assertions))]
        let dir = data_dir.join("inventory-dashboard");

        match std::fs::create_dir_all(&dir) {
            Ok(()) => path = dir.join(DB_FILE_NAME),
            Err(e) => tracing::warn!("无法创建数据目录 {}: {}，使用当前目录", dir.display(), e),
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_bootstraps_empty_db() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("state.db").to_string_lossy().to_string();

        let state = AppState::new(db_path).unwrap();
        let counts = state.stock_api.stock_counts().unwrap();
        assert_eq!(counts.total, 0);
        assert!(state.restock_api.suggestions().unwrap().suggestions.is_empty());
        assert!(state.auth_api.load_session().unwrap().is_none());
    }
}

// ==========================================
// 库存管理看板 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 库存看板后端 (库存状态 / 补货建议 / 销售分析)
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则 (纯函数)
pub mod engine;

// 导入层 - CSV / Excel 批量导入
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态装配 / 视图加载
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    Granularity, MovementType, PurchaseOrderStatus, ReorderPriority, ReorderReason, StockStatus,
    StockVariant,
};

// 领域实体
pub use domain::{
    Category, Product, PurchaseOrder, RawSaleRecord, SaleRecord, SessionContext, StockMovement,
    Supplier,
};

// 引擎
pub use engine::{
    classify, get_stock_counts, is_low_stock, is_out_of_stock, ReorderEngine,
    SalesAggregator, StockCounts, StockStatusResult, TimeRange,
};

// API
pub use api::{AnalyticsApi, AuthApi, ImportApi, RestockApi, StockApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "库存管理看板";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";

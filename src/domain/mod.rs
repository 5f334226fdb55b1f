// ==========================================
// 库存管理看板 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod product;
pub mod purchase_order;
pub mod sale;
pub mod session;
pub mod types;

// 重导出核心类型
pub use product::{Category, NewCategory, NewProduct, NewSupplier, Product, Supplier};
pub use purchase_order::{
    NewPurchaseOrder, NewStockMovement, PurchaseOrder, PurchaseOrderUpdate, StockMovement,
};
pub use sale::{normalize_sales, parse_datetime_flexible, RawSaleRecord, SaleRecord};
pub use session::SessionContext;
pub use types::{
    BadgeTone, Granularity, MovementType, PurchaseOrderStatus, ReorderPriority, ReorderReason,
    StockStatus, StockVariant,
};

// ==========================================
// 库存管理看板 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod category_repo;
pub mod error;
pub mod product_repo;
pub mod purchase_order_repo;
pub mod sale_repo;
pub mod session_repo;
pub mod stock_movement_repo;
pub mod supplier_repo;

// 重导出核心仓储
pub use category_repo::CategoryRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use product_repo::ProductRepository;
pub use purchase_order_repo::PurchaseOrderRepository;
pub use sale_repo::{NewSale, SaleRepository};
pub use session_repo::SessionRepository;
pub use stock_movement_repo::StockMovementRepository;
pub use supplier_repo::SupplierRepository;

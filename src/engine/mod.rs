// ==========================================
// 库存管理看板 - 引擎层
// ==========================================
// 职责: 实现业务规则引擎,不拼 SQL
// 红线: 纯函数，输入相同则输出相同；数据由上层加载后传入
// ==========================================

pub mod inventory_analytics;
pub mod order_grouping;
pub mod reorder;
pub mod sales_aggregation;
pub mod stock_status;
pub mod supplier_analytics;
pub mod time_range;

// 重导出核心引擎
pub use inventory_analytics::{
    category_performance, inventory_trend, restock_summary, sales_summary, CategoryPerformance,
    InventoryTrendPoint, RestockSummary, SalesSummary,
};
pub use order_grouping::{group_orders, is_batch_group_key, OrderGroup};
pub use reorder::{OrderPlan, ReorderEngine, ReorderReport, ReorderSuggestion};
pub use sales_aggregation::{
    bucket_key, bucket_label, compute_kpis, AggregationResult, SalesAggregator, SalesBucket,
    SalesFilter, SalesKpis,
};
pub use stock_status::{
    classify, filter_by_status, get_stock_counts, is_low_stock, is_out_of_stock,
    product_stock_status, StockCounts, StockStatusResult,
};
pub use supplier_analytics::{SupplierAnalytics, SupplierAnalyticsEngine};
pub use time_range::TimeRange;

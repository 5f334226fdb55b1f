// ==========================================
// 库存管理看板 - 分析 API
// ==========================================
// 职责: 销售趋势（分桶 + KPI）、分类表现、库存趋势、供应商分析、销售汇总
// 红线: 原始销售记录在此处统一归一化，引擎只接收 SaleRecord
// ==========================================

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiResult;
use crate::config::ConfigManager;
use crate::domain::sale::{normalize_sales, SaleRecord};
use crate::domain::types::Granularity;
use crate::engine::inventory_analytics::{
    category_performance, inventory_trend, sales_summary, CategoryPerformance,
    InventoryTrendPoint, SalesSummary, MAX_TREND_MONTHS, MIN_TREND_MONTHS,
};
use crate::engine::sales_aggregation::{
    bucket_label, compute_kpis, SalesAggregator, SalesFilter, SalesKpis,
};
use crate::engine::supplier_analytics::{SupplierAnalytics, SupplierAnalyticsEngine};
use crate::engine::time_range::TimeRange;
use crate::repository::{
    CategoryRepository, ProductRepository, PurchaseOrderRepository, SaleRepository,
    StockMovementRepository, SupplierRepository,
};

/// 销售趋势查询参数（None 取配置默认值）
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesTrendQuery {
    #[serde(default)]
    pub time_range: Option<TimeRange>,
    #[serde(default)]
    pub granularity: Option<Granularity>,
    #[serde(default)]
    pub category_id: Option<i64>,
}

/// 带展示标签的时间桶
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledBucket {
    pub key: String,
    pub label: String,
    pub revenue: f64,
    pub orders: i64,
}

/// 销售趋势视图
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesTrendView {
    pub time_range: TimeRange,
    pub granularity: Granularity,
    pub category_id: Option<i64>,
    pub buckets: Vec<LabeledBucket>,
    pub kpis: SalesKpis,
    /// 窗口内无数据，展示的是全量
    pub used_fallback: bool,
}

impl SalesTrendView {
    /// 全量数据为空（界面展示 "暂无数据"）
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

// ==========================================
// AnalyticsApi - 分析 API
// ==========================================

/// 分析API
pub struct AnalyticsApi {
    product_repo: Arc<ProductRepository>,
    category_repo: Arc<CategoryRepository>,
    supplier_repo: Arc<SupplierRepository>,
    sale_repo: Arc<SaleRepository>,
    movement_repo: Arc<StockMovementRepository>,
    order_repo: Arc<PurchaseOrderRepository>,
    config: Arc<ConfigManager>,
}

impl AnalyticsApi {
    pub fn new(
        product_repo: Arc<ProductRepository>,
        category_repo: Arc<CategoryRepository>,
        supplier_repo: Arc<SupplierRepository>,
        sale_repo: Arc<SaleRepository>,
        movement_repo: Arc<StockMovementRepository>,
        order_repo: Arc<PurchaseOrderRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            product_repo,
            category_repo,
            supplier_repo,
            sale_repo,
            movement_repo,
            order_repo,
            config,
        }
    }

    /// 加载并归一化全部销售记录
    fn load_sales(&self, now: NaiveDateTime) -> ApiResult<Vec<SaleRecord>> {
        let raw = self.sale_repo.list_raw()?;
        let sales = normalize_sales(&raw, now);
        let undated = sales.iter().filter(|s| !s.dated).count();
        if undated > 0 {
            tracing::warn!(undated, "部分销售记录缺少可解析日期，仅计入全量统计");
        }
        Ok(sales)
    }

    /// 销售趋势
    pub fn sales_trend(&self, query: &SalesTrendQuery) -> ApiResult<SalesTrendView> {
        self.sales_trend_at(query, Local::now().naive_local())
    }

    /// 销售趋势（指定当前时刻）
    pub fn sales_trend_at(&self, query: &SalesTrendQuery, now: NaiveDateTime) -> ApiResult<SalesTrendView> {
        let time_range = match query.time_range {
            Some(r) => r,
            None => self.config.default_time_range()?,
        };
        let granularity = match query.granularity {
            Some(g) => g,
            None => self.config.default_granularity()?,
        };

        let products = self.product_repo.list()?;
        let sales = self.load_sales(now)?;
        let filter = SalesFilter {
            since: time_range.since(now),
            category_id: query.category_id,
        };

        let result = SalesAggregator::new(granularity).aggregate_filtered(&sales, &products, &filter);
        let kpis = compute_kpis(&result.buckets);
        let buckets = result
            .buckets
            .into_iter()
            .map(|b| LabeledBucket {
                label: bucket_label(&b.key, granularity),
                key: b.key,
                revenue: b.revenue,
                orders: b.orders,
            })
            .collect();

        Ok(SalesTrendView {
            time_range,
            granularity,
            category_id: query.category_id,
            buckets,
            kpis,
            used_fallback: result.used_fallback,
        })
    }

    /// 分类表现（营收 / 销量 / 在库）
    pub fn category_performance(&self) -> ApiResult<Vec<CategoryPerformance>> {
        let categories = self.category_repo.list()?;
        let products = self.product_repo.list()?;
        let sales = self.load_sales(Local::now().naive_local())?;
        Ok(category_performance(&categories, &products, &sales))
    }

    /// 库存趋势；months 缺失时取配置值，限制在 1..=24
    pub fn inventory_trend(&self, months: Option<u32>) -> ApiResult<Vec<InventoryTrendPoint>> {
        self.inventory_trend_at(months, Local::now().naive_local())
    }

    pub fn inventory_trend_at(
        &self,
        months: Option<u32>,
        now: NaiveDateTime,
    ) -> ApiResult<Vec<InventoryTrendPoint>> {
        let months = match months {
            Some(m) => m.clamp(MIN_TREND_MONTHS, MAX_TREND_MONTHS),
            None => self.config.inventory_trend_months()?,
        };
        let products = self.product_repo.list()?;
        let movements = self.movement_repo.list()?;
        let sales = self.load_sales(now)?;
        Ok(inventory_trend(&products, &movements, &sales, now, months))
    }

    /// 供应商分析；time_range 缺失时取配置默认窗口
    pub fn supplier_analytics(&self, time_range: Option<TimeRange>) -> ApiResult<SupplierAnalytics> {
        let now = Local::now().naive_local();
        let time_range = match time_range {
            Some(r) => r,
            None => self.config.default_time_range()?,
        };
        let suppliers = self.supplier_repo.list()?;
        let products = self.product_repo.list()?;
        let orders = self.order_repo.list(None)?;
        Ok(SupplierAnalyticsEngine::analyze(
            &suppliers,
            &products,
            &orders,
            time_range.since(now),
        ))
    }

    /// 销售汇总（总营收 / 总销量 / 销量最高分类）
    pub fn sales_summary(&self) -> ApiResult<SalesSummary> {
        let products = self.product_repo.list()?;
        let categories = self.category_repo.list()?;
        let sales = self.load_sales(Local::now().naive_local())?;
        Ok(sales_summary(&sales, &products, &categories))
    }
}

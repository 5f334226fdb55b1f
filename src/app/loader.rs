// ==========================================
// 库存管理看板 - 视图数据加载
// ==========================================
// 触发: 视图挂载 / 筛选条件变化
// 并发: 同一视图的多次加载不取消在途请求，结果到达时按代次校验，过期即丢弃
// 数据源: DashboardDataSource（仓储实现在阻塞线程池执行）
// ==========================================

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::app::notification::Notification;
use crate::config::DashboardConfigReader;
use crate::domain::product::{Product, Supplier};
use crate::domain::purchase_order::PurchaseOrder;
use crate::domain::sale::{normalize_sales, SaleRecord};
use crate::domain::types::Granularity;
use crate::engine::inventory_analytics::{restock_summary, RestockSummary};
use crate::engine::reorder::{ReorderEngine, ReorderReport};
use crate::engine::sales_aggregation::{compute_kpis, SalesAggregator, SalesBucket, SalesFilter, SalesKpis};
use crate::engine::stock_status::{get_stock_counts, StockCounts};
use crate::engine::time_range::TimeRange;
use crate::repository::{
    ProductRepository, PurchaseOrderRepository, SaleRepository, SupplierRepository,
};

// ==========================================
// ViewGuard - 挂载 / 代次守卫
// ==========================================

/// 一次加载的凭据
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// 视图守卫
///
/// begin() 使之前的凭据全部过期；unmount() 之后任何凭据都不再有效
#[derive(Debug)]
pub struct ViewGuard {
    generation: AtomicU64,
    mounted: AtomicBool,
}

impl Default for ViewGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewGuard {
    pub fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
            mounted: AtomicBool::new(true),
        }
    }

    /// 开始新一轮加载
    pub fn begin(&self) -> LoadTicket {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        LoadTicket { generation }
    }

    /// 凭据是否仍对应最新一轮加载且视图仍挂载
    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        self.mounted.load(Ordering::SeqCst)
            && self.generation.load(Ordering::SeqCst) == ticket.generation
    }

    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    pub fn remount(&self) {
        self.mounted.store(true, Ordering::SeqCst);
    }
}

/// 加载结果
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome<T> {
    /// 最新结果
    Loaded(T),
    /// 已被后续加载取代或视图已卸载，结果被丢弃
    Stale,
    /// 加载失败（非致命，视图保留原数据并可重试）
    Failed(Notification),
}

impl<T> LoadOutcome<T> {
    pub fn loaded(self) -> Option<T> {
        match self {
            LoadOutcome::Loaded(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, LoadOutcome::Stale)
    }
}

// ==========================================
// DashboardDataSource - 数据源接口
// ==========================================

#[async_trait]
pub trait DashboardDataSource: Send + Sync {
    async fn products(&self) -> ApiResult<Vec<Product>>;

    async fn suppliers(&self) -> ApiResult<Vec<Supplier>>;

    /// 已归一化的销售记录
    async fn sales(&self, loaded_at: NaiveDateTime) -> ApiResult<Vec<SaleRecord>>;

    async fn purchase_orders(&self) -> ApiResult<Vec<PurchaseOrder>>;
}

/// 仓储数据源（同步仓储调用放到阻塞线程池）
pub struct RepositoryDataSource {
    product_repo: Arc<ProductRepository>,
    supplier_repo: Arc<SupplierRepository>,
    sale_repo: Arc<SaleRepository>,
    order_repo: Arc<PurchaseOrderRepository>,
}

impl RepositoryDataSource {
    pub fn new(
        product_repo: Arc<ProductRepository>,
        supplier_repo: Arc<SupplierRepository>,
        sale_repo: Arc<SaleRepository>,
        order_repo: Arc<PurchaseOrderRepository>,
    ) -> Self {
        Self {
            product_repo,
            supplier_repo,
            sale_repo,
            order_repo,
        }
    }
}

async fn run_blocking<T, F>(f: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> ApiResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::InternalError(format!("后台任务失败: {}", e)))?
}

#[async_trait]
impl DashboardDataSource for RepositoryDataSource {
    async fn products(&self) -> ApiResult<Vec<Product>> {
        let repo = self.product_repo.clone();
        run_blocking(move || Ok(repo.list()?)).await
    }

    async fn suppliers(&self) -> ApiResult<Vec<Supplier>> {
        let repo = self.supplier_repo.clone();
        run_blocking(move || Ok(repo.list()?)).await
    }

    async fn sales(&self, loaded_at: NaiveDateTime) -> ApiResult<Vec<SaleRecord>> {
        let repo = self.sale_repo.clone();
        run_blocking(move || Ok(normalize_sales(&repo.list_raw()?, loaded_at))).await
    }

    async fn purchase_orders(&self) -> ApiResult<Vec<PurchaseOrder>> {
        let repo = self.order_repo.clone();
        run_blocking(move || Ok(repo.list(None)?)).await
    }
}

// ==========================================
// 看板快照
// ==========================================

/// 筛选条件（None 取配置默认值）
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardFilter {
    #[serde(default)]
    pub time_range: Option<TimeRange>,
    #[serde(default)]
    pub granularity: Option<Granularity>,
    #[serde(default)]
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub generated_at: NaiveDateTime,
    pub time_range: TimeRange,
    pub granularity: Granularity,
    pub stock_counts: StockCounts,
    pub reorder: ReorderReport,
    pub sales_buckets: Vec<SalesBucket>,
    pub sales_kpis: SalesKpis,
    pub used_fallback: bool,
    pub restock: RestockSummary,
}

/// 看板加载器
pub struct DashboardLoader {
    source: Arc<dyn DashboardDataSource>,
    config: Arc<dyn DashboardConfigReader>,
    guard: Arc<ViewGuard>,
    locale: String,
}

impl DashboardLoader {
    pub fn new(
        source: Arc<dyn DashboardDataSource>,
        config: Arc<dyn DashboardConfigReader>,
        locale: &str,
    ) -> Self {
        Self {
            source,
            config,
            guard: Arc::new(ViewGuard::new()),
            locale: locale.to_string(),
        }
    }

    pub fn guard(&self) -> Arc<ViewGuard> {
        self.guard.clone()
    }

    /// 加载看板快照
    pub async fn load(&self, filter: DashboardFilter) -> LoadOutcome<DashboardSnapshot> {
        self.load_at(filter, Local::now().naive_local()).await
    }

    /// 加载看板快照（指定当前时刻）
    pub async fn load_at(
        &self,
        filter: DashboardFilter,
        now: NaiveDateTime,
    ) -> LoadOutcome<DashboardSnapshot> {
        let ticket = self.guard.begin();
        let result = self.build_snapshot(filter, now).await;

        if !self.guard.is_current(&ticket) {
            tracing::debug!(generation = ticket.generation(), "加载结果已过期，丢弃");
            return LoadOutcome::Stale;
        }
        match result {
            Ok(snapshot) => LoadOutcome::Loaded(snapshot),
            Err(e) => {
                tracing::warn!(error = %e, "看板加载失败");
                LoadOutcome::Failed(Notification::load_failed(&self.locale, "dashboard", &e))
            }
        }
    }

    async fn build_snapshot(
        &self,
        filter: DashboardFilter,
        now: NaiveDateTime,
    ) -> ApiResult<DashboardSnapshot> {
        let time_range = match filter.time_range {
            Some(r) => r,
            None => self.config.get_default_time_range().await?,
        };
        let granularity = match filter.granularity {
            Some(g) => g,
            None => self.config.get_default_granularity().await?,
        };
        let lead_time = self.config.get_lead_time_days().await?;

        let (products, suppliers, sales, orders) = futures::try_join!(
            self.source.products(),
            self.source.suppliers(),
            self.source.sales(now),
            self.source.purchase_orders(),
        )?;

        let aggregation = SalesAggregator::new(granularity).aggregate_filtered(
            &sales,
            &products,
            &SalesFilter {
                since: time_range.since(now),
                category_id: filter.category_id,
            },
        );

        Ok(DashboardSnapshot {
            generated_at: now,
            time_range,
            granularity,
            stock_counts: get_stock_counts(&products),
            reorder: ReorderEngine::with_lead_time(lead_time).generate(&products, &suppliers),
            sales_kpis: compute_kpis(&aggregation.buckets),
            sales_buckets: aggregation.buckets,
            used_fallback: aggregation.used_fallback,
            restock: restock_summary(&orders, &products),
        })
    }
}

// ==========================================
// 看板加载器集成测试
// ==========================================
// 覆盖: 仓储数据源快照、过期结果丢弃、卸载后丢弃、加载失败提示
// ==========================================

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use inventory_dashboard::api::{ApiError, ApiResult};
use inventory_dashboard::app::{
    DashboardDataSource, DashboardFilter, DashboardLoader, LoadOutcome, NotificationLevel,
};
use inventory_dashboard::config::DashboardConfigReader;
use inventory_dashboard::repository::{NewSale, RepositoryResult};
use inventory_dashboard::{Granularity, Product, PurchaseOrder, SaleRecord, Supplier, TimeRange};

mod test_helpers;
use test_helpers::{add_product, create_test_state, dt};

// ==========================================
// 测试替身
// ==========================================

struct FixedConfig;

#[async_trait]
impl DashboardConfigReader for FixedConfig {
    async fn get_lead_time_days(&self) -> RepositoryResult<i64> {
        Ok(5)
    }

    async fn get_default_time_range(&self) -> RepositoryResult<TimeRange> {
        Ok(TimeRange::All)
    }

    async fn get_default_granularity(&self) -> RepositoryResult<Granularity> {
        Ok(Granularity::Weekly)
    }

    async fn get_locale(&self) -> RepositoryResult<String> {
        Ok("en".to_string())
    }

    async fn get_inventory_trend_months(&self) -> RepositoryResult<u32> {
        Ok(6)
    }
}

fn product(id: i64, quantity: i64) -> Product {
    Product {
        id,
        name: format!("P{}", id),
        sku: None,
        category_id: None,
        supplier_id: None,
        description: None,
        price: 1.0,
        quantity,
        low_stock_threshold: Some(10),
        last_updated: None,
    }
}

/// 首次 products() 调用挂起一段时间，模拟慢请求
struct SlowFirstSource {
    calls: AtomicUsize,
}

#[async_trait]
impl DashboardDataSource for SlowFirstSource {
    async fn products(&self) -> ApiResult<Vec<Product>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == 0 {
            tokio::time::sleep(Duration::from_millis(200)).await;
            return Ok(vec![product(1, 0)]);
        }
        Ok(vec![product(1, 0), product(2, 50)])
    }

    async fn suppliers(&self) -> ApiResult<Vec<Supplier>> {
        Ok(Vec::new())
    }

    async fn sales(&self, _loaded_at: NaiveDateTime) -> ApiResult<Vec<SaleRecord>> {
        Ok(Vec::new())
    }

    async fn purchase_orders(&self) -> ApiResult<Vec<PurchaseOrder>> {
        Ok(Vec::new())
    }
}

struct FailingSource;

#[async_trait]
impl DashboardDataSource for FailingSource {
    async fn products(&self) -> ApiResult<Vec<Product>> {
        Ok(Vec::new())
    }

    async fn suppliers(&self) -> ApiResult<Vec<Supplier>> {
        Ok(Vec::new())
    }

    async fn sales(&self, _loaded_at: NaiveDateTime) -> ApiResult<Vec<SaleRecord>> {
        Err(ApiError::DatabaseError("disk I/O error".to_string()))
    }

    async fn purchase_orders(&self) -> ApiResult<Vec<PurchaseOrder>> {
        Ok(Vec::new())
    }
}

// ==========================================
// 测试用例
// ==========================================

#[tokio::test]
async fn test_app_state_loader_builds_snapshot() {
    let (_db, state) = create_test_state();
    let hammer = add_product(&state, "Hammer", "H", 10.0, 100, 10, None, None);
    add_product(&state, "Nails", "N", 1.0, 0, 10, None, None);
    add_product(&state, "Glue", "G", 3.0, 4, 10, None, None);

    state
        .restock_api
        .record_sale(&NewSale {
            product_id: hammer,
            quantity: 4,
            sale_date: Some(dt(2024, 3, 2)),
            notes: None,
        })
        .unwrap();

    let outcome = state
        .dashboard_loader
        .load_at(DashboardFilter::default(), dt(2024, 3, 10))
        .await;
    let snapshot = outcome.loaded().expect("应加载成功");

    assert_eq!(snapshot.time_range, TimeRange::Last6Months);
    assert_eq!(snapshot.granularity, Granularity::Monthly);
    assert_eq!(snapshot.stock_counts.total, 3);
    assert_eq!(snapshot.stock_counts.out_of_stock, 2);
    assert_eq!(snapshot.stock_counts.in_stock, 1);
    assert_eq!(snapshot.reorder.suggestions.len(), 2);
    assert!(!snapshot.used_fallback);
    assert_eq!(snapshot.sales_buckets.len(), 1);
    assert_eq!(snapshot.sales_buckets[0].key, "2024-03");
    assert!((snapshot.sales_kpis.total_revenue - 40.0).abs() < 1e-9);
    assert_eq!(snapshot.restock.pending_orders, 0);
}

#[tokio::test]
async fn test_superseded_load_is_discarded() {
    let loader = DashboardLoader::new(
        Arc::new(SlowFirstSource {
            calls: AtomicUsize::new(0),
        }),
        Arc::new(FixedConfig),
        "en",
    );
    let now = dt(2024, 3, 10);

    let (first, second) = tokio::join!(
        loader.load_at(DashboardFilter::default(), now),
        loader.load_at(DashboardFilter::default(), now),
    );

    assert!(first.is_stale());
    let snapshot = second.loaded().expect("最新一次加载应生效");
    assert_eq!(snapshot.stock_counts.total, 2);
    // 筛选缺省时取配置值
    assert_eq!(snapshot.time_range, TimeRange::All);
    assert_eq!(snapshot.granularity, Granularity::Weekly);
    assert_eq!(snapshot.reorder.suggestions[0].lead_time, 5);
}

#[tokio::test]
async fn test_unmounted_view_discards_result() {
    let loader = DashboardLoader::new(
        Arc::new(SlowFirstSource {
            calls: AtomicUsize::new(1),
        }),
        Arc::new(FixedConfig),
        "en",
    );
    let guard = loader.guard();
    guard.unmount();

    let outcome = loader.load_at(DashboardFilter::default(), dt(2024, 3, 10)).await;
    assert!(outcome.is_stale());

    guard.remount();
    let outcome = loader.load_at(DashboardFilter::default(), dt(2024, 3, 10)).await;
    assert!(matches!(outcome, LoadOutcome::Loaded(_)));
}

#[tokio::test]
async fn test_failed_load_produces_error_notification() {
    let loader = DashboardLoader::new(Arc::new(FailingSource), Arc::new(FixedConfig), "en");

    let outcome = loader.load_at(DashboardFilter::default(), dt(2024, 3, 10)).await;
    match outcome {
        LoadOutcome::Failed(notification) => {
            assert_eq!(notification.level, NotificationLevel::Error);
            assert!(notification.message.starts_with("Failed to load dashboard:"));
            assert!(notification.message.contains("disk I/O error"));
        }
        other => panic!("应为加载失败: {:?}", other),
    }
}

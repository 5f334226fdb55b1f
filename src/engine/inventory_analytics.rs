// ==========================================
// 库存管理看板 - 库存/销售分析引擎
// ==========================================
// 职责: 分类表现、库存月度趋势、销售汇总、补货汇总
// 红线: 纯函数，数据由调用方一次性加载后传入
// ==========================================

use crate::domain::product::{Category, Product};
use crate::domain::purchase_order::{PurchaseOrder, StockMovement};
use crate::domain::sale::SaleRecord;
use crate::domain::types::PurchaseOrderStatus;
use crate::engine::stock_status::get_stock_counts;
use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::instrument;

/// 库存趋势月份数上下限
pub const MIN_TREND_MONTHS: u32 = 1;
pub const MAX_TREND_MONTHS: u32 = 24;

// ==========================================
// 结果结构
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPerformance {
    pub category_id: i64,
    pub category: String,
    pub revenue: f64,
    pub sales_units: i64,
    pub inventory: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryTrendPoint {
    pub year_month: String,
    pub total_value: f64,
    pub total_items: i64,
    pub units_sold: i64,
    pub turnover_rate: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub total_revenue: f64,
    pub total_units: i64,
    pub top_category: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestockSummary {
    pub pending_orders: usize,
    pub low_stock_items: usize,
    pub out_of_stock_items: usize,
    pub total_pending_value: f64,
}

/// 单价: 成交价优先，缺失时取商品当前价格
fn unit_price(sale: &SaleRecord, prices: &HashMap<i64, f64>) -> f64 {
    sale.sale_price
        .or_else(|| sale.product_id.and_then(|id| prices.get(&id)).copied())
        .unwrap_or(0.0)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

// ==========================================
// 分类表现
// ==========================================

/// 按分类汇总营收、销量、在库数量
///
/// 无销售的分类以 0 出现；结果按分类 ID 升序
#[instrument(skip_all, fields(categories = categories.len(), sales = sales.len()))]
pub fn category_performance(
    categories: &[Category],
    products: &[Product],
    sales: &[SaleRecord],
) -> Vec<CategoryPerformance> {
    let product_category: HashMap<i64, i64> = products
        .iter()
        .filter_map(|p| p.category_id.map(|c| (p.id, c)))
        .collect();
    let prices: HashMap<i64, f64> = products.iter().map(|p| (p.id, p.price)).collect();

    let mut inventory: HashMap<i64, i64> = HashMap::new();
    for p in products {
        if let Some(cid) = p.category_id {
            *inventory.entry(cid).or_insert(0) += p.quantity;
        }
    }

    let mut revenue: HashMap<i64, (f64, i64)> = HashMap::new();
    for sale in sales {
        if let Some(cid) = sale.product_id.and_then(|id| product_category.get(&id)) {
            let entry = revenue.entry(*cid).or_insert((0.0, 0));
            entry.0 += unit_price(sale, &prices) * sale.quantity as f64;
            entry.1 += sale.quantity;
        }
    }

    let mut out: Vec<CategoryPerformance> = categories
        .iter()
        .map(|c| {
            let (rev, units) = revenue.get(&c.id).copied().unwrap_or((0.0, 0));
            CategoryPerformance {
                category_id: c.id,
                category: c.name.clone(),
                revenue: rev,
                sales_units: units,
                inventory: inventory.get(&c.id).copied().unwrap_or(0),
            }
        })
        .collect();
    out.sort_by_key(|c| c.category_id);
    out
}

// ==========================================
// 库存趋势
// ==========================================

/// 最近 N 个自然月（含当月），从旧到新
pub fn trailing_months(now: NaiveDateTime, months: u32) -> Vec<(i32, u32)> {
    let months = months.clamp(MIN_TREND_MONTHS, MAX_TREND_MONTHS);
    let first_of_month = NaiveDate::from_ymd_opt(now.year(), now.month(), 1);

    (0..months)
        .rev()
        .filter_map(|back| {
            first_of_month
                .and_then(|d| d.checked_sub_months(Months::new(back)))
                .map(|d| (d.year(), d.month()))
        })
        .collect()
}

fn month_bounds(year: i32, month: u32) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = start.checked_add_months(Months::new(1))?;
    let last_day = next.pred_opt()?;
    Some((start.and_hms_opt(0, 0, 0)?, last_day.and_hms_opt(23, 59, 59)?))
}

/// 月度库存快照
///
/// 每个商品在月末的库存 = 月末（含）之前最后一条变动的 quantity_after，无变动时取当前库存
/// 周转率 = round(当月销量 / 月末总件数 × 100)，总件数为 0 时为 0
#[instrument(skip_all, fields(months = months, products = products.len()))]
pub fn inventory_trend(
    products: &[Product],
    movements: &[StockMovement],
    sales: &[SaleRecord],
    now: NaiveDateTime,
    months: u32,
) -> Vec<InventoryTrendPoint> {
    // product_id → 按时间排序的变动
    let mut by_product: HashMap<i64, Vec<&StockMovement>> = HashMap::new();
    for m in movements {
        by_product.entry(m.product_id).or_default().push(m);
    }
    for list in by_product.values_mut() {
        list.sort_by_key(|m| (m.transaction_date, m.id));
    }

    trailing_months(now, months)
        .into_iter()
        .filter_map(|(y, m)| {
            let (start, end) = month_bounds(y, m)?;

            let mut total_value = 0.0;
            let mut total_items = 0i64;
            for p in products {
                let qty = by_product
                    .get(&p.id)
                    .and_then(|list| list.iter().rev().find(|mv| mv.transaction_date <= end))
                    .map(|mv| mv.quantity_after)
                    .unwrap_or(p.quantity);
                total_items += qty;
                total_value += qty as f64 * p.price;
            }

            let units_sold: i64 = sales
                .iter()
                .filter(|s| s.dated && s.sale_date >= start && s.sale_date <= end)
                .map(|s| s.quantity)
                .sum();

            let turnover_rate = if total_items > 0 {
                (units_sold as f64 / total_items as f64 * 100.0).round() as i64
            } else {
                0
            };

            Some(InventoryTrendPoint {
                year_month: format!("{}-{:02}", y, m),
                total_value: round2(total_value),
                total_items,
                units_sold,
                turnover_rate,
            })
        })
        .collect()
}

// ==========================================
// 销售汇总
// ==========================================

/// 总营收、总销量、销量最高的分类（并列取分类 ID 较小者）
pub fn sales_summary(sales: &[SaleRecord], products: &[Product], categories: &[Category]) -> SalesSummary {
    let prices: HashMap<i64, f64> = products.iter().map(|p| (p.id, p.price)).collect();
    let product_category: HashMap<i64, i64> = products
        .iter()
        .filter_map(|p| p.category_id.map(|c| (p.id, c)))
        .collect();

    let mut total_revenue = 0.0;
    let mut total_units = 0i64;
    let mut units_by_category: BTreeMap<i64, i64> = BTreeMap::new();

    for sale in sales {
        total_revenue += unit_price(sale, &prices) * sale.quantity as f64;
        total_units += sale.quantity;
        if let Some(cid) = sale.product_id.and_then(|id| product_category.get(&id)) {
            *units_by_category.entry(*cid).or_insert(0) += sale.quantity;
        }
    }

    let top_id = units_by_category
        .iter()
        .fold(None::<(i64, i64)>, |best, (cid, units)| match best {
            Some((_, best_units)) if best_units >= *units => best,
            _ => Some((*cid, *units)),
        })
        .map(|(cid, _)| cid);

    let top_category = top_id.and_then(|cid| {
        categories
            .iter()
            .find(|c| c.id == cid)
            .map(|c| c.name.clone())
    });

    SalesSummary {
        total_revenue,
        total_units,
        top_category,
    }
}

// ==========================================
// 补货汇总
// ==========================================

/// 待处理采购单数/货值 + 低库存/缺货计数（与状态判定引擎一致）
pub fn restock_summary(orders: &[PurchaseOrder], products: &[Product]) -> RestockSummary {
    let prices: HashMap<i64, f64> = products.iter().map(|p| (p.id, p.price)).collect();
    let pending: Vec<&PurchaseOrder> = orders
        .iter()
        .filter(|o| o.status == PurchaseOrderStatus::Pending)
        .collect();

    let total_pending_value = pending
        .iter()
        .map(|o| prices.get(&o.product_id).copied().unwrap_or(0.0) * o.quantity_ordered as f64)
        .sum();

    let counts = get_stock_counts(products);

    RestockSummary {
        pending_orders: pending.len(),
        low_stock_items: counts.low_stock,
        out_of_stock_items: counts.out_of_stock,
        total_pending_value,
    }
}

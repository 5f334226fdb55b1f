// ==========================================
// 库存管理看板 - 销售时间序列聚合引擎
// ==========================================
// 输入: 归一化销售记录 + 商品（价格回退 / 分类筛选）
// 输出: 按周/月分桶的营收与销量，及 KPI
// ==========================================
// 分桶键:
// - 月: "YYYY-MM"
// - 周: "YYYY-Www"，week = ceil((年内第几天(0 起) + 1月1日星期(周日=0) + 1) / 7)
//   非 ISO-8601 周，历史图表标签依赖此口径，不得改动
// 回退: 时间窗口内无数据但全量非空 → 对全量（同分类筛选）重新聚合
// ==========================================

use crate::domain::product::Product;
use crate::domain::sale::SaleRecord;
use crate::domain::types::Granularity;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::instrument;

// ==========================================
// 数据结构
// ==========================================

/// 单个时间桶
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesBucket {
    pub key: String,
    pub revenue: f64,
    pub orders: i64,
}

/// 筛选条件
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesFilter {
    /// 窗口起点（含），None 表示不限
    pub since: Option<NaiveDateTime>,
    /// 分类筛选，None 表示全部分类
    pub category_id: Option<i64>,
}

/// 聚合结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    pub buckets: Vec<SalesBucket>,
    /// 是否因窗口内无数据而回退到全量
    pub used_fallback: bool,
}

impl AggregationResult {
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// 指标；None 表示不可用（不会出现 NaN / ∞）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesKpis {
    pub total_revenue: f64,
    pub total_orders: i64,
    pub avg_period_revenue: Option<f64>,
    pub avg_order_value: Option<f64>,
    pub growth_rate: Option<f64>,
}

// ==========================================
// 分桶键 / 标签
// ==========================================

/// 周序号（1 起）
///
/// 只按日期计算，不含时刻。旧版前端图表用含时刻的小数天数计算，
/// 周六非零点的销售在部分年份标签差一周（2024-01-06 10:30: 此处 W01，旧图表 W02），
/// 待产品确认采用哪种口径
pub fn week_number(date: NaiveDate) -> u32 {
    let jan1_weekday = NaiveDate::from_ymd_opt(date.year(), 1, 1)
        .map(|d| d.weekday().num_days_from_sunday())
        .unwrap_or(0);
    // ceil(n / 7)
    (date.ordinal0() + jan1_weekday + 1 + 6) / 7
}

pub fn bucket_key(ts: NaiveDateTime, granularity: Granularity) -> String {
    let date = ts.date();
    match granularity {
        Granularity::Monthly => format!("{}-{:02}", date.year(), date.month()),
        Granularity::Weekly => format!("{}-W{:02}", date.year(), week_number(date)),
    }
}

/// 桶键 → 展示标签（"Jan 2024" / "Week 3, 2024"），无法识别时原样返回
pub fn bucket_label(key: &str, granularity: Granularity) -> String {
    let parsed = match granularity {
        Granularity::Weekly => key.split_once("-W").and_then(|(y, w)| {
            let year: i32 = y.parse().ok()?;
            let week: u32 = w.parse().ok()?;
            Some(format!("Week {}, {}", week, year))
        }),
        Granularity::Monthly => key.split_once('-').and_then(|(y, m)| {
            let year: i32 = y.parse().ok()?;
            let month: u32 = m.parse().ok()?;
            NaiveDate::from_ymd_opt(year, month, 1).map(|d| d.format("%b %Y").to_string())
        }),
    };
    parsed.unwrap_or_else(|| key.to_string())
}

// ==========================================
// SalesAggregator - 聚合引擎
// ==========================================
pub struct SalesAggregator {
    granularity: Granularity,
}

impl Default for SalesAggregator {
    fn default() -> Self {
        Self::new(Granularity::Monthly)
    }
}

impl SalesAggregator {
    pub fn new(granularity: Granularity) -> Self {
        Self { granularity }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// 无筛选聚合
    ///
    /// 单价优先取成交价，缺失时取商品当前价格，再缺失为 0
    pub fn aggregate(&self, sales: &[SaleRecord], products: &[Product]) -> Vec<SalesBucket> {
        let index = product_index(products);
        self.aggregate_iter(sales.iter(), &index)
    }

    /// 带筛选聚合（含空窗口回退）
    #[instrument(skip(self, sales, products), fields(sales = sales.len(), granularity = %self.granularity))]
    pub fn aggregate_filtered(
        &self,
        sales: &[SaleRecord],
        products: &[Product],
        filter: &SalesFilter,
    ) -> AggregationResult {
        let index = product_index(products);

        let in_category = |s: &&SaleRecord| match filter.category_id {
            None => true,
            Some(cid) => s
                .product_id
                .and_then(|id| index.get(&id))
                .map(|p| p.category_id == Some(cid))
                .unwrap_or(false),
        };
        // 无日期的记录不进入任何窗口，只参与全量回退
        let in_window = |s: &&SaleRecord| match filter.since {
            None => true,
            Some(since) => s.dated && s.sale_date >= since,
        };

        let buckets = self.aggregate_iter(sales.iter().filter(in_window).filter(in_category), &index);
        if !buckets.is_empty() || sales.is_empty() {
            return AggregationResult {
                buckets,
                used_fallback: false,
            };
        }

        tracing::debug!("时间窗口内无销售数据，回退到全量");
        AggregationResult {
            buckets: self.aggregate_iter(sales.iter().filter(in_category), &index),
            used_fallback: true,
        }
    }

    fn aggregate_iter<'a>(
        &self,
        sales: impl Iterator<Item = &'a SaleRecord>,
        index: &HashMap<i64, &Product>,
    ) -> Vec<SalesBucket> {
        let mut buckets: BTreeMap<String, SalesBucket> = BTreeMap::new();

        for sale in sales {
            let key = bucket_key(sale.sale_date, self.granularity);
            let unit_price = sale
                .sale_price
                .or_else(|| sale.product_id.and_then(|id| index.get(&id)).map(|p| p.price))
                .unwrap_or(0.0);

            let bucket = buckets.entry(key.clone()).or_insert_with(|| SalesBucket {
                key,
                revenue: 0.0,
                orders: 0,
            });
            bucket.revenue += unit_price * sale.quantity as f64;
            bucket.orders += sale.quantity;
        }

        // BTreeMap 按键升序（键均为零填充且以年份开头）
        buckets.into_values().collect()
    }
}

fn product_index(products: &[Product]) -> HashMap<i64, &Product> {
    products.iter().map(|p| (p.id, p)).collect()
}

// ==========================================
// KPI
// ==========================================

/// 基于桶序列计算 KPI
///
/// growth_rate: 首个与最后一个营收 > 0 的桶之间的复合增长率，
/// 区间数为 0 或结果非有限值时为 None
pub fn compute_kpis(buckets: &[SalesBucket]) -> SalesKpis {
    let total_revenue: f64 = buckets.iter().map(|b| b.revenue).sum();
    let total_orders: i64 = buckets.iter().map(|b| b.orders).sum();

    let avg_period_revenue = if buckets.is_empty() {
        None
    } else {
        Some(total_revenue / buckets.len() as f64)
    };
    let avg_order_value = if total_orders > 0 {
        Some(total_revenue / total_orders as f64)
    } else {
        None
    };

    SalesKpis {
        total_revenue,
        total_orders,
        avg_period_revenue: avg_period_revenue.filter(|v| v.is_finite()),
        avg_order_value: avg_order_value.filter(|v| v.is_finite()),
        growth_rate: growth_rate(buckets),
    }
}

fn growth_rate(buckets: &[SalesBucket]) -> Option<f64> {
    let first = buckets.iter().position(|b| b.revenue > 0.0)?;
    let last = buckets.iter().rposition(|b| b.revenue > 0.0)?;
    let periods = last.checked_sub(first).filter(|p| *p > 0)?;

    let start = buckets[first].revenue;
    let end = buckets[last].revenue;
    let rate = (end / start).powf(1.0 / periods as f64) - 1.0;
    rate.is_finite().then_some(rate)
}

// ==========================================
// 库存管理看板 - 补货建议引擎
// ==========================================
// 输入: 全部商品 + 全部供应商
// 输出: 排序后的补货建议列表
// ==========================================
// 规则:
// 1) 候选 = 缺货 ∪ 低库存（两集合由判定引擎保证互斥）
// 2) 建议量 = max(阈值 * 3 - 当前库存, 20)
// 3) 优先级: 缺货 → critical，低库存 → high（不产生 medium）
// 4) 排序: critical 在前；同级按当前库存升序；再按商品 ID 稳定排序
// ==========================================

use crate::domain::product::{Product, Supplier};
use crate::domain::purchase_order::NewPurchaseOrder;
use crate::domain::types::{PurchaseOrderStatus, ReorderPriority, ReorderReason, StockStatus};
use crate::engine::stock_status::{product_stock_status, threshold_of};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::instrument;

/// 建议量下限
pub const MIN_SUGGESTED_QUANTITY: i64 = 20;

/// 建议量倍数（阈值的 3 倍）
pub const SUGGESTION_THRESHOLD_MULTIPLIER: i64 = 3;

/// 默认到货周期（天）
pub const DEFAULT_LEAD_TIME_DAYS: i64 = 7;

/// 供应商缺失时的展示名
pub const NO_SUPPLIER_LABEL: &str = "No Supplier";

// ==========================================
// ReorderSuggestion - 补货建议
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderSuggestion {
    pub id: String,
    pub product: String,
    pub sku: String,
    pub current_stock: i64,
    pub threshold: i64,
    pub suggested_quantity: i64,
    pub supplier: String,
    pub priority: ReorderPriority,
    pub reason: ReorderReason,
    pub lead_time: i64,
    pub product_id: i64,
    pub supplier_id: Option<i64>,
}

/// 建议列表 + 缺货/低库存行数
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderReport {
    pub suggestions: Vec<ReorderSuggestion>,
    pub out_count: usize,
    pub low_count: usize,
}

/// 采购单下发方式
///
/// 多选 → 一次批量请求（同一事务，共享 group_id）
/// 单选 → 单笔请求（无 group_id）
#[derive(Debug, Clone, PartialEq)]
pub enum OrderPlan {
    Batch(Vec<NewPurchaseOrder>),
    Individual(Vec<NewPurchaseOrder>),
}

impl OrderPlan {
    pub fn orders(&self) -> &[NewPurchaseOrder] {
        match self {
            OrderPlan::Batch(v) | OrderPlan::Individual(v) => v,
        }
    }

    pub fn len(&self) -> usize {
        self.orders().len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders().is_empty()
    }
}

/// 建议量
pub fn suggested_quantity(threshold: i64, quantity: i64) -> i64 {
    (threshold * SUGGESTION_THRESHOLD_MULTIPLIER - quantity).max(MIN_SUGGESTED_QUANTITY)
}

// ==========================================
// ReorderEngine - 补货建议引擎
// ==========================================
pub struct ReorderEngine {
    lead_time_days: i64,
}

impl Default for ReorderEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReorderEngine {
    pub fn new() -> Self {
        Self {
            lead_time_days: DEFAULT_LEAD_TIME_DAYS,
        }
    }

    /// 指定到货周期（来自配置）
    pub fn with_lead_time(lead_time_days: i64) -> Self {
        Self {
            lead_time_days: lead_time_days.max(0),
        }
    }

    /// 生成补货建议
    #[instrument(skip(self, products, suppliers), fields(products = products.len(), suppliers = suppliers.len()))]
    pub fn generate(&self, products: &[Product], suppliers: &[Supplier]) -> ReorderReport {
        let supplier_names: HashMap<i64, &str> =
            suppliers.iter().map(|s| (s.id, s.name.as_str())).collect();

        // 缺货在前，低库存在后，按商品 ID 去重
        let out_of_stock = products
            .iter()
            .filter(|p| product_stock_status(p).label == StockStatus::OutOfStock);
        let low_stock = products
            .iter()
            .filter(|p| product_stock_status(p).label == StockStatus::LowStock);

        let mut seen = HashSet::new();
        let mut suggestions: Vec<ReorderSuggestion> = out_of_stock
            .chain(low_stock)
            .filter(|p| seen.insert(p.id))
            .map(|p| self.suggest(p, &supplier_names))
            .collect();

        suggestions.sort_by(|a, b| {
            let a_critical = a.priority == ReorderPriority::Critical;
            let b_critical = b.priority == ReorderPriority::Critical;
            b_critical
                .cmp(&a_critical)
                .then(a.current_stock.cmp(&b.current_stock))
                .then(a.product_id.cmp(&b.product_id))
        });

        let out_count = suggestions
            .iter()
            .filter(|s| s.reason == ReorderReason::OutOfStock)
            .count();
        let low_count = suggestions
            .iter()
            .filter(|s| s.reason == ReorderReason::BelowThreshold)
            .count();

        tracing::debug!(out_count, low_count, "补货建议生成完成");

        ReorderReport {
            suggestions,
            out_count,
            low_count,
        }
    }

    fn suggest(&self, product: &Product, supplier_names: &HashMap<i64, &str>) -> ReorderSuggestion {
        let is_out = product_stock_status(product).label == StockStatus::OutOfStock;
        let threshold = threshold_of(product);
        let supplier = product
            .supplier_id
            .and_then(|id| supplier_names.get(&id).copied())
            .unwrap_or(NO_SUPPLIER_LABEL);

        ReorderSuggestion {
            id: product.id.to_string(),
            product: product.name.clone(),
            sku: product.sku.clone().unwrap_or_default(),
            current_stock: product.quantity,
            threshold,
            suggested_quantity: suggested_quantity(threshold, product.quantity),
            supplier: supplier.to_string(),
            priority: if is_out {
                ReorderPriority::Critical
            } else {
                ReorderPriority::High
            },
            reason: if is_out {
                ReorderReason::OutOfStock
            } else {
                ReorderReason::BelowThreshold
            },
            lead_time: self.lead_time_days,
            product_id: product.id,
            supplier_id: product.supplier_id,
        }
    }

    /// 将选中的建议转换为采购单请求
    ///
    /// # 参数
    /// - selected: 选中的建议
    /// - quantities: 覆盖数量（按建议 id），下限 1；缺失时使用建议量
    /// - notify_by_email: 是否邮件通知供应商
    pub fn plan_orders(
        &self,
        selected: &[&ReorderSuggestion],
        quantities: &HashMap<String, i64>,
        notify_by_email: bool,
    ) -> OrderPlan {
        let orders: Vec<NewPurchaseOrder> = selected
            .iter()
            .map(|s| NewPurchaseOrder {
                product_id: s.product_id,
                supplier_id: s.supplier_id,
                quantity_ordered: quantities
                    .get(&s.id)
                    .map(|q| (*q).max(1))
                    .unwrap_or(s.suggested_quantity),
                status: PurchaseOrderStatus::Pending,
                notes: Some(format!("Auto-generated order: {}", s.reason)),
                notify_by_email,
            })
            .collect();

        if orders.len() > 1 {
            OrderPlan::Batch(orders)
        } else {
            OrderPlan::Individual(orders)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i64, quantity: i64, threshold: i64, supplier_id: Option<i64>) -> Product {
        Product {
            id,
            name: format!("P{}", id),
            sku: Some(format!("SKU-{}", id)),
            category_id: None,
            supplier_id,
            description: None,
            price: 2.0,
            quantity,
            low_stock_threshold: Some(threshold),
            last_updated: None,
        }
    }

    fn supplier(id: i64, name: &str) -> Supplier {
        Supplier {
            id,
            name: name.to_string(),
            email: None,
            phone: None,
            address: None,
        }
    }

    #[test]
    fn test_suggested_quantity_floor() {
        assert_eq!(suggested_quantity(10, 5), 25);
        assert_eq!(suggested_quantity(10, 12), 20);
        assert_eq!(suggested_quantity(0, 0), 20);
        assert_eq!(suggested_quantity(50, 0), 150);
    }

    #[test]
    fn test_generate_priorities_and_order() {
        let products = vec![
            product(1, 11, 10, Some(1)), // low
            product(2, 8, 10, Some(9)),  // out (低于阈值)
            product(3, 0, 10, None),     // out
            product(4, 100, 10, None),   // in stock
            product(5, 10, 10, None),    // low
        ];
        let report = ReorderEngine::new().generate(&products, &[supplier(1, "Acme")]);
        let ids: Vec<i64> = report.suggestions.iter().map(|s| s.product_id).collect();
        assert_eq!(ids, vec![3, 2, 5, 1]);
        assert_eq!(report.out_count, 2);
        assert_eq!(report.low_count, 2);

        let first = &report.suggestions[0];
        assert_eq!(first.priority, ReorderPriority::Critical);
        assert_eq!(first.reason, ReorderReason::OutOfStock);
        assert_eq!(first.supplier, NO_SUPPLIER_LABEL);
        assert_eq!(first.suggested_quantity, 30);
        assert_eq!(first.lead_time, DEFAULT_LEAD_TIME_DAYS);

        // 供应商 ID 指向不存在的供应商
        assert_eq!(report.suggestions[1].supplier, NO_SUPPLIER_LABEL);
        assert_eq!(report.suggestions[3].supplier, "Acme");
    }

    #[test]
    fn test_no_high_before_critical() {
        let products: Vec<Product> = (1..40)
            .map(|i| product(i, (i * 7) % 25, 10 + (i % 3), None))
            .collect();
        let report = ReorderEngine::new().generate(&products, &[]);
        let first_high = report
            .suggestions
            .iter()
            .position(|s| s.priority == ReorderPriority::High);
        if let Some(pos) = first_high {
            assert!(report.suggestions[pos..]
                .iter()
                .all(|s| s.priority != ReorderPriority::Critical));
        }
        assert!(report
            .suggestions
            .iter()
            .all(|s| s.priority != ReorderPriority::Medium));
    }

    #[test]
    fn test_equal_keys_tiebreak_on_product_id() {
        let products = vec![product(9, 0, 5, None), product(2, 0, 5, None), product(5, 0, 5, None)];
        let report = ReorderEngine::new().generate(&products, &[]);
        let ids: Vec<i64> = report.suggestions.iter().map(|s| s.product_id).collect();
        assert_eq!(ids, vec![2, 5, 9]);
    }

    #[test]
    fn test_lead_time_from_config() {
        let report = ReorderEngine::with_lead_time(14).generate(&[product(1, 0, 5, None)], &[]);
        assert_eq!(report.suggestions[0].lead_time, 14);
    }

    #[test]
    fn test_plan_orders_batch_vs_individual() {
        let engine = ReorderEngine::new();
        let report = engine.generate(
            &[product(1, 0, 10, Some(3)), product(2, 11, 10, None)],
            &[supplier(3, "Acme")],
        );
        let all: Vec<&ReorderSuggestion> = report.suggestions.iter().collect();

        let mut overrides = HashMap::new();
        overrides.insert("1".to_string(), 0);
        let plan = engine.plan_orders(&all, &overrides, true);
        match &plan {
            OrderPlan::Batch(orders) => {
                assert_eq!(orders.len(), 2);
                assert_eq!(orders[0].quantity_ordered, 1);
                assert_eq!(orders[0].supplier_id, Some(3));
                assert_eq!(orders[0].notes.as_deref(), Some("Auto-generated order: Out of stock"));
                assert!(orders[0].notify_by_email);
                assert_eq!(orders[1].quantity_ordered, 20);
            }
            other => panic!("expected batch, got {:?}", other),
        }

        let single = engine.plan_orders(&all[..1], &HashMap::new(), false);
        assert!(matches!(single, OrderPlan::Individual(ref v) if v.len() == 1));
        assert_eq!(single.orders()[0].quantity_ordered, 30);
    }
}

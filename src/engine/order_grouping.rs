// ==========================================
// 库存管理看板 - 采购单分组
// ==========================================
// 分组键: group_id（批量下单）或 "individual-{id}"（单笔）
// 组状态: 单一状态 → 该状态；混合 → pending > completed > cancelled
// 排序: 按下单时间倒序
// ==========================================

use crate::domain::product::Product;
use crate::domain::purchase_order::PurchaseOrder;
use crate::domain::types::PurchaseOrderStatus;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// 单笔采购单分组键前缀
pub const INDIVIDUAL_GROUP_PREFIX: &str = "individual-";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderGroup {
    pub key: String,
    pub ids: Vec<i64>,
    pub items: Vec<PurchaseOrder>,
    pub total_quantity: i64,
    pub total_value: f64,
    pub order_date: NaiveDateTime,
    pub status: PurchaseOrderStatus,
    pub supplier_id: Option<i64>,
    pub is_grouped: bool,
}

/// 分组键是否指向批量组
pub fn is_batch_group_key(key: &str) -> bool {
    !key.is_empty() && !key.starts_with(INDIVIDUAL_GROUP_PREFIX)
}

/// 组状态合并
pub fn merge_group_status(statuses: &HashSet<PurchaseOrderStatus>) -> PurchaseOrderStatus {
    if statuses.len() == 1 {
        if let Some(only) = statuses.iter().next() {
            return *only;
        }
    }
    if statuses.contains(&PurchaseOrderStatus::Pending) {
        PurchaseOrderStatus::Pending
    } else if statuses.contains(&PurchaseOrderStatus::Completed) {
        PurchaseOrderStatus::Completed
    } else if statuses.contains(&PurchaseOrderStatus::Cancelled) {
        PurchaseOrderStatus::Cancelled
    } else {
        PurchaseOrderStatus::Pending
    }
}

/// 采购单分组
///
/// 组货值 = Σ 商品当前单价 × 采购数量（商品缺失按 0 计）
pub fn group_orders(orders: &[PurchaseOrder], products: &[Product]) -> Vec<OrderGroup> {
    let prices: HashMap<i64, f64> = products.iter().map(|p| (p.id, p.price)).collect();

    let mut order_of_keys: Vec<String> = Vec::new();
    let mut groups: HashMap<String, (OrderGroup, HashSet<PurchaseOrderStatus>)> = HashMap::new();

    for order in orders {
        let key = match order.group_id.as_deref().filter(|g| !g.is_empty()) {
            Some(g) => g.to_string(),
            None => format!("{}{}", INDIVIDUAL_GROUP_PREFIX, order.id),
        };

        let (group, statuses) = groups.entry(key.clone()).or_insert_with(|| {
            order_of_keys.push(key.clone());
            (
                OrderGroup {
                    key: key.clone(),
                    ids: Vec::new(),
                    items: Vec::new(),
                    total_quantity: 0,
                    total_value: 0.0,
                    order_date: order.order_date,
                    status: PurchaseOrderStatus::Pending,
                    supplier_id: order.supplier_id,
                    is_grouped: order.group_id.as_deref().map_or(false, |g| !g.is_empty()),
                },
                HashSet::new(),
            )
        });

        let unit_price = prices.get(&order.product_id).copied().unwrap_or(0.0);
        group.ids.push(order.id);
        group.total_quantity += order.quantity_ordered;
        group.total_value += unit_price * order.quantity_ordered as f64;
        group.items.push(order.clone());
        statuses.insert(order.status);
    }

    let mut result: Vec<OrderGroup> = order_of_keys
        .into_iter()
        .filter_map(|key| groups.remove(&key))
        .map(|(mut group, statuses)| {
            group.status = merge_group_status(&statuses);
            group
        })
        .collect();

    // 稳定排序: 同一时间保持输入顺序
    result.sort_by(|a, b| b.order_date.cmp(&a.order_date));
    result
}

// ==========================================
// 库存管理看板 - 供应商分析引擎
// ==========================================
// 供应商下单量/货值（时间窗口内）
// 最常补货 SKU Top5、最常用供应商 Top5（全量采购单）
// ==========================================

use crate::domain::product::{Product, Supplier};
use crate::domain::purchase_order::PurchaseOrder;
use crate::domain::types::PurchaseOrderStatus;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Top 榜单长度
pub const TOP_N: usize = 5;

/// 未知供应商展示名
pub const UNKNOWN_SUPPLIER_LABEL: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierOrderVolume {
    pub supplier_id: Option<i64>,
    pub supplier: String,
    pub orders: i64,
    pub value: f64,
    pub completed: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderedSku {
    pub sku: String,
    pub name: Option<String>,
    pub reorder_count: i64,
    pub total_qty: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierAnalytics {
    pub order_volume: Vec<SupplierOrderVolume>,
    pub most_reordered_skus: Vec<ReorderedSku>,
    pub most_used_suppliers: Vec<SupplierOrderVolume>,
}

pub struct SupplierAnalyticsEngine;

impl SupplierAnalyticsEngine {
    /// 供应商分析
    ///
    /// # 参数
    /// - since: 下单量/货值统计的窗口起点（None 表示全量）
    pub fn analyze(
        suppliers: &[Supplier],
        products: &[Product],
        orders: &[PurchaseOrder],
        since: Option<NaiveDateTime>,
    ) -> SupplierAnalytics {
        let product_index: HashMap<i64, &Product> = products.iter().map(|p| (p.id, p)).collect();
        let supplier_names: HashMap<i64, &str> =
            suppliers.iter().map(|s| (s.id, s.name.as_str())).collect();

        let windowed: Vec<&PurchaseOrder> = orders
            .iter()
            .filter(|o| since.map_or(true, |s| o.order_date >= s))
            .collect();

        let order_volume = Self::tally(suppliers, &supplier_names, &product_index, windowed.into_iter(), true)
            .into_iter()
            .map(|mut v| {
                v.value = (v.value * 100.0).round() / 100.0;
                v
            })
            .collect();

        let mut most_used_suppliers =
            Self::tally(&[], &supplier_names, &product_index, orders.iter(), false);
        most_used_suppliers.sort_by(|a, b| b.orders.cmp(&a.orders));
        most_used_suppliers.truncate(TOP_N);

        SupplierAnalytics {
            order_volume,
            most_reordered_skus: Self::most_reordered(orders, &product_index),
            most_used_suppliers,
        }
    }

    /// 按供应商累计；seed 中的供应商即使无单也会出现
    fn tally<'a>(
        seed: &[Supplier],
        supplier_names: &HashMap<i64, &str>,
        product_index: &HashMap<i64, &Product>,
        orders: impl Iterator<Item = &'a PurchaseOrder>,
        with_value: bool,
    ) -> Vec<SupplierOrderVolume> {
        let mut keys: Vec<Option<i64>> = seed.iter().map(|s| Some(s.id)).collect();
        let mut acc: HashMap<Option<i64>, SupplierOrderVolume> = seed
            .iter()
            .map(|s| {
                (
                    Some(s.id),
                    SupplierOrderVolume {
                        supplier_id: Some(s.id),
                        supplier: s.name.clone(),
                        orders: 0,
                        value: 0.0,
                        completed: 0,
                    },
                )
            })
            .collect();

        for o in orders {
            let entry = acc.entry(o.supplier_id).or_insert_with(|| {
                keys.push(o.supplier_id);
                SupplierOrderVolume {
                    supplier_id: o.supplier_id,
                    supplier: o
                        .supplier_id
                        .and_then(|id| supplier_names.get(&id).copied())
                        .unwrap_or(UNKNOWN_SUPPLIER_LABEL)
                        .to_string(),
                    orders: 0,
                    value: 0.0,
                    completed: 0,
                }
            });
            entry.orders += 1;
            if with_value {
                let price = product_index.get(&o.product_id).map_or(0.0, |p| p.price);
                entry.value += price * o.quantity_ordered as f64;
            }
            if o.status == PurchaseOrderStatus::Completed {
                entry.completed += 1;
            }
        }

        keys.into_iter().filter_map(|k| acc.remove(&k)).collect()
    }

    /// 每条采购单计一次补货；按次数、再按总量倒序
    fn most_reordered(orders: &[PurchaseOrder], product_index: &HashMap<i64, &Product>) -> Vec<ReorderedSku> {
        let mut keys: Vec<String> = Vec::new();
        let mut acc: HashMap<String, ReorderedSku> = HashMap::new();

        for o in orders {
            let product = product_index.get(&o.product_id);
            let sku = product
                .and_then(|p| p.sku.clone())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| o.product_id.to_string());

            let entry = acc.entry(sku.clone()).or_insert_with(|| {
                keys.push(sku.clone());
                ReorderedSku {
                    sku: sku.clone(),
                    name: product.map(|p| p.name.clone()),
                    reorder_count: 0,
                    total_qty: 0,
                }
            });
            entry.reorder_count += 1;
            entry.total_qty += o.quantity_ordered;
        }

        let mut out: Vec<ReorderedSku> = keys.into_iter().filter_map(|k| acc.remove(&k)).collect();
        out.sort_by(|a, b| {
            b.reorder_count
                .cmp(&a.reorder_count)
                .then(b.total_qty.cmp(&a.total_qty))
        });
        out.truncate(TOP_N);
        out
    }
}

// ==========================================
// 库存管理看板 - 库存状态判定引擎
// ==========================================
// 输入: (库存数量, 补货阈值)
// 输出: 三态标签 + 展示变体
// 红线: 纯函数，相同输入必得相同输出
// ==========================================
// 规则:
// 1) 阈值 <= 0 (未配置): 数量 == 0 → 缺货，否则 → 正常
// 2) 阈值 > 0: margin = ceil(阈值 * 0.2)
//    - 数量 < 阈值 → 缺货（低于补货线即按缺货告警，不代表库存为 0）
//    - |阈值 - 数量| <= margin → 低库存
//    - 其他 → 正常
// ==========================================

use crate::domain::product::Product;
use crate::domain::types::{StockStatus, StockVariant};
use serde::{Deserialize, Serialize};

/// 低库存带宽系数
pub const LOW_STOCK_MARGIN_RATIO: f64 = 0.2;

/// 判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockStatusResult {
    pub label: StockStatus,
    pub variant: StockVariant,
}

impl StockStatusResult {
    fn of(label: StockStatus) -> Self {
        let variant = match label {
            StockStatus::InStock => StockVariant::Default,
            StockStatus::LowStock => StockVariant::Secondary,
            StockStatus::OutOfStock => StockVariant::Destructive,
        };
        Self { label, variant }
    }
}

/// 低库存带宽 ceil(threshold * 0.2)
///
/// 按 f64 计算后向上取整，与看板历史口径一致
pub fn low_stock_margin(threshold: i64) -> i64 {
    (threshold as f64 * LOW_STOCK_MARGIN_RATIO).ceil() as i64
}

/// 库存状态判定
pub fn classify(quantity: i64, threshold: i64) -> StockStatusResult {
    if threshold <= 0 {
        return if quantity == 0 {
            StockStatusResult::of(StockStatus::OutOfStock)
        } else {
            StockStatusResult::of(StockStatus::InStock)
        };
    }

    if quantity < threshold {
        return StockStatusResult::of(StockStatus::OutOfStock);
    }

    if (threshold - quantity).abs() <= low_stock_margin(threshold) {
        return StockStatusResult::of(StockStatus::LowStock);
    }

    StockStatusResult::of(StockStatus::InStock)
}

/// 阈值读取（缺失视为 0）
pub fn threshold_of(product: &Product) -> i64 {
    product.threshold()
}

pub fn product_stock_status(product: &Product) -> StockStatusResult {
    classify(product.quantity, threshold_of(product))
}

pub fn is_out_of_stock(product: &Product) -> bool {
    product_stock_status(product).label == StockStatus::OutOfStock
}

pub fn is_low_stock(product: &Product) -> bool {
    product_stock_status(product).label == StockStatus::LowStock
}

/// 按状态筛选
pub fn filter_by_status<'a>(products: &'a [Product], status: StockStatus) -> Vec<&'a Product> {
    products
        .iter()
        .filter(|p| product_stock_status(p).label == status)
        .collect()
}

// ==========================================
// StockCounts - 状态计数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockCounts {
    pub out_of_stock: usize,
    pub low_stock: usize,
    pub in_stock: usize,
    pub total: usize,
}

/// 状态计数：in_stock = total - out_of_stock - low_stock
pub fn get_stock_counts(products: &[Product]) -> StockCounts {
    let out_of_stock = products.iter().filter(|p| is_out_of_stock(p)).count();
    let low_stock = products
        .iter()
        .filter(|p| !is_out_of_stock(p) && is_low_stock(p))
        .count();
    let total = products.len();

    StockCounts {
        out_of_stock,
        low_stock,
        in_stock: total - out_of_stock - low_stock,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i64, quantity: i64, threshold: Option<i64>) -> Product {
        Product {
            id,
            name: format!("P{}", id),
            sku: None,
            category_id: None,
            supplier_id: None,
            description: None,
            price: 1.0,
            quantity,
            low_stock_threshold: threshold,
            last_updated: None,
        }
    }

    #[test]
    fn test_reference_scenarios() {
        assert_eq!(classify(5, 10).label, StockStatus::OutOfStock);
        assert_eq!(classify(20, 10).label, StockStatus::InStock);
        assert_eq!(classify(0, 0).label, StockStatus::OutOfStock);
        // 10 <= 11 <= 12: 补货线上方 margin 带内
        assert_eq!(classify(11, 10).label, StockStatus::LowStock);
        assert_eq!(classify(12, 10).label, StockStatus::LowStock);
        assert_eq!(classify(13, 10).label, StockStatus::InStock);
    }

    #[test]
    fn test_just_below_threshold_is_out_of_stock() {
        // 9 距阈值仅 1，但低于补货线，按缺货处理
        let r = classify(9, 10);
        assert_eq!(r.label, StockStatus::OutOfStock);
        assert_eq!(r.variant, StockVariant::Destructive);
    }

    #[test]
    fn test_equal_to_threshold_is_low_stock() {
        assert_eq!(classify(10, 10).label, StockStatus::LowStock);
    }

    #[test]
    fn test_no_threshold_rule() {
        for q in 0..50 {
            for th in [-5, 0] {
                let expected = if q == 0 {
                    StockStatus::OutOfStock
                } else {
                    StockStatus::InStock
                };
                assert_eq!(classify(q, th).label, expected, "q={} th={}", q, th);
            }
        }
    }

    #[test]
    fn test_never_low_below_threshold() {
        for th in 1..60 {
            for q in 0..th {
                assert_eq!(classify(q, th).label, StockStatus::OutOfStock);
            }
        }
    }

    #[test]
    fn test_margin_uses_float_ceil() {
        assert_eq!(low_stock_margin(10), 2);
        assert_eq!(low_stock_margin(1), 1);
        assert_eq!(low_stock_margin(5), 1);
        assert_eq!(low_stock_margin(35), 7);
        assert_eq!(low_stock_margin(36), 8);
    }

    #[test]
    fn test_variants() {
        assert_eq!(classify(100, 10).variant, StockVariant::Default);
        assert_eq!(classify(10, 10).variant, StockVariant::Secondary);
    }

    #[test]
    fn test_stock_counts_partition() {
        let products = vec![
            product(1, 0, None),
            product(2, 4, Some(10)),
            product(3, 11, Some(10)),
            product(4, 50, Some(10)),
            product(5, 7, None),
            product(6, 10, Some(10)),
        ];
        let counts = get_stock_counts(&products);
        assert_eq!(counts.out_of_stock, 2);
        assert_eq!(counts.low_stock, 2);
        assert_eq!(counts.in_stock, 2);
        assert_eq!(
            counts.out_of_stock + counts.low_stock + counts.in_stock,
            counts.total
        );
    }

    #[test]
    fn test_filter_by_status() {
        let products = vec![product(1, 0, None), product(2, 11, Some(10)), product(3, 99, Some(10))];
        let low = filter_by_status(&products, StockStatus::LowStock);
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].id, 2);
    }
}

// ==========================================
// 库存管理看板 - 商品/分类/供应商领域模型
// ==========================================
// 上游序列化字段不统一（lowStockThreshold / low_stock_threshold），
// 在反序列化边界一次性归一化
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ==========================================
// Product - 商品
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawProduct")]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub sku: Option<String>,
    pub category_id: Option<i64>,
    pub supplier_id: Option<i64>,
    pub description: Option<String>,
    pub price: f64,
    pub quantity: i64,
    // 0 或缺失表示未配置阈值
    pub low_stock_threshold: Option<i64>,
    pub last_updated: Option<NaiveDateTime>,
}

/// 上游原始商品形态（阈值字段名与类型都不统一）
#[derive(Debug, Clone, Default, Deserialize)]
struct RawProduct {
    id: i64,
    name: String,
    #[serde(default)]
    sku: Option<String>,
    #[serde(default, alias = "categoryId")]
    category_id: Option<i64>,
    #[serde(default, alias = "supplierId")]
    supplier_id: Option<i64>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    price: f64,
    #[serde(default)]
    quantity: i64,
    #[serde(default, rename = "lowStockThreshold")]
    threshold_camel: Option<Value>,
    #[serde(default, rename = "low_stock_threshold")]
    threshold_snake: Option<Value>,
    #[serde(default, alias = "lastUpdated")]
    last_updated: Option<NaiveDateTime>,
}

impl From<RawProduct> for Product {
    fn from(raw: RawProduct) -> Self {
        // lowStockThreshold 优先，null 视为缺失
        let threshold = [raw.threshold_camel, raw.threshold_snake]
            .into_iter()
            .flatten()
            .find(|v| !v.is_null())
            .map(|v| coerce_threshold(&v));

        Product {
            id: raw.id,
            name: raw.name,
            sku: raw.sku,
            category_id: raw.category_id,
            supplier_id: raw.supplier_id,
            description: raw.description,
            price: raw.price,
            quantity: raw.quantity,
            low_stock_threshold: threshold,
            last_updated: raw.last_updated,
        }
    }
}

/// 阈值转数字: 数字或数字字符串；NaN / 无法解析 / 负数为 0，小数向上取整
///
/// 库存为整数，向上取整后 "quantity < threshold" 的判定结果不变
fn coerce_threshold(value: &Value) -> i64 {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match n {
        Some(n) if n.is_finite() && n > 0.0 => n.ceil() as i64,
        _ => 0,
    }
}

impl Product {
    /// 生效阈值（缺失视为 0）
    pub fn threshold(&self) -> i64 {
        self.low_stock_threshold.unwrap_or(0)
    }

    /// 库存货值
    pub fn stock_value(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

/// 新建商品参数
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub supplier_id: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default, alias = "lowStockThreshold")]
    pub low_stock_threshold: i64,
}

// ==========================================
// Category - 商品分类
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

// ==========================================
// Supplier - 供应商
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSupplier {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_aliases() {
        let camel: Product =
            serde_json::from_str(r#"{"id":1,"name":"A","quantity":3,"lowStockThreshold":10}"#)
                .unwrap();
        let snake: Product =
            serde_json::from_str(r#"{"id":2,"name":"B","quantity":3,"low_stock_threshold":7}"#)
                .unwrap();
        let missing: Product = serde_json::from_str(r#"{"id":3,"name":"C"}"#).unwrap();

        assert_eq!(camel.threshold(), 10);
        assert_eq!(snake.threshold(), 7);
        assert_eq!(missing.threshold(), 0);
        assert_eq!(missing.quantity, 0);
    }

    #[test]
    fn test_threshold_both_keys_prefers_camel() {
        let p: Product = serde_json::from_str(
            r#"{"id":1,"name":"A","lowStockThreshold":10,"low_stock_threshold":4}"#,
        )
        .unwrap();
        assert_eq!(p.threshold(), 10);

        let p: Product = serde_json::from_str(
            r#"{"id":1,"name":"A","lowStockThreshold":null,"low_stock_threshold":4}"#,
        )
        .unwrap();
        assert_eq!(p.threshold(), 4);
    }

    #[test]
    fn test_threshold_coercion() {
        let parse = |threshold: &str| -> i64 {
            let json = format!(r#"{{"id":1,"name":"A","lowStockThreshold":{}}}"#, threshold);
            serde_json::from_str::<Product>(&json).unwrap().threshold()
        };
        assert_eq!(parse(r#""10""#), 10);
        assert_eq!(parse(r#"" 12 ""#), 12);
        assert_eq!(parse("10.0"), 10);
        assert_eq!(parse("9.5"), 10);
        assert_eq!(parse(r#""NaN""#), 0);
        assert_eq!(parse(r#""abc""#), 0);
        assert_eq!(parse("true"), 0);
        assert_eq!(parse("-3"), 0);
    }

    #[test]
    fn test_serialized_product_reads_back() {
        let p: Product =
            serde_json::from_str(r#"{"id":5,"name":"E","quantity":2,"lowStockThreshold":"8"}"#)
                .unwrap();
        let back: Product = serde_json::from_str(&serde_json::to_string(&p).unwrap()).unwrap();
        assert_eq!(back, p);
    }
}

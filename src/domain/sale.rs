// ==========================================
// 库存管理看板 - 销售记录领域模型
// ==========================================
// RawSaleRecord: 上游原始形态（日期字段存在多个别名，价格可能为字符串）
// SaleRecord:    归一化后的形态，聚合引擎只接受此类型
// ==========================================

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 日期字段探测顺序
pub const SALE_DATE_ALIASES: [&str; 5] = ["sale_date", "date", "saleDate", "created_at", "timestamp"];

// ==========================================
// SaleRecord - 归一化销售记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: i64,
    /// 缺失时仍计入销量，单价只能取成交价
    pub product_id: Option<i64>,
    pub quantity: i64,
    /// 成交单价；缺失时聚合使用商品当前价格
    pub sale_price: Option<f64>,
    pub sale_date: NaiveDateTime,
    /// false: 上游无可解析日期，sale_date 为加载时刻；不进入任何时间窗口
    #[serde(default = "default_dated")]
    pub dated: bool,
}

fn default_dated() -> bool {
    true
}

// ==========================================
// RawSaleRecord - 上游原始销售记录
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSaleRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, alias = "productId")]
    pub product_id: Option<i64>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default, alias = "salePrice")]
    pub sale_price: Option<Value>,
    #[serde(default)]
    pub sale_date: Option<Value>,
    #[serde(default)]
    pub date: Option<Value>,
    #[serde(default, rename = "saleDate")]
    pub sale_date_camel: Option<Value>,
    #[serde(default)]
    pub created_at: Option<Value>,
    #[serde(default)]
    pub timestamp: Option<Value>,
}

impl RawSaleRecord {
    /// 按别名顺序探测第一个可解析的日期
    pub fn resolve_date(&self) -> Option<NaiveDateTime> {
        [
            &self.sale_date,
            &self.date,
            &self.sale_date_camel,
            &self.created_at,
            &self.timestamp,
        ]
        .into_iter()
        .flatten()
        .find_map(parse_timestamp_value)
    }

    /// 归一化为 SaleRecord
    ///
    /// # 参数
    /// - loaded_at: 加载时刻；日期全部缺失/无法解析时使用
    ///
    /// 不丢弃任何记录：缺少 product_id 的记录保留，销量照常计入
    pub fn normalize(&self, loaded_at: NaiveDateTime) -> SaleRecord {
        let resolved = self.resolve_date();
        SaleRecord {
            id: self.id.unwrap_or(0),
            product_id: self.product_id,
            quantity: self.quantity.unwrap_or(0).max(0),
            sale_price: self.sale_price.as_ref().and_then(parse_number_value),
            sale_date: resolved.unwrap_or(loaded_at),
            dated: resolved.is_some(),
        }
    }
}

/// 批量归一化
pub fn normalize_sales(raw: &[RawSaleRecord], loaded_at: NaiveDateTime) -> Vec<SaleRecord> {
    raw.iter().map(|r| r.normalize(loaded_at)).collect()
}

// ==========================================
// 解析辅助
// ==========================================

fn parse_number_value(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn parse_timestamp_value(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::String(s) => parse_datetime_flexible(s),
        Value::Number(n) => n.as_i64().and_then(from_epoch_millis),
        _ => None,
    }
}

fn from_epoch_millis(ms: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(ms).map(|dt| dt.naive_utc())
}

/// 宽松日期解析
///
/// 支持格式（按顺序尝试）:
/// - RFC 3339（取记录自身时区的墙上时间）
/// - `YYYY-MM-DDTHH:MM:SS[.f]` / `YYYY-MM-DD HH:MM:SS[.f]`
/// - `YYYY-MM-DD` / `MM/DD/YYYY` / `DD/MM/YYYY`（零点）
/// - 纯数字: 毫秒时间戳
pub fn parse_datetime_flexible(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    for fmt in ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }

    s.parse::<i64>().ok().and_then(from_epoch_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_date_alias_probe_order() {
        let raw: RawSaleRecord = serde_json::from_str(
            r#"{"product_id":1,"quantity":2,"date":"2024-02-03","created_at":"2023-01-01"}"#,
        )
        .unwrap();
        let sale = raw.normalize(loaded_at());
        assert_eq!(sale.sale_date.date(), NaiveDate::from_ymd_opt(2024, 2, 3).unwrap());
    }

    #[test]
    fn test_camel_case_and_string_price() {
        let raw: RawSaleRecord = serde_json::from_str(
            r#"{"productId":4,"quantity":1,"salePrice":"12.50","saleDate":"2024-03-01T10:15:00Z"}"#,
        )
        .unwrap();
        let sale = raw.normalize(loaded_at());
        assert_eq!(sale.product_id, Some(4));
        assert_eq!(sale.sale_price, Some(12.5));
        assert_eq!(sale.sale_date.date(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn test_epoch_millis_timestamp() {
        let raw: RawSaleRecord =
            serde_json::from_str(r#"{"product_id":1,"quantity":1,"timestamp":1704067200000}"#)
                .unwrap();
        let sale = raw.normalize(loaded_at());
        assert_eq!(sale.sale_date.date(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn test_missing_date_uses_load_time() {
        let raw: RawSaleRecord =
            serde_json::from_str(r#"{"product_id":1,"quantity":1,"sale_date":"not a date"}"#).unwrap();
        let sale = raw.normalize(loaded_at());
        assert_eq!(sale.sale_date, loaded_at());
        assert!(!sale.dated);
    }

    #[test]
    fn test_missing_product_is_kept() {
        let raw = vec![
            RawSaleRecord {
                quantity: Some(1),
                sale_price: Some(Value::from(10.0)),
                date: Some(Value::from("2024-01-15")),
                ..Default::default()
            },
            RawSaleRecord {
                product_id: Some(9),
                quantity: Some(3),
                ..Default::default()
            },
        ];
        let sales = normalize_sales(&raw, loaded_at());
        assert_eq!(sales.len(), 2);
        assert_eq!(sales[0].product_id, None);
        assert_eq!(sales[0].sale_price, Some(10.0));
        assert!(sales[0].dated);
        assert_eq!(sales[1].product_id, Some(9));
        assert!(!sales[1].dated);
    }

    #[test]
    fn test_us_date_format() {
        let dt = parse_datetime_flexible("03/15/2024").unwrap();
        assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
    }
}

// ==========================================
// 库存管理看板 - 行映射
// ==========================================
// 职责: RawRow → 类型化行；失败返回 RowError（本地化原因）
// 红线: 不访问数据库（SKU/分类/供应商的解析由导入器完成）
// ==========================================

use crate::domain::product::{NewCategory, NewProduct, NewSupplier};
use crate::domain::sale::parse_datetime_flexible;
use crate::i18n::t_in;
use crate::importer::error::RowError;
use crate::importer::file_parser::RawRow;
use chrono::NaiveDateTime;

/// 销售上传中 SKU 列的别名（按顺序探测）
pub const SKU_ALIASES: [&str; 7] = [
    "sku",
    "SKU",
    "Sku",
    "sku_id",
    "SKU_ID",
    "product_sku",
    "productSKU",
];

/// 销售上传中日期列的别名
pub const SALE_DATE_COLUMNS: [&str; 2] = ["sale_date", "date"];

/// 商品行（分类/供应商按名称引用）
#[derive(Debug, Clone)]
pub struct ProductRow {
    pub row_number: usize,
    pub product: NewProduct,
    pub category: Option<String>,
    pub supplier: Option<String>,
}

/// 销售行的数量与日期
#[derive(Debug, Clone, PartialEq)]
pub struct SaleFields {
    pub quantity: i64,
    pub sale_date: Option<NaiveDateTime>,
}

// ==========================================
// RowMapper
// ==========================================
pub struct RowMapper {
    locale: String,
}

impl RowMapper {
    pub fn new(locale: &str) -> Self {
        Self {
            locale: locale.to_string(),
        }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// 构造本地化的行错误
    pub fn row_error(&self, row: &RawRow, key: &str, args: &[(&str, &str)]) -> RowError {
        RowError::new(row.row_number, t_in(&self.locale, key, args))
    }

    fn required<'a>(&self, row: &'a RawRow, field: &str) -> Result<&'a str, RowError> {
        row.get(field)
            .ok_or_else(|| self.row_error(row, "import.missing_field", &[("field", field)]))
    }

    fn non_negative_int(&self, row: &RawRow, field: &str) -> Result<Option<i64>, RowError> {
        let Some(raw) = row.get(field) else {
            return Ok(None);
        };
        let value = parse_int(raw).ok_or_else(|| {
            self.row_error(row, "import.invalid_number", &[("field", field), ("value", raw)])
        })?;
        if value < 0 {
            return Err(self.row_error(
                row,
                "import.negative_value",
                &[("field", field), ("value", &value.to_string())],
            ));
        }
        Ok(Some(value))
    }

    fn non_negative_float(&self, row: &RawRow, field: &str) -> Result<Option<f64>, RowError> {
        let Some(raw) = row.get(field) else {
            return Ok(None);
        };
        let value = raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| {
                self.row_error(row, "import.invalid_number", &[("field", field), ("value", raw)])
            })?;
        if value < 0.0 {
            return Err(self.row_error(
                row,
                "import.negative_value",
                &[("field", field), ("value", raw)],
            ));
        }
        Ok(Some(value))
    }

    /// 商品行: name 必填；price/quantity/low_stock_threshold 缺失按 0
    pub fn map_product(&self, row: &RawRow) -> Result<ProductRow, RowError> {
        let name = self.required(row, "name")?;
        let price = self.non_negative_float(row, "price")?.unwrap_or(0.0);
        let quantity = self.non_negative_int(row, "quantity")?.unwrap_or(0);
        let threshold = match row.get("low_stock_threshold") {
            Some(_) => self.non_negative_int(row, "low_stock_threshold")?,
            None => self.non_negative_int(row, "lowStockThreshold")?,
        }
        .unwrap_or(0);

        Ok(ProductRow {
            row_number: row.row_number,
            product: NewProduct {
                name: name.to_string(),
                sku: row.get("sku").map(str::to_string),
                category_id: None,
                supplier_id: None,
                description: row.get("description").map(str::to_string),
                price,
                quantity,
                low_stock_threshold: threshold,
            },
            category: row.get("category").map(str::to_string),
            supplier: row.get("supplier").map(str::to_string),
        })
    }

    pub fn map_category(&self, row: &RawRow) -> Result<NewCategory, RowError> {
        let name = self.required(row, "name")?;
        Ok(NewCategory {
            name: name.to_string(),
            description: row.get("description").map(str::to_string),
        })
    }

    pub fn map_supplier(&self, row: &RawRow) -> Result<NewSupplier, RowError> {
        let name = self.required(row, "name")?;
        Ok(NewSupplier {
            name: name.to_string(),
            email: row.get("email").map(str::to_string),
            phone: row.get("phone").map(str::to_string),
            address: row.get("address").map(str::to_string),
        })
    }

    /// 销售行中的 SKU（按别名顺序）
    pub fn sale_sku<'a>(&self, row: &'a RawRow) -> Option<&'a str> {
        row.get_any(&SKU_ALIASES)
    }

    /// 销售行的数量（必须为正整数）与日期（可选）
    pub fn map_sale_fields(&self, row: &RawRow) -> Result<SaleFields, RowError> {
        let raw_quantity = self.required(row, "quantity")?;
        let quantity = parse_int(raw_quantity).ok_or_else(|| {
            self.row_error(
                row,
                "import.invalid_number",
                &[("field", "quantity"), ("value", raw_quantity)],
            )
        })?;
        if quantity <= 0 {
            return Err(self.row_error(
                row,
                "import.quantity_not_positive",
                &[("value", &quantity.to_string())],
            ));
        }

        let sale_date = match row.get_any(&SALE_DATE_COLUMNS) {
            Some(raw) => Some(parse_datetime_flexible(raw).ok_or_else(|| {
                self.row_error(row, "import.invalid_date", &[("value", raw)])
            })?),
            None => None,
        };

        Ok(SaleFields {
            quantity,
            sale_date,
        })
    }
}

/// 整数解析；Excel 导出的 "3.0" 视为 3
fn parse_int(raw: &str) -> Option<i64> {
    if let Ok(v) = raw.parse::<i64>() {
        return Some(v);
    }
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && v.fract() == 0.0)
        .map(|v| v as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn row(n: usize, cells: &[(&str, &str)]) -> RawRow {
        RawRow {
            row_number: n,
            cells: cells
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        }
    }

    #[test]
    fn test_sale_fields_messages() {
        let mapper = RowMapper::new("en");

        let missing = mapper.map_sale_fields(&row(2, &[("sku", "A")])).unwrap_err();
        assert_eq!(missing.message("en"), "Row 2: Missing 'quantity' column");

        let invalid = mapper
            .map_sale_fields(&row(3, &[("quantity", "abc")]))
            .unwrap_err();
        assert_eq!(
            invalid.message("en"),
            "Row 3: Invalid quantity 'abc' - must be a number"
        );

        let zero = mapper.map_sale_fields(&row(4, &[("quantity", "0")])).unwrap_err();
        assert_eq!(zero.message("en"), "Row 4: Quantity must be positive, got 0");

        let bad_date = mapper
            .map_sale_fields(&row(5, &[("quantity", "1"), ("date", "yesterday")]))
            .unwrap_err();
        assert_eq!(
            bad_date.message("en"),
            "Row 5: Invalid date format 'yesterday'. Use YYYY-MM-DD format."
        );
    }

    #[test]
    fn test_sale_fields_accepts_date_formats() {
        let mapper = RowMapper::new("en");
        let fields = mapper
            .map_sale_fields(&row(2, &[("quantity", "3"), ("sale_date", "01/15/2024")]))
            .unwrap();
        assert_eq!(fields.quantity, 3);
        assert_eq!(
            fields.sale_date.map(|d| d.date()),
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );
    }

    #[test]
    fn test_sku_alias_order() {
        let mapper = RowMapper::new("en");
        let r = row(2, &[("product_sku", "P-2"), ("Sku", "P-1")]);
        assert_eq!(mapper.sale_sku(&r), Some("P-1"));
    }

    #[test]
    fn test_product_row_defaults_and_errors() {
        let mapper = RowMapper::new("en");
        let ok = mapper
            .map_product(&row(2, &[("name", "Hammer"), ("quantity", "4.0"), ("category", "Tools")]))
            .unwrap();
        assert_eq!(ok.product.quantity, 4);
        assert_eq!(ok.product.price, 0.0);
        assert_eq!(ok.product.low_stock_threshold, 0);
        assert_eq!(ok.category.as_deref(), Some("Tools"));

        let negative = mapper
            .map_product(&row(3, &[("name", "Saw"), ("price", "-1")]))
            .unwrap_err();
        assert_eq!(negative.message("en"), "Row 3: price must not be negative, got -1");

        let no_name = mapper.map_product(&row(4, &[("sku", "X")])).unwrap_err();
        assert_eq!(no_name.message("en"), "Row 4: Missing 'name' column");
    }

    #[test]
    fn test_localized_reason() {
        let mapper = RowMapper::new("zh-CN");
        let err = mapper.map_category(&row(2, &[])).unwrap_err();
        assert!(err.reason.contains("name"));
        assert!(err.message("zh-CN").starts_with("第 2 行"));
    }
}

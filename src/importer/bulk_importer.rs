// ==========================================
// 库存管理看板 - 批量导入器
// ==========================================
// 流程: 解析 → 逐行映射 → 引用解析 → 落库 → 汇总报告
// 行级失败记入 errors 并继续；连接/锁错误视为文件级失败
// 已接受的行逐行提交，被拒绝的行不影响其他行
// ==========================================

use crate::domain::product::NewProduct;
use crate::importer::error::{ImportError, ImportResult, RowError};
use crate::importer::file_parser::{RawRow, UniversalFileParser};
use crate::importer::report::UploadReport;
use crate::importer::row_mapper::RowMapper;
use crate::repository::{
    CategoryRepository, NewSale, ProductRepository, RepositoryError, SaleRepository,
    SupplierRepository,
};
use chrono::NaiveDateTime;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// 销售上传的文件级默认商品（行内无 SKU 时使用）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaleUploadTarget {
    pub product_id: Option<i64>,
    pub sku: Option<String>,
}

/// 导入实体类型
#[derive(Debug, Clone, PartialEq)]
pub enum ImportKind {
    Products,
    Categories,
    Suppliers,
    Sales(SaleUploadTarget),
}

impl ImportKind {
    pub fn entity_name(&self) -> &'static str {
        match self {
            ImportKind::Products => "Product",
            ImportKind::Categories => "Category",
            ImportKind::Suppliers => "Supplier",
            ImportKind::Sales(_) => "Sale",
        }
    }
}

// ==========================================
// BulkImporter
// ==========================================
pub struct BulkImporter {
    product_repo: Arc<ProductRepository>,
    category_repo: Arc<CategoryRepository>,
    supplier_repo: Arc<SupplierRepository>,
    sale_repo: Arc<SaleRepository>,
    parser: UniversalFileParser,
    mapper: RowMapper,
}

impl BulkImporter {
    pub fn new(
        product_repo: Arc<ProductRepository>,
        category_repo: Arc<CategoryRepository>,
        supplier_repo: Arc<SupplierRepository>,
        sale_repo: Arc<SaleRepository>,
        locale: &str,
    ) -> Self {
        Self {
            product_repo,
            category_repo,
            supplier_repo,
            sale_repo,
            parser: UniversalFileParser,
            mapper: RowMapper::new(locale),
        }
    }

    /// 导入文件（.csv / .xlsx）
    #[instrument(skip(self, file_path), fields(file = %file_path.display()))]
    pub fn import_file(
        &self,
        kind: &ImportKind,
        file_path: &Path,
        now: NaiveDateTime,
    ) -> ImportResult<UploadReport> {
        let rows = self.parser.parse(file_path)?;
        info!(entity = kind.entity_name(), total_rows = rows.len(), "文件解析完成");
        self.import_rows(kind, &rows, now)
    }

    /// 导入已解析的行
    pub fn import_rows(
        &self,
        kind: &ImportKind,
        rows: &[RawRow],
        now: NaiveDateTime,
    ) -> ImportResult<UploadReport> {
        let mut report = UploadReport::new(rows.len());
        let locale = self.mapper.locale().to_string();

        for row in rows {
            let outcome = match kind {
                ImportKind::Products => self.import_product_row(row, now),
                ImportKind::Categories => self.import_category_row(row),
                ImportKind::Suppliers => self.import_supplier_row(row),
                ImportKind::Sales(target) => self.import_sale_row(row, target, now),
            };
            match outcome {
                Ok(()) => report.record_created(),
                Err(RowFailure::Rejected(err)) => {
                    warn!(row = err.row, reason = %err.reason, "行被拒绝");
                    report.record_error(&err, &locale);
                }
                Err(RowFailure::Fatal(err)) => return Err(err),
            }
        }

        info!(
            entity = kind.entity_name(),
            created = report.created_count,
            rejected = report.rejected_count(),
            total = report.total_rows_processed,
            "导入完成"
        );
        Ok(report)
    }

    // ===== 商品 =====

    fn import_product_row(&self, row: &RawRow, now: NaiveDateTime) -> Result<(), RowFailure> {
        let mapped = self.mapper.map_product(row)?;

        let category_id = match mapped.category.as_deref() {
            Some(name) => Some(
                self.category_repo
                    .find_by_name(name)
                    .map_err(|e| self.repo_failure(row, "Category", name, e))?
                    .ok_or_else(|| {
                        self.mapper
                            .row_error(row, "import.category_not_found", &[("name", name)])
                    })?
                    .id,
            ),
            None => None,
        };
        let supplier_id = match mapped.supplier.as_deref() {
            Some(name) => Some(
                self.supplier_repo
                    .find_by_name(name)
                    .map_err(|e| self.repo_failure(row, "Supplier", name, e))?
                    .ok_or_else(|| {
                        self.mapper
                            .row_error(row, "import.supplier_not_found", &[("name", name)])
                    })?
                    .id,
            ),
            None => None,
        };

        let product = NewProduct {
            category_id,
            supplier_id,
            ..mapped.product
        };
        let label = product.sku.clone().unwrap_or_else(|| product.name.clone());
        self.product_repo
            .insert(&product, now)
            .map_err(|e| self.repo_failure(row, "Product", &label, e))?;
        Ok(())
    }

    // ===== 分类 / 供应商 =====

    fn import_category_row(&self, row: &RawRow) -> Result<(), RowFailure> {
        let category = self.mapper.map_category(row)?;
        self.category_repo
            .insert(&category)
            .map_err(|e| self.repo_failure(row, "Category", &category.name, e))?;
        Ok(())
    }

    fn import_supplier_row(&self, row: &RawRow) -> Result<(), RowFailure> {
        let supplier = self.mapper.map_supplier(row)?;
        self.supplier_repo
            .insert(&supplier)
            .map_err(|e| self.repo_failure(row, "Supplier", &supplier.name, e))?;
        Ok(())
    }

    // ===== 销售 =====

    /// 商品解析顺序: 行内 SKU → 上传级 product_id → 上传级 SKU
    fn resolve_sale_product(
        &self,
        row: &RawRow,
        target: &SaleUploadTarget,
    ) -> Result<i64, RowFailure> {
        let sku = self
            .mapper
            .sale_sku(row)
            .or_else(|| match target.product_id {
                Some(_) => None,
                None => target.sku.as_deref().filter(|s| !s.trim().is_empty()),
            });

        if let Some(sku) = sku {
            let product = self
                .product_repo
                .find_by_sku(sku)
                .map_err(|e| self.repo_failure(row, "Product", sku, e))?
                .ok_or_else(|| self.mapper.row_error(row, "import.sku_not_found", &[("sku", sku)]))?;
            return Ok(product.id);
        }

        target
            .product_id
            .ok_or_else(|| self.mapper.row_error(row, "import.no_product_reference", &[]).into())
    }

    fn import_sale_row(
        &self,
        row: &RawRow,
        target: &SaleUploadTarget,
        now: NaiveDateTime,
    ) -> Result<(), RowFailure> {
        let product_id = self.resolve_sale_product(row, target)?;
        let fields = self.mapper.map_sale_fields(row)?;

        let product = self
            .product_repo
            .find_by_id(product_id)
            .map_err(|e| self.repo_failure(row, "Product", &product_id.to_string(), e))?
            .ok_or_else(|| {
                self.mapper.row_error(
                    row,
                    "import.product_id_not_found",
                    &[("id", &product_id.to_string())],
                )
            })?;

        let sale = NewSale {
            product_id,
            quantity: fields.quantity,
            sale_date: fields.sale_date,
            notes: Some(format!(
                "CSV upload sale of {} units at {:.2} each",
                fields.quantity, product.price
            )),
        };
        self.sale_repo
            .record_sale(&sale, now)
            .map_err(|e| self.repo_failure(row, "Product", &product_id.to_string(), e))?;
        Ok(())
    }

    /// 仓储错误 → 行级拒绝 / 文件级失败
    fn repo_failure(&self, row: &RawRow, entity: &str, name: &str, err: RepositoryError) -> RowFailure {
        let reason = match err {
            RepositoryError::LockError(_) | RepositoryError::DatabaseConnectionError(_) => {
                return RowFailure::Fatal(ImportError::Repository(err));
            }
            RepositoryError::UniqueConstraintViolation(_) => {
                return self
                    .mapper
                    .row_error(row, "import.duplicate", &[("entity", entity), ("name", name)])
                    .into();
            }
            RepositoryError::InsufficientStock {
                available,
                requested,
                ..
            } => {
                return self
                    .mapper
                    .row_error(
                        row,
                        "import.insufficient_stock",
                        &[
                            ("available", &available.to_string()),
                            ("requested", &requested.to_string()),
                        ],
                    )
                    .into();
            }
            RepositoryError::NotFound { id, .. } => {
                return self
                    .mapper
                    .row_error(row, "import.product_id_not_found", &[("id", &id)])
                    .into();
            }
            other => other.to_string(),
        };
        self.mapper
            .row_error(row, "import.rejected", &[("reason", &reason)])
            .into()
    }
}

/// 单行处理失败
enum RowFailure {
    Rejected(RowError),
    Fatal(ImportError),
}

impl From<RowError> for RowFailure {
    fn from(err: RowError) -> Self {
        RowFailure::Rejected(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::NewCategory;
    use crate::importer::file_parser::CsvParser;
    use chrono::NaiveDate;
    use rusqlite::Connection;
    use std::sync::Mutex;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(9, 0, 0).unwrap()
    }

    fn importer() -> (BulkImporter, Arc<ProductRepository>) {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        let products = Arc::new(ProductRepository::from_connection(conn.clone()));
        let categories = Arc::new(CategoryRepository::from_connection(conn.clone()));
        categories
            .insert(&NewCategory {
                name: "Tools".to_string(),
                description: None,
            })
            .unwrap();
        let importer = BulkImporter::new(
            products.clone(),
            categories,
            Arc::new(SupplierRepository::from_connection(conn.clone())),
            Arc::new(SaleRepository::from_connection(conn)),
            "en",
        );
        (importer, products)
    }

    fn rows(csv: &str) -> Vec<RawRow> {
        CsvParser.parse_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_product_import_resolves_category_and_reports_rows() {
        let (importer, products) = importer();
        let report = importer
            .import_rows(
                &ImportKind::Products,
                &rows("name,sku,price,quantity,category\nHammer,H-1,9.5,10,tools\nSaw,S-1,12,3,Garden\nDrill,H-1,40,1,\n"),
                now(),
            )
            .unwrap();

        assert_eq!(report.created_count, 1);
        assert_eq!(report.total_rows_processed, 3);
        assert_eq!(
            report.errors,
            vec![
                "Row 3: Category 'Garden' not found".to_string(),
                "Row 4: Product 'H-1' already exists".to_string(),
            ]
        );
        let hammer = products.find_by_sku("H-1").unwrap().unwrap();
        assert_eq!(hammer.category_id, Some(1));
    }

    #[test]
    fn test_sale_import_uses_upload_fallback_and_checks_stock() {
        let (importer, products) = importer();
        importer
            .import_rows(
                &ImportKind::Products,
                &rows("name,sku,price,quantity\nHammer,H-1,10,5\n"),
                now(),
            )
            .unwrap();

        let target = SaleUploadTarget {
            product_id: None,
            sku: Some("H-1".to_string()),
        };
        let report = importer
            .import_rows(
                &ImportKind::Sales(target),
                &rows("quantity,date\n2,2024-01-15\n9,2024-01-16\n1,\n"),
                now(),
            )
            .unwrap();

        assert_eq!(report.created_count, 2);
        assert_eq!(
            report.errors,
            vec!["Row 3: Insufficient stock (available: 3, requested: 9)".to_string()]
        );
        assert_eq!(products.find_by_sku("H-1").unwrap().unwrap().quantity, 2);
    }

    #[test]
    fn test_sale_import_without_any_product_reference() {
        let (importer, _) = importer();
        let report = importer
            .import_rows(
                &ImportKind::Sales(SaleUploadTarget::default()),
                &rows("quantity\n1\n"),
                now(),
            )
            .unwrap();
        assert_eq!(report.created_count, 0);
        assert_eq!(
            report.errors,
            vec!["Row 2: No SKU in CSV and no product_id/sku provided in upload request".to_string()]
        );
    }

    #[test]
    fn test_unknown_sku_in_row() {
        let (importer, _) = importer();
        let report = importer
            .import_rows(
                &ImportKind::Sales(SaleUploadTarget::default()),
                &rows("SKU,quantity\nZZ-9,1\n"),
                now(),
            )
            .unwrap();
        assert_eq!(
            report.errors,
            vec!["Row 2: Product with SKU 'ZZ-9' not found".to_string()]
        );
    }
}

// ==========================================
// 库存管理看板 - 批量上传 API
// ==========================================
// 职责: 封装商品 / 分类 / 供应商 / 销售的文件上传
// 返回: UploadOutcome（成功 / 部分成功 / 失败）
// ==========================================

use std::path::Path;
use std::sync::Arc;

use chrono::Local;

use crate::api::error::ApiResult;
use crate::config::ConfigManager;
use crate::importer::{BulkImporter, ImportKind, SaleUploadTarget, UploadOutcome};
use crate::repository::{CategoryRepository, ProductRepository, SaleRepository, SupplierRepository};

/// 批量上传API
pub struct ImportApi {
    product_repo: Arc<ProductRepository>,
    category_repo: Arc<CategoryRepository>,
    supplier_repo: Arc<SupplierRepository>,
    sale_repo: Arc<SaleRepository>,
    config: Arc<ConfigManager>,
}

impl ImportApi {
    pub fn new(
        product_repo: Arc<ProductRepository>,
        category_repo: Arc<CategoryRepository>,
        supplier_repo: Arc<SupplierRepository>,
        sale_repo: Arc<SaleRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            product_repo,
            category_repo,
            supplier_repo,
            sale_repo,
            config,
        }
    }

    /// 按当前界面语言构造导入器（行错误原因随语言变化）
    fn importer(&self) -> ApiResult<BulkImporter> {
        let locale = self.config.locale()?;
        Ok(BulkImporter::new(
            self.product_repo.clone(),
            self.category_repo.clone(),
            self.supplier_repo.clone(),
            self.sale_repo.clone(),
            &locale,
        ))
    }

    /// 通用上传入口
    ///
    /// 文件级错误（格式不支持 / 缺表头 / 连接失败）折叠为 Failure，
    /// 仅配置读取失败时返回 Err
    pub fn upload(&self, kind: &ImportKind, file_path: &Path) -> ApiResult<UploadOutcome> {
        let importer = self.importer()?;
        let result = importer.import_file(kind, file_path, Local::now().naive_local());
        if let Err(e) = &result {
            tracing::warn!(entity = kind.entity_name(), file = %file_path.display(), error = %e, "上传失败");
        }
        Ok(UploadOutcome::from_result(result))
    }

    pub fn upload_products(&self, file_path: &Path) -> ApiResult<UploadOutcome> {
        self.upload(&ImportKind::Products, file_path)
    }

    pub fn upload_categories(&self, file_path: &Path) -> ApiResult<UploadOutcome> {
        self.upload(&ImportKind::Categories, file_path)
    }

    pub fn upload_suppliers(&self, file_path: &Path) -> ApiResult<UploadOutcome> {
        self.upload(&ImportKind::Suppliers, file_path)
    }

    /// 销售上传；行内无 SKU 时依次使用 product_id / sku
    pub fn upload_sales(
        &self,
        file_path: &Path,
        product_id: Option<i64>,
        sku: Option<&str>,
    ) -> ApiResult<UploadOutcome> {
        let target = SaleUploadTarget {
            product_id,
            sku: sku.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
        };
        self.upload(&ImportKind::Sales(target), file_path)
    }
}

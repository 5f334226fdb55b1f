// ==========================================
// 库存管理看板 - 库存管理 API
// ==========================================
// 职责: 商品 / 分类 / 供应商 CRUD，库存状态查询
// ==========================================

use std::sync::Arc;

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::product::{Category, NewCategory, NewProduct, NewSupplier, Product, Supplier};
use crate::domain::sale::{normalize_sales, SaleRecord};
use crate::domain::types::StockStatus;
use crate::domain::StockMovement;
use crate::engine::stock_status::{
    filter_by_status, get_stock_counts, product_stock_status, StockCounts, StockStatusResult,
};
use crate::repository::{
    CategoryRepository, ProductRepository, SaleRepository, StockMovementRepository,
    SupplierRepository,
};

/// 商品 + 库存状态（表格/卡片展示用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub status: StockStatusResult,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        let status = product_stock_status(&product);
        Self { product, status }
    }
}

// ==========================================
// StockApi - 库存管理 API
// ==========================================

/// 库存管理API
///
/// 职责：
/// 1. 商品 CRUD + 库存状态
/// 2. 分类 / 供应商 CRUD（仍被商品引用时拒绝删除）
/// 3. 单品销售记录与库存流水查询
pub struct StockApi {
    product_repo: Arc<ProductRepository>,
    category_repo: Arc<CategoryRepository>,
    supplier_repo: Arc<SupplierRepository>,
    sale_repo: Arc<SaleRepository>,
    movement_repo: Arc<StockMovementRepository>,
}

impl StockApi {
    pub fn new(
        product_repo: Arc<ProductRepository>,
        category_repo: Arc<CategoryRepository>,
        supplier_repo: Arc<SupplierRepository>,
        sale_repo: Arc<SaleRepository>,
        movement_repo: Arc<StockMovementRepository>,
    ) -> Self {
        Self {
            product_repo,
            category_repo,
            supplier_repo,
            sale_repo,
            movement_repo,
        }
    }

    // ===== 商品 =====

    /// 查询商品（可按库存状态筛选）
    pub fn list_products(&self, status: Option<StockStatus>) -> ApiResult<Vec<ProductView>> {
        let products = self.product_repo.list()?;
        let views = match status {
            Some(s) => filter_by_status(&products, s)
                .into_iter()
                .cloned()
                .map(ProductView::from)
                .collect(),
            None => products.into_iter().map(ProductView::from).collect(),
        };
        Ok(views)
    }

    pub fn get_product(&self, id: i64) -> ApiResult<ProductView> {
        self.product_repo
            .find_by_id(id)?
            .map(ProductView::from)
            .ok_or_else(|| ApiError::NotFound(format!("Product(id={})不存在", id)))
    }

    /// 库存状态统计
    pub fn stock_counts(&self) -> ApiResult<StockCounts> {
        let products = self.product_repo.list()?;
        Ok(get_stock_counts(&products))
    }

    pub fn create_product(&self, product: &NewProduct) -> ApiResult<ProductView> {
        validate_product(product)?;
        let id = self
            .product_repo
            .insert(product, Local::now().naive_local())?;
        tracing::info!(product_id = id, name = %product.name, "商品已创建");
        self.get_product(id)
    }

    /// 更新商品；数量变化会记录一条调整流水
    pub fn update_product(&self, id: i64, product: &NewProduct) -> ApiResult<ProductView> {
        validate_product(product)?;
        let updated = self
            .product_repo
            .update(id, product, Local::now().naive_local())?;
        Ok(ProductView::from(updated))
    }

    pub fn delete_product(&self, id: i64) -> ApiResult<()> {
        self.product_repo.delete(id)?;
        tracing::info!(product_id = id, "商品已删除");
        Ok(())
    }

    /// 单品销售记录（按时间倒序）
    pub fn product_sales(&self, product_id: i64) -> ApiResult<Vec<SaleRecord>> {
        if self.product_repo.find_by_id(product_id)?.is_none() {
            return Err(ApiError::NotFound(format!("Product(id={})不存在", product_id)));
        }
        let raw = self.sale_repo.list_raw_by_product(product_id)?;
        Ok(normalize_sales(&raw, Local::now().naive_local()))
    }

    /// 单品库存流水（按时间倒序）
    pub fn product_movements(&self, product_id: i64) -> ApiResult<Vec<StockMovement>> {
        Ok(self.movement_repo.list_by_product(product_id)?)
    }

    // ===== 分类 =====

    pub fn list_categories(&self) -> ApiResult<Vec<Category>> {
        Ok(self.category_repo.list()?)
    }

    pub fn create_category(&self, category: &NewCategory) -> ApiResult<Category> {
        require_name(&category.name, "分类名称")?;
        let id = self.category_repo.insert(category)?;
        self.category_repo
            .find_by_id(id)?
            .ok_or_else(|| ApiError::InternalError(format!("分类创建后未找到: id={}", id)))
    }

    pub fn update_category(&self, id: i64, category: &NewCategory) -> ApiResult<Category> {
        require_name(&category.name, "分类名称")?;
        Ok(self.category_repo.update(id, category)?)
    }

    /// 删除分类（仍有商品引用时返回 Conflict）
    pub fn delete_category(&self, id: i64) -> ApiResult<()> {
        Ok(self.category_repo.delete(id)?)
    }

    // ===== 供应商 =====

    pub fn list_suppliers(&self) -> ApiResult<Vec<Supplier>> {
        Ok(self.supplier_repo.list()?)
    }

    pub fn get_supplier(&self, id: i64) -> ApiResult<Supplier> {
        self.supplier_repo
            .find_by_id(id)?
            .ok_or_else(|| ApiError::NotFound(format!("Supplier(id={})不存在", id)))
    }

    pub fn create_supplier(&self, supplier: &NewSupplier) -> ApiResult<Supplier> {
        require_name(&supplier.name, "供应商名称")?;
        let id = self.supplier_repo.insert(supplier)?;
        self.get_supplier(id)
    }

    pub fn update_supplier(&self, id: i64, supplier: &NewSupplier) -> ApiResult<Supplier> {
        require_name(&supplier.name, "供应商名称")?;
        Ok(self.supplier_repo.update(id, supplier)?)
    }

    /// 删除供应商（仍有商品引用时返回 Conflict；历史采购单保留）
    pub fn delete_supplier(&self, id: i64) -> ApiResult<()> {
        Ok(self.supplier_repo.delete(id)?)
    }
}

fn require_name(name: &str, label: &str) -> ApiResult<()> {
    if name.trim().is_empty() {
        return Err(ApiError::InvalidInput(format!("{}不能为空", label)));
    }
    Ok(())
}

fn validate_product(product: &NewProduct) -> ApiResult<()> {
    require_name(&product.name, "商品名称")?;
    if !product.price.is_finite() || product.price < 0.0 {
        return Err(ApiError::InvalidInput(format!(
            "价格必须为非负数: {}",
            product.price
        )));
    }
    if product.quantity < 0 {
        return Err(ApiError::InvalidInput(format!(
            "库存数量不能为负数: {}",
            product.quantity
        )));
    }
    if product.low_stock_threshold < 0 {
        return Err(ApiError::InvalidInput(format!(
            "补货阈值不能为负数: {}",
            product.low_stock_threshold
        )));
    }
    Ok(())
}

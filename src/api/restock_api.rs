// ==========================================
// 库存管理看板 - 补货 API
// ==========================================
// 职责: 补货建议、采购单下发/分组/状态流转、销售录入
// 红线: 建议在下单时重新生成，不信任调用方传入的建议快照
// ==========================================

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Local;

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::purchase_order::{NewPurchaseOrder, PurchaseOrder, PurchaseOrderUpdate};
use crate::domain::sale::SaleRecord;
use crate::domain::types::PurchaseOrderStatus;
use crate::engine::inventory_analytics::{restock_summary, RestockSummary};
use crate::engine::order_grouping::{group_orders, OrderGroup, INDIVIDUAL_GROUP_PREFIX};
use crate::engine::reorder::{OrderPlan, ReorderEngine, ReorderReport, ReorderSuggestion};
use crate::repository::{
    NewSale, ProductRepository, PurchaseOrderRepository, SaleRepository, SupplierRepository,
};

/// 补货API
pub struct RestockApi {
    product_repo: Arc<ProductRepository>,
    supplier_repo: Arc<SupplierRepository>,
    order_repo: Arc<PurchaseOrderRepository>,
    sale_repo: Arc<SaleRepository>,
    config: Arc<ConfigManager>,
}

impl RestockApi {
    pub fn new(
        product_repo: Arc<ProductRepository>,
        supplier_repo: Arc<SupplierRepository>,
        order_repo: Arc<PurchaseOrderRepository>,
        sale_repo: Arc<SaleRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            product_repo,
            supplier_repo,
            order_repo,
            sale_repo,
            config,
        }
    }

    fn engine(&self) -> ApiResult<ReorderEngine> {
        let lead_time = self.config.lead_time_days()?;
        Ok(ReorderEngine::with_lead_time(lead_time))
    }

    // ===== 补货建议 =====

    /// 生成补货建议（缺货在前，同级按库存升序）
    pub fn suggestions(&self) -> ApiResult<ReorderReport> {
        let products = self.product_repo.list()?;
        let suppliers = self.supplier_repo.list()?;
        Ok(self.engine()?.generate(&products, &suppliers))
    }

    /// 按选中的建议下单
    ///
    /// # 参数
    /// - selected_ids: 选中的建议 id
    /// - quantities: 覆盖数量（按建议 id），下限 1
    /// - notify_by_email: 是否邮件通知供应商
    ///
    /// # 返回
    /// 创建的采购单；多选时共享同一 group_id，任一失败则整批回滚
    pub fn create_orders_from_suggestions(
        &self,
        selected_ids: &[String],
        quantities: &HashMap<String, i64>,
        notify_by_email: bool,
    ) -> ApiResult<Vec<PurchaseOrder>> {
        if selected_ids.is_empty() {
            return Err(ApiError::InvalidInput("未选择任何补货建议".to_string()));
        }

        let engine = self.engine()?;
        let products = self.product_repo.list()?;
        let suppliers = self.supplier_repo.list()?;
        let report = engine.generate(&products, &suppliers);

        let index: HashMap<&str, &ReorderSuggestion> = report
            .suggestions
            .iter()
            .map(|s| (s.id.as_str(), s))
            .collect();

        let mut selected = Vec::with_capacity(selected_ids.len());
        for id in selected_ids {
            match index.get(id.as_str()) {
                Some(s) if !selected.iter().any(|x: &&ReorderSuggestion| x.id == s.id) => {
                    selected.push(*s)
                }
                Some(_) => {}
                None => {
                    return Err(ApiError::NotFound(format!("补货建议(id={})不存在", id)));
                }
            }
        }

        let plan = engine.plan_orders(&selected, quantities, notify_by_email);
        self.submit_plan(plan)
    }

    fn submit_plan(&self, plan: OrderPlan) -> ApiResult<Vec<PurchaseOrder>> {
        let now = Local::now().naive_local();
        let created = match plan {
            OrderPlan::Batch(orders) => self.order_repo.create_batch(&orders, now)?,
            OrderPlan::Individual(orders) => orders
                .iter()
                .map(|o| self.order_repo.create(o, now))
                .collect::<Result<Vec<_>, _>>()?,
        };
        tracing::info!(count = created.len(), "采购单已创建");
        Ok(created)
    }

    // ===== 采购单 =====

    pub fn create_order(&self, order: &NewPurchaseOrder) -> ApiResult<PurchaseOrder> {
        let created = self.order_repo.create(order, Local::now().naive_local())?;
        tracing::info!(order_id = created.id, product_id = created.product_id, "采购单已创建");
        Ok(created)
    }

    /// 批量下单（同一事务，共享 group_id）
    pub fn create_batch(&self, orders: &[NewPurchaseOrder]) -> ApiResult<Vec<PurchaseOrder>> {
        Ok(self
            .order_repo
            .create_batch(orders, Local::now().naive_local())?)
    }

    /// 采购单列表（可按状态筛选，新单在前）
    pub fn list_orders(&self, status: Option<PurchaseOrderStatus>) -> ApiResult<Vec<PurchaseOrder>> {
        Ok(self.order_repo.list(status)?)
    }

    /// 采购单分组视图
    pub fn grouped_orders(&self, status: Option<PurchaseOrderStatus>) -> ApiResult<Vec<OrderGroup>> {
        let orders = self.order_repo.list(status)?;
        let products = self.product_repo.list()?;
        Ok(group_orders(&orders, &products))
    }

    pub fn get_order(&self, id: i64) -> ApiResult<PurchaseOrder> {
        self.order_repo
            .find_by_id(id)?
            .ok_or_else(|| ApiError::NotFound(format!("PurchaseOrder(id={})不存在", id)))
    }

    /// 更新采购单；转为 completed 时入库
    pub fn update_order(&self, id: i64, update: &PurchaseOrderUpdate) -> ApiResult<PurchaseOrder> {
        validate_update(update)?;
        let updated = self
            .order_repo
            .update(id, update, Local::now().naive_local())?;
        tracing::info!(order_id = id, status = %updated.status, "采购单已更新");
        Ok(updated)
    }

    /// 按分组键更新（批量组或 "individual-{id}"）
    pub fn update_group(&self, key: &str, update: &PurchaseOrderUpdate) -> ApiResult<Vec<PurchaseOrder>> {
        validate_update(update)?;
        if let Some(raw_id) = key.strip_prefix(INDIVIDUAL_GROUP_PREFIX) {
            let id: i64 = raw_id
                .parse()
                .map_err(|_| ApiError::InvalidInput(format!("无效的分组键: {}", key)))?;
            return Ok(vec![self.update_order(id, update)?]);
        }
        if key.trim().is_empty() {
            return Err(ApiError::InvalidInput("分组键不能为空".to_string()));
        }
        let updated = self
            .order_repo
            .update_group(key, update, Local::now().naive_local())?;
        tracing::info!(group_id = key, count = updated.len(), "采购单组已更新");
        Ok(updated)
    }

    pub fn delete_order(&self, id: i64) -> ApiResult<()> {
        self.order_repo.delete(id)?;
        tracing::info!(order_id = id, "采购单已删除");
        Ok(())
    }

    // ===== 汇总 / 销售 =====

    pub fn summary(&self) -> ApiResult<RestockSummary> {
        let orders = self.order_repo.list(None)?;
        let products = self.product_repo.list()?;
        Ok(restock_summary(&orders, &products))
    }

    /// 录入销售（库存不足时拒绝）
    pub fn record_sale(&self, sale: &NewSale) -> ApiResult<SaleRecord> {
        if sale.quantity <= 0 {
            return Err(ApiError::InvalidInput(format!(
                "销售数量必须为正数: {}",
                sale.quantity
            )));
        }
        let record = self
            .sale_repo
            .record_sale(sale, Local::now().naive_local())?;
        tracing::info!(sale_id = record.id, product_id = sale.product_id, "销售已记录");
        Ok(record)
    }
}

fn validate_update(update: &PurchaseOrderUpdate) -> ApiResult<()> {
    if let Some(q) = update.quantity_ordered {
        if q < 1 {
            return Err(ApiError::InvalidInput(format!("采购数量必须至少为 1: {}", q)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_update_rejects_zero_quantity() {
        let update = PurchaseOrderUpdate {
            quantity_ordered: Some(0),
            ..Default::default()
        };
        assert!(matches!(validate_update(&update), Err(ApiError::InvalidInput(_))));
        assert!(validate_update(&PurchaseOrderUpdate::default()).is_ok());
    }
}

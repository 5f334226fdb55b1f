// ==========================================
// 库存管理看板 - 采购单 / 库存变动领域模型
// ==========================================

use crate::domain::types::{MovementType, PurchaseOrderStatus};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// PurchaseOrder - 采购单
// ==========================================
// group_id: 批量下单时同批次共享 (UUID v4)，单笔下单为空
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: i64,
    pub supplier_id: Option<i64>,
    pub product_id: i64,
    pub quantity_ordered: i64,
    pub status: PurchaseOrderStatus,
    pub order_date: NaiveDateTime,
    pub notes: Option<String>,
    pub notify_by_email: bool,
    pub group_id: Option<String>,
}

/// 新建采购单参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPurchaseOrder {
    pub product_id: i64,
    #[serde(default)]
    pub supplier_id: Option<i64>,
    pub quantity_ordered: i64,
    #[serde(default = "default_status")]
    pub status: PurchaseOrderStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub notify_by_email: bool,
}

fn default_status() -> PurchaseOrderStatus {
    PurchaseOrderStatus::Pending
}

/// 采购单更新参数（None 表示不修改）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PurchaseOrderUpdate {
    #[serde(default)]
    pub status: Option<PurchaseOrderStatus>,
    #[serde(default)]
    pub quantity_ordered: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

// ==========================================
// StockMovement - 库存变动流水
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: i64,
    pub product_id: i64,
    pub movement_type: MovementType,
    pub quantity_change: i64,
    pub quantity_before: i64,
    pub quantity_after: i64,
    pub reference_id: Option<i64>,
    pub reference_type: Option<String>,
    pub notes: Option<String>,
    pub transaction_date: NaiveDateTime,
}

/// 新建库存变动参数
#[derive(Debug, Clone)]
pub struct NewStockMovement {
    pub product_id: i64,
    pub movement_type: MovementType,
    pub quantity_change: i64,
    pub quantity_before: i64,
    pub reference_id: Option<i64>,
    pub reference_type: Option<String>,
    pub notes: Option<String>,
    pub transaction_date: NaiveDateTime,
}

impl NewStockMovement {
    pub fn quantity_after(&self) -> i64 {
        self.quantity_before + self.quantity_change
    }
}

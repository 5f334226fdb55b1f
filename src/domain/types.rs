// ==========================================
// 库存管理看板 - 领域类型定义
// ==========================================
// 状态标签 / 展示变体 / 补货优先级 / 聚合粒度 / 采购单状态
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 库存状态 (Stock Status)
// ==========================================
// 三态标签，序列化值与看板展示文本一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StockStatus {
    #[serde(rename = "In Stock")]
    InStock,
    #[serde(rename = "Low Stock")]
    LowStock,
    #[serde(rename = "Out of Stock")]
    OutOfStock,
}

impl StockStatus {
    /// 展示文本
    pub fn label(&self) -> &'static str {
        match self {
            StockStatus::InStock => "In Stock",
            StockStatus::LowStock => "Low Stock",
            StockStatus::OutOfStock => "Out of Stock",
        }
    }

    /// 对应的徽标色调
    pub fn badge_tone(&self) -> BadgeTone {
        match self {
            StockStatus::InStock => BadgeTone::Success,
            StockStatus::LowStock => BadgeTone::Warning,
            StockStatus::OutOfStock => BadgeTone::Danger,
        }
    }

    /// 从展示文本解析（大小写不敏感）
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "in stock" | "in_stock" => Some(StockStatus::InStock),
            "low stock" | "low_stock" => Some(StockStatus::LowStock),
            "out of stock" | "out_of_stock" => Some(StockStatus::OutOfStock),
            _ => None,
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ==========================================
// 展示变体 (Stock Variant)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockVariant {
    Default,     // 正常
    Secondary,   // 低库存
    Destructive, // 缺货
}

impl fmt::Display for StockVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockVariant::Default => write!(f, "default"),
            StockVariant::Secondary => write!(f, "secondary"),
            StockVariant::Destructive => write!(f, "destructive"),
        }
    }
}

// ==========================================
// 徽标色调 (Badge Tone)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTone {
    Success,
    Warning,
    Danger,
}

// ==========================================
// 补货优先级 (Reorder Priority)
// ==========================================
// 顺序: Critical < High < Medium (排序时 Critical 在前)
// Medium 仅为兼容保留，生成器不会产生
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReorderPriority {
    Critical,
    High,
    Medium,
}

impl fmt::Display for ReorderPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReorderPriority::Critical => write!(f, "critical"),
            ReorderPriority::High => write!(f, "high"),
            ReorderPriority::Medium => write!(f, "medium"),
        }
    }
}

// ==========================================
// 补货原因 (Reorder Reason)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReorderReason {
    #[serde(rename = "Out of stock")]
    OutOfStock,
    #[serde(rename = "Below threshold")]
    BelowThreshold,
}

impl fmt::Display for ReorderReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReorderReason::OutOfStock => write!(f, "Out of stock"),
            ReorderReason::BelowThreshold => write!(f, "Below threshold"),
        }
    }
}

// ==========================================
// 聚合粒度 (Granularity)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Weekly,
    #[default]
    Monthly,
}

impl Granularity {
    /// 从字符串解析，未知值回退为 Monthly
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "weekly" | "week" => Granularity::Weekly,
            _ => Granularity::Monthly,
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Weekly => write!(f, "weekly"),
            Granularity::Monthly => write!(f, "monthly"),
        }
    }
}

// ==========================================
// 采购单状态 (Purchase Order Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseOrderStatus {
    Pending,
    Completed,
    #[serde(alias = "canceled")]
    Cancelled,
}

impl PurchaseOrderStatus {
    /// 从字符串解析状态
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(PurchaseOrderStatus::Pending),
            "completed" => Some(PurchaseOrderStatus::Completed),
            "cancelled" | "canceled" => Some(PurchaseOrderStatus::Cancelled),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            PurchaseOrderStatus::Pending => "pending",
            PurchaseOrderStatus::Completed => "completed",
            PurchaseOrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for PurchaseOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 库存变动类型 (Movement Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    Sale,
    Restock,
    Adjustment,
}

impl MovementType {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "sale" => MovementType::Sale,
            "restock" => MovementType::Restock,
            _ => MovementType::Adjustment,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            MovementType::Sale => "sale",
            MovementType::Restock => "restock",
            MovementType::Adjustment => "adjustment",
        }
    }
}

// ==========================================
// 库存管理看板 - 看板配置读取 Trait
// ==========================================
// 职责: 定义视图加载所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::types::Granularity;
use crate::engine::time_range::TimeRange;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// DashboardConfigReader Trait
// ==========================================
// 用途: 异步视图加载器读取默认筛选条件
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait DashboardConfigReader: Send + Sync {
    /// 获取补货提前期（天）
    ///
    /// # 默认值
    /// - 7
    async fn get_lead_time_days(&self) -> RepositoryResult<i64>;

    /// 获取默认时间窗口
    ///
    /// # 默认值
    /// - 6m
    async fn get_default_time_range(&self) -> RepositoryResult<TimeRange>;

    /// 获取默认聚合粒度
    ///
    /// # 默认值
    /// - monthly
    async fn get_default_granularity(&self) -> RepositoryResult<Granularity>;

    /// 获取界面语言
    ///
    /// # 默认值
    /// - en
    async fn get_locale(&self) -> RepositoryResult<String>;

    /// 获取库存趋势月数
    ///
    /// # 默认值
    /// - 6（限制在 1..=24）
    async fn get_inventory_trend_months(&self) -> RepositoryResult<u32>;
}

// ==========================================
// 库存管理看板 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::dashboard_config_trait::DashboardConfigReader;
use crate::db::open_sqlite_connection;
use crate::domain::types::Granularity;
use crate::engine::reorder::DEFAULT_LEAD_TIME_DAYS;
use crate::engine::inventory_analytics::{MAX_TREND_MONTHS, MIN_TREND_MONTHS};
use crate::engine::time_range::TimeRange;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

/// 默认界面语言
pub const DEFAULT_LOCALE: &str = "en";

/// 默认库存趋势月数
pub const DEFAULT_TREND_MONTHS: u32 = 6;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        Ok(conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?)
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(RepositoryError::ValidationError("配置键不能为空".to_string()));
        }
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        tracing::info!(key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 全部 global 配置（按键排序）
    pub fn list_global(&self) -> RepositoryResult<BTreeMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut map = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            map.insert(key, value);
        }
        Ok(map)
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self
            .get_global_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let config_map = self.list_global()?;
        let json_value = json!(config_map);
        serde_json::to_string(&json_value)
            .map_err(|e| RepositoryError::InternalError(format!("配置快照序列化失败: {}", e)))
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    ///
    /// # 注意
    /// - 会覆盖同名的 global 配置，快照外的配置保持不变
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> RepositoryResult<usize> {
        let config_map: HashMap<String, String> = serde_json::from_str(snapshot_json)
            .map_err(|e| RepositoryError::ValidationError(format!("配置快照格式错误: {}", e)))?;

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for (key, value) in config_map.iter() {
            let affected = tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
                params![key, value],
            )?;
            count += affected;
        }

        tx.commit()?;
        Ok(count)
    }

    // ===== 看板配置 =====

    /// 补货提前期（天），非正数或无法解析时回退默认值
    pub fn lead_time_days(&self) -> RepositoryResult<i64> {
        let value = self.get_config_or_default(
            config_keys::REORDER_LEAD_TIME_DAYS,
            &DEFAULT_LEAD_TIME_DAYS.to_string(),
        )?;
        Ok(value
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|d| *d > 0)
            .unwrap_or(DEFAULT_LEAD_TIME_DAYS))
    }

    /// 默认时间窗口
    pub fn default_time_range(&self) -> RepositoryResult<TimeRange> {
        let value = self.get_config_or_default(
            config_keys::DEFAULT_TIME_RANGE,
            TimeRange::default().as_str(),
        )?;
        Ok(TimeRange::parse(&value).unwrap_or_default())
    }

    /// 默认聚合粒度
    pub fn default_granularity(&self) -> RepositoryResult<Granularity> {
        let value = self.get_config_or_default(config_keys::DEFAULT_GRANULARITY, "monthly")?;
        Ok(Granularity::from_str(&value))
    }

    /// 界面语言
    pub fn locale(&self) -> RepositoryResult<String> {
        let value = self.get_config_or_default(config_keys::UI_LOCALE, DEFAULT_LOCALE)?;
        let value = value.trim();
        Ok(if value.is_empty() {
            DEFAULT_LOCALE.to_string()
        } else {
            value.to_string()
        })
    }

    /// 库存趋势月数（限制在 1..=24）
    pub fn inventory_trend_months(&self) -> RepositoryResult<u32> {
        let value = self.get_config_or_default(
            config_keys::INVENTORY_TREND_MONTHS,
            &DEFAULT_TREND_MONTHS.to_string(),
        )?;
        Ok(value
            .trim()
            .parse::<u32>()
            .unwrap_or(DEFAULT_TREND_MONTHS)
            .clamp(MIN_TREND_MONTHS, MAX_TREND_MONTHS))
    }
}

#[async_trait]
impl DashboardConfigReader for ConfigManager {
    async fn get_lead_time_days(&self) -> RepositoryResult<i64> {
        self.lead_time_days()
    }

    async fn get_default_time_range(&self) -> RepositoryResult<TimeRange> {
        self.default_time_range()
    }

    async fn get_default_granularity(&self) -> RepositoryResult<Granularity> {
        self.default_granularity()
    }

    async fn get_locale(&self) -> RepositoryResult<String> {
        self.locale()
    }

    async fn get_inventory_trend_months(&self) -> RepositoryResult<u32> {
        self.inventory_trend_months()
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 补货
    pub const REORDER_LEAD_TIME_DAYS: &str = "reorder.lead_time_days";

    // 看板默认视图
    pub const DEFAULT_TIME_RANGE: &str = "dashboard.default_time_range";
    pub const DEFAULT_GRANULARITY: &str = "dashboard.default_granularity";
    pub const INVENTORY_TREND_MONTHS: &str = "analytics.inventory_trend_months";

    // 界面
    pub const UI_LOCALE: &str = "ui.locale";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_defaults_when_unset() {
        let cm = manager();
        assert_eq!(cm.lead_time_days().unwrap(), 7);
        assert_eq!(cm.default_time_range().unwrap(), TimeRange::Last6Months);
        assert_eq!(cm.default_granularity().unwrap(), Granularity::Monthly);
        assert_eq!(cm.locale().unwrap(), "en");
        assert_eq!(cm.inventory_trend_months().unwrap(), 6);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let cm = manager();
        cm.set_global_config_value(config_keys::REORDER_LEAD_TIME_DAYS, "-3").unwrap();
        cm.set_global_config_value(config_keys::DEFAULT_TIME_RANGE, "fortnight").unwrap();
        cm.set_global_config_value(config_keys::INVENTORY_TREND_MONTHS, "99").unwrap();

        assert_eq!(cm.lead_time_days().unwrap(), 7);
        assert_eq!(cm.default_time_range().unwrap(), TimeRange::Last6Months);
        assert_eq!(cm.inventory_trend_months().unwrap(), 24);
    }

    #[test]
    fn test_snapshot_round_trip_overwrites() {
        let cm = manager();
        cm.set_global_config_value(config_keys::REORDER_LEAD_TIME_DAYS, "10").unwrap();
        cm.set_global_config_value(config_keys::UI_LOCALE, "zh-CN").unwrap();
        let snapshot = cm.get_config_snapshot().unwrap();

        cm.set_global_config_value(config_keys::REORDER_LEAD_TIME_DAYS, "3").unwrap();
        let restored = cm.restore_config_from_snapshot(&snapshot).unwrap();

        assert_eq!(restored, 2);
        assert_eq!(cm.lead_time_days().unwrap(), 10);
        assert_eq!(cm.locale().unwrap(), "zh-CN");
    }

    #[test]
    fn test_empty_key_rejected() {
        let cm = manager();
        assert!(matches!(
            cm.set_global_config_value("  ", "x"),
            Err(RepositoryError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_reader_trait_delegates() {
        let cm = manager();
        cm.set_global_config_value(config_keys::DEFAULT_GRANULARITY, "weekly").unwrap();
        let reader: &dyn DashboardConfigReader = &cm;
        assert_eq!(reader.get_default_granularity().await.unwrap(), Granularity::Weekly);
        assert_eq!(reader.get_lead_time_days().await.unwrap(), 7);
    }
}

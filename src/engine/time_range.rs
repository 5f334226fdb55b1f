// ==========================================
// 库存管理看板 - 时间窗口
// ==========================================
// 看板时间筛选: 7d / 30d / 90d / 6m / 1y / all
// ==========================================

use chrono::{Duration, Months, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    Last30Days,
    #[serde(rename = "90d")]
    Last90Days,
    #[default]
    #[serde(rename = "6m")]
    Last6Months,
    #[serde(rename = "1y")]
    LastYear,
    #[serde(rename = "all")]
    All,
}

impl TimeRange {
    /// 从字符串解析，未知值返回 None
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "7d" => Some(TimeRange::Last7Days),
            "30d" => Some(TimeRange::Last30Days),
            "90d" => Some(TimeRange::Last90Days),
            "6m" => Some(TimeRange::Last6Months),
            "1y" | "12m" => Some(TimeRange::LastYear),
            "all" => Some(TimeRange::All),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Last7Days => "7d",
            TimeRange::Last30Days => "30d",
            TimeRange::Last90Days => "90d",
            TimeRange::Last6Months => "6m",
            TimeRange::LastYear => "1y",
            TimeRange::All => "all",
        }
    }

    /// 窗口起点（All 返回 None）
    pub fn since(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            TimeRange::Last7Days => Some(now - Duration::days(7)),
            TimeRange::Last30Days => Some(now - Duration::days(30)),
            TimeRange::Last90Days => Some(now - Duration::days(90)),
            TimeRange::Last6Months => now.checked_sub_months(Months::new(6)),
            TimeRange::LastYear => now.checked_sub_months(Months::new(12)),
            TimeRange::All => None,
        }
    }

    /// 是否落在窗口内（含起点）
    pub fn contains(&self, now: NaiveDateTime, ts: NaiveDateTime) -> bool {
        match self.since(now) {
            Some(since) => ts >= since,
            None => true,
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

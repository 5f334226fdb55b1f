// ==========================================
// 库存管理看板 - 命令行入口
// ==========================================
// 用法: inventory-dashboard [db_path] [time_range] [granularity]
// 输出: 看板快照 JSON（库存计数 / 补货建议 / 销售分桶与 KPI / 补货汇总）
// ==========================================

use std::error::Error;

use inventory_dashboard::app::{get_default_db_path, AppState, DashboardFilter, LoadOutcome};
use inventory_dashboard::{Granularity, TimeRange};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    inventory_dashboard::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} v{}", inventory_dashboard::APP_NAME, inventory_dashboard::VERSION);
    tracing::info!("==================================================");

    let mut args = std::env::args().skip(1);
    let db_path = args.next().unwrap_or_else(get_default_db_path);

    let time_range = match args.next() {
        Some(raw) => Some(
            TimeRange::parse(&raw).ok_or_else(|| format!("无效的时间窗口: {}", raw))?,
        ),
        None => None,
    };
    let granularity = args.next().map(|raw| Granularity::from_str(&raw));

    tracing::info!("使用数据库: {}", db_path);
    let state = AppState::new(db_path)?;

    let filter = DashboardFilter {
        time_range,
        granularity,
        category_id: None,
    };

    match state.dashboard_loader.load(filter).await {
        LoadOutcome::Loaded(snapshot) => {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            Ok(())
        }
        LoadOutcome::Failed(notification) => Err(notification.message.into()),
        LoadOutcome::Stale => Err("加载结果已过期".into()),
    }
}

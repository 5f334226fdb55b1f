// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库、应用状态、测试文件与基础数据
// ==========================================

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use inventory_dashboard::app::AppState;
use inventory_dashboard::domain::{NewCategory, NewProduct, NewSupplier};
use std::error::Error;
use std::io::Write;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是 UTF-8")?
        .to_string();

    inventory_dashboard::db::open_and_init(&db_path)?;

    Ok((temp_file, db_path))
}

/// 创建临时数据库上的 AppState
pub fn create_test_state() -> (NamedTempFile, AppState) {
    let (temp_file, db_path) = create_test_db().expect("创建测试数据库失败");
    let state = AppState::new(db_path).expect("初始化AppState失败");
    (temp_file, state)
}

/// 写入临时 CSV 文件
pub fn write_csv(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("创建临时CSV失败");
    file.write_all(contents.as_bytes()).expect("写入CSV失败");
    file.flush().expect("刷新CSV失败");
    file
}

pub fn dt(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

pub fn add_category(state: &AppState, name: &str) -> i64 {
    state
        .stock_api
        .create_category(&NewCategory {
            name: name.to_string(),
            description: None,
        })
        .expect("创建分类失败")
        .id
}

pub fn add_supplier(state: &AppState, name: &str) -> i64 {
    state
        .stock_api
        .create_supplier(&NewSupplier {
            name: name.to_string(),
            ..Default::default()
        })
        .expect("创建供应商失败")
        .id
}

/// 创建商品
///
/// # 参数
/// - quantity / threshold: 初始库存与补货阈值
pub fn add_product(
    state: &AppState,
    name: &str,
    sku: &str,
    price: f64,
    quantity: i64,
    threshold: i64,
    category_id: Option<i64>,
    supplier_id: Option<i64>,
) -> i64 {
    state
        .stock_api
        .create_product(&NewProduct {
            name: name.to_string(),
            sku: Some(sku.to_string()),
            category_id,
            supplier_id,
            description: None,
            price,
            quantity,
            low_stock_threshold: threshold,
        })
        .expect("创建商品失败")
        .product
        .id
}

// ==========================================
// 库存管理看板 - 演示数据库生成
// ==========================================
// 用法: seed_demo_db [db_path]
// 已存在的数据库先备份再重建；数据全部经由仓储写入（库存流水与商品数量保持一致）
// ==========================================

use chrono::{Duration, Local, NaiveDateTime};
use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use inventory_dashboard::app::get_default_db_path;
use inventory_dashboard::db::open_and_init;
use inventory_dashboard::domain::{
    NewCategory, NewProduct, NewPurchaseOrder, NewSupplier, PurchaseOrderUpdate,
};
use inventory_dashboard::repository::{
    CategoryRepository, NewSale, ProductRepository, PurchaseOrderRepository, SaleRepository,
    SupplierRepository,
};
use inventory_dashboard::PurchaseOrderStatus;

/// (名称, SKU, 分类序号, 供应商序号, 单价, 初始库存, 补货阈值)
const DEMO_PRODUCTS: [(&str, &str, usize, usize, f64, i64, i64); 8] = [
    ("Claw Hammer", "TL-001", 0, 0, 12.5, 140, 20),
    ("Cordless Drill", "TL-002", 0, 1, 89.0, 60, 15),
    ("Tape Measure", "TL-003", 0, 0, 7.25, 45, 30),
    ("LED Bulb 4-Pack", "EL-001", 1, 1, 9.99, 220, 40),
    ("Extension Cord", "EL-002", 1, 2, 15.0, 35, 25),
    ("Wood Screws 100ct", "HW-001", 2, 2, 4.5, 300, 50),
    ("Wall Anchors", "HW-002", 2, 0, 3.75, 80, 60),
    ("Door Hinge", "HW-003", 2, 2, 6.0, 0, 10),
];

fn main() -> Result<(), Box<dyn Error>> {
    inventory_dashboard::logging::init();

    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);
    backup_and_reset_db(&db_path)?;

    let conn = Arc::new(Mutex::new(open_and_init(&db_path)?));
    seed_demo(conn, Local::now().naive_local())?;

    eprintln!("Seeded demo database: {}", db_path);
    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}

fn seed_demo(conn: Arc<Mutex<rusqlite::Connection>>, now: NaiveDateTime) -> Result<(), Box<dyn Error>> {
    let categories = CategoryRepository::from_connection(conn.clone());
    let suppliers = SupplierRepository::from_connection(conn.clone());
    let products = ProductRepository::from_connection(conn.clone());
    let sales = SaleRepository::from_connection(conn.clone());
    let orders = PurchaseOrderRepository::from_connection(conn);

    let category_ids = [
        ("Tools", "Hand and power tools"),
        ("Electrical", "Cables, bulbs and fittings"),
        ("Hardware", "Fasteners and fixings"),
    ]
    .iter()
    .map(|(name, desc)| {
        categories.insert(&NewCategory {
            name: name.to_string(),
            description: Some(desc.to_string()),
        })
    })
    .collect::<Result<Vec<_>, _>>()?;

    let supplier_ids = [
        ("Acme Tools", "orders@acme.example"),
        ("BrightCo", "sales@brightco.example"),
        ("FixIt Supply", "hello@fixit.example"),
    ]
    .iter()
    .map(|(name, email)| {
        suppliers.insert(&NewSupplier {
            name: name.to_string(),
            email: Some(email.to_string()),
            ..Default::default()
        })
    })
    .collect::<Result<Vec<_>, _>>()?;

    let mut product_ids = Vec::with_capacity(DEMO_PRODUCTS.len());
    for (name, sku, cat, sup, price, quantity, threshold) in DEMO_PRODUCTS {
        let id = products.insert(
            &NewProduct {
                name: name.to_string(),
                sku: Some(sku.to_string()),
                category_id: Some(category_ids[cat]),
                supplier_id: Some(supplier_ids[sup]),
                description: None,
                price,
                quantity,
                low_stock_threshold: threshold,
            },
            now - Duration::days(200),
        )?;
        product_ids.push(id);
    }

    // 近 6 个月的销售，每周一笔，数量随商品与周次变化
    let mut sale_count = 0;
    for week in (1..=26i64).rev() {
        let sale_date = now - Duration::weeks(week);
        for (idx, product_id) in product_ids.iter().enumerate() {
            let quantity = 1 + ((week + idx as i64 * 3) % 4);
            let available = products
                .find_by_id(*product_id)?
                .map(|p| p.quantity)
                .unwrap_or(0);
            if available <= quantity + 5 {
                continue;
            }
            sales.record_sale(
                &NewSale {
                    product_id: *product_id,
                    quantity,
                    sale_date: Some(sale_date),
                    notes: Some("Demo sale".to_string()),
                },
                sale_date,
            )?;
            sale_count += 1;
        }
    }

    // 一组批量采购单（已完成，触发入库）+ 一笔待处理的单笔采购单
    let batch = orders.create_batch(
        &[
            NewPurchaseOrder {
                product_id: product_ids[2],
                supplier_id: Some(supplier_ids[0]),
                quantity_ordered: 50,
                status: PurchaseOrderStatus::Pending,
                notes: Some("Demo batch".to_string()),
                notify_by_email: false,
            },
            NewPurchaseOrder {
                product_id: product_ids[6],
                supplier_id: Some(supplier_ids[0]),
                quantity_ordered: 120,
                status: PurchaseOrderStatus::Pending,
                notes: Some("Demo batch".to_string()),
                notify_by_email: false,
            },
        ],
        now - Duration::days(20),
    )?;
    if let Some(group_id) = batch.first().and_then(|o| o.group_id.clone()) {
        orders.update_group(
            &group_id,
            &PurchaseOrderUpdate {
                status: Some(PurchaseOrderStatus::Completed),
                ..Default::default()
            },
            now - Duration::days(12),
        )?;
    }

    orders.create(
        &NewPurchaseOrder {
            product_id: product_ids[7],
            supplier_id: Some(supplier_ids[2]),
            quantity_ordered: 30,
            status: PurchaseOrderStatus::Pending,
            notes: Some("Demo order".to_string()),
            notify_by_email: true,
        },
        now - Duration::days(2),
    )?;

    eprintln!(
        "Inserted {} categories, {} suppliers, {} products, {} sales, {} purchase orders",
        category_ids.len(),
        supplier_ids.len(),
        product_ids.len(),
        sale_count,
        batch.len() + 1
    );
    Ok(())
}

// ==========================================
// 库存管理看板 - 商品数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::{format_datetime, parse_datetime};
use crate::domain::product::{NewProduct, Product};
use crate::domain::purchase_order::NewStockMovement;
use crate::domain::types::MovementType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::stock_movement_repo::insert_movement;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const PRODUCT_COLUMNS: &str = "id, name, sku, category_id, supplier_id, description, price, quantity, low_stock_threshold, last_updated";

/// 行 → Product（列顺序同 PRODUCT_COLUMNS）
pub(crate) fn map_product_row(row: &Row) -> SqliteResult<Product> {
    let last_updated: Option<String> = row.get(9)?;
    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        sku: row.get(2)?,
        category_id: row.get(3)?,
        supplier_id: row.get(4)?,
        description: row.get(5)?,
        price: row.get(6)?,
        quantity: row.get(7)?,
        low_stock_threshold: row.get(8)?,
        last_updated: last_updated.as_deref().and_then(parse_datetime),
    })
}

/// 在给定连接（可为事务）上按 ID 读取商品
pub(crate) fn find_product_with_conn(conn: &Connection, id: i64) -> RepositoryResult<Option<Product>> {
    let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
    Ok(conn.query_row(&sql, params![id], map_product_row).optional()?)
}

/// 在给定连接（可为事务）上更新库存数量
pub(crate) fn set_quantity_with_conn(
    conn: &Connection,
    id: i64,
    quantity: i64,
    now: NaiveDateTime,
) -> RepositoryResult<()> {
    let affected = conn.execute(
        "UPDATE products SET quantity = ?1, last_updated = ?2 WHERE id = ?3",
        params![quantity, format_datetime(&now), id],
    )?;
    if affected == 0 {
        return Err(RepositoryError::not_found("Product", id));
    }
    Ok(())
}

// ==========================================
// ProductRepository - 商品仓储
// ==========================================
pub struct ProductRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProductRepository {
    /// 创建新的商品仓储实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询全部商品（按 ID 升序）
    pub fn list(&self) -> RepositoryResult<Vec<Product>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM products ORDER BY id", PRODUCT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let products = stmt
            .query_map([], map_product_row)?
            .collect::<SqliteResult<Vec<Product>>>()?;
        Ok(products)
    }

    /// 按 ID 查询
    ///
    /// # 返回
    /// - Ok(Some(Product)): 找到
    /// - Ok(None): 未找到
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Product>> {
        let conn = self.get_conn()?;
        find_product_with_conn(&conn, id)
    }

    /// 按 SKU 查询（精确匹配，忽略首尾空白）
    pub fn find_by_sku(&self, sku: &str) -> RepositoryResult<Option<Product>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM products WHERE sku = ?1", PRODUCT_COLUMNS);
        Ok(conn
            .query_row(&sql, params![sku.trim()], map_product_row)
            .optional()?)
    }

    /// 新建商品
    ///
    /// # 返回
    /// - Ok(i64): 新商品 ID
    /// - Err(UniqueConstraintViolation): SKU 重复
    pub fn insert(&self, product: &NewProduct, now: NaiveDateTime) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO products (
                name, sku, category_id, supplier_id, description,
                price, quantity, low_stock_threshold, last_updated
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                product.name.trim(),
                normalize_sku(product.sku.as_deref()),
                product.category_id,
                product.supplier_id,
                product.description,
                product.price,
                product.quantity,
                product.low_stock_threshold,
                format_datetime(&now),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 更新商品
    ///
    /// 库存数量发生变化时，同一事务内记录一条 adjustment 变动
    pub fn update(&self, id: i64, product: &NewProduct, now: NaiveDateTime) -> RepositoryResult<Product> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let before = find_product_with_conn(&tx, id)?
            .ok_or_else(|| RepositoryError::not_found("Product", id))?;

        tx.execute(
            r#"
            UPDATE products SET
                name = ?1, sku = ?2, category_id = ?3, supplier_id = ?4, description = ?5,
                price = ?6, quantity = ?7, low_stock_threshold = ?8, last_updated = ?9
            WHERE id = ?10
            "#,
            params![
                product.name.trim(),
                normalize_sku(product.sku.as_deref()),
                product.category_id,
                product.supplier_id,
                product.description,
                product.price,
                product.quantity,
                product.low_stock_threshold,
                format_datetime(&now),
                id,
            ],
        )?;

        if before.quantity != product.quantity {
            insert_movement(
                &tx,
                &NewStockMovement {
                    product_id: id,
                    movement_type: MovementType::Adjustment,
                    quantity_change: product.quantity - before.quantity,
                    quantity_before: before.quantity,
                    reference_id: None,
                    reference_type: None,
                    notes: Some("Manual stock adjustment".to_string()),
                    transaction_date: now,
                },
            )?;
        }

        let updated = find_product_with_conn(&tx, id)?
            .ok_or_else(|| RepositoryError::not_found("Product", id))?;
        tx.commit()?;
        Ok(updated)
    }

    /// 删除商品（关联销售/变动/采购单级联删除）
    pub fn delete(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM products WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Product", id));
        }
        Ok(())
    }
}

/// 空 SKU 存为 NULL，避免唯一约束误伤
fn normalize_sku(sku: Option<&str>) -> Option<String> {
    sku.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

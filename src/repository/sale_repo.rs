// ==========================================
// 库存管理看板 - 销售记录仓储
// ==========================================
// 读取返回上游原始形态 RawSaleRecord，由 API 边界统一归一化
// 写入: 同一事务内 扣减库存 + 写销售 + 写 sale 变动
// ==========================================

use crate::db::format_datetime;
use crate::domain::purchase_order::NewStockMovement;
use crate::domain::sale::{RawSaleRecord, SaleRecord};
use crate::domain::types::MovementType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::product_repo::{find_product_with_conn, set_quantity_with_conn};
use crate::repository::stock_movement_repo::insert_movement;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use serde_json::Value;
use std::sync::{Arc, Mutex};

fn map_raw_sale_row(row: &Row) -> SqliteResult<RawSaleRecord> {
    let sale_date: Option<String> = row.get(4)?;
    Ok(RawSaleRecord {
        id: row.get(0)?,
        product_id: row.get(1)?,
        quantity: row.get(2)?,
        sale_price: row.get::<_, Option<f64>>(3)?.map(Value::from),
        sale_date: sale_date.map(Value::String),
        ..Default::default()
    })
}

/// 单笔销售写入参数
#[derive(Debug, Clone)]
pub struct NewSale {
    pub product_id: i64,
    pub quantity: i64,
    /// 缺失时使用当前时间
    pub sale_date: Option<NaiveDateTime>,
    pub notes: Option<String>,
}

pub struct SaleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SaleRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 全部销售记录（原始形态）
    pub fn list_raw(&self) -> RepositoryResult<Vec<RawSaleRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, product_id, quantity, sale_price, sale_date FROM product_sales ORDER BY sale_date, id",
        )?;
        let rows = stmt
            .query_map([], map_raw_sale_row)?
            .collect::<SqliteResult<Vec<RawSaleRecord>>>()?;
        Ok(rows)
    }

    /// 单品销售记录（原始形态，按时间倒序）
    pub fn list_raw_by_product(&self, product_id: i64) -> RepositoryResult<Vec<RawSaleRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, product_id, quantity, sale_price, sale_date
            FROM product_sales
            WHERE product_id = ?1
            ORDER BY sale_date DESC, id DESC
            "#,
        )?;
        let rows = stmt
            .query_map(params![product_id], map_raw_sale_row)?
            .collect::<SqliteResult<Vec<RawSaleRecord>>>()?;
        Ok(rows)
    }

    /// 记录一笔销售
    ///
    /// 成交价取商品当前价格；库存不足时拒绝
    ///
    /// # 返回
    /// - Err(NotFound): 商品不存在
    /// - Err(InsufficientStock): 库存不足
    pub fn record_sale(&self, sale: &NewSale, now: NaiveDateTime) -> RepositoryResult<SaleRecord> {
        if sale.quantity <= 0 {
            return Err(RepositoryError::FieldValueError {
                field: "quantity".to_string(),
                message: format!("must be positive, got {}", sale.quantity),
            });
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let product = find_product_with_conn(&tx, sale.product_id)?
            .ok_or_else(|| RepositoryError::not_found("Product", sale.product_id))?;
        if product.quantity < sale.quantity {
            return Err(RepositoryError::InsufficientStock {
                product_id: product.id,
                available: product.quantity,
                requested: sale.quantity,
            });
        }

        let sale_date = sale.sale_date.unwrap_or(now);
        tx.execute(
            "INSERT INTO product_sales (product_id, quantity, sale_price, sale_date) VALUES (?1, ?2, ?3, ?4)",
            params![product.id, sale.quantity, product.price, format_datetime(&sale_date)],
        )?;
        let sale_id = tx.last_insert_rowid();

        insert_movement(
            &tx,
            &NewStockMovement {
                product_id: product.id,
                movement_type: MovementType::Sale,
                quantity_change: -sale.quantity,
                quantity_before: product.quantity,
                reference_id: Some(sale_id),
                reference_type: Some("sale".to_string()),
                notes: sale.notes.clone().or_else(|| {
                    Some(format!(
                        "Sale of {} units at {:.2} each",
                        sale.quantity, product.price
                    ))
                }),
                transaction_date: sale_date,
            },
        )?;
        set_quantity_with_conn(&tx, product.id, product.quantity - sale.quantity, now)?;

        tx.commit()?;

        Ok(SaleRecord {
            id: sale_id,
            product_id: Some(product.id),
            quantity: sale.quantity,
            sale_price: Some(product.price),
            sale_date,
            dated: true,
        })
    }
}

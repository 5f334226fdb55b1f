// ==========================================
// 库存管理看板 - 库存变动流水仓储
// ==========================================
// 流水只追加；写入由销售/采购/调整事务内调用 insert_movement
// ==========================================

use crate::db::{format_datetime, parse_datetime};
use crate::domain::purchase_order::{NewStockMovement, StockMovement};
use crate::domain::types::MovementType;
use crate::repository::error::{invalid_column, RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const MOVEMENT_COLUMNS: &str = "id, product_id, movement_type, quantity_change, quantity_before, quantity_after, reference_id, reference_type, notes, transaction_date";

fn map_movement_row(row: &Row) -> SqliteResult<StockMovement> {
    let movement_type: String = row.get(2)?;
    let transaction_date: String = row.get(9)?;
    let transaction_date =
        parse_datetime(&transaction_date).ok_or_else(|| invalid_column(9, &transaction_date))?;
    Ok(StockMovement {
        id: row.get(0)?,
        product_id: row.get(1)?,
        movement_type: MovementType::from_str(&movement_type),
        quantity_change: row.get(3)?,
        quantity_before: row.get(4)?,
        quantity_after: row.get(5)?,
        reference_id: row.get(6)?,
        reference_type: row.get(7)?,
        notes: row.get(8)?,
        transaction_date,
    })
}

/// 写入一条变动（调用方负责事务）
pub(crate) fn insert_movement(conn: &Connection, movement: &NewStockMovement) -> RepositoryResult<i64> {
    conn.execute(
        r#"
        INSERT INTO stock_movements (
            product_id, movement_type, quantity_change, quantity_before, quantity_after,
            reference_id, reference_type, notes, transaction_date
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
        params![
            movement.product_id,
            movement.movement_type.to_db_str(),
            movement.quantity_change,
            movement.quantity_before,
            movement.quantity_after(),
            movement.reference_id,
            movement.reference_type,
            movement.notes,
            format_datetime(&movement.transaction_date),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub struct StockMovementRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StockMovementRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 全部流水（按时间升序）
    pub fn list(&self) -> RepositoryResult<Vec<StockMovement>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM stock_movements ORDER BY transaction_date, id",
            MOVEMENT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], map_movement_row)?
            .collect::<SqliteResult<Vec<StockMovement>>>()?;
        Ok(rows)
    }

    /// 单品流水（按时间倒序）
    pub fn list_by_product(&self, product_id: i64) -> RepositoryResult<Vec<StockMovement>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM stock_movements WHERE product_id = ?1 ORDER BY transaction_date DESC, id DESC",
            MOVEMENT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![product_id], map_movement_row)?
            .collect::<SqliteResult<Vec<StockMovement>>>()?;
        Ok(rows)
    }

    /// 手工追加一条流水
    pub fn insert(&self, movement: &NewStockMovement) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        insert_movement(&conn, movement)
    }
}

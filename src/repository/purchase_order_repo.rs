// ==========================================
// 库存管理看板 - 采购单仓储
// ==========================================
// 批量创建: 单事务，共享 group_id (UUID v4)，任一商品/供应商不存在则整体回滚
// 状态流转到 completed: 同事务内入库 + 写 restock 变动
// ==========================================

use crate::db::{format_datetime, parse_datetime};
use crate::domain::purchase_order::{
    NewPurchaseOrder, NewStockMovement, PurchaseOrder, PurchaseOrderUpdate,
};
use crate::domain::types::{MovementType, PurchaseOrderStatus};
use crate::repository::error::{invalid_column, RepositoryError, RepositoryResult};
use crate::repository::product_repo::{find_product_with_conn, set_quantity_with_conn};
use crate::repository::stock_movement_repo::insert_movement;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

const ORDER_COLUMNS: &str = "id, supplier_id, product_id, quantity_ordered, status, order_date, notes, notify_by_email, group_id";

/// 状态或日期无法识别的行视为损坏，映射失败
fn map_order_row(row: &Row) -> SqliteResult<PurchaseOrder> {
    let status: String = row.get(4)?;
    let status = PurchaseOrderStatus::from_str(&status).ok_or_else(|| invalid_column(4, &status))?;
    let order_date: String = row.get(5)?;
    let order_date = parse_datetime(&order_date).ok_or_else(|| invalid_column(5, &order_date))?;
    Ok(PurchaseOrder {
        id: row.get(0)?,
        supplier_id: row.get(1)?,
        product_id: row.get(2)?,
        quantity_ordered: row.get(3)?,
        status,
        order_date,
        notes: row.get(6)?,
        notify_by_email: row.get(7)?,
        group_id: row.get(8)?,
    })
}

fn find_order_with_conn(conn: &Connection, id: i64) -> RepositoryResult<Option<PurchaseOrder>> {
    let sql = format!("SELECT {} FROM purchase_orders WHERE id = ?1", ORDER_COLUMNS);
    Ok(conn.query_row(&sql, params![id], map_order_row).optional()?)
}

/// 校验 + 写入单笔（调用方负责事务）
fn insert_order_with_conn(
    conn: &Connection,
    order: &NewPurchaseOrder,
    group_id: Option<&str>,
    now: NaiveDateTime,
) -> RepositoryResult<i64> {
    if order.quantity_ordered < 1 {
        return Err(RepositoryError::FieldValueError {
            field: "quantity_ordered".to_string(),
            message: format!("must be at least 1, got {}", order.quantity_ordered),
        });
    }
    if find_product_with_conn(conn, order.product_id)?.is_none() {
        return Err(RepositoryError::not_found("Product", order.product_id));
    }
    if let Some(supplier_id) = order.supplier_id {
        let exists: Option<i64> = conn
            .query_row(
                "SELECT id FROM suppliers WHERE id = ?1",
                params![supplier_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(RepositoryError::not_found("Supplier", supplier_id));
        }
    }

    conn.execute(
        r#"
        INSERT INTO purchase_orders (
            supplier_id, product_id, quantity_ordered, status,
            order_date, notes, notify_by_email, group_id
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
        params![
            order.supplier_id,
            order.product_id,
            order.quantity_ordered,
            order.status.to_db_str(),
            format_datetime(&now),
            order.notes,
            order.notify_by_email,
            group_id,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// 应用更新；pending/cancelled → completed 时入库
fn apply_update_with_conn(
    conn: &Connection,
    order: &PurchaseOrder,
    update: &PurchaseOrderUpdate,
    now: NaiveDateTime,
) -> RepositoryResult<()> {
    let new_status = update.status.unwrap_or(order.status);
    let new_quantity = update.quantity_ordered.unwrap_or(order.quantity_ordered);
    if new_quantity < 1 {
        return Err(RepositoryError::FieldValueError {
            field: "quantity_ordered".to_string(),
            message: format!("must be at least 1, got {}", new_quantity),
        });
    }
    let new_notes = update.notes.clone().or_else(|| order.notes.clone());

    conn.execute(
        "UPDATE purchase_orders SET status = ?1, quantity_ordered = ?2, notes = ?3 WHERE id = ?4",
        params![new_status.to_db_str(), new_quantity, new_notes, order.id],
    )?;

    let becomes_completed =
        new_status == PurchaseOrderStatus::Completed && order.status != PurchaseOrderStatus::Completed;
    if becomes_completed {
        if let Some(product) = find_product_with_conn(conn, order.product_id)? {
            let note = match order.group_id.as_deref() {
                Some(g) => format!("Restock from purchase order #{} (group {})", order.id, g),
                None => format!("Restock from purchase order #{}", order.id),
            };
            insert_movement(
                conn,
                &NewStockMovement {
                    product_id: product.id,
                    movement_type: MovementType::Restock,
                    quantity_change: new_quantity,
                    quantity_before: product.quantity,
                    reference_id: Some(order.id),
                    reference_type: Some("purchase_order".to_string()),
                    notes: Some(note),
                    transaction_date: now,
                },
            )?;
            set_quantity_with_conn(conn, product.id, product.quantity + new_quantity, now)?;
        }
    }
    Ok(())
}

pub struct PurchaseOrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PurchaseOrderRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询采购单（可按状态筛选），下单时间倒序
    pub fn list(&self, status: Option<PurchaseOrderStatus>) -> RepositoryResult<Vec<PurchaseOrder>> {
        let conn = self.get_conn()?;
        let rows = match status {
            Some(s) => {
                let sql = format!(
                    "SELECT {} FROM purchase_orders WHERE status = ?1 ORDER BY order_date DESC, id DESC",
                    ORDER_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![s.to_db_str()], map_order_row)?
                    .collect::<SqliteResult<Vec<PurchaseOrder>>>()?;
                rows
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM purchase_orders ORDER BY order_date DESC, id DESC",
                    ORDER_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map([], map_order_row)?
                    .collect::<SqliteResult<Vec<PurchaseOrder>>>()?;
                rows
            }
        };
        Ok(rows)
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<PurchaseOrder>> {
        let conn = self.get_conn()?;
        find_order_with_conn(&conn, id)
    }

    pub fn list_by_group(&self, group_id: &str) -> RepositoryResult<Vec<PurchaseOrder>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM purchase_orders WHERE group_id = ?1 ORDER BY order_date DESC, id DESC",
            ORDER_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![group_id], map_order_row)?
            .collect::<SqliteResult<Vec<PurchaseOrder>>>()?;
        Ok(rows)
    }

    /// 创建单笔采购单（无 group_id）
    pub fn create(&self, order: &NewPurchaseOrder, now: NaiveDateTime) -> RepositoryResult<PurchaseOrder> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let id = insert_order_with_conn(&tx, order, None, now)?;
        let created = find_order_with_conn(&tx, id)?
            .ok_or_else(|| RepositoryError::not_found("PurchaseOrder", id))?;
        tx.commit()?;
        Ok(created)
    }

    /// 批量创建（单事务，共享新生成的 group_id）
    ///
    /// # 返回
    /// - Ok(Vec<PurchaseOrder>): 按输入顺序返回
    /// - Err: 任一失败则整体回滚
    pub fn create_batch(
        &self,
        orders: &[NewPurchaseOrder],
        now: NaiveDateTime,
    ) -> RepositoryResult<Vec<PurchaseOrder>> {
        if orders.is_empty() {
            return Err(RepositoryError::ValidationError(
                "batch must contain at least one order".to_string(),
            ));
        }

        let group_id = Uuid::new_v4().to_string();
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut created = Vec::with_capacity(orders.len());
        for order in orders {
            let id = insert_order_with_conn(&tx, order, Some(&group_id), now)?;
            let row = find_order_with_conn(&tx, id)?
                .ok_or_else(|| RepositoryError::not_found("PurchaseOrder", id))?;
            created.push(row);
        }

        tx.commit()?;
        tracing::info!(group_id = %group_id, count = created.len(), "批量采购单已创建");
        Ok(created)
    }

    /// 更新单笔采购单
    pub fn update(
        &self,
        id: i64,
        update: &PurchaseOrderUpdate,
        now: NaiveDateTime,
    ) -> RepositoryResult<PurchaseOrder> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let order = find_order_with_conn(&tx, id)?
            .ok_or_else(|| RepositoryError::not_found("PurchaseOrder", id))?;
        apply_update_with_conn(&tx, &order, update, now)?;

        let fresh = find_order_with_conn(&tx, id)?
            .ok_or_else(|| RepositoryError::not_found("PurchaseOrder", id))?;
        tx.commit()?;
        Ok(fresh)
    }

    /// 按组更新（单事务）
    pub fn update_group(
        &self,
        group_id: &str,
        update: &PurchaseOrderUpdate,
        now: NaiveDateTime,
    ) -> RepositoryResult<Vec<PurchaseOrder>> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let sql = format!(
            "SELECT {} FROM purchase_orders WHERE group_id = ?1 ORDER BY id",
            ORDER_COLUMNS
        );
        let orders = {
            let mut stmt = tx.prepare(&sql)?;
            let rows = stmt
                .query_map(params![group_id], map_order_row)?
                .collect::<SqliteResult<Vec<PurchaseOrder>>>()?;
            rows
        };
        if orders.is_empty() {
            return Err(RepositoryError::not_found("PurchaseOrderGroup", group_id));
        }

        for order in &orders {
            apply_update_with_conn(&tx, order, update, now)?;
        }

        let mut fresh = Vec::with_capacity(orders.len());
        for order in &orders {
            if let Some(row) = find_order_with_conn(&tx, order.id)? {
                fresh.push(row);
            }
        }
        tx.commit()?;
        Ok(fresh)
    }

    pub fn delete(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM purchase_orders WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(RepositoryError::not_found("PurchaseOrder", id));
        }
        Ok(())
    }
}

// ==========================================
// 库存管理看板 - 供应商仓储
// ==========================================

use crate::domain::product::{NewSupplier, Supplier};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

fn map_supplier_row(row: &Row) -> SqliteResult<Supplier> {
    Ok(Supplier {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        address: row.get(4)?,
    })
}

pub struct SupplierRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SupplierRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn list(&self) -> RepositoryResult<Vec<Supplier>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT id, name, email, phone, address FROM suppliers ORDER BY id")?;
        let rows = stmt
            .query_map([], map_supplier_row)?
            .collect::<SqliteResult<Vec<Supplier>>>()?;
        Ok(rows)
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Supplier>> {
        let conn = self.get_conn()?;
        Ok(conn
            .query_row(
                "SELECT id, name, email, phone, address FROM suppliers WHERE id = ?1",
                params![id],
                map_supplier_row,
            )
            .optional()?)
    }

    /// 按名称查询（大小写不敏感）
    pub fn find_by_name(&self, name: &str) -> RepositoryResult<Option<Supplier>> {
        let conn = self.get_conn()?;
        Ok(conn
            .query_row(
                "SELECT id, name, email, phone, address FROM suppliers WHERE name = ?1 COLLATE NOCASE",
                params![name.trim()],
                map_supplier_row,
            )
            .optional()?)
    }

    pub fn insert(&self, supplier: &NewSupplier) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO suppliers (name, email, phone, address) VALUES (?1, ?2, ?3, ?4)",
            params![
                supplier.name.trim(),
                supplier.email,
                supplier.phone,
                supplier.address
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update(&self, id: i64, supplier: &NewSupplier) -> RepositoryResult<Supplier> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE suppliers SET name = ?1, email = ?2, phone = ?3, address = ?4 WHERE id = ?5",
            params![
                supplier.name.trim(),
                supplier.email,
                supplier.phone,
                supplier.address,
                id
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Supplier", id));
        }
        Ok(Supplier {
            id,
            name: supplier.name.trim().to_string(),
            email: supplier.email.clone(),
            phone: supplier.phone.clone(),
            address: supplier.address.clone(),
        })
    }

    /// 删除供应商；仍有商品引用时拒绝
    pub fn delete(&self, id: i64) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let dependents: i64 = tx.query_row(
            "SELECT COUNT(*) FROM products WHERE supplier_id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        if dependents > 0 {
            return Err(RepositoryError::InUse {
                entity: "Supplier".to_string(),
                id: id.to_string(),
                dependents,
            });
        }

        // 历史采购单保留，仅解除供应商引用
        tx.execute(
            "UPDATE purchase_orders SET supplier_id = NULL WHERE supplier_id = ?1",
            params![id],
        )?;
        let affected = tx.execute("DELETE FROM suppliers WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Supplier", id));
        }
        tx.commit()?;
        Ok(())
    }
}

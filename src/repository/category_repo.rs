// ==========================================
// 库存管理看板 - 商品分类仓储
// ==========================================

use crate::domain::product::{Category, NewCategory};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

fn map_category_row(row: &Row) -> SqliteResult<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
    })
}

pub struct CategoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CategoryRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn list(&self) -> RepositoryResult<Vec<Category>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT id, name, description FROM categories ORDER BY id")?;
        let rows = stmt
            .query_map([], map_category_row)?
            .collect::<SqliteResult<Vec<Category>>>()?;
        Ok(rows)
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Category>> {
        let conn = self.get_conn()?;
        Ok(conn
            .query_row(
                "SELECT id, name, description FROM categories WHERE id = ?1",
                params![id],
                map_category_row,
            )
            .optional()?)
    }

    /// 按名称查询（大小写不敏感）
    pub fn find_by_name(&self, name: &str) -> RepositoryResult<Option<Category>> {
        let conn = self.get_conn()?;
        Ok(conn
            .query_row(
                "SELECT id, name, description FROM categories WHERE name = ?1 COLLATE NOCASE",
                params![name.trim()],
                map_category_row,
            )
            .optional()?)
    }

    /// 新建分类
    ///
    /// # 返回
    /// - Err(UniqueConstraintViolation): 名称重复
    pub fn insert(&self, category: &NewCategory) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO categories (name, description) VALUES (?1, ?2)",
            params![category.name.trim(), category.description],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update(&self, id: i64, category: &NewCategory) -> RepositoryResult<Category> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE categories SET name = ?1, description = ?2 WHERE id = ?3",
            params![category.name.trim(), category.description, id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Category", id));
        }
        Ok(Category {
            id,
            name: category.name.trim().to_string(),
            description: category.description.clone(),
        })
    }

    /// 删除分类；仍有商品引用时拒绝
    pub fn delete(&self, id: i64) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let dependents: i64 = tx.query_row(
            "SELECT COUNT(*) FROM products WHERE category_id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        if dependents > 0 {
            return Err(RepositoryError::InUse {
                entity: "Category".to_string(),
                id: id.to_string(),
                dependents,
            });
        }

        let affected = tx.execute("DELETE FROM categories WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Category", id));
        }
        tx.commit()?;
        Ok(())
    }
}

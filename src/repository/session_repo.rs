// ==========================================
// 库存管理看板 - 会话存储
// ==========================================
// session_kv 表仅保存一条当前会话（JSON），启动时加载，登出时清除
// ==========================================

use crate::domain::session::SessionContext;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

const SESSION_KEY: &str = "current_session";

pub struct SessionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SessionRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 保存（覆盖）当前会话
    pub fn save(&self, session: &SessionContext) -> RepositoryResult<()> {
        let json = serde_json::to_string(session)
            .map_err(|e| RepositoryError::InternalError(format!("会话序列化失败: {}", e)))?;
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO session_kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![SESSION_KEY, json],
        )?;
        Ok(())
    }

    /// 读取当前会话
    ///
    /// 存储内容损坏时视为无会话并清除
    pub fn load(&self) -> RepositoryResult<Option<SessionContext>> {
        let conn = self.get_conn()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT value FROM session_kv WHERE key = ?1",
                params![SESSION_KEY],
                |row| row.get(0),
            )
            .optional()?;

        let Some(raw) = raw else {
            return Ok(None);
        };
        match serde_json::from_str::<SessionContext>(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!(error = %e, "会话数据无法解析，已清除");
                conn.execute("DELETE FROM session_kv WHERE key = ?1", params![SESSION_KEY])?;
                Ok(None)
            }
        }
    }

    /// 清除当前会话
    pub fn clear(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute("DELETE FROM session_kv WHERE key = ?1", params![SESSION_KEY])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn repo() -> SessionRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        SessionRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_save_load_clear() {
        let repo = repo();
        assert!(repo.load().unwrap().is_none());

        let now = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
        let session = SessionContext::new("ops@example.com", "tok-1", None, now);
        repo.save(&session).unwrap();
        assert_eq!(repo.load().unwrap(), Some(session.clone()));

        let second = SessionContext::new("ops@example.com", "tok-2", Some("bearer"), now);
        repo.save(&second).unwrap();
        assert_eq!(repo.load().unwrap().unwrap().access_token, "tok-2");

        repo.clear().unwrap();
        assert!(repo.load().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_session_is_discarded() {
        let repo = repo();
        {
            let conn = repo.get_conn().unwrap();
            conn.execute(
                "INSERT INTO session_kv (key, value) VALUES (?1, 'not json')",
                params![SESSION_KEY],
            )
            .unwrap();
        }
        assert!(repo.load().unwrap().is_none());
        assert!(repo.load().unwrap().is_none());
    }
}

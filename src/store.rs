//! 工作区与历史的 SQLite 持久化
//!
//! 两张表：workspaces（元信息 + 上下文摘要）与 history（按工作区外键级联删除的
//! user/assistant 对）。所有操作同步执行，数据库文件路径来自配置。

use std::path::Path;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};

use crate::core::AgentError;

/// 工作区元信息（列表展示用）
#[derive(Clone, Debug)]
pub struct WorkspaceMeta {
    pub id: i64,
    pub name: String,
    pub created_at: NaiveDateTime,
}

/// 打开即建表的工作区存储
pub struct WorkspaceStore {
    conn: Connection,
}

impl WorkspaceStore {
    /// 打开（必要时创建）数据库并确保 schema 存在
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AgentError> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS workspaces (
                workspace_id       INTEGER PRIMARY KEY AUTOINCREMENT,
                name               TEXT NOT NULL,
                created_at         TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                context_summary    TEXT,
                context_updated_at TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS history (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                workspace_id INTEGER NOT NULL,
                user         TEXT NOT NULL,
                assistant    TEXT NOT NULL,
                FOREIGN KEY (workspace_id) REFERENCES workspaces (workspace_id)
                    ON DELETE CASCADE
            );",
        )?;
        Ok(Self { conn })
    }

    pub fn create_workspace(&self, name: &str) -> Result<i64, AgentError> {
        self.conn.execute(
            "INSERT INTO workspaces (name) VALUES (?1)",
            params![name],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// 全部工作区，最新的在前
    pub fn list_workspaces(&self) -> Result<Vec<WorkspaceMeta>, AgentError> {
        let mut stmt = self.conn.prepare(
            "SELECT workspace_id, name, created_at FROM workspaces
             ORDER BY created_at DESC, workspace_id DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(WorkspaceMeta {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn find_workspace(&self, name: &str) -> Result<Option<WorkspaceMeta>, AgentError> {
        let meta = self
            .conn
            .query_row(
                "SELECT workspace_id, name, created_at FROM workspaces WHERE name = ?1",
                params![name],
                |row| {
                    Ok(WorkspaceMeta {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(meta)
    }

    pub fn rename_workspace(&self, id: i64, name: &str) -> Result<(), AgentError> {
        self.conn.execute(
            "UPDATE workspaces SET name = ?1 WHERE workspace_id = ?2",
            params![name, id],
        )?;
        Ok(())
    }

    /// 删除工作区，历史随外键级联清除
    pub fn delete_workspace(&self, id: i64) -> Result<(), AgentError> {
        self.conn.execute(
            "DELETE FROM workspaces WHERE workspace_id = ?1",
            params![id],
        )?;
        Ok(())
    }

    /// 指定工作区的全部历史对，最旧在前
    pub fn load_history(&self, workspace_id: i64) -> Result<Vec<(String, String)>, AgentError> {
        let mut stmt = self.conn.prepare(
            "SELECT user, assistant FROM history WHERE workspace_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![workspace_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn append_history(
        &self,
        workspace_id: i64,
        user: &str,
        assistant: &str,
    ) -> Result<(), AgentError> {
        self.conn.execute(
            "INSERT INTO history (workspace_id, user, assistant) VALUES (?1, ?2, ?3)",
            params![workspace_id, user, assistant],
        )?;
        Ok(())
    }

    pub fn clear_history(&self, workspace_id: i64) -> Result<(), AgentError> {
        self.conn.execute(
            "DELETE FROM history WHERE workspace_id = ?1",
            params![workspace_id],
        )?;
        Ok(())
    }

    pub fn summary(&self, workspace_id: i64) -> Result<Option<String>, AgentError> {
        let summary: Option<Option<String>> = self
            .conn
            .query_row(
                "SELECT context_summary FROM workspaces WHERE workspace_id = ?1",
                params![workspace_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(summary.flatten())
    }

    pub fn set_summary(&self, workspace_id: i64, summary: &str) -> Result<(), AgentError> {
        self.conn.execute(
            "UPDATE workspaces
             SET context_summary = ?1, context_updated_at = CURRENT_TIMESTAMP
             WHERE workspace_id = ?2",
            params![summary, workspace_id],
        )?;
        Ok(())
    }

    pub fn summary_updated_at(
        &self,
        workspace_id: i64,
    ) -> Result<Option<NaiveDateTime>, AgentError> {
        let stamp: Option<Option<NaiveDateTime>> = self
            .conn
            .query_row(
                "SELECT context_updated_at FROM workspaces WHERE workspace_id = ?1",
                params![workspace_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(stamp.flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> WorkspaceStore {
        WorkspaceStore::open(dir.path().join("test.sqlite")).unwrap()
    }

    #[test]
    fn history_round_trips_in_insertion_order() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let ws = store.create_workspace("kitchen").unwrap();

        store.append_history(ws, "hi", "hello").unwrap();
        store.append_history(ws, "bye", "see you").unwrap();

        let history = store.load_history(ws).unwrap();
        assert_eq!(
            history,
            vec![
                ("hi".to_string(), "hello".to_string()),
                ("bye".to_string(), "see you".to_string()),
            ]
        );
    }

    #[test]
    fn deleting_a_workspace_cascades_to_history() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let ws = store.create_workspace("garage").unwrap();
        store.append_history(ws, "q", "a").unwrap();

        store.delete_workspace(ws).unwrap();

        assert!(store.load_history(ws).unwrap().is_empty());
        assert!(store.find_workspace("garage").unwrap().is_none());
    }

    #[test]
    fn summary_defaults_to_none_and_updates_with_timestamp() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let ws = store.create_workspace("deck").unwrap();

        assert!(store.summary(ws).unwrap().is_none());
        assert!(store.summary_updated_at(ws).unwrap().is_none());

        store.set_summary(ws, "planning a deck build").unwrap();
        assert_eq!(
            store.summary(ws).unwrap().as_deref(),
            Some("planning a deck build")
        );
        assert!(store.summary_updated_at(ws).unwrap().is_some());
    }

    #[test]
    fn rename_and_clear_history_are_scoped_to_one_workspace() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let a = store.create_workspace("a").unwrap();
        let b = store.create_workspace("b").unwrap();
        store.append_history(a, "qa", "aa").unwrap();
        store.append_history(b, "qb", "ab").unwrap();

        store.rename_workspace(a, "attic").unwrap();
        store.clear_history(a).unwrap();

        assert!(store.find_workspace("attic").unwrap().is_some());
        assert!(store.load_history(a).unwrap().is_empty());
        assert_eq!(store.load_history(b).unwrap().len(), 1);
    }
}

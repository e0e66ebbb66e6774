use chrono::Utc;
use rusqlite::OptionalExtension;

use crate::db::Database;
use crate::error::ServerError;
use crate::models::shortcut::{Shortcut, Visibility};

pub struct ShortcutStore {
    db: Database,
}

impl ShortcutStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a new shortcut. Names are unique workspace-wide; a taken name
    /// fails with `AlreadyExists`.
    pub async fn create(&self, shortcut: &Shortcut) -> Result<(), ServerError> {
        let s = shortcut.clone();
        let result = self
            .db
            .with_conn_async(move |conn| {
                conn.execute(
                    "INSERT INTO shortcuts
                       (id, creator_id, name, link, title, description, visibility, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    rusqlite::params![
                        s.id,
                        s.creator_id,
                        s.name,
                        s.link,
                        s.title,
                        s.description,
                        s.visibility.as_str(),
                        s.created_at.timestamp_millis(),
                        s.updated_at.timestamp_millis(),
                    ],
                )?;
                Ok(())
            })
            .await;

        match result {
            Err(ServerError::Database(msg)) if msg.contains("UNIQUE constraint failed") => Err(
                ServerError::AlreadyExists(format!("Shortcut {} already exists", shortcut.name)),
            ),
            other => other,
        }
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<Shortcut>, ServerError> {
        let name = name.to_string();
        self.db
            .with_conn_async(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, creator_id, name, link, title, description, visibility, created_at, updated_at
                     FROM shortcuts WHERE name = ?1",
                )?;
                stmt.query_row(rusqlite::params![name], |row| Ok(row_to_shortcut(row)))
                    .optional()
            })
            .await
    }

    pub async fn list(&self) -> Result<Vec<Shortcut>, ServerError> {
        self.db
            .with_conn_async(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, creator_id, name, link, title, description, visibility, created_at, updated_at
                     FROM shortcuts ORDER BY created_at DESC",
                )?;
                let rows = stmt
                    .query_map([], |row| Ok(row_to_shortcut(row)))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ServerError> {
        let id = id.to_string();
        self.db
            .with_conn_async(move |conn| {
                conn.execute("DELETE FROM shortcuts WHERE id = ?1", rusqlite::params![id])?;
                Ok(())
            })
            .await
    }

    pub async fn count(&self) -> Result<u32, ServerError> {
        self.db
            .with_conn_async(move |conn| {
                conn.query_row("SELECT COUNT(*) FROM shortcuts", [], |row| row.get(0))
            })
            .await
    }
}

use rusqlite::Row;

fn row_to_shortcut(row: &Row<'_>) -> Shortcut {
    let created_ms: i64 = row.get(7).unwrap_or(0);
    let updated_ms: i64 = row.get(8).unwrap_or(0);

    Shortcut {
        id: row.get(0).unwrap_or_default(),
        creator_id: row.get(1).unwrap_or(0),
        name: row.get(2).unwrap_or_default(),
        link: row.get(3).unwrap_or_default(),
        title: row.get(4).unwrap_or_default(),
        description: row.get(5).unwrap_or_default(),
        visibility: Visibility::from_str(&row.get::<_, String>(6).unwrap_or_default()),
        created_at: chrono::DateTime::from_timestamp_millis(created_ms)
            .unwrap_or_else(|| Utc::now()),
        updated_at: chrono::DateTime::from_timestamp_millis(updated_ms)
            .unwrap_or_else(|| Utc::now()),
    }
}

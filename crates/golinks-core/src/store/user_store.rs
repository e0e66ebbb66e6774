use chrono::Utc;
use rusqlite::OptionalExtension;

use crate::db::Database;
use crate::error::ServerError;
use crate::models::user::{Role, User};

pub struct UserStore {
    db: Database,
}

impl UserStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create the host (admin) user if no admin exists yet. Returns the
    /// host user either way. Every deployment has exactly one host.
    pub async fn ensure_host(&self, username: &str) -> Result<User, ServerError> {
        if let Some(host) = self.find_host().await? {
            return Ok(host);
        }

        let username = username.to_string();
        let now = Utc::now().timestamp_millis();
        self.db
            .with_conn_async(move |conn| {
                conn.execute(
                    "INSERT INTO users (username, nickname, role, locale, created_at, updated_at)
                     VALUES (?1, ?2, 'admin', 'en', ?3, ?3)
                     ON CONFLICT (username) DO NOTHING",
                    rusqlite::params![username, username, now],
                )?;
                Ok(())
            })
            .await?;

        self.find_host()
            .await?
            .ok_or_else(|| ServerError::Internal("Failed to create host user".to_string()))
    }

    pub async fn find_host(&self) -> Result<Option<User>, ServerError> {
        self.db
            .with_conn_async(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, username, nickname, role, locale, created_at, updated_at
                     FROM users WHERE role = 'admin' ORDER BY id ASC LIMIT 1",
                )?;
                stmt.query_row([], |row| Ok(row_to_user(row))).optional()
            })
            .await
    }

    pub async fn create(&self, username: &str, nickname: &str, role: Role) -> Result<User, ServerError> {
        let username_owned = username.to_string();
        let nickname = nickname.to_string();
        let now = Utc::now().timestamp_millis();
        let result = self
            .db
            .with_conn_async(move |conn| {
                conn.execute(
                    "INSERT INTO users (username, nickname, role, locale, created_at, updated_at)
                     VALUES (?1, ?2, ?3, 'en', ?4, ?4)",
                    rusqlite::params![username_owned, nickname, role.as_str(), now],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await;

        let id = match result {
            Err(ServerError::Database(msg)) if msg.contains("UNIQUE constraint failed") => {
                return Err(ServerError::AlreadyExists(format!(
                    "User {} already exists",
                    username
                )))
            }
            other => other?,
        };

        self.get(id)
            .await?
            .ok_or_else(|| ServerError::Internal("Failed to load created user".to_string()))
    }

    pub async fn get(&self, id: i64) -> Result<Option<User>, ServerError> {
        self.db
            .with_conn_async(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, username, nickname, role, locale, created_at, updated_at
                     FROM users WHERE id = ?1",
                )?;
                stmt.query_row(rusqlite::params![id], |row| Ok(row_to_user(row)))
                    .optional()
            })
            .await
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, ServerError> {
        let username = username.to_string();
        self.db
            .with_conn_async(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, username, nickname, role, locale, created_at, updated_at
                     FROM users WHERE username = ?1",
                )?;
                stmt.query_row(rusqlite::params![username], |row| Ok(row_to_user(row)))
                    .optional()
            })
            .await
    }

    pub async fn list(&self) -> Result<Vec<User>, ServerError> {
        self.db
            .with_conn_async(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, username, nickname, role, locale, created_at, updated_at
                     FROM users ORDER BY id ASC",
                )?;
                let rows = stmt
                    .query_map([], |row| Ok(row_to_user(row)))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
    }

    pub async fn count(&self) -> Result<u32, ServerError> {
        self.db
            .with_conn_async(move |conn| {
                conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            })
            .await
    }
}

use rusqlite::Row;

fn row_to_user(row: &Row<'_>) -> User {
    let created_ms: i64 = row.get(5).unwrap_or(0);
    let updated_ms: i64 = row.get(6).unwrap_or(0);

    User {
        id: row.get(0).unwrap_or(0),
        username: row.get(1).unwrap_or_default(),
        nickname: row.get(2).unwrap_or_default(),
        role: Role::from_str(&row.get::<_, String>(3).unwrap_or_default()),
        locale: row.get(4).unwrap_or_else(|_| "en".to_string()),
        created_at: chrono::DateTime::from_timestamp_millis(created_ms)
            .unwrap_or_else(|| Utc::now()),
        updated_at: chrono::DateTime::from_timestamp_millis(updated_ms)
            .unwrap_or_else(|| Utc::now()),
    }
}

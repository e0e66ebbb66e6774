use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::error::ServerError;

/// A persisted access token record. Only the SHA-256 hash of the token is
/// stored; the raw secret is shown to the caller once at mint time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
    pub id: String,
    pub user_id: i64,
    #[serde(skip_serializing)]
    pub token_hash: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(exp) if exp <= now)
    }
}

pub struct TokenStore {
    db: Database,
}

impl TokenStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        user_id: i64,
        token_hash: &str,
        description: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<AccessToken, ServerError> {
        let token = AccessToken {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            token_hash: token_hash.to_string(),
            description: description.to_string(),
            created_at: Utc::now(),
            expires_at,
        };

        let t = token.clone();
        self.db
            .with_conn_async(move |conn| {
                conn.execute(
                    "INSERT INTO access_tokens (id, user_id, token_hash, description, created_at, expires_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    rusqlite::params![
                        t.id,
                        t.user_id,
                        t.token_hash,
                        t.description,
                        t.created_at.timestamp_millis(),
                        t.expires_at.map(|e| e.timestamp_millis()),
                    ],
                )?;
                Ok(())
            })
            .await?;

        Ok(token)
    }

    pub async fn find_by_hash(&self, token_hash: &str) -> Result<Option<AccessToken>, ServerError> {
        let token_hash = token_hash.to_string();
        self.db
            .with_conn_async(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, user_id, token_hash, description, created_at, expires_at
                     FROM access_tokens WHERE token_hash = ?1",
                )?;
                stmt.query_row(rusqlite::params![token_hash], |row| Ok(row_to_token(row)))
                    .optional()
            })
            .await
    }

    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<AccessToken>, ServerError> {
        self.db
            .with_conn_async(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, user_id, token_hash, description, created_at, expires_at
                     FROM access_tokens WHERE user_id = ?1 ORDER BY created_at DESC",
                )?;
                let rows = stmt
                    .query_map(rusqlite::params![user_id], |row| Ok(row_to_token(row)))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ServerError> {
        let id = id.to_string();
        self.db
            .with_conn_async(move |conn| {
                conn.execute(
                    "DELETE FROM access_tokens WHERE id = ?1",
                    rusqlite::params![id],
                )?;
                Ok(())
            })
            .await
    }

    /// Drop tokens whose expiry has passed. Called periodically by the server.
    pub async fn prune_expired(&self) -> Result<usize, ServerError> {
        let now = Utc::now().timestamp_millis();
        self.db
            .with_conn_async(move |conn| {
                conn.execute(
                    "DELETE FROM access_tokens WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                    rusqlite::params![now],
                )
            })
            .await
    }
}

use rusqlite::Row;

fn row_to_token(row: &Row<'_>) -> AccessToken {
    let created_ms: i64 = row.get(4).unwrap_or(0);
    let expires_ms: Option<i64> = row.get(5).unwrap_or(None);

    AccessToken {
        id: row.get(0).unwrap_or_default(),
        user_id: row.get(1).unwrap_or(0),
        token_hash: row.get(2).unwrap_or_default(),
        description: row.get(3).unwrap_or_default(),
        created_at: chrono::DateTime::from_timestamp_millis(created_ms)
            .unwrap_or_else(|| Utc::now()),
        expires_at: expires_ms.and_then(chrono::DateTime::from_timestamp_millis),
    }
}

use std::sync::Arc;

use crate::auth::Authenticator;
use crate::db::Database;
use crate::error::ServerError;
use crate::models::user::User;
use crate::store::{SettingStore, ShortcutStore, TokenStore, UserStore};

/// Shared application state, cheap to clone via `Arc`.
pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub users: UserStore,
    pub tokens: TokenStore,
    pub shortcuts: ShortcutStore,
    pub settings: SettingStore,
    /// Shared with the server's auth interceptor as a `TokenVerifier`.
    pub auth: Arc<Authenticator>,
    pub version: String,
}

impl AppStateInner {
    pub fn new(db: Database) -> Self {
        Self {
            users: UserStore::new(db.clone()),
            tokens: TokenStore::new(db.clone()),
            shortcuts: ShortcutStore::new(db.clone()),
            settings: SettingStore::new(db.clone()),
            auth: Arc::new(Authenticator::new(
                TokenStore::new(db.clone()),
                UserStore::new(db.clone()),
            )),
            version: env!("CARGO_PKG_VERSION").to_string(),
            db,
        }
    }

    /// Bootstrap the host admin account. Idempotent; called at startup.
    pub async fn ensure_host_user(&self, username: &str) -> Result<User, ServerError> {
        let host = self.users.ensure_host(username).await?;
        tracing::debug!(username = %host.username, id = host.id, "Host user ready");
        Ok(host)
    }
}

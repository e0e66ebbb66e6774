//! Access-token authentication.
//!
//! Tokens are opaque random strings handed out once at mint time. The
//! database keeps only a SHA-256 hash, so a leaked database does not leak
//! usable credentials.

use chrono::{DateTime, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::ServerError;
use crate::models::user::{Role, User};
use crate::store::{TokenStore, UserStore};

/// Prefix on every minted token so secrets are recognizable in logs and
/// scanners without revealing anything.
const TOKEN_PREFIX: &str = "glk_";
const TOKEN_RANDOM_BYTES: usize = 24;

/// The caller on whose behalf a method executes. Resolved once per call by
/// the auth interceptor; anonymous for public methods without credentials.
#[derive(Debug, Clone, PartialEq)]
pub enum Identity {
    Anonymous,
    User {
        id: i64,
        username: String,
        role: Role,
    },
}

impl Identity {
    pub fn from_user(user: &User) -> Self {
        Self::User {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::User { role: Role::Admin, .. })
    }

    pub fn user_id(&self) -> Option<i64> {
        match self {
            Self::Anonymous => None,
            Self::User { id, .. } => Some(*id),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid access token")]
    InvalidToken,
    #[error("Access token expired")]
    Expired,
    #[error(transparent)]
    Store(#[from] ServerError),
}

/// Generate a fresh raw token. The caller must hash it before storage.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_RANDOM_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    format!("{}{}", TOKEN_PREFIX, hex::encode(bytes))
}

/// SHA-256 hex digest of a raw token, the only form ever persisted.
pub fn hash_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}

/// Credential verification seam consumed by the server's auth interceptor.
/// Implemented by the store-backed `Authenticator`; tests substitute fakes.
#[async_trait::async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, raw: &str) -> Result<Identity, AuthError>;
}

/// Resolves raw tokens to identities against the token and user stores.
pub struct Authenticator {
    tokens: TokenStore,
    users: UserStore,
}

impl Authenticator {
    pub fn new(tokens: TokenStore, users: UserStore) -> Self {
        Self { tokens, users }
    }

    /// Mint a token for a user and return the raw secret alongside the
    /// stored record. The raw secret is never persisted.
    pub async fn mint(
        &self,
        user_id: i64,
        description: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(String, crate::store::AccessToken), ServerError> {
        let raw = generate_token();
        let record = self
            .tokens
            .create(user_id, &hash_token(&raw), description, expires_at)
            .await?;
        Ok((raw, record))
    }
}

#[async_trait::async_trait]
impl TokenVerifier for Authenticator {
    async fn verify(&self, raw: &str) -> Result<Identity, AuthError> {
        let record = self
            .tokens
            .find_by_hash(&hash_token(raw))
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if record.is_expired(Utc::now()) {
            return Err(AuthError::Expired);
        }

        let user = self
            .users
            .get(record.user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        Ok(Identity::from_user(&user))
    }
}

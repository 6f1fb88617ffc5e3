//! Database row models — these map to/from SQL rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct VaultRow {
    pub id: String,
    /// Display name — NOT unique; shadow vaults share it.
    pub name: String,
    /// Argon2id PHC string (opaque to the store).
    pub pin_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CredentialRow {
    pub id: String,
    pub vault_id: String,
    /// Platform display name ("github", "bank", ...).
    pub platform: String,
    /// Sealed secret (base64 ciphertext, opaque to the store).
    pub secret_enc: String,
    /// Identifier of the user's secret image — the verification identity.
    pub image_path: String,
    pub category: String,
    pub failed_attempts: i64,
    /// Set on lockout; persists after expiry until explicitly overwritten.
    pub lock_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CredentialRow {
    /// Lazy lock check — the field outlives the lock window, only the
    /// comparison against `now` decides.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        matches!(self.lock_until, Some(until) if now < until)
    }
}

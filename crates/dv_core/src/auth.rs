//! Vault registration and the shadow-vault login boundary.
//!
//! Login never fails for a known name: a PIN that matches no existing vault
//! under that name silently creates a fresh empty vault and logs into it.
//! That is the plausible-deniability mechanism, not a bug — an observer
//! coercing a login cannot tell a shadow vault from the real one.

use serde::Serialize;
use tracing::{debug, info};

use dv_crypto::pin;
use dv_store::{Store, VaultRow};

use crate::error::CoreError;

/// Outcome of `authenticate`.  Callers that present a UI MUST NOT render
/// the two cases differently — the distinction exists only so the owner's
/// own tooling can act on it.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "login", rename_all = "snake_case")]
pub enum LoginResult {
    Matched(VaultRow),
    Shadow(VaultRow),
}

impl LoginResult {
    pub fn vault(&self) -> &VaultRow {
        match self {
            LoginResult::Matched(v) | LoginResult::Shadow(v) => v,
        }
    }
}

pub struct VaultDirectory {
    store: Store,
}

impl VaultDirectory {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Create a vault under `name`.  Duplicate names are allowed — they are
    /// what shadow vaults hide among.
    pub async fn register(&self, name: &str, pin: &str) -> Result<VaultRow, CoreError> {
        if pin.is_empty() || !pin.chars().all(|c| c.is_ascii_digit()) {
            return Err(CoreError::InvalidPin);
        }
        let hash = pin::hash_pin(pin)?;
        let vault = self.store.create_vault(name, &hash).await?;
        info!(vault_id = %vault.id, "vault registered");
        Ok(vault)
    }

    /// Look up or create: scan the vaults sharing `name` oldest-first and
    /// log into the first whose PIN verifies; otherwise mint a shadow vault
    /// keyed to exactly the PIN that was entered.
    pub async fn authenticate(&self, name: &str, pin: &str) -> Result<LoginResult, CoreError> {
        if pin.is_empty() || !pin.chars().all(|c| c.is_ascii_digit()) {
            return Err(CoreError::InvalidPin);
        }

        let candidates = self.store.list_vaults_by_name(name).await?;
        for vault in candidates {
            if pin::verify_pin(pin, &vault.pin_hash) {
                debug!(vault_id = %vault.id, "login");
                return Ok(LoginResult::Matched(vault));
            }
        }

        let hash = pin::hash_pin(pin)?;
        let vault = self.store.create_vault(name, &hash).await?;
        debug!(vault_id = %vault.id, "login");
        Ok(LoginResult::Shadow(vault))
    }
}

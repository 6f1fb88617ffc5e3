//! Challenge service — the caller-facing surface of the reveal protocol.
//!
//! One verification attempt is guard check → pick comparison → counter/lock
//! mutation → persistence, atomic per credential: a per-credential async
//! mutex serializes in-process attempts and the store's conditional update
//! catches external writers (bounded retry).  Operations on different
//! credentials run fully in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use dv_crypto::{CryptoError, SecretCipher};
use dv_store::credentials::NewCredential;
use dv_store::{CredentialRow, Store};

use crate::catalog::ImageCatalog;
use crate::clock::Clock;
use crate::error::CoreError;
use crate::gallery::{self, GalleryEntry, DEFAULT_DECOY_COUNT};
use crate::image::ImageRef;
use crate::lockout::{self, Outcome};

const ATTEMPT_RETRIES: usize = 3;

/// Result of starting a challenge.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Challenge {
    Gallery { entries: Vec<GalleryEntry> },
    Locked { lock_until: DateTime<Utc> },
}

/// Result of submitting a pick.  Lossless tagged union for any front end.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerifyResult {
    Revealed { secret: String },
    InfoNotice { failed_attempts: i64 },
    FinalWarning { failed_attempts: i64 },
    LockedOut { lock_until: DateTime<Utc> },
    /// Attempt rejected up front — the lock was already live.
    Locked { lock_until: DateTime<Utc> },
}

/// Result of a security-details update.
#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UpdateResult {
    Updated,
    /// Current plaintext did not match — nothing was changed.
    WrongPassword,
}

pub struct ChallengeService {
    store: Store,
    cipher: Arc<SecretCipher>,
    catalog: Arc<dyn ImageCatalog>,
    clock: Arc<dyn Clock>,
    guards: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ChallengeService {
    pub fn new(
        store: Store,
        cipher: Arc<SecretCipher>,
        catalog: Arc<dyn ImageCatalog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            cipher,
            catalog,
            clock,
            guards: Mutex::new(HashMap::new()),
        }
    }

    /// Store a new credential: seal the plaintext, remember the secret image
    /// identifier and category.
    pub async fn add_credential(
        &self,
        vault_id: &str,
        platform: &str,
        secret: &str,
        image: &ImageRef,
        category: Option<&str>,
    ) -> Result<CredentialRow, CoreError> {
        if self.store.get_vault(vault_id).await?.is_none() {
            return Err(CoreError::VaultNotFound(vault_id.to_string()));
        }
        let sealed = self.cipher.seal(secret)?;
        let row = self
            .store
            .insert_credential(NewCredential {
                vault_id,
                platform,
                secret_enc: &sealed,
                image_path: image.as_str(),
                category: category.unwrap_or("other"),
            })
            .await?;
        info!(credential_id = %row.id, platform, "credential added");
        Ok(row)
    }

    /// Start a challenge: either the shuffled gallery or the live lock.
    pub async fn start_challenge(&self, credential_id: &str) -> Result<Challenge, CoreError> {
        let cred = self.fetch(credential_id).await?;
        let now = self.clock.now();
        if let Some(until) = cred.lock_until {
            if now < until {
                debug!(credential_id, %until, "challenge refused: locked");
                return Ok(Challenge::Locked { lock_until: until });
            }
        }

        let secret = ImageRef::new(cred.image_path.clone());
        let entries = gallery::build(
            self.catalog.as_ref(),
            &mut rand::thread_rng(),
            &secret,
            &cred.category,
            DEFAULT_DECOY_COUNT,
        )?;
        debug!(credential_id, tiles = entries.len(), "challenge started");
        Ok(Challenge::Gallery { entries })
    }

    /// Verify one pick against the credential's secret image.
    pub async fn submit_choice(
        &self,
        credential_id: &str,
        chosen: &ImageRef,
    ) -> Result<VerifyResult, CoreError> {
        let guard = self.guard_for(credential_id).await;
        let _held = guard.lock().await;

        for _ in 0..ATTEMPT_RETRIES {
            let mut cred = self.fetch(credential_id).await?;
            let now = self.clock.now();
            let observed_attempts = cred.failed_attempts;

            // Identifier equality — never image content.
            let success = chosen.as_str() == cred.image_path;
            let outcome = lockout::record_outcome(&mut cred, success, now);

            if let Outcome::AlreadyLocked { lock_until } = outcome {
                // Guard fired before comparison mattered; nothing to persist.
                return Ok(VerifyResult::Locked { lock_until });
            }

            let stored = self
                .store
                .store_attempt_state(
                    &cred.id,
                    cred.failed_attempts,
                    cred.lock_until,
                    observed_attempts,
                )
                .await?;
            if !stored {
                warn!(credential_id, "attempt state raced an external writer, retrying");
                continue;
            }

            return match outcome {
                Outcome::Revealed => {
                    let secret = self.open_sealed(&cred.secret_enc)?;
                    info!(credential_id, "secret revealed, counter reset");
                    Ok(VerifyResult::Revealed { secret })
                }
                Outcome::InfoNotice { failed_attempts } => {
                    debug!(credential_id, failed_attempts, "wrong pick");
                    Ok(VerifyResult::InfoNotice { failed_attempts })
                }
                Outcome::FinalWarning { failed_attempts } => {
                    warn!(credential_id, failed_attempts, "one attempt left before lockout");
                    Ok(VerifyResult::FinalWarning { failed_attempts })
                }
                Outcome::LockedOut { lock_until } => {
                    warn!(credential_id, %lock_until, "credential locked");
                    Ok(VerifyResult::LockedOut { lock_until })
                }
                Outcome::AlreadyLocked { .. } => unreachable!("handled before persistence"),
            };
        }

        Err(CoreError::Contention(credential_id.to_string()))
    }

    /// Change secret and/or secret image.  Requires re-proving the current
    /// plaintext; on success the attempt counter and lock are reset — the
    /// only path besides a reveal that does.
    pub async fn change_security(
        &self,
        credential_id: &str,
        current_secret: &str,
        new_secret: Option<&str>,
        new_image: Option<&ImageRef>,
    ) -> Result<UpdateResult, CoreError> {
        let guard = self.guard_for(credential_id).await;
        let _held = guard.lock().await;

        let cred = self.fetch(credential_id).await?;
        let stored_plain = self.open_sealed(&cred.secret_enc)?;
        if stored_plain != current_secret {
            debug!(credential_id, "security update refused: wrong current secret");
            return Ok(UpdateResult::WrongPassword);
        }

        let resealed = match new_secret {
            Some(plain) => Some(self.cipher.seal(plain)?),
            None => None,
        };
        self.store
            .update_security(
                credential_id,
                resealed.as_deref(),
                new_image.map(ImageRef::as_str),
            )
            .await?;
        info!(credential_id, "security details updated, lock state cleared");
        Ok(UpdateResult::Updated)
    }

    async fn fetch(&self, credential_id: &str) -> Result<CredentialRow, CoreError> {
        self.store
            .get_credential(credential_id)
            .await?
            .ok_or_else(|| CoreError::CredentialNotFound(credential_id.to_string()))
    }

    fn open_sealed(&self, sealed: &str) -> Result<String, CoreError> {
        self.cipher
            .open(sealed)
            .map(|z| z.to_string())
            .map_err(|e| match e {
                CryptoError::AeadDecrypt => CoreError::SecretIntegrity(CryptoError::AeadDecrypt),
                other => CoreError::Crypto(other),
            })
    }

    async fn guard_for(&self, credential_id: &str) -> Arc<Mutex<()>> {
        let mut guards = self.guards.lock().await;
        guards
            .entry(credential_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

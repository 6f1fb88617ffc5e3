//! dv_store — SQLite persistence for DecoyVault
//!
//! # Encryption strategy
//! SQLite does NOT natively encrypt.  Secrets are stored as
//! XChaCha20-Poly1305 ciphertext (sealed by `dv_crypto::SecretCipher` before
//! they reach this crate) — the store only ever sees opaque base64 blobs.
//! Non-sensitive metadata (names, categories, attempt counters, timestamps)
//! is plaintext to allow efficient queries.
//!
//! # Attempt-state atomicity
//! `store_attempt_state` is a single conditional UPDATE guarded on the
//! previously observed `failed_attempts` value, so two racing wrong guesses
//! cannot both increment past the lock threshold (or skip it).
//!
//! # Migration
//! SQLx migrations in `migrations/` are run on open.

pub mod credentials;
pub mod db;
pub mod error;
pub mod models;
pub mod vaults;

pub use db::Store;
pub use error::StoreError;
pub use models::{CredentialRow, VaultRow};

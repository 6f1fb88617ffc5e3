use thiserror::Error;

use dv_crypto::CryptoError;
use dv_store::StoreError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("credential not found: {0}")]
    CredentialNotFound(String),

    #[error("vault not found: {0}")]
    VaultNotFound(String),

    #[error("decoy pool is empty — the image catalog has no usable images")]
    EmptyDecoyPool,

    #[error("PIN must be numeric")]
    InvalidPin,

    /// A correct pick whose stored ciphertext failed authenticated
    /// decryption.  This is a data-integrity fault, never a wrong guess.
    #[error("stored secret failed authenticated decryption — data integrity fault")]
    SecretIntegrity(#[source] CryptoError),

    #[error("attempt state for credential {0} kept changing under us")]
    Contention(String),

    #[error("image catalog error: {0}")]
    Catalog(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

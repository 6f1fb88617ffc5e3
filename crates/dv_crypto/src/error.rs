use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("AEAD encryption failed")]
    AeadEncrypt,

    #[error("AEAD decryption failed: tag mismatch (tampering or wrong key)")]
    AeadDecrypt,

    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error("PIN hashing failed: {0}")]
    PinHash(String),

    #[error("Sealed secret is not valid UTF-8")]
    InvalidPlaintext,

    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),
}

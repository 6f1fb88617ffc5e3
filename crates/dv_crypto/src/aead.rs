//! Authenticated encryption for stored secrets.
//!
//! Uses XChaCha20-Poly1305 (192-bit nonce).
//! Key size: 32 bytes.  Nonce: 24 bytes (random).  Tag: 16 bytes.
//!
//! Sealed wire format (base64 URL-safe, no padding):
//!   [ nonce (24 bytes) | ciphertext + tag ]
//!
//! A decrypt failure means the ciphertext was tampered with or sealed under
//! a different key — callers treat it as a data-integrity fault, never a
//! retryable condition.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, OsRng as AeadOsRng},
    XChaCha20Poly1305,
};
use zeroize::{ZeroizeOnDrop, Zeroizing};

use crate::error::CryptoError;

const SEAL_AAD: &[u8] = b"dv-secret-v1";

/// Handle around the 32-byte at-rest key.  Construct once, inject wherever
/// sealing/opening is needed.  Key is zeroized on drop.
#[derive(ZeroizeOnDrop)]
pub struct SecretCipher {
    key: [u8; 32],
}

impl SecretCipher {
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Generate a fresh random key (first-run bootstrap).
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut key = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut key);
        Self { key }
    }

    /// Load a key previously exported with [`SecretCipher::export_base64`].
    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = URL_SAFE_NO_PAD.decode(encoded.trim())?;
        let key: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKey("key must be 32 bytes".into()))?;
        Ok(Self { key })
    }

    /// Export the key for storage in a key file (the file, not this string,
    /// is the caller's protection boundary).
    pub fn export_base64(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.key)
    }

    /// Seal a plaintext secret, prepending a random 24-byte nonce.
    pub fn seal(&self, plaintext: &str) -> Result<String, CryptoError> {
        let cipher = XChaCha20Poly1305::new_from_slice(&self.key)
            .map_err(|_| CryptoError::AeadEncrypt)?;
        let nonce = XChaCha20Poly1305::generate_nonce(&mut AeadOsRng);
        let ciphertext = cipher
            .encrypt(
                &nonce,
                chacha20poly1305::aead::Payload {
                    msg: plaintext.as_bytes(),
                    aad: SEAL_AAD,
                },
            )
            .map_err(|_| CryptoError::AeadEncrypt)?;

        let mut out = Vec::with_capacity(24 + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(out))
    }

    /// Open a sealed secret.  Fails with [`CryptoError::AeadDecrypt`] on any
    /// tampering or key mismatch.
    pub fn open(&self, sealed: &str) -> Result<Zeroizing<String>, CryptoError> {
        let data = URL_SAFE_NO_PAD.decode(sealed)?;
        if data.len() < 24 {
            return Err(CryptoError::AeadDecrypt);
        }
        let (nonce_bytes, ct) = data.split_at(24);
        let nonce = chacha20poly1305::XNonce::from_slice(nonce_bytes);

        let cipher = XChaCha20Poly1305::new_from_slice(&self.key)
            .map_err(|_| CryptoError::AeadDecrypt)?;
        let plaintext = cipher
            .decrypt(
                nonce,
                chacha20poly1305::aead::Payload {
                    msg: ct,
                    aad: SEAL_AAD,
                },
            )
            .map_err(|_| CryptoError::AeadDecrypt)?;

        let text = String::from_utf8(plaintext).map_err(|_| CryptoError::InvalidPlaintext)?;
        Ok(Zeroizing::new(text))
    }
}

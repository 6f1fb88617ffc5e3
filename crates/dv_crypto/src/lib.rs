//! dv_crypto — DecoyVault cryptographic primitives
//!
//! # Design principles
//! - NO custom crypto; all primitives come from audited Rust crates.
//! - Zeroize secret material on drop.
//! - The cipher is an explicitly constructed handle the caller injects into
//!   the core — never process-global state.
//!
//! # Module layout
//! - `aead`    — XChaCha20-Poly1305 secret sealing
//! - `pin`     — Argon2id PIN hashing / verification
//! - `passgen` — random password generation
//! - `error`   — unified error type

pub mod aead;
pub mod error;
pub mod passgen;
pub mod pin;

pub use aead::SecretCipher;
pub use error::CryptoError;

//! dv_core — the DecoyVault challenge protocol
//!
//! Revealing a stored secret is an image-recognition challenge: the owner
//! must pick their pre-chosen secret image out of a shuffled gallery of
//! decoys.  Three wrong picks lock the credential for 24 hours.
//!
//! # Module layout
//! - `catalog`   — `ImageCatalog` trait + filesystem implementation
//! - `decoys`    — tiered decoy pool resolver (category → classic → rest)
//! - `gallery`   — decoys + the one secret, shuffled
//! - `lockout`   — attempt counter / time-lock state machine
//! - `challenge` — `ChallengeService`: start a challenge, verify a pick
//! - `auth`      — vault registration + shadow-vault login boundary
//! - `clock`     — injected time source (always aware UTC)
//! - `image`     — image identifiers and recognized extensions
//! - `error`     — unified error type
//!
//! All collaborators (store, cipher, catalog, clock) are constructed by the
//! caller and injected — nothing in this crate reads process globals.

pub mod auth;
pub mod catalog;
pub mod challenge;
pub mod clock;
pub mod decoys;
pub mod error;
pub mod gallery;
pub mod image;
pub mod lockout;

pub use auth::{LoginResult, VaultDirectory};
pub use catalog::{FsCatalog, ImageCatalog};
pub use challenge::{Challenge, ChallengeService, UpdateResult, VerifyResult};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::CoreError;
pub use gallery::GalleryEntry;
pub use image::ImageRef;
pub use lockout::Outcome;

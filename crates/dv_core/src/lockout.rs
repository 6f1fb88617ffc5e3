//! Attempt counter / time-lock state machine.
//!
//! One verification attempt maps to one `record_outcome` call.  The
//! function only mutates the in-memory row — persistence (and its
//! exactly-once guarantee) is the caller's job, so a failed write leaves
//! the stored counter untouched.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use dv_store::CredentialRow;

/// Wrong guesses before the lock engages.
pub const LOCK_THRESHOLD: i64 = 3;
/// Lock window once engaged.
pub const LOCK_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Correct pick — counter reset, lock cleared.
    Revealed,
    /// First wrong pick.
    InfoNotice { failed_attempts: i64 },
    /// Second wrong pick — next one locks.
    FinalWarning { failed_attempts: i64 },
    /// Third (or later) wrong pick — locked for [`LOCK_HOURS`].
    LockedOut { lock_until: DateTime<Utc> },
    /// Attempt arrived while the lock is live.  Nothing was mutated and the
    /// pick was never even compared.
    AlreadyLocked { lock_until: DateTime<Utc> },
}

/// Apply one attempt to the credential's counter/lock state.
///
/// The entry guard runs first: inside a live lock window every call —
/// success or not — returns `AlreadyLocked` without touching the counter.
/// An expired `lock_until` is simply ignored (lazy expiry); it stays set
/// until a success or an explicit security update overwrites it.
pub fn record_outcome(
    credential: &mut CredentialRow,
    success: bool,
    now: DateTime<Utc>,
) -> Outcome {
    if let Some(until) = credential.lock_until {
        if now < until {
            return Outcome::AlreadyLocked { lock_until: until };
        }
    }

    if success {
        credential.failed_attempts = 0;
        credential.lock_until = None;
        return Outcome::Revealed;
    }

    credential.failed_attempts += 1;
    match credential.failed_attempts {
        1 => Outcome::InfoNotice { failed_attempts: 1 },
        2 => Outcome::FinalWarning { failed_attempts: 2 },
        _ => {
            let until = now + Duration::hours(LOCK_HOURS);
            credential.lock_until = Some(until);
            Outcome::LockedOut { lock_until: until }
        }
    }
}

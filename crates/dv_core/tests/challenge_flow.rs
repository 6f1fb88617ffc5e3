//! End-to-end challenge flows over a real SQLite store.
//!
//! Covers the full escalation table, lock expiry on a simulated clock,
//! reveal-and-reset, the integrity fault path, and security updates.

use std::fs;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tempfile::{tempdir, TempDir};

use dv_core::{
    gallery, Challenge, ChallengeService, Clock, CoreError, FsCatalog, ImageRef, ManualClock,
    UpdateResult, VerifyResult,
};
use dv_crypto::SecretCipher;
use dv_store::credentials::NewCredential;
use dv_store::{CredentialRow, Store};

struct Fixture {
    _dir: TempDir,
    store: Store,
    service: ChallengeService,
    clock: Arc<ManualClock>,
    cred: CredentialRow,
    cipher_copy: SecretCipher,
}

async fn setup(decoy_names: &[&str]) -> Fixture {
    let dir = tempdir().unwrap();
    let decoy_root = dir.path().join("decoys");
    fs::create_dir_all(&decoy_root).unwrap();
    for name in decoy_names {
        fs::write(decoy_root.join(name), b"img").unwrap();
    }

    let store = Store::open(&dir.path().join("dv.db")).await.unwrap();
    let vault = store.create_vault("alice", "pin-hash").await.unwrap();

    let cipher = SecretCipher::generate();
    let cipher_copy = SecretCipher::from_base64(&cipher.export_base64()).unwrap();
    let sealed = cipher.seal("s3cret-password").unwrap();
    let cred = store
        .insert_credential(NewCredential {
            vault_id: &vault.id,
            platform: "github",
            secret_enc: &sealed,
            image_path: "uploads/cats.png",
            category: "pets",
        })
        .await
        .unwrap();

    let clock = Arc::new(ManualClock::new(Utc::now()));
    let service = ChallengeService::new(
        store.clone(),
        Arc::new(cipher),
        Arc::new(FsCatalog::new(decoy_root)),
        clock.clone(),
    );

    Fixture {
        _dir: dir,
        store,
        service,
        clock,
        cred,
        cipher_copy,
    }
}

async fn attempts(fx: &Fixture) -> i64 {
    fx.store
        .get_credential(&fx.cred.id)
        .await
        .unwrap()
        .unwrap()
        .failed_attempts
}

#[tokio::test]
async fn wrong_then_right_pick_reveals_and_resets() {
    let fx = setup(&["a.png", "b.png"]).await;

    // Small gallery straight from the builder: 2 decoys + the secret.
    let secret = ImageRef::new("uploads/cats.png");
    let entries = gallery::build(
        &FsCatalog::new(fx._dir.path().join("decoys")),
        &mut rand::thread_rng(),
        &secret,
        "pets",
        2,
    )
    .unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries.iter().filter(|e| e.is_secret).count(), 1);

    match fx
        .service
        .submit_choice(&fx.cred.id, &ImageRef::new("a.png"))
        .await
        .unwrap()
    {
        VerifyResult::InfoNotice { failed_attempts } => assert_eq!(failed_attempts, 1),
        other => panic!("expected InfoNotice, got {other:?}"),
    }
    assert_eq!(attempts(&fx).await, 1);

    match fx.service.submit_choice(&fx.cred.id, &secret).await.unwrap() {
        VerifyResult::Revealed { secret } => assert_eq!(secret, "s3cret-password"),
        other => panic!("expected Revealed, got {other:?}"),
    }
    assert_eq!(attempts(&fx).await, 0);
}

#[tokio::test]
async fn three_wrong_picks_lock_for_24_hours() {
    let fx = setup(&["a.png", "b.png"]).await;
    let wrong = ImageRef::new("a.png");
    let right = ImageRef::new("uploads/cats.png");
    let now = fx.clock.now();

    match fx.service.submit_choice(&fx.cred.id, &wrong).await.unwrap() {
        VerifyResult::InfoNotice { failed_attempts } => assert_eq!(failed_attempts, 1),
        other => panic!("unexpected {other:?}"),
    }
    match fx.service.submit_choice(&fx.cred.id, &wrong).await.unwrap() {
        VerifyResult::FinalWarning { failed_attempts } => assert_eq!(failed_attempts, 2),
        other => panic!("unexpected {other:?}"),
    }
    let lock_until = match fx.service.submit_choice(&fx.cred.id, &wrong).await.unwrap() {
        VerifyResult::LockedOut { lock_until } => {
            assert_eq!(lock_until, now + Duration::hours(24));
            lock_until
        }
        other => panic!("unexpected {other:?}"),
    };

    // Inside the window even the correct image is refused, with no mutation.
    match fx.service.submit_choice(&fx.cred.id, &right).await.unwrap() {
        VerifyResult::Locked { lock_until: until } => assert_eq!(until, lock_until),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(attempts(&fx).await, 3);

    // Starting a challenge is refused too.
    match fx.service.start_challenge(&fx.cred.id).await.unwrap() {
        Challenge::Locked { lock_until: until } => assert_eq!(until, lock_until),
        Challenge::Gallery { .. } => panic!("expected locked challenge"),
    }

    // After expiry the correct pick goes through and resets everything.
    fx.clock.advance(Duration::hours(25));
    match fx.service.start_challenge(&fx.cred.id).await.unwrap() {
        Challenge::Gallery { entries } => assert_eq!(entries.len(), 20),
        Challenge::Locked { .. } => panic!("lock should have expired"),
    }
    match fx.service.submit_choice(&fx.cred.id, &right).await.unwrap() {
        VerifyResult::Revealed { .. } => {}
        other => panic!("unexpected {other:?}"),
    }
    let row = fx.store.get_credential(&fx.cred.id).await.unwrap().unwrap();
    assert_eq!(row.failed_attempts, 0);
    assert!(row.lock_until.is_none());
}

#[tokio::test]
async fn expired_lock_does_not_reset_the_counter() {
    let fx = setup(&["a.png"]).await;
    let wrong = ImageRef::new("a.png");

    for _ in 0..3 {
        fx.service.submit_choice(&fx.cred.id, &wrong).await.unwrap();
    }
    assert_eq!(attempts(&fx).await, 3);

    // Counting resumes at 3 after expiry, so one more wrong pick re-locks.
    fx.clock.advance(Duration::hours(25));
    match fx.service.submit_choice(&fx.cred.id, &wrong).await.unwrap() {
        VerifyResult::LockedOut { lock_until } => {
            assert_eq!(lock_until, fx.clock.now() + Duration::hours(24));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(attempts(&fx).await, 4);
}

#[tokio::test]
async fn corrupted_ciphertext_is_an_integrity_fault_not_a_wrong_guess() {
    let fx = setup(&["a.png"]).await;
    fx.store
        .update_security(&fx.cred.id, Some("bm90LWEtdmFsaWQtYmxvYg"), None)
        .await
        .unwrap();

    let err = fx
        .service
        .submit_choice(&fx.cred.id, &ImageRef::new("uploads/cats.png"))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::SecretIntegrity(_)), "got {err:?}");
}

#[tokio::test]
async fn unknown_credential_is_not_found() {
    let fx = setup(&["a.png"]).await;
    assert!(matches!(
        fx.service.start_challenge("missing").await,
        Err(CoreError::CredentialNotFound(_))
    ));
    assert!(matches!(
        fx.service
            .submit_choice("missing", &ImageRef::new("a.png"))
            .await,
        Err(CoreError::CredentialNotFound(_))
    ));
}

#[tokio::test]
async fn empty_catalog_cannot_start_a_challenge() {
    let fx = setup(&[]).await;
    assert!(matches!(
        fx.service.start_challenge(&fx.cred.id).await,
        Err(CoreError::EmptyDecoyPool)
    ));
}

#[tokio::test]
async fn security_update_requires_current_secret_and_clears_lock() {
    let fx = setup(&["a.png"]).await;
    let wrong = ImageRef::new("a.png");
    for _ in 0..3 {
        fx.service.submit_choice(&fx.cred.id, &wrong).await.unwrap();
    }

    // Wrong current secret: nothing changes, lock stays.
    assert_eq!(
        fx.service
            .change_security(&fx.cred.id, "wrong-password", None, None)
            .await
            .unwrap(),
        UpdateResult::WrongPassword
    );
    assert_eq!(attempts(&fx).await, 3);

    // Correct current secret: new image + reset, even while locked.
    assert_eq!(
        fx.service
            .change_security(
                &fx.cred.id,
                "s3cret-password",
                Some("new-password"),
                Some(&ImageRef::new("uploads/dogs.png")),
            )
            .await
            .unwrap(),
        UpdateResult::Updated
    );
    let row = fx.store.get_credential(&fx.cred.id).await.unwrap().unwrap();
    assert_eq!(row.failed_attempts, 0);
    assert!(row.lock_until.is_none());
    assert_eq!(row.image_path, "uploads/dogs.png");
    assert_eq!(
        fx.cipher_copy.open(&row.secret_enc).unwrap().as_str(),
        "new-password"
    );
}

#[tokio::test]
async fn add_credential_seals_the_secret() {
    let fx = setup(&["a.png"]).await;
    let row = fx
        .service
        .add_credential(
            &fx.cred.vault_id,
            "mailbox",
            "inbox-pass",
            &ImageRef::new("uploads/tree.png"),
            None,
        )
        .await
        .unwrap();
    assert_eq!(row.category, "other");
    assert_ne!(row.secret_enc, "inbox-pass");
    assert_eq!(
        fx.cipher_copy.open(&row.secret_enc).unwrap().as_str(),
        "inbox-pass"
    );

    assert!(matches!(
        fx.service
            .add_credential("no-such-vault", "x", "y", &ImageRef::new("z.png"), None)
            .await,
        Err(CoreError::VaultNotFound(_))
    ));
}
